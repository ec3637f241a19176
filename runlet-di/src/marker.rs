//! Vocabulary of declarative markers attached to registered types, their fields and methods.
//!
//! Markers are normally produced by the derive macros (see the crate documentation), but can also
//! be constructed by hand when registering types manually with a
//! [TypeRegistry](crate::type_registry::TypeRegistry).

use std::fmt::{Display, Formatter};

/// Role a registered type or field can play.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Role {
    /// The single root type whose lifecycle methods get dispatched.
    Application,
    /// A type eligible for field injection and lifecycle materialization.
    ManagedClass,
    /// A type naming the configuration resource to load.
    ConfigSource,
    /// A field bound to a configuration key.
    ConfigurableField,
}

/// Closed set of primitive kinds configuration values can be coerced into.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum PrimitiveKind {
    #[default]
    String,
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    Long,
    Boolean,
}

impl Display for PrimitiveKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PrimitiveKind::String => "STRING",
            PrimitiveKind::Integer => "INTEGER",
            PrimitiveKind::Long => "LONG",
            PrimitiveKind::Boolean => "BOOLEAN",
        })
    }
}

/// Where the raw value of a property comes from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum PropertyOrigin {
    /// The configuration resource loaded for the application.
    #[default]
    Application,
    /// The process environment.
    System,
}

impl Display for PropertyOrigin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PropertyOrigin::Application => "application",
            PropertyOrigin::System => "system",
        })
    }
}

/// Phases of the application lifecycle, in dispatch order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum LifecyclePhase {
    Init,
    Execute,
    Terminate,
}

impl LifecyclePhase {
    /// All phases in the order they are dispatched.
    pub const ALL: [LifecyclePhase; 3] = [
        LifecyclePhase::Init,
        LifecyclePhase::Execute,
        LifecyclePhase::Terminate,
    ];

    /// Only [LifecyclePhase::Execute] is required - a missing method is reported, but never
    /// fatal.
    #[inline]
    pub fn is_required(&self) -> bool {
        matches!(self, LifecyclePhase::Execute)
    }

    /// Name of the method marker bound to this phase.
    pub fn marker_name(&self) -> &'static str {
        match self {
            LifecyclePhase::Init => "app_init",
            LifecyclePhase::Execute => "app_exec",
            LifecyclePhase::Terminate => "app_term",
        }
    }
}

impl Display for LifecyclePhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LifecyclePhase::Init => "INIT",
            LifecyclePhase::Execute => "EXECUTE",
            LifecyclePhase::Terminate => "TERMINATE",
        })
    }
}

/// Attributes of a `ConfigurableField` marker.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ApplicationPropertyMarker {
    /// Configuration key name.
    pub name: &'static str,
    pub kind: PrimitiveKind,
    /// Is a blank value tolerated (replaced with the default of the kind).
    pub optional: bool,
    pub origin: PropertyOrigin,
}

impl ApplicationPropertyMarker {
    /// Creates a required application property marker.
    pub const fn new(name: &'static str, kind: PrimitiveKind) -> Self {
        Self {
            name,
            kind,
            optional: false,
            origin: PropertyOrigin::Application,
        }
    }

    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub const fn system(mut self) -> Self {
        self.origin = PropertyOrigin::System;
        self
    }
}
