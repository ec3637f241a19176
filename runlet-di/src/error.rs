use crate::marker::{LifecyclePhase, PrimitiveKind, PropertyOrigin};
use std::error::Error;
use std::sync::Arc;
use thiserror::Error;

/// Shared pointer to errors returned by lifecycle methods.
pub type ErrorPtr = Arc<dyn Error + Send + Sync + 'static>;

/// Wraps any error in an [ErrorPtr].
pub fn convert_error<E: Error + Send + Sync + 'static>(error: E) -> ErrorPtr {
    Arc::new(error) as ErrorPtr
}

/// Errors found while enumerating a discovery scope. Never fatal - the offending scope entry
/// simply contributes no types.
#[derive(Error, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DiscoveryError {
    #[error("Cannot scan invalid namespace: '{0}'")]
    InvalidNamespace(String),
}

/// Error related to type registries.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum TypeRegistryError {
    #[error("Attempted to re-register a type: {0}")]
    DuplicateType(String),
    #[error("Missing base type {target_type} for lifecycle method: {method_name}")]
    MissingBaseType {
        target_type: String,
        method_name: String,
    },
}

/// Reason a raw value could not be coerced.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CoercionErrorKind {
    InvalidNumber,
    InvalidBoolean,
}

/// Raw configuration value does not match the declared [PrimitiveKind].
#[derive(Error, Clone, Eq, PartialEq, Hash, Debug)]
#[error("Cannot coerce '{raw}' to {target}: {kind:?}")]
pub struct CoercionError {
    pub kind: CoercionErrorKind,
    pub target: PrimitiveKind,
    pub raw: String,
}

/// Reason a property could not be injected.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum InjectionFailure {
    /// The raw value does not match the declared kind.
    Coercion(CoercionErrorKind),
    /// The field accessor rejected the coerced value or the instance.
    IncompatibleField,
}

/// Failure to inject a single configurable field.
#[derive(Error, Clone, Eq, PartialEq, Hash, Debug)]
#[error("Cannot inject {origin} property '{property_name}' ({kind}) into field '{field_name}' with value '{value}': {reason:?}")]
pub struct PropertyInjectionError {
    pub field_name: String,
    pub property_name: String,
    pub kind: PrimitiveKind,
    pub value: String,
    pub origin: PropertyOrigin,
    pub reason: InjectionFailure,
}

impl PropertyInjectionError {
    /// Was the offending value sourced from the process environment.
    #[inline]
    pub fn is_system(&self) -> bool {
        self.origin == PropertyOrigin::System
    }
}

/// Errors related to materializing managed instances.
#[derive(Error, Clone, Eq, PartialEq, Hash, Debug)]
pub enum InstanceError {
    #[error("Cannot find registered type: {0}")]
    UnknownType(String),
    #[error("Constructed instance is incompatible with requested type: {0}")]
    IncompatibleInstance(String),
    #[error("Error injecting properties: {0}")]
    Injection(#[from] PropertyInjectionError),
}

/// Failure calling a lifecycle method.
#[derive(Error, Clone, Debug)]
pub enum InvocationError {
    #[error("Lifecycle method called on incompatible instance of: {0}")]
    IncompatibleInstance(String),
    #[error("Lifecycle method failed: {0}")]
    Failed(ErrorPtr),
}

/// Failure of a single lifecycle phase.
#[derive(Error, Clone, Debug)]
pub enum LifecycleError {
    #[error("Cannot materialize application for {phase}: {error}")]
    Materialization {
        phase: LifecyclePhase,
        error: InstanceError,
    },
    #[error("Error invoking {method_name} for {phase}: {error}")]
    Invocation {
        phase: LifecyclePhase,
        method_name: String,
        error: InvocationError,
    },
}

/// Failure loading a configuration resource.
#[derive(Error, Debug)]
pub enum ConfigurationSourceError {
    #[error("Cannot read configuration '{identifier}': {error}")]
    Io {
        identifier: String,
        #[source]
        error: std::io::Error,
    },
    #[error("Cannot parse configuration '{identifier}': {error}")]
    Parse {
        identifier: String,
        #[source]
        error: java_properties::PropertiesError,
    },
}
