//! Registry of types taking part in injection and lifecycle dispatch. Instead of inspecting types
//! at runtime, every participating type registers a [TypeDefinition] describing its markers,
//! configurable fields and lifecycle methods. Registration normally happens statically through
//! the derive macros, but definitions can also be registered manually.
//!
//! The registry is then [discovered](TypeRegistry::discover) within a [DiscoveryScope], which
//! limits candidates to given module namespaces.

use crate::coercion::TypedValue;
use crate::context::ApplicationContext;
use crate::error::{DiscoveryError, InvocationError, TypeRegistryError};
use crate::marker::{ApplicationPropertyMarker, LifecyclePhase, Role};
use crate::type_registry::internal::{
    LifecycleMethodRegisterer, LifecycleMethodRegistration, TypeDefinitionRegisterer,
};
use derivative::Derivative;
use fxhash::FxHashMap;
use itertools::Itertools;
use std::any::{Any, TypeId};
use tracing::{debug, error, warn};

/// Type-erased instance of a registered type.
pub type ManagedInstance = Box<dyn Any>;

/// Creates a zero-valued instance of a registered type.
pub type Constructor = fn() -> ManagedInstance;

/// Explicit capability to write a single field of an instance. Gives the value back if either the
/// instance or the value are incompatible with the field.
pub type FieldAccessor = fn(instance: &mut dyn Any, value: TypedValue) -> Result<(), TypedValue>;

/// Calls a lifecycle method on an instance.
pub type LifecycleInvoker =
    fn(instance: &mut dyn Any, context: &ApplicationContext) -> Result<(), InvocationError>;

/// A field carrying a `ConfigurableField` marker.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct FieldDefinition {
    pub field_name: &'static str,
    pub marker: ApplicationPropertyMarker,
    #[derivative(Debug = "ignore")]
    pub accessor: FieldAccessor,
}

/// A method bound to a [LifecyclePhase].
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct LifecycleMethodDefinition {
    pub phase: LifecyclePhase,
    pub method_name: &'static str,
    #[derivative(Debug = "ignore")]
    pub invoker: LifecycleInvoker,
}

/// Definition of a type registered in a [TypeRegistry].
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct TypeDefinition {
    pub type_id: TypeId,
    pub type_name: &'static str,
    /// Module in which the type is declared; used to match [DiscoveryScope]s.
    pub module_path: &'static str,
    /// Type-level roles.
    pub roles: Vec<Role>,
    /// Configuration resource name, when the type carries the [Role::ConfigSource] role.
    pub config_file: Option<&'static str>,
    pub fields: Vec<FieldDefinition>,
    /// Lifecycle methods in registration order.
    pub lifecycle_methods: Vec<LifecycleMethodDefinition>,
    #[derivative(Debug = "ignore")]
    pub constructor: Constructor,
}

impl TypeDefinition {
    #[inline]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    #[inline]
    pub fn is_application(&self) -> bool {
        self.has_role(Role::Application)
    }

    /// Managed types get their fields injected when materialized. The application type is always
    /// considered managed.
    #[inline]
    pub fn is_managed(&self) -> bool {
        self.has_role(Role::ManagedClass) || self.is_application()
    }

    /// Returns the method bound to given phase. When multiple methods are bound to the same
    /// phase, the last registered one wins.
    pub fn lifecycle_method(&self, phase: LifecyclePhase) -> Option<&LifecycleMethodDefinition> {
        let methods = self
            .lifecycle_methods
            .iter()
            .filter(|method| method.phase == phase)
            .collect_vec();

        if methods.len() > 1 {
            warn!(
                type_name = self.type_name,
                %phase,
                methods = %methods.iter().map(|method| method.method_name).join(", "),
                "Multiple methods bound to the same lifecycle phase - using the last one."
            );
        }

        let method = methods.last().copied();
        if let Some(method) = method {
            debug!(
                "Annotated method '{}' found: {}",
                method.method_name,
                phase.marker_name()
            );
        }

        method
    }
}

/// Set of module namespaces limiting discovery. An empty scope covers everything.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DiscoveryScope {
    namespaces: Vec<String>,
}

impl DiscoveryScope {
    /// Scope covering all registered types.
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn new<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespaces: namespaces.into_iter().map(Into::into).collect(),
        }
    }

    #[inline]
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    #[inline]
    pub fn is_everything(&self) -> bool {
        self.namespaces.is_empty()
    }
}

fn is_valid_namespace(namespace: &str) -> bool {
    !namespace.is_empty()
        && namespace.split("::").all(|segment| {
            let mut chars = segment.chars();
            chars
                .next()
                .map(|first| first.is_alphabetic() || first == '_')
                .unwrap_or(false)
                && chars.all(|c| c.is_alphanumeric() || c == '_')
        })
}

fn is_in_namespace(module_path: &str, namespace: &str) -> bool {
    module_path
        .strip_prefix(namespace)
        .map(|rest| rest.is_empty() || rest.starts_with("::"))
        .unwrap_or(false)
}

/// Result of discovering a [DiscoveryScope].
#[derive(Clone, Debug, Default)]
pub struct Discovery {
    /// Candidate types in deterministic discovery order.
    pub candidates: Vec<TypeDefinition>,
    /// Scope entries which could not be scanned.
    pub errors: Vec<DiscoveryError>,
}

/// A registry of type definitions.
pub trait TypeRegistry {
    /// Adds a new type definition. Handling of duplicates is registry-dependent.
    fn register_type(&mut self, definition: TypeDefinition) -> Result<(), TypeRegistryError>;

    /// Binds a lifecycle method to an already registered type.
    fn register_lifecycle_method(
        &mut self,
        target: TypeId,
        method: LifecycleMethodDefinition,
    ) -> Result<(), TypeRegistryError>;

    /// Returns the definition of given type.
    fn type_by_id(&self, type_id: TypeId) -> Option<TypeDefinition>;

    /// Checks if given type is present in this registry.
    fn is_registered(&self, type_id: TypeId) -> bool;

    /// Enumerates all types within given scope. Never fails as a whole - unreadable scope entries
    /// are reported in [Discovery::errors].
    fn discover(&self, scope: &DiscoveryScope) -> Discovery;
}

/// Registry of type definitions initialized from statically registered definitions.
#[derive(Clone, Debug)]
pub struct StaticTypeRegistry {
    definitions: Vec<TypeDefinition>,
    index: FxHashMap<TypeId, usize>,
    allow_definition_overriding: bool,
}

impl StaticTypeRegistry {
    /// Creates a registry containing all types registered with the derive macros.
    pub fn new(allow_definition_overriding: bool) -> Result<Self, TypeRegistryError> {
        let type_definitions = inventory::iter::<TypeDefinitionRegisterer>
            .into_iter()
            .map(|registerer| (registerer.register)())
            .sorted_by_key(|definition| (definition.module_path, definition.type_name))
            .collect_vec();

        let method_registrations = sort_registrations(
            inventory::iter::<LifecycleMethodRegisterer>
                .into_iter()
                .map(|registerer| (registerer.register)()),
        );

        let mut registry = Self::empty(allow_definition_overriding);

        for definition in type_definitions {
            registry.register_type(definition)?;
        }

        for registration in method_registrations {
            registry.register_lifecycle_method(registration.target, registration.method)?;
        }

        debug!(
            types = registry.definitions.len(),
            "Registered statically declared types."
        );

        Ok(registry)
    }

    /// Creates a registry without any definitions.
    pub fn empty(allow_definition_overriding: bool) -> Self {
        Self {
            definitions: vec![],
            index: Default::default(),
            allow_definition_overriding,
        }
    }
}

// Inventory order is unspecified, so registrations are ordered by their declaration site.
fn sort_registrations(
    registrations: impl IntoIterator<Item = LifecycleMethodRegistration>,
) -> Vec<LifecycleMethodRegistration> {
    registrations
        .into_iter()
        .sorted_by_key(|registration| {
            (
                registration.target_name,
                registration.file,
                registration.line,
                registration.column,
                registration.ordinal,
            )
        })
        .collect_vec()
}

impl TypeRegistry for StaticTypeRegistry {
    fn register_type(&mut self, definition: TypeDefinition) -> Result<(), TypeRegistryError> {
        if let Some(index) = self.index.get(&definition.type_id) {
            if !self.allow_definition_overriding {
                return Err(TypeRegistryError::DuplicateType(
                    definition.type_name.to_string(),
                ));
            }

            self.definitions[*index] = definition;
            return Ok(());
        }

        self.index
            .insert(definition.type_id, self.definitions.len());
        self.definitions.push(definition);

        Ok(())
    }

    fn register_lifecycle_method(
        &mut self,
        target: TypeId,
        method: LifecycleMethodDefinition,
    ) -> Result<(), TypeRegistryError> {
        let definition = self
            .index
            .get(&target)
            .and_then(|index| self.definitions.get_mut(*index))
            .ok_or_else(|| TypeRegistryError::MissingBaseType {
                target_type: format!("{target:?}"),
                method_name: method.method_name.to_string(),
            })?;

        definition.lifecycle_methods.push(method);
        Ok(())
    }

    #[inline]
    fn type_by_id(&self, type_id: TypeId) -> Option<TypeDefinition> {
        self.index
            .get(&type_id)
            .and_then(|index| self.definitions.get(*index))
            .cloned()
    }

    #[inline]
    fn is_registered(&self, type_id: TypeId) -> bool {
        self.index.contains_key(&type_id)
    }

    fn discover(&self, scope: &DiscoveryScope) -> Discovery {
        if scope.is_everything() {
            return Discovery {
                candidates: self.definitions.clone(),
                errors: vec![],
            };
        }

        let (namespaces, errors): (Vec<_>, Vec<_>) = scope
            .namespaces()
            .iter()
            .partition(|namespace| is_valid_namespace(namespace));

        let errors = errors
            .into_iter()
            .map(|namespace| DiscoveryError::InvalidNamespace(namespace.clone()))
            .collect_vec();

        for error in &errors {
            error!(%error, "Error scanning discovery scope.");
        }

        let candidates = self
            .definitions
            .iter()
            .filter(|definition| {
                namespaces
                    .iter()
                    .any(|namespace| is_in_namespace(definition.module_path, namespace))
            })
            .cloned()
            .collect_vec();

        debug!(candidates = candidates.len(), "Discovered candidate types.");

        Discovery { candidates, errors }
    }
}

#[doc(hidden)]
pub mod internal {
    use crate::type_registry::{LifecycleMethodDefinition, TypeDefinition};
    use inventory::collect;
    pub use inventory::submit;
    use std::any::TypeId;

    pub struct TypeDefinitionRegisterer {
        pub register: fn() -> TypeDefinition,
    }

    pub struct LifecycleMethodRegistration {
        pub target: TypeId,
        pub target_name: &'static str,
        /// Source location of the `#[lifecycle]` impl block declaring the method.
        pub file: &'static str,
        pub line: u32,
        pub column: u32,
        /// Position of the method within its impl block.
        pub ordinal: usize,
        pub method: LifecycleMethodDefinition,
    }

    pub struct LifecycleMethodRegisterer {
        pub register: fn() -> LifecycleMethodRegistration,
    }

    collect!(TypeDefinitionRegisterer);
    collect!(LifecycleMethodRegisterer);
}
