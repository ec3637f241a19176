//! The [ApplicationContext] holds everything produced by a single configuration pass: loaded
//! configuration, discovered type definitions and the configurable field descriptors derived from
//! them. It is built once and then shared by reference with the
//! [FieldInjector](crate::injector::FieldInjector) and the
//! [LifecycleDispatcher](crate::lifecycle::LifecycleDispatcher).
//!
//! Lifecycle methods can receive the context to materialize other managed types:
//!
//! ```
//! use runlet_di::context::ApplicationContext;
//! use runlet_di::error::InstanceError;
//! use runlet_di::{lifecycle, Managed};
//!
//! #[derive(Managed)]
//! struct Initializer {
//!     #[property(name = "demo.nameOfOwner")]
//!     owner_name: String,
//! }
//!
//! #[derive(Managed)]
//! #[managed(application)]
//! struct DemoApplication;
//!
//! #[lifecycle]
//! impl DemoApplication {
//!     #[app_init]
//!     fn initialize(&mut self, context: &ApplicationContext) -> Result<(), InstanceError> {
//!         let initializer = context.new_instance::<Initializer>()?;
//!         println!("Owner: {}", initializer.owner_name);
//!         Ok(())
//!     }
//! }
//! ```

use crate::config_source::ConfigurationStore;
use crate::error::InstanceError;
use crate::injector::{ConfigurableFieldDescriptor, FieldInjector};
use crate::managed::Managed;
use crate::type_registry::{ManagedInstance, TypeDefinition};
use fxhash::FxHashMap;
use std::any::{type_name, TypeId};
use tracing::debug;

/// Configuration context of a single run.
#[derive(Clone, Debug, Default)]
pub struct ApplicationContext {
    application_store: ConfigurationStore,
    system_store: ConfigurationStore,
    definitions: FxHashMap<TypeId, TypeDefinition>,
    descriptors: Vec<ConfigurableFieldDescriptor>,
}

impl ApplicationContext {
    /// Creates a context from loaded stores and discovered definitions.
    pub fn new<I: IntoIterator<Item = TypeDefinition>>(
        application_store: ConfigurationStore,
        system_store: ConfigurationStore,
        definitions: I,
    ) -> Self {
        let definitions: FxHashMap<_, _> = definitions
            .into_iter()
            .map(|definition| (definition.type_id, definition))
            .collect();

        let mut descriptors: Vec<_> = definitions
            .values()
            .flat_map(ConfigurableFieldDescriptor::from_definition)
            .collect();

        // stable order regardless of map iteration
        descriptors.sort_by_key(|descriptor| descriptor.type_name);

        Self {
            application_store,
            system_store,
            definitions,
            descriptors,
        }
    }

    #[inline]
    pub fn application_store(&self) -> &ConfigurationStore {
        &self.application_store
    }

    #[inline]
    pub fn system_store(&self) -> &ConfigurationStore {
        &self.system_store
    }

    #[inline]
    pub fn descriptors(&self) -> &[ConfigurableFieldDescriptor] {
        &self.descriptors
    }

    #[inline]
    pub fn definition(&self, type_id: TypeId) -> Option<&TypeDefinition> {
        self.definitions.get(&type_id)
    }

    /// Returns an injector working on this context.
    #[inline]
    pub fn injector(&self) -> FieldInjector<'_> {
        FieldInjector::new(
            &self.application_store,
            &self.system_store,
            &self.descriptors,
        )
    }

    /// Creates a new instance of a registered type, injecting its configurable fields when the
    /// type is managed.
    pub fn materialize(&self, type_id: TypeId) -> Result<ManagedInstance, InstanceError> {
        let definition = self
            .definitions
            .get(&type_id)
            .ok_or_else(|| InstanceError::UnknownType(format!("{type_id:?}")))?;

        let mut instance = (definition.constructor)();

        if !definition.is_managed() {
            debug!(
                type_name = definition.type_name,
                "Type is not managed - skipping injection."
            );
            return Ok(instance);
        }

        if self.injector().inject(instance.as_mut(), type_id)? {
            debug!("Instance of type {} injected", definition.type_name);
        }

        Ok(instance)
    }

    /// Typesafe version of [ApplicationContext::materialize].
    pub fn new_instance<T: Managed>(&self) -> Result<T, InstanceError> {
        self.materialize(TypeId::of::<T>())
            .map_err(|error| match error {
                InstanceError::UnknownType(_) => {
                    InstanceError::UnknownType(type_name::<T>().to_string())
                }
                error => error,
            })?
            .downcast::<T>()
            .map(|instance| *instance)
            .map_err(|_| InstanceError::IncompatibleInstance(type_name::<T>().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use crate::coercion::{PropertyValue, TypedValue};
    use crate::config_source::ConfigurationStore;
    use crate::context::ApplicationContext;
    use crate::error::InstanceError;
    use crate::managed::Managed;
    use crate::marker::{ApplicationPropertyMarker, PrimitiveKind, Role};
    use crate::type_registry::{FieldDefinition, ManagedInstance, TypeDefinition};
    use std::any::{type_name, Any, TypeId};

    #[derive(Debug, Default)]
    struct Initializer {
        owner_name: String,
    }

    impl Managed for Initializer {
        fn construct() -> Self {
            Self::default()
        }
    }

    #[derive(Debug)]
    struct Unregistered;

    impl Managed for Unregistered {
        fn construct() -> Self {
            Unregistered
        }
    }

    fn constructor() -> ManagedInstance {
        Box::new(Initializer::construct())
    }

    fn owner_name(instance: &mut dyn Any, value: TypedValue) -> Result<(), TypedValue> {
        match instance.downcast_mut::<Initializer>() {
            Some(target) => {
                target.owner_name = String::from_typed(value)?;
                Ok(())
            }
            None => Err(value),
        }
    }

    fn create_definition(roles: Vec<Role>) -> TypeDefinition {
        TypeDefinition {
            type_id: TypeId::of::<Initializer>(),
            type_name: type_name::<Initializer>(),
            module_path: module_path!(),
            roles,
            config_file: None,
            fields: vec![FieldDefinition {
                field_name: "owner_name",
                marker: ApplicationPropertyMarker::new("demo.nameOfOwner", PrimitiveKind::String),
                accessor: owner_name,
            }],
            lifecycle_methods: vec![],
            constructor,
        }
    }

    fn create_context(roles: Vec<Role>, owner: &str) -> ApplicationContext {
        ApplicationContext::new(
            [("demo.nameOfOwner", owner)].into_iter().collect(),
            ConfigurationStore::default(),
            [create_definition(roles)],
        )
    }

    #[test]
    fn should_derive_descriptors() {
        let context = create_context(vec![Role::ManagedClass], "Ada");

        assert_eq!(context.descriptors().len(), 1);
        assert_eq!(context.descriptors()[0].field_name, "owner_name");
        assert_eq!(
            context.descriptors()[0].type_id,
            TypeId::of::<Initializer>()
        );
    }

    #[test]
    fn should_materialize_managed_instance() {
        let context = create_context(vec![Role::ManagedClass], "Ada");

        let instance = context.new_instance::<Initializer>().unwrap();
        assert_eq!(instance.owner_name, "Ada");
    }

    #[test]
    fn should_not_inject_unmanaged_instance() {
        let context = create_context(vec![], "Ada");

        let instance = context.new_instance::<Initializer>().unwrap();
        assert_eq!(instance.owner_name, "");
    }

    #[test]
    fn should_reject_unknown_type() {
        let context = create_context(vec![Role::ManagedClass], "Ada");

        assert_eq!(
            context.new_instance::<Unregistered>().unwrap_err(),
            InstanceError::UnknownType(type_name::<Unregistered>().to_string())
        );
    }

    #[test]
    fn should_forward_injection_error() {
        let context = ApplicationContext::new(
            ConfigurationStore::default(),
            ConfigurationStore::default(),
            [TypeDefinition {
                fields: vec![FieldDefinition {
                    field_name: "owner_name",
                    marker: ApplicationPropertyMarker::new("HOME", PrimitiveKind::Integer)
                        .system(),
                    accessor: owner_name,
                }],
                ..create_definition(vec![Role::ManagedClass])
            }],
        );

        // system store is empty, so the field is skipped
        assert!(context.new_instance::<Initializer>().is_ok());

        let context = ApplicationContext::new(
            ConfigurationStore::default(),
            [("HOME", "/home/ada")].into_iter().collect(),
            context.definition(TypeId::of::<Initializer>()).cloned(),
        );

        assert!(matches!(
            context.new_instance::<Initializer>().unwrap_err(),
            InstanceError::Injection(..)
        ));
    }
}
