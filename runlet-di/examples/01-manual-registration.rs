use runlet_di::coercion::{PropertyValue, TypedValue};
use runlet_di::config_source::{parse_properties, ConfigurationStore};
use runlet_di::context::ApplicationContext;
use runlet_di::error::InvocationError;
use runlet_di::lifecycle::LifecycleDispatcher;
use runlet_di::marker::{ApplicationPropertyMarker, LifecyclePhase, PrimitiveKind, Role};
use runlet_di::type_registry::{
    DiscoveryScope, FieldDefinition, LifecycleMethodDefinition, ManagedInstance,
    StaticTypeRegistry, TypeDefinition, TypeRegistry,
};
use std::any::{type_name, Any, TypeId};

// types can be registered without the derive macros, by describing them manually
#[derive(Default)]
struct ManualApplication {
    verbose: bool,
}

fn construct() -> ManagedInstance {
    Box::new(ManualApplication::default())
}

// accessors give the value back, if it doesn't fit the field
fn set_verbose(instance: &mut dyn Any, value: TypedValue) -> Result<(), TypedValue> {
    match instance.downcast_mut::<ManualApplication>() {
        Some(target) => {
            target.verbose = bool::from_typed(value)?;
            Ok(())
        }
        None => Err(value),
    }
}

fn execute(instance: &mut dyn Any, _context: &ApplicationContext) -> Result<(), InvocationError> {
    let target = instance
        .downcast_mut::<ManualApplication>()
        .ok_or_else(|| InvocationError::IncompatibleInstance(type_name::<ManualApplication>().to_string()))?;

    println!("Verbose: {}", target.verbose);
    Ok(())
}

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    let mut registry = StaticTypeRegistry::empty(false);
    registry
        .register_type(TypeDefinition {
            type_id: TypeId::of::<ManualApplication>(),
            type_name: type_name::<ManualApplication>(),
            module_path: module_path!(),
            roles: vec![Role::Application],
            config_file: None,
            fields: vec![FieldDefinition {
                field_name: "verbose",
                marker: ApplicationPropertyMarker::new("app.verbose", PrimitiveKind::Boolean),
                accessor: set_verbose,
            }],
            lifecycle_methods: vec![],
            constructor: construct,
        })
        .expect("unable to register type");

    registry
        .register_lifecycle_method(
            TypeId::of::<ManualApplication>(),
            LifecycleMethodDefinition {
                phase: LifecyclePhase::Execute,
                method_name: "execute",
                invoker: execute,
            },
        )
        .expect("unable to register lifecycle method");

    let application = registry
        .type_by_id(TypeId::of::<ManualApplication>())
        .expect("missing application type");

    let context = ApplicationContext::new(
        parse_properties("app.verbose = yes".as_bytes()).expect("invalid properties"),
        ConfigurationStore::default(),
        registry.discover(&DiscoveryScope::everything()).candidates,
    );

    // prints "Verbose: true"
    LifecycleDispatcher::new(&context).dispatch(&application);
}
