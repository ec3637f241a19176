use runlet_di::config_source::ConfigurationStore;
use runlet_di::context::ApplicationContext;
use runlet_di::lifecycle::LifecycleDispatcher;
use runlet_di::resolver::resolve_application_type;
use runlet_di::type_registry::{DiscoveryScope, StaticTypeRegistry, TypeRegistry};
use runlet_di::{lifecycle, Managed};

// the application type; its fields are injected before each lifecycle method runs
#[derive(Managed)]
#[managed(application)]
struct HelloApplication {
    #[property(name = "hello.name")]
    name: String,
    // kind is inferred from the field type; optional properties get a default value when blank
    #[property(name = "hello.times", optional)]
    times: i32,
}

#[lifecycle]
impl HelloApplication {
    #[app_init]
    fn initialize(&mut self) {
        self.times = self.times.max(1);
    }

    #[app_exec]
    fn execute(&self) {
        for _ in 0..self.times {
            println!("Hello {}!", self.name);
        }
    }
}

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    // all types registered with the derive macros
    let registry = StaticTypeRegistry::new(false).expect("unable to create type registry");
    let discovery = registry.discover(&DiscoveryScope::everything());

    let application = resolve_application_type(&discovery.candidates)
        .cloned()
        .expect("no application found");

    // configuration would normally be loaded from a file with a ConfigurationSource
    let store: ConfigurationStore = [("hello.name", "world"), ("hello.times", " ")]
        .into_iter()
        .collect();

    let context = ApplicationContext::new(store, ConfigurationStore::default(), discovery.candidates);

    // prints "Hello world!" once
    let report = LifecycleDispatcher::new(&context).dispatch(&application);
    assert!(report.is_success());
}
