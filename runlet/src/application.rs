//! Core application framework functionality.

use crate::config::ApplicationConfig;
use config::ConfigError;
use derive_more::Constructor;
use runlet_di::config_source::{
    load_configuration, ConfigurationSource, ConfigurationStore, PropertiesFileSource,
};
use runlet_di::context::ApplicationContext;
use runlet_di::error::TypeRegistryError;
use runlet_di::lifecycle::{LifecycleDispatcher, LifecycleReport};
use runlet_di::resolver::resolve_application_type;
use runlet_di::type_registry::{DiscoveryScope, StaticTypeRegistry, TypeRegistry};
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Error creating type registry: {0}")]
    TypeRegistryError(#[from] TypeRegistryError),
    #[error("Error reading framework configuration: {0}")]
    ConfigError(#[from] ConfigError),
}

/// Summary of a single [Application::run].
#[derive(Clone, Debug)]
pub enum RunReport {
    /// No type marked as the application was found - nothing was executed.
    NoApplication,
    Completed {
        /// Name of the resolved application type.
        application: &'static str,
        /// Number of loaded configuration entries.
        configuration_entries: usize,
        lifecycle: LifecycleReport,
    },
}

impl RunReport {
    /// A run is successful when an application was found and its lifecycle completed without
    /// failures or missing required phases.
    pub fn is_success(&self) -> bool {
        match self {
            RunReport::NoApplication => false,
            RunReport::Completed { lifecycle, .. } => lifecycle.is_success(),
        }
    }

    pub fn lifecycle(&self) -> Option<&LifecycleReport> {
        match self {
            RunReport::NoApplication => None,
            RunReport::Completed { lifecycle, .. } => Some(lifecycle),
        }
    }
}

/// Main entrypoint for the application. Finds the application type, loads its configuration and
/// dispatches its lifecycle.
#[derive(Constructor)]
pub struct Application<TR: TypeRegistry, CS: ConfigurationSource> {
    type_registry: TR,
    configuration_source: CS,
    config: ApplicationConfig,
}

impl<TR: TypeRegistry, CS: ConfigurationSource> Application<TR, CS> {
    pub fn run(&self) -> RunReport {
        let _guard = self.config.install_tracing_logger.then(|| {
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

            tracing::subscriber::set_default(
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .finish(),
            )
        });

        self.run_lifecycle()
    }

    fn run_lifecycle(&self) -> RunReport {
        info!("Searching for application type...");

        let discovery = self
            .type_registry
            .discover(&DiscoveryScope::new(self.config.scope.iter().cloned()));

        let application = match resolve_application_type(&discovery.candidates) {
            Some(application) => application.clone(),
            None => {
                warn!("No annotated application class was found");
                return RunReport::NoApplication;
            }
        };

        let identifier = self
            .config
            .config_file
            .as_deref()
            .or(application.config_file);

        let store = match identifier {
            Some(identifier) => {
                let store = load_configuration(&self.configuration_source, identifier);
                if store.is_empty() {
                    warn!(identifier, "No properties found");
                } else {
                    info!(entries = store.len(), "Configuration applied");
                }

                store
            }
            None => {
                debug!("No configuration resource declared.");
                ConfigurationStore::default()
            }
        };

        let configuration_entries = store.len();
        let context = ApplicationContext::new(
            store,
            ConfigurationStore::from_environment(),
            discovery.candidates,
        );

        info!(
            application = application.type_name,
            "Dispatching application lifecycle..."
        );

        let lifecycle = LifecycleDispatcher::new(&context).dispatch(&application);

        RunReport::Completed {
            application: application.type_name,
            configuration_entries,
            lifecycle,
        }
    }
}

/// Creates an [Application] with the statically registered types, reading configuration from
/// properties files and the framework config from the environment.
pub fn create_default() -> Result<Application<StaticTypeRegistry, PropertiesFileSource>, ApplicationError>
{
    let type_registry = StaticTypeRegistry::new(false)?;
    let config = ApplicationConfig::init_from_environment()?;

    Ok(Application::new(type_registry, PropertiesFileSource, config))
}

#[cfg(test)]
mod tests {
    use crate::application::{Application, RunReport};
    use crate::config::ApplicationConfig;
    use mockall::mock;
    use mockall::predicate::*;
    use runlet_di::coercion::{PropertyValue, TypedValue};
    use runlet_di::config_source::{ConfigurationSource, ConfigurationStore};
    use runlet_di::context::ApplicationContext;
    use runlet_di::error::{
        convert_error, ConfigurationSourceError, InvocationError, TypeRegistryError,
    };
    use runlet_di::lifecycle::PhaseOutcome;
    use runlet_di::marker::{ApplicationPropertyMarker, LifecyclePhase, PrimitiveKind, Role};
    use runlet_di::type_registry::{
        Discovery, DiscoveryScope, FieldDefinition, LifecycleMethodDefinition, ManagedInstance,
        TypeDefinition, TypeRegistry,
    };
    use std::any::{Any, TypeId};
    use std::io::{self, Error, ErrorKind, Write};
    use std::sync::{Arc, Mutex};
    use tracing::Level;
    use tracing_subscriber::fmt::MakeWriter;

    mock! {
        TypeRegistry {}

        impl TypeRegistry for TypeRegistry {
            fn register_type(&mut self, definition: TypeDefinition) -> Result<(), TypeRegistryError>;

            fn register_lifecycle_method(
                &mut self,
                target: TypeId,
                method: LifecycleMethodDefinition,
            ) -> Result<(), TypeRegistryError>;

            fn type_by_id(&self, type_id: TypeId) -> Option<TypeDefinition>;

            fn is_registered(&self, type_id: TypeId) -> bool;

            fn discover(&self, scope: &DiscoveryScope) -> Discovery;
        }
    }

    mock! {
        ConfigurationSource {}

        impl ConfigurationSource for ConfigurationSource {
            fn load(&self, identifier: &str) -> Result<ConfigurationStore, ConfigurationSourceError>;
        }
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[derive(Default)]
    struct TestApplication {
        owner_name: String,
    }

    fn constructor() -> ManagedInstance {
        Box::new(TestApplication::default())
    }

    fn owner_name(instance: &mut dyn Any, value: TypedValue) -> Result<(), TypedValue> {
        match instance.downcast_mut::<TestApplication>() {
            Some(target) => {
                target.owner_name = String::from_typed(value)?;
                Ok(())
            }
            None => Err(value),
        }
    }

    fn execute(instance: &mut dyn Any, _context: &ApplicationContext) -> Result<(), InvocationError> {
        let target = instance
            .downcast_mut::<TestApplication>()
            .ok_or_else(|| InvocationError::IncompatibleInstance("TestApplication".to_string()))?;

        if target.owner_name.is_empty() {
            Err(InvocationError::Failed(convert_error(Error::new(
                ErrorKind::InvalidData,
                "missing owner",
            ))))
        } else {
            Ok(())
        }
    }

    fn create_definition(with_execute: bool) -> TypeDefinition {
        TypeDefinition {
            type_id: TypeId::of::<TestApplication>(),
            type_name: "TestApplication",
            module_path: "app::demo",
            roles: vec![Role::Application, Role::ConfigSource],
            config_file: Some("config/demo.properties"),
            fields: vec![FieldDefinition {
                field_name: "owner_name",
                marker: ApplicationPropertyMarker::new("demo.nameOfOwner", PrimitiveKind::String),
                accessor: owner_name,
            }],
            lifecycle_methods: if with_execute {
                vec![LifecycleMethodDefinition {
                    phase: LifecyclePhase::Execute,
                    method_name: "execute",
                    invoker: execute,
                }]
            } else {
                vec![]
            },
            constructor,
        }
    }

    fn create_registry(candidates: Vec<TypeDefinition>) -> MockTypeRegistry {
        let mut type_registry = MockTypeRegistry::new();
        type_registry
            .expect_discover()
            .times(1)
            .returning(move |_| Discovery {
                candidates: candidates.clone(),
                errors: vec![],
            });

        type_registry
    }

    fn create_config(config_file: Option<&str>) -> ApplicationConfig {
        let mut config = ApplicationConfig::default();
        config.install_tracing_logger = false;
        config.config_file = config_file.map(str::to_string);
        config
    }

    #[test]
    fn should_report_missing_application() {
        let mut configuration_source = MockConfigurationSource::new();
        configuration_source.expect_load().never();

        let application = Application::new(
            create_registry(vec![]),
            configuration_source,
            create_config(None),
        );

        let report = application.run();
        assert!(matches!(report, RunReport::NoApplication));
        assert!(!report.is_success());
        assert!(report.lifecycle().is_none());
    }

    #[test]
    fn should_run_application() {
        let mut configuration_source = MockConfigurationSource::new();
        configuration_source
            .expect_load()
            .with(eq("config/demo.properties"))
            .times(1)
            .returning(|_| Ok([("demo.nameOfOwner", "Ada")].into_iter().collect()));

        let application = Application::new(
            create_registry(vec![create_definition(true)]),
            configuration_source,
            create_config(None),
        );

        let report = application.run();
        assert!(report.is_success());

        match report {
            RunReport::Completed {
                application,
                configuration_entries,
                lifecycle,
            } => {
                assert_eq!(application, "TestApplication");
                assert_eq!(configuration_entries, 1);
                assert_eq!(lifecycle.completed_phases(), vec![LifecyclePhase::Execute]);
            }
            RunReport::NoApplication => panic!("application not found"),
        }
    }

    #[test]
    fn should_override_config_file() {
        let mut configuration_source = MockConfigurationSource::new();
        configuration_source
            .expect_load()
            .with(eq("config/other.properties"))
            .times(1)
            .returning(|identifier| {
                Err(ConfigurationSourceError::Io {
                    identifier: identifier.to_string(),
                    error: ErrorKind::NotFound.into(),
                })
            });

        let application = Application::new(
            create_registry(vec![create_definition(true)]),
            configuration_source,
            create_config(Some("config/other.properties")),
        );

        // without configuration the owner stays empty and execution fails
        let report = application.run();
        assert!(!report.is_success());
        assert!(matches!(
            report.lifecycle().and_then(|lifecycle| lifecycle.outcome(LifecyclePhase::Execute)),
            Some(PhaseOutcome::Failed(_))
        ));
    }

    #[test]
    fn should_skip_loading_without_declared_config_file() {
        let mut configuration_source = MockConfigurationSource::new();
        configuration_source.expect_load().never();

        let mut definition = create_definition(true);
        definition.config_file = None;
        definition.roles.retain(|role| *role != Role::ConfigSource);

        let application = Application::new(
            create_registry(vec![definition]),
            configuration_source,
            create_config(None),
        );

        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(Level::DEBUG)
            .with_writer(logs.clone())
            .finish();
        let report = tracing::subscriber::with_default(subscriber, || application.run());

        match report {
            RunReport::Completed {
                configuration_entries,
                ..
            } => assert_eq!(configuration_entries, 0),
            RunReport::NoApplication => panic!("application not found"),
        }

        let logs = logs.contents();
        assert!(logs.contains("No configuration resource declared."));
        assert!(!logs.contains("No properties found"));
    }

    #[test]
    fn should_warn_about_empty_declared_config_file() {
        let mut configuration_source = MockConfigurationSource::new();
        configuration_source
            .expect_load()
            .times(1)
            .returning(|_| Ok(ConfigurationStore::default()));

        let application = Application::new(
            create_registry(vec![create_definition(true)]),
            configuration_source,
            create_config(None),
        );

        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(logs.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || application.run());

        assert!(logs.contents().contains("No properties found"));
    }

    #[test]
    fn should_report_missing_execute() {
        let mut configuration_source = MockConfigurationSource::new();
        configuration_source
            .expect_load()
            .times(1)
            .returning(|_| Ok(ConfigurationStore::default()));

        let application = Application::new(
            create_registry(vec![create_definition(false)]),
            configuration_source,
            create_config(None),
        );

        let report = application.run();
        assert!(!report.is_success());
        assert_eq!(
            report.lifecycle().map(|lifecycle| lifecycle.missing_phases()),
            Some(vec![LifecyclePhase::Execute])
        );
    }
}
