//! Framework configuration is represented by [ApplicationConfig], which is passed to the
//! [Application](crate::application::Application) when it gets created.
//!
//! By default, the config is created with opinionated default values, which can then be overwritten
//! by environment variables prefixed with `RUNLET_` or `runlet.json` file. Discovery scope can be
//! given as a comma-separated list, e.g. `RUNLET_SCOPE=app::demo,app::shared`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_ENV_PREFIX: &str = "RUNLET";

/// Name of the default config file.
pub const CONFIG_FILE: &str = "runlet.json";

/// Framework configuration.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct ApplicationConfig {
    /// Should a default tracing logger be installed in the scope of the application.
    pub install_tracing_logger: bool,
    /// Configuration resource to load instead of the one declared by the application type.
    pub config_file: Option<String>,
    /// Module namespaces searched for the application type. Empty means all registered types.
    pub scope: Vec<String>,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            install_tracing_logger: true,
            config_file: None,
            scope: vec![],
        }
    }
}

impl From<OptionalApplicationConfig> for ApplicationConfig {
    fn from(value: OptionalApplicationConfig) -> Self {
        let default = Self::default();
        Self {
            install_tracing_logger: value
                .install_tracing_logger
                .unwrap_or(default.install_tracing_logger),
            config_file: value
                .config_file
                .filter(|config_file| !config_file.trim().is_empty())
                .or(default.config_file),
            scope: value.scope.unwrap_or(default.scope),
        }
    }
}

impl ApplicationConfig {
    /// Reads the config from the default config file and the environment.
    pub fn init_from_environment() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("scope"),
            )
            .build()
            .and_then(|config| config.try_deserialize::<OptionalApplicationConfig>())
            .map(|config| config.into())
    }
}

#[derive(Deserialize)]
struct OptionalApplicationConfig {
    install_tracing_logger: Option<bool>,
    config_file: Option<String>,
    scope: Option<Vec<String>>,
}
