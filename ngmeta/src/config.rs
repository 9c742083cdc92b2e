//! Bootstrap configuration. Created with opinionated default values, which can then be overwritten
//! by environment variables prefixed with `NGMETA_` or the `ngmeta.json` file.

use config::{Config, ConfigError, Environment, File};
use ngmeta_core::binding::changes::DEFAULT_ON_CHANGES_TTL;
use serde::Deserialize;

const CONFIG_ENV_PREFIX: &str = "NGMETA";

/// Name of the default config file.
pub const CONFIG_FILE: &str = "ngmeta.json";

/// Default name of the host module registrations are made into.
pub const DEFAULT_MODULE_NAME: &str = "app";

#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BootstrapConfig {
    /// Should a default tracing logger be installed when bootstrapping.
    pub install_tracing_logger: bool,
    /// Number of nested `on_changes` flushes before an infinite loop is reported.
    pub on_changes_ttl: usize,
    /// Name of the host module.
    pub module_name: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            install_tracing_logger: true,
            on_changes_ttl: DEFAULT_ON_CHANGES_TTL,
            module_name: DEFAULT_MODULE_NAME.to_string(),
        }
    }
}

impl From<OptionalBootstrapConfig> for BootstrapConfig {
    fn from(value: OptionalBootstrapConfig) -> Self {
        let default = Self::default();
        Self {
            install_tracing_logger: value
                .install_tracing_logger
                .unwrap_or(default.install_tracing_logger),
            on_changes_ttl: value
                .on_changes_ttl
                .filter(|ttl| *ttl > 0)
                .unwrap_or(default.on_changes_ttl),
            module_name: value.module_name.unwrap_or(default.module_name),
        }
    }
}

impl BootstrapConfig {
    /// Reads the optional config file and environment overrides.
    pub fn init_from_environment() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(CONFIG_ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(|config| config.try_deserialize::<OptionalBootstrapConfig>())
            .map(|config| config.into())
    }

    pub fn with_module_name<T: ToString>(mut self, module_name: T) -> Self {
        self.module_name = module_name.to_string();
        self
    }

    pub fn with_tracing_logger(mut self, install_tracing_logger: bool) -> Self {
        self.install_tracing_logger = install_tracing_logger;
        self
    }

    pub fn with_on_changes_ttl(mut self, on_changes_ttl: usize) -> Self {
        self.on_changes_ttl = on_changes_ttl;
        self
    }
}

#[derive(Deserialize)]
struct OptionalBootstrapConfig {
    install_tracing_logger: Option<bool>,
    on_changes_ttl: Option<usize>,
    module_name: Option<String>,
}
