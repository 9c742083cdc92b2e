//! Core bootstrapping functionality.

use crate::bundle::{bundle, BundleError, HostModule, ModuleBundle, Registration};
use crate::config::BootstrapConfig;
use config::ConfigError;
use itertools::Itertools;
use ngmeta_core::binding::changes::ChangesQueue;
use ngmeta_core::provider::ProviderEntry;
use ngmeta_core::reflection::Reflector;
use ngmeta_core::types::Type;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Error loading bootstrap configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Error bundling root module: {0}")]
    Bundle(#[from] BundleError),
}

/// Main entrypoint. Bundles a root `@NgModule` and registers the result in a host module.
pub struct Application<'a> {
    reflector: &'a Reflector,
    changes: ChangesQueue,
    config: BootstrapConfig,
}

impl<'a> Application<'a> {
    /// Creates an application with a changes queue using the configured TTL.
    pub fn new(reflector: &'a Reflector, config: BootstrapConfig) -> Self {
        Self {
            reflector,
            changes: ChangesQueue::new(config.on_changes_ttl),
            config,
        }
    }

    /// Creates an application configured from the environment.
    pub fn from_environment(reflector: &'a Reflector) -> Result<Self, BootstrapError> {
        Ok(Self::new(
            reflector,
            BootstrapConfig::init_from_environment()?,
        ))
    }

    #[inline]
    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    #[inline]
    pub fn changes(&self) -> &ChangesQueue {
        &self.changes
    }

    /// Bundles `root` together with `other_providers` and forwards all registrations to `host`.
    pub fn bootstrap(
        &self,
        root: Type,
        other_providers: &[ProviderEntry],
        host: &dyn HostModule,
    ) -> Result<ModuleBundle, BootstrapError> {
        if self.config.install_tracing_logger {
            install_tracing_logger();
        }

        info!(
            module = %self.config.module_name,
            root = root.name(),
            "Bootstrapping application..."
        );

        let bundle = bundle(
            self.reflector,
            self.changes.clone(),
            &self.config.module_name,
            root,
            other_providers,
        )?;

        debug!(
            names = %bundle.registrations().iter().filter_map(Registration::name).join(", "),
            "Bundled registrations."
        );

        bundle.register_into(host);
        Ok(bundle)
    }
}

fn install_tracing_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        debug!("Global tracing subscriber already installed.");
    }
}
