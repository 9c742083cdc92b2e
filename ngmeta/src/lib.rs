//! Bootstrapping of [ngmeta_core] decorated classes.
//!
//! Decorated classes are organized into `@NgModule` trees. A [bundle](bundle::bundle) walks such
//! a tree, resolves every declaration and provider, and produces an ordered list of registrations,
//! which can then be forwarded to any [HostModule](bundle::HostModule). The
//! [Application](application::Application) is the usual entrypoint: it loads
//! [configuration](config::BootstrapConfig), installs a default logger and runs the whole process.
//!
//! ```
//! use ngmeta::application::Application;
//! use ngmeta::config::BootstrapConfig;
//! use ngmeta_core::reflection::Reflector;
//!
//! let reflector = Reflector::new();
//! let config = BootstrapConfig::default().with_module_name("admin");
//! let application = Application::new(&reflector, config);
//!
//! assert_eq!(application.config().module_name, "admin");
//! ```

pub mod application;
pub mod bundle;
pub mod config;
