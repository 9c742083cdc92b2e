//! Decorator metadata for component-style classes, translated into registrations of a legacy
//! directive runtime.
//!
//! Classes get annotated through [decorators] which store metadata in the explicit side-tables of
//! a [reflection::Reflector]. Consumers then turn decorated classes into host registrations:
//!
//! * [provider::ProviderResolver] resolves a class or a provider literal into a named service,
//!   factory, value, filter or directive definition
//! * [directive::DirectiveProvider] builds directive definition objects, whose controller factory
//!   and link functions wire [binding]s, host listeners, queries and lifecycle hooks
//! * [pipe::PipeProvider] turns pipes into filters
//!
//! The host itself is consumed through the [scope::Scope], [element::Element],
//! [element::Attributes] and [instance::Injector] contracts.
//!
//! ### Features
//!
//! * `testing` - in-memory implementations of the host contracts, for use in tests

pub mod binding;
pub mod controller;
pub mod decorators;
pub mod directive;
pub mod element;
mod error;
pub mod instance;
pub mod key_registry;
pub mod metadata;
pub mod pipe;
pub mod provider;
pub mod reflection;
pub mod scope;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod token;
pub mod types;

pub use error::{DependencyError, Error};
