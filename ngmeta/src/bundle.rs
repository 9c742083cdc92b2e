//! Bundling of `@NgModule` trees into host registrations.
//!
//! Modules are walked depth-first: imports first, then providers, then declarations. Declared
//! directives and components also contribute their own `providers` and `view_providers`. Every
//! class is provided at most once under its own name and once per alias, no matter how many
//! modules mention it.

use derive_more::Constructor;
use fxhash::FxHashSet;
#[cfg(test)]
use mockall::automock;
use ngmeta_core::binding::changes::ChangesQueue;
use ngmeta_core::directive::DirectiveDefinition;
use ngmeta_core::instance::InstancePtr;
use ngmeta_core::metadata::{Annotation, NgModuleMetadata};
use ngmeta_core::pipe::PipeFilter;
use ngmeta_core::provider::{
    FactoryProvider, Provided, ProvidedValue, ProviderEntry, ProviderOptions, ProviderResolver,
    ServiceProvider,
};
use ngmeta_core::reflection::Reflector;
use ngmeta_core::types::Type;
use thiserror::Error;
use tracing::{debug, info};

/// Method of an undecorated class whose parameters are injected when run as a config function.
pub const CONFIG_METHOD: &str = "config";

#[derive(Clone, Error, Debug)]
pub enum BundleError {
    #[error("Class '{0}' is not decorated with @NgModule")]
    NotAnNgModule(String),
    #[error("Error providing module units: {0}")]
    Provider(#[from] ngmeta_core::Error),
}

/// A single registration to be made in the host module.
#[derive(Clone, Debug)]
pub enum Registration {
    Value {
        name: String,
        value: InstancePtr,
    },
    Factory {
        name: String,
        provider: FactoryProvider,
    },
    Service {
        name: String,
        provider: ServiceProvider,
    },
    Directive {
        name: String,
        definition: DirectiveDefinition,
    },
    Filter {
        name: String,
        filter: PipeFilter,
    },
    Config {
        class: Type,
        inject: Vec<Option<String>>,
    },
}

impl Registration {
    fn from_provided(reflector: &Reflector, provided: Provided) -> Self {
        match provided {
            Provided::Named { name, value } => match value {
                ProvidedValue::Value(value) => Registration::Value { name, value },
                ProvidedValue::Factory(provider) => Registration::Factory { name, provider },
                ProvidedValue::Service(provider) => Registration::Service { name, provider },
                ProvidedValue::Filter(filter) => Registration::Filter { name, filter },
                ProvidedValue::Directive(definition) => {
                    Registration::Directive { name, definition }
                }
            },
            Provided::Config(class) => Registration::Config {
                inject: reflector
                    .method_dependencies(&class, CONFIG_METHOD)
                    .unwrap_or_default(),
                class,
            },
        }
    }

    /// Registered name. Config functions have none.
    pub fn name(&self) -> Option<&str> {
        match self {
            Registration::Value { name, .. }
            | Registration::Factory { name, .. }
            | Registration::Service { name, .. }
            | Registration::Directive { name, .. }
            | Registration::Filter { name, .. } => Some(name),
            Registration::Config { .. } => None,
        }
    }
}

/// Registration surface of a host module.
#[cfg_attr(test, automock)]
pub trait HostModule {
    fn value(&self, name: &str, value: InstancePtr);

    fn factory(&self, name: &str, provider: FactoryProvider);

    fn service(&self, name: &str, provider: ServiceProvider);

    fn directive(&self, name: &str, definition: DirectiveDefinition);

    fn filter(&self, name: &str, filter: PipeFilter);

    fn config(&self, class: Type, inject: Vec<Option<String>>);
}

/// Ordered registrations of a module tree.
#[derive(Clone, Debug, Constructor)]
pub struct ModuleBundle {
    name: String,
    registrations: Vec<Registration>,
}

impl ModuleBundle {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    pub fn find(&self, name: &str) -> Option<&Registration> {
        self.registrations
            .iter()
            .find(|registration| registration.name() == Some(name))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Forwards all registrations, in order, to the host module.
    pub fn register_into(&self, host: &dyn HostModule) {
        for registration in &self.registrations {
            match registration {
                Registration::Value { name, value } => host.value(name, value.clone()),
                Registration::Factory { name, provider } => host.factory(name, provider.clone()),
                Registration::Service { name, provider } => host.service(name, provider.clone()),
                Registration::Directive { name, definition } => {
                    host.directive(name, definition.clone())
                }
                Registration::Filter { name, filter } => host.filter(name, filter.clone()),
                Registration::Config { class, inject } => host.config(*class, inject.clone()),
            }
        }

        info!(
            module = %self.name,
            registrations = self.registrations.len(),
            "Registered module."
        );
    }
}

/// Walks the module tree starting at `root` and resolves every unit it contains. Additional
/// providers are resolved after the tree.
pub fn bundle(
    reflector: &Reflector,
    changes: ChangesQueue,
    module_name: &str,
    root: Type,
    other_providers: &[ProviderEntry],
) -> Result<ModuleBundle, BundleError> {
    let mut bundler = Bundler {
        reflector,
        resolver: ProviderResolver::new(reflector, changes),
        visited: Default::default(),
        aliases: Default::default(),
        expanded: Default::default(),
        registrations: vec![],
    };

    bundler.visit_module(root)?;
    for provider in other_providers {
        bundler.provide(provider)?;
    }

    debug!(
        module = module_name,
        root = root.name(),
        registrations = bundler.registrations.len(),
        "Bundled module tree."
    );

    Ok(ModuleBundle::new(
        module_name.to_string(),
        bundler.registrations,
    ))
}

struct Bundler<'a> {
    reflector: &'a Reflector,
    resolver: ProviderResolver<'a>,
    visited: FxHashSet<Type>,
    /// `useClass` targets already registered under an alias name.
    aliases: FxHashSet<(String, Type)>,
    /// Classes whose directive providers were already bundled.
    expanded: FxHashSet<Type>,
    registrations: Vec<Registration>,
}

impl<'a> Bundler<'a> {
    fn visit_module(&mut self, module: Type) -> Result<(), BundleError> {
        if !self.visited.insert(module) {
            return Ok(());
        }

        let reflector = self.reflector;
        let metadata = ng_module_metadata(reflector, &module)
            .ok_or_else(|| BundleError::NotAnNgModule(module.name().to_string()))?;

        debug!(module = module.name(), "Visiting module.");

        for import in &metadata.imports {
            let import = import
                .as_type()
                .ok_or_else(|| ngmeta_core::Error::NotAType(import.to_string()))?;
            self.visit_module(import)?;
        }

        for provider in &metadata.providers {
            self.provide(provider)?;
        }

        for declaration in &metadata.declarations {
            self.provide(&ProviderEntry::Token(declaration.clone()))?;
        }

        Ok(())
    }

    fn provide(&mut self, entry: &ProviderEntry) -> Result<(), BundleError> {
        let target = match entry {
            ProviderEntry::Token(token) => token.as_type().map(|class| (class, None)),
            ProviderEntry::Literal {
                token,
                options: ProviderOptions::Class(class),
            } => Some(match token.as_type() {
                Some(own) => (own, None),
                None => (*class, Some(self.resolver.get_injectable_name(token)?)),
            }),
            ProviderEntry::Literal { .. } => None,
        };

        if let Some((class, alias)) = &target {
            let first = match alias {
                Some(alias) => self.aliases.insert((alias.clone(), *class)),
                None => self.visited.insert(*class),
            };

            if !first {
                debug!(class = class.name(), alias = ?alias, "Skipping already bundled class.");
                return Ok(());
            }
        }

        let provided = self.resolver.provide_entry(entry)?;
        self.registrations
            .push(Registration::from_provided(self.reflector, provided));

        if let Some((class, _)) = target {
            if self.expanded.insert(class) {
                let reflector = self.reflector;
                for nested in directive_providers(reflector, &class) {
                    self.provide(nested)?;
                }
            }
        }

        Ok(())
    }
}

fn ng_module_metadata<'r>(reflector: &'r Reflector, class: &Type) -> Option<&'r NgModuleMetadata> {
    reflector
        .annotations(class)
        .iter()
        .find_map(|annotation| match annotation {
            Annotation::NgModule(metadata) => Some(metadata),
            _ => None,
        })
}

fn directive_providers<'r>(reflector: &'r Reflector, class: &Type) -> Vec<&'r ProviderEntry> {
    reflector
        .annotations(class)
        .iter()
        .flat_map(|annotation| match annotation {
            Annotation::Component(metadata) => metadata
                .directive
                .providers
                .iter()
                .chain(&metadata.view_providers)
                .collect(),
            Annotation::Directive(metadata) => metadata.providers.iter().collect(),
            _ => vec![],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::bundle::{bundle, BundleError, MockHostModule, Registration};
    use ngmeta_core::binding::changes::ChangesQueue;
    use ngmeta_core::decorators::{component, inject, injectable, ng_module, pipe, ParamTarget};
    use ngmeta_core::instance::InstancePtr;
    use ngmeta_core::metadata::{
        ComponentMetadata, DirectiveMetadata, NgModuleMetadata, PipeMetadata,
    };
    use ngmeta_core::provider::{ProviderEntry, ProviderOptions};
    use ngmeta_core::reflection::Reflector;
    use ngmeta_core::testing::TestController;
    use ngmeta_core::types::Type;
    use std::rc::Rc;

    struct AppModule;
    struct AliasModule;
    struct SharedModule;
    struct Logger;
    struct Upper;
    struct Configure;

    fn greeter() -> Type {
        Type::controller::<TestController>()
    }

    fn decorate() -> Reflector {
        let mut reflector = Reflector::new();
        let logger = Type::of::<Logger>();
        let configure = Type::of::<Configure>();

        injectable(Some("logger")).apply(&mut reflector, logger);
        pipe(PipeMetadata::new("upper")).apply(&mut reflector, Type::of::<Upper>());
        inject(logger).apply(
            &mut reflector,
            ParamTarget::Method {
                class: configure,
                method: "config",
            },
            0,
        );
        component(ComponentMetadata {
            directive: DirectiveMetadata {
                selector: "greeter".to_string(),
                providers: vec![ProviderEntry::Literal {
                    token: "greeting".into(),
                    options: ProviderOptions::Value(Rc::new("Hello") as InstancePtr),
                }],
                ..Default::default()
            },
            template: Some("{{ $ctrl.greeting }}".to_string()),
            ..Default::default()
        })
        .apply(&mut reflector, greeter());

        ng_module(NgModuleMetadata {
            providers: vec![logger.into()],
            ..Default::default()
        })
        .apply(&mut reflector, Type::of::<SharedModule>());
        ng_module(NgModuleMetadata {
            imports: vec![Type::of::<SharedModule>().into()],
            providers: vec![
                configure.into(),
                logger.into(),
                ProviderEntry::Literal {
                    token: "apiUrl".into(),
                    options: ProviderOptions::Value(Rc::new("/api") as InstancePtr),
                },
            ],
            declarations: vec![greeter().into(), Type::of::<Upper>().into()],
        })
        .apply(&mut reflector, Type::of::<AppModule>());

        reflector
    }

    #[test]
    fn should_bundle_module_tree_in_order() {
        let reflector = decorate();

        let bundle = bundle(
            &reflector,
            ChangesQueue::default(),
            "app",
            Type::of::<AppModule>(),
            &[Type::of::<Logger>().into()],
        )
        .unwrap();

        let names = bundle
            .registrations()
            .iter()
            .map(Registration::name)
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            [
                Some("logger"),
                None,
                Some("apiUrl"),
                Some("greeter"),
                Some("greeting"),
                Some("upper"),
            ]
        );
        assert!(matches!(
            bundle.registrations()[1],
            Registration::Config { ref inject, .. } if inject == &[Some("logger".to_string())]
        ));
    }

    #[test]
    fn should_bundle_class_providers_once() {
        let mut reflector = decorate();
        let logger = Type::of::<Logger>();
        let log_alias = || ProviderEntry::Literal {
            token: "$log".into(),
            options: ProviderOptions::Class(logger),
        };
        ng_module(NgModuleMetadata {
            providers: vec![
                ProviderEntry::Literal {
                    token: logger.into(),
                    options: ProviderOptions::Class(Type::of::<Upper>()),
                },
                logger.into(),
                log_alias(),
                log_alias(),
                ProviderEntry::Literal {
                    token: "welcome".into(),
                    options: ProviderOptions::Class(greeter()),
                },
            ],
            declarations: vec![greeter().into()],
            ..Default::default()
        })
        .apply(&mut reflector, Type::of::<AliasModule>());

        let bundle = bundle(
            &reflector,
            ChangesQueue::default(),
            "aliases",
            Type::of::<AliasModule>(),
            &[],
        )
        .unwrap();

        let names = bundle
            .registrations()
            .iter()
            .map(Registration::name)
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            [
                Some("logger"),
                Some("$log"),
                Some("welcome"),
                Some("greeting"),
                Some("greeter"),
            ]
        );
    }

    #[test]
    fn should_forward_registrations_to_host() {
        let reflector = decorate();
        let bundle = bundle(
            &reflector,
            ChangesQueue::default(),
            "app",
            Type::of::<AppModule>(),
            &[],
        )
        .unwrap();

        let mut host = MockHostModule::new();
        host.expect_service()
            .withf(|name, provider| name == "logger" && provider.inject.is_empty())
            .times(1)
            .return_const(());
        host.expect_config()
            .withf(|class, _| *class == Type::of::<Configure>())
            .times(1)
            .return_const(());
        host.expect_value().times(2).return_const(());
        host.expect_directive()
            .withf(|name, definition| name == "greeter" && definition.isolate_scope)
            .times(1)
            .return_const(());
        host.expect_filter()
            .withf(|name, filter| name == "upper" && !filter.stateful)
            .times(1)
            .return_const(());
        host.expect_factory().never();

        bundle.register_into(&host);
    }

    #[test]
    fn should_reject_non_module_root() {
        let reflector = decorate();

        assert!(matches!(
            bundle(
                &reflector,
                ChangesQueue::default(),
                "app",
                Type::of::<Logger>(),
                &[]
            )
            .err(),
            Some(BundleError::NotAnNgModule(name)) if name == "Logger"
        ));
    }

    #[test]
    fn should_propagate_provider_errors() {
        let mut reflector = decorate();
        ng_module(NgModuleMetadata {
            declarations: vec![Type::of::<SharedModule>().into()],
            ..Default::default()
        })
        .apply(&mut reflector, Type::of::<Configure>());

        assert!(matches!(
            bundle(
                &reflector,
                ChangesQueue::default(),
                "app",
                Type::of::<Configure>(),
                &[]
            )
            .err(),
            Some(BundleError::Provider(ngmeta_core::Error::NgModuleNotProvidable(_)))
        ));
    }
}
