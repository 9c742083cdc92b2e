//! Resolution of tokens, provider literals and decorated classes into the `(name, value)` pairs
//! registered with the host container.
//!
//! ## Resolution rules
//!
//! * a factory provider resolves its token name and the injection list of its dependencies
//! * a value provider resolves only its token name
//! * anything else must be a class: undecorated classes are config functions, decorated ones are
//!   dispatched on their role decorator (`@Pipe`, `@Directive`/`@Component` or `@Injectable`)

use crate::binding::changes::ChangesQueue;
use crate::directive::selector::directive_name_from_selector;
use crate::directive::{DirectiveDefinition, DirectiveProvider};
use crate::error::Error;
use crate::instance::{Dependencies, ErrorPtr, Injector, InstancePtr};
use crate::metadata::{describe, Annotation, InjectMetadata, InjectableMetadata, MetadataKind};
use crate::pipe::{PipeFilter, PipeProvider};
use crate::reflection::Reflector;
use crate::token::{resolve_forward_ref, ProviderToken};
use crate::types::{Constructor, Type};
use derivative::Derivative;
use std::rc::Rc;
use tracing::debug;

/// User factory invoked by the host container with resolved dependencies.
pub type FactoryFn = Rc<dyn Fn(&Dependencies) -> Result<InstancePtr, ErrorPtr>>;

/// How a token should be provided, when it's not a decorated class itself.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub enum ProviderOptions {
    Value(#[derivative(Debug = "ignore")] InstancePtr),
    Factory {
        #[derivative(Debug = "ignore")]
        factory: FactoryFn,
        deps: Vec<ProviderToken>,
    },
    Class(Type),
}

/// Entry of a `providers` list.
#[derive(Clone, Debug)]
pub enum ProviderEntry {
    /// A decorated class or a forward reference to one.
    Token(ProviderToken),
    /// A provider literal binding a token to a value, factory or class.
    Literal {
        token: ProviderToken,
        options: ProviderOptions,
    },
}

impl From<Type> for ProviderEntry {
    fn from(value: Type) -> Self {
        ProviderEntry::Token(value.into())
    }
}

impl From<ProviderToken> for ProviderEntry {
    fn from(value: ProviderToken) -> Self {
        ProviderEntry::Token(value)
    }
}

#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct FactoryProvider {
    #[derivative(Debug = "ignore")]
    pub factory: FactoryFn,
    pub inject: Vec<Option<String>>,
}

impl FactoryProvider {
    /// Calls the factory with dependencies from the injector.
    pub fn invoke(&self, injector: &dyn Injector) -> Result<InstancePtr, Error> {
        let dependencies = Dependencies::resolve(injector, &self.inject)?;
        Ok((self.factory)(&dependencies)?)
    }
}

#[derive(Clone, Debug)]
pub struct ServiceProvider {
    pub class: Type,
    pub inject: Vec<Option<String>>,
}

impl ServiceProvider {
    /// Constructs the service with dependencies from the injector.
    pub fn instantiate(&self, injector: &dyn Injector) -> Result<InstancePtr, Error> {
        let construct = match self.class.constructor() {
            Some(Constructor::Service(construct)) => construct,
            _ => return Err(Error::MissingConstructor(self.class.name().to_string())),
        };

        let dependencies = Dependencies::resolve(injector, &self.inject)?;
        Ok(construct(&dependencies)?)
    }
}

/// What gets registered under a name.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub enum ProvidedValue {
    Value(#[derivative(Debug = "ignore")] InstancePtr),
    Factory(FactoryProvider),
    Service(ServiceProvider),
    Filter(PipeFilter),
    Directive(DirectiveDefinition),
}

/// Result of [ProviderResolver::provide].
#[derive(Clone, Debug)]
pub enum Provided {
    /// Register the value under the given name.
    Named { name: String, value: ProvidedValue },
    /// An undecorated class - register it through the container's raw config path.
    Config(Type),
}

impl Provided {
    pub fn name(&self) -> Option<&str> {
        match self {
            Provided::Named { name, .. } => Some(name),
            Provided::Config(_) => None,
        }
    }
}

/// Resolves providers against the metadata stored in a [Reflector].
pub struct ProviderResolver<'a> {
    reflector: &'a Reflector,
    changes: ChangesQueue,
}

impl<'a> ProviderResolver<'a> {
    pub fn new(reflector: &'a Reflector, changes: ChangesQueue) -> Self {
        Self { reflector, changes }
    }

    /// Resolves an entry of a `providers` list.
    pub fn provide_entry(&self, entry: &ProviderEntry) -> Result<Provided, Error> {
        match entry {
            ProviderEntry::Token(token) => self.provide(token.clone(), None),
            ProviderEntry::Literal { token, options } => {
                self.provide(token.clone(), Some(options.clone()))
            }
        }
    }

    /// Produces the registration for a token.
    pub fn provide<T: Into<ProviderToken>>(
        &self,
        token: T,
        options: Option<ProviderOptions>,
    ) -> Result<Provided, Error> {
        let token = token.into().resolved();

        match options {
            Some(ProviderOptions::Factory { factory, deps }) => {
                let name = get_injectable_name(self.reflector, &token)?;
                let inject = deps
                    .iter()
                    .map(|dependency| get_injectable_name(self.reflector, dependency).map(Some))
                    .collect::<Result<Vec<_>, _>>()?;

                debug!(%name, "Providing factory.");

                Ok(Provided::Named {
                    name,
                    value: ProvidedValue::Factory(FactoryProvider { factory, inject }),
                })
            }
            Some(ProviderOptions::Value(value)) => {
                let name = get_injectable_name(self.reflector, &token)?;

                debug!(%name, "Providing value.");

                Ok(Provided::Named {
                    name,
                    value: ProvidedValue::Value(value),
                })
            }
            Some(ProviderOptions::Class(class)) => match token.as_type() {
                // only string and opaque aliases follow useClass
                Some(own) => self.provide_class(own),
                None => match self.provide_class(class)? {
                    Provided::Named { value, .. } => Ok(Provided::Named {
                        name: get_injectable_name(self.reflector, &token)?,
                        value,
                    }),
                    provided @ Provided::Config(_) => Ok(provided),
                },
            },
            None => {
                let class = token
                    .as_type()
                    .ok_or_else(|| Error::NotAType(token.to_string()))?;
                self.provide_class(class)
            }
        }
    }

    fn provide_class(&self, class: Type) -> Result<Provided, Error> {
        let annotations = self.reflector.annotations(&class);
        if annotations.is_empty() {
            debug!(class = class.name(), "Providing config function.");
            return Ok(Provided::Config(class));
        }

        let primary = primary_annotation(&class, annotations)?;
        let inject = dependencies_for(self.reflector, &class)?;

        match primary {
            Annotation::Pipe(_) => {
                let (name, filter) =
                    PipeProvider::new(self.reflector).create_from_type(&class)?;

                debug!(%name, class = class.name(), "Providing pipe.");

                Ok(Provided::Named {
                    name,
                    value: ProvidedValue::Filter(filter),
                })
            }
            Annotation::Directive(_) | Annotation::Component(_) => {
                let (name, definition) =
                    DirectiveProvider::new(self.reflector, self.changes.clone())
                        .create_from_type(&class)?;

                debug!(%name, class = class.name(), "Providing directive.");

                Ok(Provided::Named {
                    name,
                    value: ProvidedValue::Directive(definition),
                })
            }
            Annotation::Injectable(InjectableMetadata { id: Some(id) }) => {
                debug!(name = %id, class = class.name(), "Providing service.");

                Ok(Provided::Named {
                    name: id.clone(),
                    value: ProvidedValue::Service(ServiceProvider { class, inject }),
                })
            }
            Annotation::NgModule(_) => Err(Error::NgModuleNotProvidable(class.name().to_string())),
            _ => Err(Error::UndecoratedClass(class.name().to_string())),
        }
    }

    #[inline]
    pub fn get_injectable_name(&self, token: &ProviderToken) -> Result<String, Error> {
        get_injectable_name(self.reflector, token)
    }

    #[inline]
    pub fn dependencies_for(&self, class: &Type) -> Result<Vec<Option<String>>, Error> {
        dependencies_for(self.reflector, class)
    }
}

/// Picks the role annotation, validating allowed combinations.
pub(crate) fn primary_annotation<'a>(
    class: &Type,
    annotations: &'a [Annotation],
) -> Result<&'a Annotation, Error> {
    if let [single] = annotations {
        return Ok(single);
    }

    // a component may carry exactly one routing annotation besides
    match annotations {
        [first, second] => match (first.kind(), second.kind()) {
            (MetadataKind::Component, MetadataKind::RouteConfig) => Ok(first),
            (MetadataKind::RouteConfig, MetadataKind::Component) => Ok(second),
            _ => Err(multiple_decorators(class, annotations)),
        },
        _ => Err(multiple_decorators(class, annotations)),
    }
}

fn multiple_decorators(class: &Type, annotations: &[Annotation]) -> Error {
    Error::MultipleDecorators {
        class: class.name().to_string(),
        decorators: describe(annotations),
    }
}

/// Resolves the string name a token is registered under.
pub fn get_injectable_name(reflector: &Reflector, token: &ProviderToken) -> Result<String, Error> {
    match token {
        ProviderToken::Name(name) => Ok(name.clone()),
        ProviderToken::Opaque(token) => Ok(token.desc().to_string()),
        ProviderToken::Type(class) => class_name(reflector, class),
        ProviderToken::Forward(reference) => class_name(reflector, &resolve_forward_ref(*reference)),
    }
}

fn class_name(reflector: &Reflector, class: &Type) -> Result<String, Error> {
    let annotation = reflector
        .annotations(class)
        .iter()
        .find(|annotation| annotation.kind().is_role())
        .ok_or_else(|| Error::UndecoratedClass(class.name().to_string()))?;

    match annotation {
        Annotation::Pipe(metadata) => Ok(metadata.name.clone()),
        Annotation::Directive(metadata) => Ok(directive_name_from_selector(&metadata.selector)),
        Annotation::Component(metadata) => {
            Ok(directive_name_from_selector(&metadata.directive.selector))
        }
        Annotation::Injectable(InjectableMetadata { id: Some(id) }) => Ok(id.clone()),
        Annotation::NgModule(_) => Err(Error::NgModuleNotProvidable(class.name().to_string())),
        _ => Err(Error::UndecoratedClass(class.name().to_string())),
    }
}

/// Injection list for a class constructor. Positions taken by required directives (parameters with
/// `@Host`, `@Self` or `@SkipSelf`) and parameters without `@Inject` hold `None`.
pub fn dependencies_for(reflector: &Reflector, class: &Type) -> Result<Vec<Option<String>>, Error> {
    let Some(params) = reflector.store().param_annotations(class) else {
        return Ok(vec![]);
    };

    params
        .iter()
        .enumerate()
        .map(|(index, annotations)| {
            let annotations = annotations
                .as_deref()
                .filter(|annotations| !annotations.is_empty())
                .ok_or_else(|| Error::HoleInConstructor {
                    class: class.name().to_string(),
                    index,
                })?;

            if annotations
                .iter()
                .any(|annotation| annotation.kind().is_locator())
            {
                return Ok(None);
            }

            extract_token(reflector, annotations)
        })
        .collect()
}

/// Resolves the `@Inject` token of a single parameter, if present.
pub fn extract_token(
    reflector: &Reflector,
    annotations: &[Annotation],
) -> Result<Option<String>, Error> {
    annotations
        .iter()
        .find_map(|annotation| match annotation {
            Annotation::Inject(InjectMetadata { token }) => Some(token),
            _ => None,
        })
        .map(|token| get_injectable_name(reflector, token))
        .transpose()
}
