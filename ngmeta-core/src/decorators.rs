//! Decorators are plain builder calls made right after defining a class: the first call builds the
//! metadata instance, [ClassDecorator::apply] / [ParamDecorator::apply] / [PropDecorator::apply]
//! attach it to the class in the [Reflector] side-tables.
//!
//! ```
//! use ngmeta_core::decorators::{component, inject, input};
//! use ngmeta_core::metadata::{ComponentMetadata, DirectiveMetadata};
//! use ngmeta_core::reflection::Reflector;
//! use ngmeta_core::types::Type;
//!
//! struct Greeter;
//!
//! let mut reflector = Reflector::new();
//! let greeter = Type::of::<Greeter>();
//!
//! component(ComponentMetadata {
//!     directive: DirectiveMetadata {
//!         selector: "greeter".to_string(),
//!         ..Default::default()
//!     },
//!     template: Some("Hello {{ $ctrl.name }}".to_string()),
//!     ..Default::default()
//! })
//! .apply(&mut reflector, greeter);
//! inject("$log").apply(&mut reflector, greeter.into(), 0);
//! input(None).apply(&mut reflector, greeter, "name");
//!
//! assert_eq!(reflector.annotations(&greeter).len(), 1);
//! ```
//!
//! Decorators never fail. All validation is deferred to resolution.

use crate::metadata::{
    Annotation, AttrMetadata, ComponentMetadata, DirectiveMetadata, HostBindingMetadata,
    HostListenerMetadata, InjectMetadata, InjectableMetadata, InputMetadata, NgModuleMetadata,
    OutputMetadata, PipeMetadata, QueryKind, QueryMetadata, QuerySelector, RouteConfigMetadata,
};
use crate::provider::get_injectable_name;
use crate::reflection::Reflector;
use crate::token::ProviderToken;
use crate::types::Type;
use derivative::Derivative;
use serde_json::Value;
use tracing::{debug, warn};

/// Where a parameter decorator is applied.
#[derive(Clone, Copy, Debug)]
pub enum ParamTarget {
    Constructor(Type),
    Method { class: Type, method: &'static str },
}

impl From<Type> for ParamTarget {
    fn from(value: Type) -> Self {
        ParamTarget::Constructor(value)
    }
}

/// Alternative attachment for parameters of ordinary methods.
pub type ParamOverride =
    fn(reflector: &mut Reflector, annotation: &Annotation, class: &Type, method: &str, index: usize);

/// Second stage of a class decorator.
#[derive(Clone, Debug)]
pub struct ClassDecorator {
    annotation: Annotation,
}

impl ClassDecorator {
    #[inline]
    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    /// Attaches the metadata to the target class and returns the class unchanged.
    pub fn apply(self, reflector: &mut Reflector, target: Type) -> Type {
        let annotation = match self.annotation {
            Annotation::Injectable(InjectableMetadata { id: None }) => {
                Annotation::Injectable(InjectableMetadata {
                    id: reflector.keys_mut().get(&target.into()).ok(),
                })
            }
            annotation => annotation,
        };

        debug!(class = target.name(), decorator = %annotation.kind(), "Decorating class.");

        reflector
            .store_mut()
            .class_annotations_mut(&target)
            .push(annotation);
        target
    }
}

/// Second stage of a parameter decorator.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct ParamDecorator {
    annotation: Annotation,
    #[derivative(Debug = "ignore")]
    override_fn: Option<ParamOverride>,
}

impl ParamDecorator {
    #[inline]
    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    /// Attaches the metadata to the parameter at `index`. Missing positions before it are padded
    /// with `None`, never compacted.
    pub fn apply(self, reflector: &mut Reflector, target: ParamTarget, index: usize) {
        match target {
            ParamTarget::Constructor(class) => {
                let params = reflector.store_mut().param_annotations_mut(&class);
                if params.len() <= index {
                    params.resize(index + 1, None);
                }

                params[index]
                    .get_or_insert_with(Vec::new)
                    .push(self.annotation);
            }
            ParamTarget::Method { class, method } => match self.override_fn {
                Some(override_fn) => override_fn(reflector, &self.annotation, &class, method, index),
                None => warn!(
                    class = class.name(),
                    method,
                    decorator = %self.annotation.kind(),
                    "Decorator has no effect on method parameters."
                ),
            },
        }
    }
}

/// Second stage of a property decorator.
#[derive(Clone, Debug)]
pub struct PropDecorator {
    annotation: Annotation,
}

impl PropDecorator {
    #[inline]
    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    /// Attaches the metadata to a property. The most recent decorator goes first.
    pub fn apply(self, reflector: &mut Reflector, target: Type, property: &str) {
        reflector
            .store_mut()
            .prop_annotations_mut(&target)
            .entry(property.to_string())
            .or_default()
            .insert(0, self.annotation);
    }
}

/// Turns a metadata constructor into a class decorator factory.
pub fn make_decorator<A, M, F>(metadata: F) -> impl Fn(A) -> ClassDecorator
where
    F: Fn(A) -> M,
    M: Into<Annotation>,
{
    move |args| ClassDecorator {
        annotation: metadata(args).into(),
    }
}

/// Turns a metadata constructor into a parameter decorator factory, with an optional alternative
/// path for method parameters.
pub fn make_param_decorator<A, M, F>(
    metadata: F,
    override_fn: Option<ParamOverride>,
) -> impl Fn(A) -> ParamDecorator
where
    F: Fn(A) -> M,
    M: Into<Annotation>,
{
    move |args| ParamDecorator {
        annotation: metadata(args).into(),
        override_fn,
    }
}

/// Turns a metadata constructor into a property decorator factory.
pub fn make_prop_decorator<A, M, F>(metadata: F) -> impl Fn(A) -> PropDecorator
where
    F: Fn(A) -> M,
    M: Into<Annotation>,
{
    move |args| PropDecorator {
        annotation: metadata(args).into(),
    }
}

fn inject_method_param(
    reflector: &mut Reflector,
    annotation: &Annotation,
    class: &Type,
    method: &str,
    index: usize,
) {
    let Annotation::Inject(InjectMetadata { token }) = annotation else {
        return;
    };

    let name = match get_injectable_name(reflector, token) {
        Ok(name) => Some(name),
        Err(error) => {
            warn!(class = class.name(), method, %error, "Cannot resolve method parameter token.");
            None
        }
    };

    let mut tokens = reflector
        .method_dependencies(class, method)
        .unwrap_or_default();
    if tokens.len() <= index {
        tokens.resize(index + 1, None);
    }

    tokens[index] = name;
    reflector
        .store_mut()
        .set_method_injections(class, method, tokens);
}

pub fn injectable(id: Option<&str>) -> ClassDecorator {
    make_decorator(|id: Option<&str>| InjectableMetadata {
        id: id.map(str::to_string),
    })(id)
}

pub fn directive(metadata: DirectiveMetadata) -> ClassDecorator {
    make_decorator(|metadata: DirectiveMetadata| metadata)(metadata)
}

pub fn component(metadata: ComponentMetadata) -> ClassDecorator {
    make_decorator(|metadata: ComponentMetadata| metadata)(metadata)
}

pub fn pipe(metadata: PipeMetadata) -> ClassDecorator {
    make_decorator(|metadata: PipeMetadata| metadata)(metadata)
}

pub fn ng_module(metadata: NgModuleMetadata) -> ClassDecorator {
    make_decorator(|metadata: NgModuleMetadata| metadata)(metadata)
}

pub fn route_config(routes: Vec<Value>) -> ClassDecorator {
    make_decorator(|routes: Vec<Value>| RouteConfigMetadata { routes })(routes)
}

pub fn inject<T: Into<ProviderToken>>(token: T) -> ParamDecorator {
    make_param_decorator(
        |token: ProviderToken| InjectMetadata { token },
        Some(inject_method_param),
    )(token.into())
}

pub fn optional() -> ParamDecorator {
    make_param_decorator(|_: ()| Annotation::Optional, None)(())
}

pub fn host() -> ParamDecorator {
    make_param_decorator(|_: ()| Annotation::Host, None)(())
}

pub fn self_() -> ParamDecorator {
    make_param_decorator(|_: ()| Annotation::SelfOnly, None)(())
}

pub fn skip_self() -> ParamDecorator {
    make_param_decorator(|_: ()| Annotation::SkipSelf, None)(())
}

pub fn input(binding_name: Option<&str>) -> PropDecorator {
    make_prop_decorator(|name: Option<&str>| InputMetadata {
        binding_name: name.map(str::to_string),
    })(binding_name)
}

pub fn output(binding_name: Option<&str>) -> PropDecorator {
    make_prop_decorator(|name: Option<&str>| OutputMetadata {
        binding_name: name.map(str::to_string),
    })(binding_name)
}

pub fn attr(binding_name: Option<&str>) -> PropDecorator {
    make_prop_decorator(|name: Option<&str>| AttrMetadata {
        binding_name: name.map(str::to_string),
    })(binding_name)
}

pub fn host_binding(host_property_name: Option<&str>) -> PropDecorator {
    make_prop_decorator(|name: Option<&str>| HostBindingMetadata {
        host_property_name: name.map(str::to_string),
    })(host_property_name)
}

pub fn host_listener(event_name: &str, args: &[&str]) -> PropDecorator {
    make_prop_decorator(|(event_name, args): (&str, &[&str])| HostListenerMetadata {
        event_name: event_name.to_string(),
        args: args.iter().map(|arg| arg.to_string()).collect(),
    })((event_name, args))
}

fn query(kind: QueryKind, selector: QuerySelector) -> PropDecorator {
    make_prop_decorator(|(kind, selector): (QueryKind, QuerySelector)| {
        QueryMetadata::new(kind, selector)
    })((kind, selector))
}

pub fn content_child<T: Into<QuerySelector>>(selector: T) -> PropDecorator {
    query(QueryKind::ContentChild, selector.into())
}

pub fn content_children<T: Into<QuerySelector>>(selector: T) -> PropDecorator {
    query(QueryKind::ContentChildren, selector.into())
}

pub fn view_child<T: Into<QuerySelector>>(selector: T) -> PropDecorator {
    query(QueryKind::ViewChild, selector.into())
}

pub fn view_children<T: Into<QuerySelector>>(selector: T) -> PropDecorator {
    query(QueryKind::ViewChildren, selector.into())
}

impl From<&str> for QuerySelector {
    fn from(value: &str) -> Self {
        QuerySelector::Selector(value.to_string())
    }
}

impl From<Type> for QuerySelector {
    fn from(value: Type) -> Self {
        QuerySelector::Type(value.into())
    }
}
