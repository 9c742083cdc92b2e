use ngmeta_core::binding::changes::ChangesQueue;
use ngmeta_core::decorators::{inject, injectable, pipe};
use ngmeta_core::instance::{Dependencies, ErrorPtr, Injector, InstancePtr};
use ngmeta_core::metadata::PipeMetadata;
use ngmeta_core::pipe::Pipe;
use ngmeta_core::provider::{Provided, ProvidedValue, ProviderOptions, ProviderResolver};
use ngmeta_core::reflection::Reflector;
use ngmeta_core::token::OpaqueToken;
use ngmeta_core::types::{Service, Type};
use ngmeta_core::Error;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(thiserror::Error, Debug)]
#[error("No provider for {0}")]
struct NoProvider(String);

#[derive(Default)]
struct MapInjector(HashMap<String, InstancePtr>);

impl Injector for MapInjector {
    fn get(&self, name: &str) -> Result<InstancePtr, ErrorPtr> {
        self.0
            .get(name)
            .cloned()
            .ok_or_else(|| Rc::new(NoProvider(name.to_string())) as ErrorPtr)
    }

    fn has(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
}

struct Settings {
    prefix: String,
}

struct Greeter {
    settings: Rc<Settings>,
    audit: Option<Rc<Vec<String>>>,
}

impl Service for Greeter {
    fn create(dependencies: &Dependencies) -> Result<Self, ErrorPtr> {
        Ok(Self {
            settings: dependencies
                .get::<Settings>(0)
                .map_err(|error| Rc::new(error) as ErrorPtr)?,
            audit: dependencies
                .optional::<Vec<String>>(1)
                .map_err(|error| Rc::new(error) as ErrorPtr)?,
        })
    }
}

impl Greeter {
    fn greet(&self, name: &str) -> String {
        format!("{}, {name}", self.settings.prefix)
    }
}

struct Shout;

impl Pipe for Shout {
    fn create(_dependencies: &Dependencies) -> Result<Self, ErrorPtr> {
        Ok(Self)
    }

    fn transform(&self, value: &Value, _args: &[Value]) -> Value {
        json!(value.as_str().unwrap_or_default().to_uppercase())
    }
}

fn decorate() -> Reflector {
    let mut reflector = Reflector::new();
    let greeter = Type::service::<Greeter>();

    injectable(Some("greeter")).apply(&mut reflector, greeter);
    inject(OpaqueToken::new("settings")).apply(&mut reflector, greeter.into(), 0);
    inject("audit").apply(&mut reflector, greeter.into(), 1);
    pipe(PipeMetadata::new("shout")).apply(&mut reflector, Type::pipe::<Shout>());

    reflector
}

fn injector() -> MapInjector {
    let mut injector = MapInjector::default();
    injector.0.insert(
        "settings".to_string(),
        Rc::new(Settings {
            prefix: "Hello".to_string(),
        }),
    );
    injector
        .0
        .insert("audit".to_string(), Rc::new(vec!["boot".to_string()]));
    injector
}

#[test]
fn should_instantiate_provided_service() {
    let reflector = decorate();
    let resolver = ProviderResolver::new(&reflector, ChangesQueue::default());

    let Provided::Named {
        name,
        value: ProvidedValue::Service(provider),
    } = resolver.provide(Type::service::<Greeter>(), None).unwrap()
    else {
        panic!("expected a service");
    };

    assert_eq!(name, "greeter");
    assert_eq!(
        provider.inject,
        [Some("settings".to_string()), Some("audit".to_string())]
    );

    let instance = provider.instantiate(&injector()).unwrap();
    let greeter = instance.downcast::<Greeter>().ok().unwrap();
    assert_eq!(greeter.greet("world"), "Hello, world");
    assert_eq!(greeter.audit.as_ref().map(|audit| audit.len()), Some(1));
}

#[test]
fn should_report_missing_dependencies() {
    let reflector = decorate();
    let resolver = ProviderResolver::new(&reflector, ChangesQueue::default());

    let Provided::Named {
        value: ProvidedValue::Service(provider),
        ..
    } = resolver.provide(Type::service::<Greeter>(), None).unwrap()
    else {
        panic!("expected a service");
    };

    assert!(matches!(
        provider.instantiate(&MapInjector::default()).err(),
        Some(Error::Injection(_))
    ));
}

#[test]
fn should_invoke_factory_with_resolved_tokens() {
    let reflector = decorate();
    let resolver = ProviderResolver::new(&reflector, ChangesQueue::default());

    let Provided::Named {
        name,
        value: ProvidedValue::Factory(provider),
    } = resolver
        .provide(
            "welcome",
            Some(ProviderOptions::Factory {
                factory: Rc::new(|dependencies: &Dependencies| -> Result<InstancePtr, ErrorPtr> {
                    let settings = dependencies
                        .get::<Settings>(0)
                        .map_err(|error| Rc::new(error) as ErrorPtr)?;
                    Ok(Rc::new(format!("{}!", settings.prefix)) as InstancePtr)
                }),
                deps: vec![OpaqueToken::new("settings").into()],
            }),
        )
        .unwrap()
    else {
        panic!("expected a factory");
    };

    assert_eq!(name, "welcome");

    let welcome = provider.invoke(&injector()).unwrap();
    assert_eq!(
        welcome.downcast::<String>().ok().as_deref().map(String::as_str),
        Some("Hello!")
    );
}

#[test]
fn should_provide_pipes_as_filters() {
    let reflector = decorate();
    let resolver = ProviderResolver::new(&reflector, ChangesQueue::default());

    let Provided::Named {
        name,
        value: ProvidedValue::Filter(filter),
    } = resolver.provide(Type::pipe::<Shout>(), None).unwrap()
    else {
        panic!("expected a filter");
    };

    assert_eq!(name, "shout");
    assert!(!filter.stateful);

    let filter = filter.instantiate(&MapInjector::default()).unwrap();
    assert_eq!((filter.transform)(&json!("quiet"), &[]), json!("QUIET"));
}

#[test]
fn should_alias_classes_under_opaque_tokens() {
    let reflector = decorate();
    let resolver = ProviderResolver::new(&reflector, ChangesQueue::default());

    let provided = resolver
        .provide(
            OpaqueToken::new("politeGreeter"),
            Some(ProviderOptions::Class(Type::service::<Greeter>())),
        )
        .unwrap();

    assert_eq!(provided.name(), Some("politeGreeter"));
}
