use ngmeta_core::binding::changes::ChangesQueue;
use ngmeta_core::decorators::{inject, injectable, pipe};
use ngmeta_core::instance::{Dependencies, ErrorPtr, Injector, InstancePtr};
use ngmeta_core::metadata::PipeMetadata;
use ngmeta_core::pipe::Pipe;
use ngmeta_core::provider::{Provided, ProvidedValue, ProviderResolver};
use ngmeta_core::reflection::Reflector;
use ngmeta_core::types::{Service, Type};
use serde_json::{json, Value};
use std::rc::Rc;

// a service which will be registered under an explicit name
struct Clock {
    offset: Rc<i64>,
}

impl Service for Clock {
    fn create(dependencies: &Dependencies) -> Result<Self, ErrorPtr> {
        Ok(Self {
            offset: dependencies
                .get::<i64>(0)
                .map_err(|error| Rc::new(error) as ErrorPtr)?,
        })
    }
}

// a pure pipe, which becomes a stateless filter
struct Hours;

impl Pipe for Hours {
    fn create(_dependencies: &Dependencies) -> Result<Self, ErrorPtr> {
        Ok(Self)
    }

    fn transform(&self, value: &Value, _args: &[Value]) -> Value {
        json!(value.as_i64().unwrap_or_default() / 3600)
    }
}

// the host container is consumed through a trait - in a real application, it's provided by the
// host runtime
struct OffsetInjector;

impl Injector for OffsetInjector {
    fn get(&self, _name: &str) -> Result<InstancePtr, ErrorPtr> {
        Ok(Rc::new(7200_i64))
    }

    fn has(&self, name: &str) -> bool {
        name == "offset"
    }
}

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    // decorators store metadata in a reflector, instead of ambient reflection
    let mut reflector = Reflector::new();
    let clock = Type::service::<Clock>();
    injectable(Some("clock")).apply(&mut reflector, clock);
    inject("offset").apply(&mut reflector, clock.into(), 0);
    pipe(PipeMetadata::new("hours")).apply(&mut reflector, Type::pipe::<Hours>());

    let resolver = ProviderResolver::new(&reflector, ChangesQueue::default());

    if let Provided::Named {
        name,
        value: ProvidedValue::Service(provider),
    } = resolver.provide(clock, None).expect("error providing Clock")
    {
        let instance = provider
            .instantiate(&OffsetInjector)
            .expect("error creating Clock");
        let clock = instance.downcast::<Clock>().ok().expect("not a Clock");

        // prints "clock: offset 7200"
        println!("{name}: offset {}", clock.offset);
    }

    if let Provided::Named {
        name,
        value: ProvidedValue::Filter(filter),
    } = resolver
        .provide(Type::pipe::<Hours>(), None)
        .expect("error providing Hours")
    {
        let filter = filter
            .instantiate(&OffsetInjector)
            .expect("error creating Hours");

        // prints "hours: 2"
        println!("{name}: {}", (filter.transform)(&json!(7200), &[]));
    }
}
