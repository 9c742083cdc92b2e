//! Pipes registered as legacy filters.

use crate::error::Error;
use crate::instance::{Dependencies, ErrorPtr, Injector};
use crate::metadata::Annotation;
use crate::provider::dependencies_for;
use crate::reflection::Reflector;
use crate::types::{Constructor, Type};
use derivative::Derivative;
use serde_json::Value;
use std::rc::Rc;
use tracing::debug;

pub type PipePtr = Rc<dyn Pipe>;

pub trait Pipe: 'static {
    fn create(dependencies: &Dependencies) -> Result<Self, ErrorPtr>
    where
        Self: Sized;

    fn transform(&self, value: &Value, args: &[Value]) -> Value;
}

pub type FilterFn = Rc<dyn Fn(&Value, &[Value]) -> Value>;

/// Filter function handed to the host. Stateful filters are re-evaluated on every digest.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct Filter {
    #[derivative(Debug = "ignore")]
    pub transform: FilterFn,
    pub stateful: bool,
}

/// Registration of a pipe class, instantiated lazily by the host container.
#[derive(Clone, Debug)]
pub struct PipeFilter {
    pub class: Type,
    pub inject: Vec<Option<String>>,
    /// `true` for impure pipes.
    pub stateful: bool,
}

impl PipeFilter {
    /// Constructs the pipe with dependencies from the injector.
    pub fn instantiate(&self, injector: &dyn Injector) -> Result<Filter, Error> {
        let construct = match self.class.constructor() {
            Some(Constructor::Pipe(construct)) => construct,
            _ => return Err(Error::MissingConstructor(self.class.name().to_string())),
        };

        let dependencies = Dependencies::resolve(injector, &self.inject)?;
        let pipe = construct(&dependencies)?;

        Ok(Filter {
            transform: Rc::new(move |value, args| pipe.transform(value, args)),
            stateful: self.stateful,
        })
    }
}

pub struct PipeProvider<'a> {
    reflector: &'a Reflector,
}

impl<'a> PipeProvider<'a> {
    pub fn new(reflector: &'a Reflector) -> Self {
        Self { reflector }
    }

    pub fn create_from_type(&self, class: &Type) -> Result<(String, PipeFilter), Error> {
        let metadata = self
            .reflector
            .annotations(class)
            .iter()
            .find_map(|annotation| match annotation {
                Annotation::Pipe(metadata) => Some(metadata),
                _ => None,
            })
            .ok_or_else(|| Error::UndecoratedClass(class.name().to_string()))?;

        let filter = PipeFilter {
            class: *class,
            inject: dependencies_for(self.reflector, class)?,
            stateful: !metadata.pure,
        };

        debug!(name = %metadata.name, stateful = filter.stateful, "Created pipe filter.");

        Ok((metadata.name.clone(), filter))
    }
}
