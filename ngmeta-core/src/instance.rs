//! Type-erased instances moving between the host injector and class constructors.

use crate::error::DependencyError;
#[cfg(test)]
use mockall::automock;
use std::any::{type_name, Any};
use std::error::Error;
use std::rc::Rc;

/// Any value the host container can hand out: services, locals such as `$scope`, plain values.
pub type InstancePtr = Rc<dyn Any>;

/// Error produced by user code: constructors, factories, controller methods.
pub type ErrorPtr = Rc<dyn Error>;

/// The host dependency container (`$injector`). Consumed as an opaque service - resolution logic
/// lives entirely on the host side.
#[cfg_attr(test, automock)]
pub trait Injector {
    /// Returns the instance registered under the given name.
    fn get(&self, name: &str) -> Result<InstancePtr, ErrorPtr>;

    /// Checks if a given name can be resolved.
    fn has(&self, name: &str) -> bool;
}

pub type InjectorPtr = Rc<dyn Injector>;

/// Positional constructor arguments. Positions are never compacted: parameters which are filled
/// later (required sibling controllers) or could not be resolved hold `None`.
#[derive(Clone, Default)]
pub struct Dependencies {
    instances: Vec<Option<InstancePtr>>,
}

impl Dependencies {
    pub fn new(instances: Vec<Option<InstancePtr>>) -> Self {
        Self { instances }
    }

    /// Resolves an injection list against the host injector. `None` positions stay empty.
    pub fn resolve(injector: &dyn Injector, inject: &[Option<String>]) -> Result<Self, ErrorPtr> {
        inject
            .iter()
            .map(|name| name.as_deref().map(|name| injector.get(name)).transpose())
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Raw access to the instance at a given position.
    pub fn instance(&self, index: usize) -> Option<&InstancePtr> {
        self.instances.get(index).and_then(|instance| instance.as_ref())
    }

    /// Typed access to a required dependency.
    pub fn get<T: 'static>(&self, index: usize) -> Result<Rc<T>, DependencyError> {
        self.optional(index)?
            .ok_or(DependencyError::Missing(index))
    }

    /// Typed access to a dependency which might not be present.
    pub fn optional<T: 'static>(&self, index: usize) -> Result<Option<Rc<T>>, DependencyError> {
        self.instance(index)
            .cloned()
            .map(|instance| {
                instance
                    .downcast::<T>()
                    .map_err(|_| DependencyError::Incompatible {
                        index,
                        expected: type_name::<T>(),
                    })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DependencyError;
    use crate::instance::{Dependencies, InstancePtr, MockInjector};
    use std::rc::Rc;

    #[test]
    fn should_resolve_from_injector() {
        let mut injector = MockInjector::new();
        injector
            .expect_get()
            .withf(|name| name == "$http")
            .times(1)
            .returning(|_| Ok(Rc::new(7_i32) as InstancePtr));

        let dependencies =
            Dependencies::resolve(&injector, &[None, Some("$http".to_string())]).unwrap();

        assert_eq!(dependencies.len(), 2);
        assert!(dependencies.instance(0).is_none());
        assert_eq!(*dependencies.get::<i32>(1).unwrap(), 7);
    }

    #[test]
    fn should_return_typed_dependency() {
        let dependencies = Dependencies::new(vec![Some(Rc::new(5_u8) as InstancePtr), None]);

        assert_eq!(*dependencies.get::<u8>(0).unwrap(), 5);
        assert_eq!(dependencies.get::<u8>(1).unwrap_err(), DependencyError::Missing(1));
        assert!(dependencies.optional::<u8>(1).unwrap().is_none());
    }

    #[test]
    fn should_reject_incompatible_dependency() {
        let dependencies = Dependencies::new(vec![Some(Rc::new(5_u8) as InstancePtr)]);

        assert!(matches!(
            dependencies.get::<String>(0).unwrap_err(),
            DependencyError::Incompatible { index: 0, .. }
        ));
    }
}
