//! Class handles. Classes are identified by their [TypeId], which makes [Type] usable as a key in
//! the explicit metadata side-tables replacing ambient reflection.

use crate::controller::{Controller, ControllerPtr};
use crate::instance::{Dependencies, ErrorPtr, InstancePtr};
use crate::pipe::{Pipe, PipePtr};
use bitflags::bitflags;
use derivative::Derivative;
use std::any::{type_name, TypeId};
use std::cell::RefCell;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

bitflags! {
    /// Lifecycle hooks implemented by a class.
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
    pub struct LifecycleHooks: u8 {
        const ON_INIT = 1;
        const AFTER_CONTENT_INIT = 1 << 1;
        const AFTER_VIEW_INIT = 1 << 2;
        const ON_DESTROY = 1 << 3;
        const ON_CHANGES = 1 << 4;
        const DO_CHECK = 1 << 5;
    }
}

/// An injectable service constructed by the host container.
pub trait Service: 'static {
    fn create(dependencies: &Dependencies) -> Result<Self, ErrorPtr>
    where
        Self: Sized;
}

/// Type-erased constructor captured when a [Type] is created for a given role.
#[derive(Clone, Copy)]
pub enum Constructor {
    Service(fn(&Dependencies) -> Result<InstancePtr, ErrorPtr>),
    Controller(fn(&Dependencies) -> Result<ControllerPtr, ErrorPtr>),
    Pipe(fn(&Dependencies) -> Result<PipePtr, ErrorPtr>),
}

/// Handle to a class known to the metadata system.
#[derive(Clone, Copy, Derivative)]
#[derivative(Debug)]
pub struct Type {
    id: TypeId,
    name: &'static str,
    hooks: LifecycleHooks,
    #[derivative(Debug = "ignore")]
    constructor: Option<Constructor>,
}

impl Type {
    /// Identity-only handle, usable as a token or a config function.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: bare_type_name(type_name::<T>()),
            hooks: LifecycleHooks::empty(),
            constructor: None,
        }
    }

    /// Handle to a service class.
    pub fn service<T: Service>() -> Self {
        Self {
            constructor: Some(Constructor::Service(construct_service::<T>)),
            ..Self::of::<T>()
        }
    }

    /// Handle to a directive or component controller class.
    pub fn controller<T: Controller>() -> Self {
        Self {
            hooks: T::hooks(),
            constructor: Some(Constructor::Controller(construct_controller::<T>)),
            ..Self::of::<T>()
        }
    }

    /// Handle to a pipe class.
    pub fn pipe<T: Pipe>() -> Self {
        Self {
            constructor: Some(Constructor::Pipe(construct_pipe::<T>)),
            ..Self::of::<T>()
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Declared class name, without module path and generic arguments.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn hooks(&self) -> LifecycleHooks {
        self.hooks
    }

    #[inline]
    pub fn implements(&self, hooks: LifecycleHooks) -> bool {
        self.hooks.contains(hooks)
    }

    #[inline]
    pub fn constructor(&self) -> Option<Constructor> {
        self.constructor
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn construct_service<T: Service>(dependencies: &Dependencies) -> Result<InstancePtr, ErrorPtr> {
    T::create(dependencies).map(|service| Rc::new(service) as InstancePtr)
}

fn construct_controller<T: Controller>(
    dependencies: &Dependencies,
) -> Result<ControllerPtr, ErrorPtr> {
    T::create(dependencies).map(|controller| Rc::new(RefCell::new(controller)) as ControllerPtr)
}

fn construct_pipe<T: Pipe>(dependencies: &Dependencies) -> Result<PipePtr, ErrorPtr> {
    T::create(dependencies).map(|pipe| Rc::new(pipe) as PipePtr)
}

/// Strips module path and generic arguments from a type name.
pub(crate) fn bare_type_name(full_name: &'static str) -> &'static str {
    let without_generics = full_name
        .find('<')
        .map(|index| &full_name[..index])
        .unwrap_or(full_name);

    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}
