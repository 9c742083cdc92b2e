//! Contracts of the host element, its normalized attributes and DOM events.

use crate::controller::ControllerPtr;
use crate::error::Error;
use crate::instance::InstancePtr;
use crate::scope::Disposer;
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

pub type ElementPtr = Rc<dyn Element>;
pub type AttributesPtr = Rc<dyn Attributes>;

pub type EventHandler = Rc<dyn Fn(&dyn DomEvent) -> Result<(), Error>>;

/// Called with the current, interpolated attribute value.
pub type ObserveCallback = Box<dyn FnMut(&Value) -> Result<(), Error>>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ListenerId(pub usize);

/// Targets outside the host element a listener can be attached to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum GlobalTarget {
    Document,
    Window,
    Body,
}

impl GlobalTarget {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "document" => Some(GlobalTarget::Document),
            "window" => Some(GlobalTarget::Window),
            "body" => Some(GlobalTarget::Body),
            _ => None,
        }
    }
}

impl Display for GlobalTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            GlobalTarget::Document => "document",
            GlobalTarget::Window => "window",
            GlobalTarget::Body => "body",
        })
    }
}

/// What a content or view query looks for.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum QueryTarget {
    /// A CSS selector or template reference.
    Selector(String),
    /// Controllers of the directive registered under the given name.
    Directive(String),
}

#[derive(Clone)]
pub enum QueryMatch {
    Element(ElementPtr),
    Controller(ControllerPtr),
}

/// Value assigned to a query property.
#[derive(Clone)]
pub enum QueryResult {
    First(Option<QueryMatch>),
    All(Vec<QueryMatch>),
}

pub trait DomEvent {
    /// Serializable view of the event, used to evaluate `$event.path` arguments.
    fn value(&self) -> Value;

    fn prevent_default(&self);
}

pub trait Element {
    /// Sets an attribute, or removes it when `value` is `None`.
    fn set_attribute(&self, name: &str, value: Option<&str>);

    fn set_property(&self, name: &str, value: Value);

    fn toggle_class(&self, name: &str, enabled: bool);

    fn on(&self, event: &str, handler: EventHandler) -> ListenerId;

    fn off(&self, event: &str, listener: ListenerId);

    /// Returns the element standing for a global listener target.
    fn global(&self, target: GlobalTarget) -> ElementPtr;

    fn query(&self, target: &QueryTarget, descendants: bool, view: bool) -> Vec<QueryMatch>;

    fn data(&self, key: &str) -> Option<InstancePtr>;

    fn set_data(&self, key: &str, value: Option<InstancePtr>);
}

/// Normalized attributes of an element. Names are passed in their template form, e.g. `bar`,
/// `[bar]`, `[(bar)]` or `(bar)`.
pub trait Attributes {
    fn get(&self, name: &str) -> Option<String>;

    fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn set(&self, name: &str, value: &str);

    /// Calls back once after the current digest and then on every interpolation change.
    fn observe(&self, name: &str, callback: ObserveCallback) -> Disposer;
}
