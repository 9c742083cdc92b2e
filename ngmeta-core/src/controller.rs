//! Directive and component controllers.
//!
//! Bound values and method calls go through name-based accessors, since templates refer to
//! controller members by name:
//!
//! ```
//! use ngmeta_core::controller::Controller;
//! use ngmeta_core::instance::{Dependencies, ErrorPtr};
//! use ngmeta_core::types::LifecycleHooks;
//! use serde_json::Value;
//!
//! #[derive(Default)]
//! struct Counter {
//!     count: i64,
//! }
//!
//! impl Controller for Counter {
//!     fn create(_dependencies: &Dependencies) -> Result<Self, ErrorPtr> {
//!         Ok(Self::default())
//!     }
//!
//!     fn hooks() -> LifecycleHooks {
//!         LifecycleHooks::ON_INIT
//!     }
//!
//!     fn property(&self, name: &str) -> Value {
//!         match name {
//!             "count" => self.count.into(),
//!             _ => Value::Null,
//!         }
//!     }
//!
//!     fn set_property(&mut self, name: &str, value: Value) {
//!         if name == "count" {
//!             self.count = value.as_i64().unwrap_or_default();
//!         }
//!     }
//!
//!     fn on_init(&mut self) {
//!         self.count += 1;
//!     }
//! }
//! ```

use crate::binding::changes::SimpleChanges;
use crate::binding::emitter::EventEmitter;
use crate::element::QueryResult;
use crate::instance::{Dependencies, ErrorPtr};
use crate::types::LifecycleHooks;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

pub type ControllerPtr = Rc<RefCell<dyn Controller>>;

pub trait Controller: 'static {
    fn create(dependencies: &Dependencies) -> Result<Self, ErrorPtr>
    where
        Self: Sized;

    /// Lifecycle hooks implemented by this controller. Only declared hooks get called.
    fn hooks() -> LifecycleHooks
    where
        Self: Sized,
    {
        LifecycleHooks::empty()
    }

    fn property(&self, name: &str) -> Value;

    fn set_property(&mut self, name: &str, value: Value);

    fn set_output(&mut self, _name: &str, _emitter: EventEmitter) {}

    /// Assigns a required sibling or ancestor controller, keyed by directive name.
    fn set_required(&mut self, _name: &str, _controller: Option<ControllerPtr>) {}

    fn set_query(&mut self, _name: &str, _result: QueryResult) {}

    /// Invokes a method by name, e.g. from a host listener.
    fn call(&mut self, _method: &str, _args: &[Value]) -> Result<Value, ErrorPtr> {
        Ok(Value::Null)
    }

    fn on_changes(&mut self, _changes: &SimpleChanges) {}

    fn on_init(&mut self) {}

    fn do_check(&mut self) {}

    fn after_content_init(&mut self) {}

    fn after_view_init(&mut self) {}

    fn on_destroy(&mut self) {}
}

/// Controller of the definition object shell, before the real one gets merged in.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopController;

impl Controller for NoopController {
    fn create(_dependencies: &Dependencies) -> Result<Self, ErrorPtr> {
        Ok(Self)
    }

    fn property(&self, _name: &str) -> Value {
        Value::Null
    }

    fn set_property(&mut self, _name: &str, _value: Value) {}
}
