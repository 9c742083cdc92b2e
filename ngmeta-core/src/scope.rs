//! Contract of the host scope: the hierarchical context object owning watched state and the digest
//! scheduling primitives. The core never runs a digest itself - it only registers watchers and
//! schedules work through this trait.
//!
//! Watchers fire in registration order within a digest, and post-digest tasks run after all
//! watchers have settled. Both are guarantees of the host, not of this crate.

use crate::error::Error;
use serde_json::{Map, Value};
use std::rc::Rc;

/// Work scheduled on the host, possibly failing with an error propagated out of the digest.
pub type Task = Box<dyn FnOnce() -> Result<(), Error>>;

/// Called with `(new_value, old_value)`. On the first call both are equal.
pub type WatchListener = Box<dyn FnMut(&Value, &Value) -> Result<(), Error>>;

/// Computes the watched value on every digest iteration.
pub type WatchGetter = Box<dyn FnMut() -> Result<Value, Error>>;

/// Deregistration handle for watchers, observers and listeners.
pub type Disposer = Box<dyn FnOnce()>;

pub type ScopePtr = Rc<dyn Scope>;

pub trait Scope {
    /// Registers a watcher for an expression evaluated against this scope. `deep` requests
    /// structural instead of reference comparison.
    fn watch(&self, expression: &str, listener: WatchListener, deep: bool) -> Disposer;

    /// Registers a watcher for an arbitrary getter.
    fn watch_fn(&self, getter: WatchGetter, listener: WatchListener) -> Disposer;

    /// Evaluates an expression, with optional locals shadowing scope properties.
    fn eval(&self, expression: &str, locals: Option<&Map<String, Value>>) -> Value;

    /// Checks if an expression has a setter.
    fn is_assignable(&self, expression: &str) -> bool;

    /// Assigns a value through an assignable expression. Non-assignable expressions are ignored.
    fn assign(&self, expression: &str, value: Value);

    /// Evaluates interpolation markup (`{{ expr }}`) against this scope.
    fn interpolate(&self, text: &str) -> Value;

    /// Runs the task, then digests from the root scope.
    fn apply(&self, task: Task) -> Result<(), Error>;

    /// Schedules a digest, optionally running a task first. Multiple calls are coalesced.
    fn apply_async(&self, task: Option<Task>);

    /// Schedules a task to run in the current or the next digest.
    fn eval_async(&self, task: Task);

    /// Schedules a task to run once after the current digest settles.
    fn post_digest(&self, task: Task);

    /// Registers a callback for the `$destroy` event of this scope.
    fn on_destroy(&self, callback: Box<dyn FnOnce()>);

    fn parent(&self) -> Option<ScopePtr>;
}

/// Truthiness of a bound value, as seen by templates.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(value) => *value,
        Value::Number(number) => number.as_f64().map(|number| number != 0.0).unwrap_or(true),
        Value::String(value) => !value.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
