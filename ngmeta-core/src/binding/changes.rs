//! Batching of `on_changes` notifications. All changes recorded during a digest are delivered after
//! it settles, in a dedicated apply cycle, as a single call per controller.
//!
//! The queue is shared by every directive of an application, and so is its time-to-live: a
//! notification cycle in one component exhausts the budget for all of them.

use crate::controller::ControllerPtr;
use crate::error::Error;
use crate::scope::ScopePtr;
use indexmap::IndexMap;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use tracing::{debug, trace};

/// Default number of nested flushes before giving up.
pub const DEFAULT_ON_CHANGES_TTL: usize = 10;

/// A single property change.
#[derive(Clone, Debug, PartialEq)]
pub struct SimpleChange {
    pub previous_value: Value,
    pub current_value: Value,
    first_change: bool,
}

impl SimpleChange {
    pub fn new(previous_value: Value, current_value: Value) -> Self {
        Self {
            previous_value,
            current_value,
            first_change: false,
        }
    }

    /// Change produced when a binding is created.
    pub fn first(current_value: Value) -> Self {
        Self {
            previous_value: Value::Null,
            current_value,
            first_change: true,
        }
    }

    #[inline]
    pub fn is_first_change(&self) -> bool {
        self.first_change
    }
}

pub type SimpleChanges = IndexMap<String, SimpleChange>;

type Notification = Box<dyn FnOnce()>;

struct QueueState {
    /// `Some` while a flush is scheduled.
    pending: Option<VecDeque<Notification>>,
    ttl: usize,
    limit: usize,
}

/// Application-wide queue of pending notifications. Clones share the same queue.
#[derive(Clone)]
pub struct ChangesQueue {
    state: Rc<RefCell<QueueState>>,
}

impl Debug for ChangesQueue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ChangesQueue")
            .field("scheduled", &state.pending.is_some())
            .field("ttl", &state.ttl)
            .field("limit", &state.limit)
            .finish()
    }
}

impl Default for ChangesQueue {
    fn default() -> Self {
        Self::new(DEFAULT_ON_CHANGES_TTL)
    }
}

impl ChangesQueue {
    pub fn new(ttl: usize) -> Self {
        Self {
            state: Rc::new(RefCell::new(QueueState {
                pending: None,
                ttl,
                limit: ttl,
            })),
        }
    }

    #[inline]
    pub fn is_scheduled(&self) -> bool {
        self.state.borrow().pending.is_some()
    }

    #[inline]
    pub fn ttl(&self) -> usize {
        self.state.borrow().ttl
    }

    /// Number of notifications waiting for the next flush.
    pub fn len(&self) -> usize {
        self.state
            .borrow()
            .pending
            .as_ref()
            .map(VecDeque::len)
            .unwrap_or_default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops pending notifications and restores the time-to-live.
    pub fn reset(&self) {
        let mut state = self.state.borrow_mut();
        state.pending = None;
        state.ttl = state.limit;
    }

    /// Makes sure a flush is scheduled after the current digest.
    pub fn schedule(&self, scope: &ScopePtr) {
        if self.is_scheduled() {
            return;
        }

        self.state.borrow_mut().pending = Some(VecDeque::new());

        let queue = self.clone();
        let flush_scope = scope.clone();
        scope.post_digest(Box::new(move || queue.flush(&flush_scope)));

        trace!("Scheduled onChanges flush.");
    }

    /// Adds a notification to the scheduled flush.
    pub fn push(&self, notification: Notification) {
        if let Some(pending) = self.state.borrow_mut().pending.as_mut() {
            pending.push_back(notification);
        }
    }

    /// Delivers all pending notifications inside a new apply cycle.
    pub fn flush(&self, scope: &ScopePtr) -> Result<(), Error> {
        let exhausted = {
            let mut state = self.state.borrow_mut();
            state.ttl = state.ttl.saturating_sub(1);
            if state.ttl == 0 {
                state.pending = None;
                Some(state.limit)
            } else {
                None
            }
        };

        let result = match exhausted {
            Some(limit) => Err(Error::InfiniteChangeLoop(limit)),
            None => {
                let queue = self.clone();
                scope.apply(Box::new(move || {
                    queue.drain();
                    Ok(())
                }))
            }
        };

        self.state.borrow_mut().ttl += 1;
        result
    }

    fn drain(&self) {
        let mut delivered = 0;
        loop {
            let notification = self
                .state
                .borrow_mut()
                .pending
                .as_mut()
                .and_then(VecDeque::pop_front);

            match notification {
                Some(notification) => {
                    notification();
                    delivered += 1;
                }
                None => break,
            }
        }

        self.state.borrow_mut().pending = None;

        debug!(delivered, "Flushed onChanges queue.");
    }
}

/// Accumulates changes of a single controller between flushes.
#[derive(Clone)]
pub struct ChangesRecorder {
    controller: ControllerPtr,
    changes: Rc<RefCell<Option<SimpleChanges>>>,
    queue: ChangesQueue,
    scope: ScopePtr,
}

impl ChangesRecorder {
    pub fn new(controller: ControllerPtr, queue: ChangesQueue, scope: ScopePtr) -> Self {
        Self {
            controller,
            changes: Default::default(),
            queue,
            scope,
        }
    }

    /// Records a change of a property. A key changed multiple times before a flush keeps its
    /// original previous value.
    pub fn record(&self, key: &str, current_value: &Value, previous_value: &Value) {
        if current_value == previous_value {
            return;
        }

        self.queue.schedule(&self.scope);

        let mut changes = self.changes.borrow_mut();
        let changes = changes.get_or_insert_with(|| {
            let controller = self.controller.clone();
            let pending = self.changes.clone();
            self.queue.push(Box::new(move || {
                let changes = pending.borrow_mut().take();
                if let Some(changes) = changes {
                    controller.borrow_mut().on_changes(&changes);
                }
            }));

            SimpleChanges::new()
        });

        let previous_value = changes
            .get(key)
            .map(|change| change.previous_value.clone())
            .unwrap_or_else(|| previous_value.clone());

        changes.insert(
            key.to_string(),
            SimpleChange::new(previous_value, current_value.clone()),
        );
    }
}
