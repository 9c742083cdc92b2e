use crate::scope::ScopePtr;
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

pub type Subscriber = Rc<dyn Fn(&Value)>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SubscriptionId(usize);

struct BoundExpression {
    scope: ScopePtr,
    expression: String,
}

struct EmitterState {
    target: Option<BoundExpression>,
    subscribers: RefCell<Vec<(SubscriptionId, Subscriber)>>,
    next_id: Cell<usize>,
}

/// Output of a directive. Emitting evaluates the expression bound in the template with the value
/// available as `$event`, then notifies programmatic subscribers. An emitter without a bound
/// expression ignores emitted values.
#[derive(Clone)]
pub struct EventEmitter {
    state: Rc<EmitterState>,
}

impl Debug for EventEmitter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field(
                "expression",
                &self.state.target.as_ref().map(|target| &target.expression),
            )
            .field("subscribers", &self.state.subscribers.borrow().len())
            .finish()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::noop()
    }
}

impl EventEmitter {
    pub fn noop() -> Self {
        Self::with_target(None)
    }

    pub fn bound<T: ToString>(scope: ScopePtr, expression: T) -> Self {
        Self::with_target(Some(BoundExpression {
            scope,
            expression: expression.to_string(),
        }))
    }

    fn with_target(target: Option<BoundExpression>) -> Self {
        Self {
            state: Rc::new(EmitterState {
                target,
                subscribers: Default::default(),
                next_id: Default::default(),
            }),
        }
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.state.target.is_some()
    }

    pub fn emit(&self, value: Value) {
        let Some(target) = &self.state.target else {
            return;
        };

        let mut locals = Map::new();
        locals.insert("$event".to_string(), value.clone());
        target.scope.eval(&target.expression, Some(&locals));

        let subscribers = self
            .state
            .subscribers
            .borrow()
            .iter()
            .map(|(_, subscriber)| subscriber.clone())
            .collect::<Vec<_>>();

        for subscriber in subscribers {
            subscriber(&value);
        }
    }

    pub fn subscribe(&self, subscriber: Subscriber) -> SubscriptionId {
        let id = SubscriptionId(self.state.next_id.get());
        self.state.next_id.set(id.0 + 1);
        self.state.subscribers.borrow_mut().push((id, subscriber));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.state
            .subscribers
            .borrow_mut()
            .retain(|(subscription, _)| *subscription != id);
    }
}

#[cfg(test)]
mod tests {
    use crate::binding::emitter::EventEmitter;
    use crate::testing::TestScope;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn should_evaluate_bound_expression_with_event() {
        let scope = TestScope::new();
        let received = Rc::new(RefCell::new(Vec::<Value>::new()));
        let sink = received.clone();
        scope.set_function("onSave", move |args| {
            sink.borrow_mut().extend(args.iter().cloned());
            Value::Null
        });

        let emitter = EventEmitter::bound(scope.clone(), "onSave($event)");
        emitter.emit(json!({"id": 1}));

        assert_eq!(*received.borrow(), [json!({"id": 1})]);
    }

    #[test]
    fn should_notify_subscribers_until_unsubscribed() {
        let scope = TestScope::new();
        let received = Rc::new(RefCell::new(Vec::<Value>::new()));
        let sink = received.clone();

        let emitter = EventEmitter::bound(scope, "noop");
        let id = emitter.subscribe(Rc::new(move |value| sink.borrow_mut().push(value.clone())));
        emitter.emit(json!(1));
        emitter.unsubscribe(id);
        emitter.emit(json!(2));

        assert_eq!(*received.borrow(), [json!(1)]);
    }

    #[test]
    fn should_ignore_emits_without_expression() {
        let received = Rc::new(RefCell::new(0));
        let sink = received.clone();

        let emitter = EventEmitter::noop();
        emitter.subscribe(Rc::new(move |_| *sink.borrow_mut() += 1));
        emitter.emit(json!(1));

        assert!(!emitter.is_bound());
        assert_eq!(*received.borrow(), 0);
    }
}
