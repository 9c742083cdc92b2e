//! In-memory stand-ins for the host runtime: a scope running its own digest loop, element
//! attributes, an element recording what gets applied to it and an injector backed by a map.
//!
//! The scope understands a small expression subset: property paths, JSON literals, single-quoted
//! strings, calls of functions registered with [TestScope::set_function], assignments and
//! `{{ }}` interpolation.

use crate::binding::changes::SimpleChanges;
use crate::binding::emitter::EventEmitter;
use crate::controller::{Controller, ControllerPtr};
use crate::element::{
    Attributes, DomEvent, Element, ElementPtr, EventHandler, GlobalTarget, ListenerId,
    ObserveCallback, QueryMatch, QueryResult, QueryTarget,
};
use crate::error::Error;
use crate::instance::{Dependencies, ErrorPtr, Injector, InstancePtr};
use crate::scope::{Disposer, Scope, ScopePtr, Task, WatchGetter, WatchListener};
use crate::types::LifecycleHooks;
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};
use tracing::warn;

const DIGEST_TTL: usize = 10;

static PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*$").unwrap());

static CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*)\s*\((.*)\)$").unwrap()
});

static INTERPOLATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{(.*?)\}\}").unwrap());

pub const TEST_HOOKS: u8 = LifecycleHooks::all()
    .difference(LifecycleHooks::AFTER_VIEW_INIT)
    .bits();
pub const CONTENT_HOOKS: u8 = LifecycleHooks::AFTER_CONTENT_INIT.bits();
pub const VIEW_HOOKS: u8 = LifecycleHooks::AFTER_VIEW_INIT.bits();
pub const VIEW_AND_CONTENT_HOOKS: u8 = CONTENT_HOOKS | VIEW_HOOKS;

/// Every hook apart from `after_view_init`, which components and directives cannot share.
pub type TestController = HookedController<TEST_HOOKS>;
pub type ContentController = HookedController<CONTENT_HOOKS>;
pub type ViewController = HookedController<VIEW_HOOKS>;
pub type ViewAndContentController = HookedController<VIEW_AND_CONTENT_HOOKS>;
pub type PlainController = HookedController<0>;

/// Controller recording everything done to it. `HOOKS` are the bits of the declared
/// [LifecycleHooks].
#[derive(Default)]
pub struct HookedController<const HOOKS: u8> {
    pub dependencies: Dependencies,
    pub properties: IndexMap<String, Value>,
    pub outputs: IndexMap<String, EventEmitter>,
    pub required: IndexMap<String, Option<ControllerPtr>>,
    pub queries: IndexMap<String, QueryResult>,
    pub changes: Vec<SimpleChanges>,
    /// Lifecycle hooks in call order, e.g. `onInit`.
    pub hook_calls: Vec<&'static str>,
    /// Method invocations in call order.
    pub invocations: Vec<(String, Vec<Value>)>,
    /// Values returned from [Controller::call], by method name.
    pub results: IndexMap<String, Value>,
}

impl<const HOOKS: u8> HookedController<HOOKS> {
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn count_hook(&self, hook: &str) -> usize {
        self.hook_calls.iter().filter(|call| **call == hook).count()
    }
}

impl<const HOOKS: u8> Controller for HookedController<HOOKS> {
    fn create(dependencies: &Dependencies) -> Result<Self, ErrorPtr> {
        Ok(Self {
            dependencies: dependencies.clone(),
            ..Default::default()
        })
    }

    fn hooks() -> LifecycleHooks {
        LifecycleHooks::from_bits_truncate(HOOKS)
    }

    fn property(&self, name: &str) -> Value {
        self.properties.get(name).cloned().unwrap_or(Value::Null)
    }

    fn set_property(&mut self, name: &str, value: Value) {
        self.properties.insert(name.to_string(), value);
    }

    fn set_output(&mut self, name: &str, emitter: EventEmitter) {
        self.outputs.insert(name.to_string(), emitter);
    }

    fn set_required(&mut self, name: &str, controller: Option<ControllerPtr>) {
        self.required.insert(name.to_string(), controller);
    }

    fn set_query(&mut self, name: &str, result: QueryResult) {
        self.queries.insert(name.to_string(), result);
    }

    fn call(&mut self, method: &str, args: &[Value]) -> Result<Value, ErrorPtr> {
        self.invocations.push((method.to_string(), args.to_vec()));
        Ok(self.results.get(method).cloned().unwrap_or(Value::Null))
    }

    fn on_changes(&mut self, changes: &SimpleChanges) {
        self.hook_calls.push("onChanges");
        self.changes.push(changes.clone());
    }

    fn on_init(&mut self) {
        self.hook_calls.push("onInit");
    }

    fn do_check(&mut self) {
        self.hook_calls.push("doCheck");
    }

    fn after_content_init(&mut self) {
        self.hook_calls.push("afterContentInit");
    }

    fn after_view_init(&mut self) {
        self.hook_calls.push("afterViewInit");
    }

    fn on_destroy(&mut self) {
        self.hook_calls.push("onDestroy");
    }
}

type TestFunction = Rc<dyn Fn(&[Value]) -> Value>;

struct Watcher {
    getter: WatchGetter,
    listener: WatchListener,
    last: Option<Value>,
}

struct WatcherEntry {
    id: usize,
    scope: usize,
    watcher: Rc<RefCell<Watcher>>,
}

/// State shared by a scope tree.
#[derive(Default)]
struct DigestState {
    watchers: Vec<WatcherEntry>,
    async_queue: VecDeque<Task>,
    post_digest_queue: VecDeque<Task>,
    digest_requested: bool,
    next_id: usize,
}

impl DigestState {
    fn next_id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }
}

pub struct TestScope {
    id: usize,
    this: Weak<TestScope>,
    parent: Option<Rc<TestScope>>,
    isolate: bool,
    children: RefCell<Vec<Weak<TestScope>>>,
    data: RefCell<Map<String, Value>>,
    functions: RefCell<HashMap<String, TestFunction>>,
    destroy_callbacks: RefCell<Vec<Box<dyn FnOnce()>>>,
    destroyed: Cell<bool>,
    state: Rc<RefCell<DigestState>>,
}

impl TestScope {
    /// Creates a root scope.
    pub fn new() -> Rc<Self> {
        Self::create(None, false, Default::default())
    }

    fn create(
        parent: Option<Rc<TestScope>>,
        isolate: bool,
        state: Rc<RefCell<DigestState>>,
    ) -> Rc<Self> {
        let id = state.borrow_mut().next_id();
        Rc::new_cyclic(|this| Self {
            id,
            this: this.clone(),
            parent,
            isolate,
            children: Default::default(),
            data: Default::default(),
            functions: Default::default(),
            destroy_callbacks: Default::default(),
            destroyed: Cell::new(false),
            state,
        })
    }

    /// Creates a child scope. Non-isolated children see properties of their ancestors.
    pub fn child(&self, isolate: bool) -> Rc<Self> {
        let child = Self::create(self.this.upgrade(), isolate, self.state.clone());
        self.children.borrow_mut().push(Rc::downgrade(&child));
        child
    }

    /// Assigns a value to a (possibly dotted) path.
    pub fn set(&self, path: &str, value: Value) {
        self.assign_path(path, value);
    }

    /// Evaluates a path against this scope.
    pub fn get(&self, path: &str) -> Value {
        self.lookup(path, None)
    }

    /// Registers a function callable from expressions under the given (possibly dotted) name.
    pub fn set_function<F>(&self, name: &str, function: F)
    where
        F: Fn(&[Value]) -> Value + 'static,
    {
        self.functions
            .borrow_mut()
            .insert(name.to_string(), Rc::new(function));
    }

    /// Checks if a digest was requested with [Scope::apply_async] or [Scope::eval_async] since
    /// the last one.
    pub fn is_digest_requested(&self) -> bool {
        self.state.borrow().digest_requested
    }

    /// Runs a digest if one was requested.
    pub fn flush(&self) -> Result<(), Error> {
        if self.is_digest_requested() {
            self.digest()
        } else {
            Ok(())
        }
    }

    /// Runs async tasks and watchers until nothing changes, then post-digest tasks.
    ///
    /// # Panics
    ///
    /// Panics when watchers keep changing for more than 10 iterations.
    pub fn digest(&self) -> Result<(), Error> {
        self.state.borrow_mut().digest_requested = false;

        let mut iterations = 0;
        loop {
            while let Some(task) = self.pop_task(|state| &mut state.async_queue) {
                task()?;
            }

            let dirty = self.run_watchers()?;
            if !dirty && self.state.borrow().async_queue.is_empty() {
                break;
            }

            iterations += 1;
            if iterations >= DIGEST_TTL {
                panic!("{DIGEST_TTL} digest iterations reached");
            }
        }

        while let Some(task) = self.pop_task(|state| &mut state.post_digest_queue) {
            task()?;
        }

        Ok(())
    }

    fn pop_task(&self, queue: fn(&mut DigestState) -> &mut VecDeque<Task>) -> Option<Task> {
        let mut state = self.state.borrow_mut();
        queue(&mut state).pop_front()
    }

    fn run_watchers(&self) -> Result<bool, Error> {
        let watchers = self
            .state
            .borrow()
            .watchers
            .iter()
            .map(|entry| (entry.id, entry.watcher.clone()))
            .collect::<Vec<_>>();

        let mut dirty = false;
        for (id, watcher) in watchers {
            let registered = self
                .state
                .borrow()
                .watchers
                .iter()
                .any(|entry| entry.id == id);
            if !registered {
                continue;
            }

            let mut watcher = watcher.borrow_mut();
            let value = (watcher.getter)()?;
            if watcher.last.as_ref() == Some(&value) {
                continue;
            }

            let old_value = watcher.last.replace(value.clone()).unwrap_or_else(|| value.clone());
            (watcher.listener)(&value, &old_value)?;
            dirty = true;
        }

        Ok(dirty)
    }

    /// Fires `$destroy` on this scope and its children and removes their watchers.
    pub fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }

        let children = self.children.take();
        for child in children.iter().filter_map(Weak::upgrade) {
            child.destroy();
        }

        let callbacks = self.destroy_callbacks.take();
        for callback in callbacks {
            callback();
        }

        self.state
            .borrow_mut()
            .watchers
            .retain(|entry| entry.scope != self.id);
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    pub fn watcher_count(&self) -> usize {
        self.state.borrow().watchers.len()
    }

    fn register(&self, getter: WatchGetter, listener: WatchListener) -> Disposer {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.watchers.push(WatcherEntry {
            id,
            scope: self.id,
            watcher: Rc::new(RefCell::new(Watcher {
                getter,
                listener,
                last: None,
            })),
        });

        let state = Rc::downgrade(&self.state);
        Box::new(move || {
            if let Some(state) = state.upgrade() {
                state.borrow_mut().watchers.retain(|entry| entry.id != id);
            }
        })
    }

    fn evaluate(&self, expression: &str, locals: Option<&Map<String, Value>>) -> Value {
        let expression = expression.trim();
        if expression.is_empty() {
            return Value::Null;
        }

        if let Some(index) = find_assignment(expression) {
            let value = self.evaluate(&expression[index + 1..], locals);
            self.assign_path(expression[..index].trim(), value.clone());
            return value;
        }

        if let Some(literal) = parse_literal(expression) {
            return literal;
        }

        if let Some(captures) = CALL.captures(expression) {
            let args = split_top_level(&captures[2], ',')
                .into_iter()
                .filter(|arg| !arg.trim().is_empty())
                .map(|arg| self.evaluate(arg, locals))
                .collect::<Vec<_>>();
            return self.call(&captures[1], &args);
        }

        if PATH.is_match(expression) {
            return self.lookup(expression, locals);
        }

        Value::Null
    }

    fn lookup(&self, path: &str, locals: Option<&Map<String, Value>>) -> Value {
        let mut segments = path.split('.');
        let root = segments.next().unwrap_or_default();
        let value = locals
            .and_then(|locals| locals.get(root).cloned())
            .or_else(|| self.resolve_root(root));

        value
            .and_then(|value| {
                segments.try_fold(value, |value, segment| value.get(segment).cloned())
            })
            .unwrap_or(Value::Null)
    }

    fn resolve_root(&self, root: &str) -> Option<Value> {
        if let Some(value) = self.data.borrow().get(root) {
            return Some(value.clone());
        }

        self.visible_parent()
            .and_then(|parent| parent.resolve_root(root))
    }

    fn visible_parent(&self) -> Option<&Rc<TestScope>> {
        self.parent.as_ref().filter(|_| !self.isolate)
    }

    fn assign_path(&self, path: &str, value: Value) {
        let segments = path.split('.').collect::<Vec<_>>();
        let root = segments[0];

        if !self.data.borrow().contains_key(root) {
            let mut parent = self.visible_parent();
            while let Some(scope) = parent {
                if scope.data.borrow().contains_key(root) {
                    scope.store(&segments, value);
                    return;
                }
                parent = scope.visible_parent();
            }
        }

        self.store(&segments, value);
    }

    fn store(&self, segments: &[&str], value: Value) {
        let mut data = self.data.borrow_mut();
        let target = data
            .entry(segments[0].to_string())
            .or_insert(Value::Null);
        assign_into(target, &segments[1..], value);
    }

    fn call(&self, name: &str, args: &[Value]) -> Value {
        let function = self.functions.borrow().get(name).cloned();
        match function {
            Some(function) => function(args),
            None => match &self.parent {
                Some(parent) => parent.call(name, args),
                None => Value::Null,
            },
        }
    }
}

impl Scope for TestScope {
    /// Values are compared structurally regardless of `deep`.
    fn watch(&self, expression: &str, listener: WatchListener, _deep: bool) -> Disposer {
        let scope = self.this.clone();
        let expression = expression.to_string();
        self.register(
            Box::new(move || {
                Ok(scope
                    .upgrade()
                    .map(|scope| scope.evaluate(&expression, None))
                    .unwrap_or(Value::Null))
            }),
            listener,
        )
    }

    fn watch_fn(&self, getter: WatchGetter, listener: WatchListener) -> Disposer {
        self.register(getter, listener)
    }

    fn eval(&self, expression: &str, locals: Option<&Map<String, Value>>) -> Value {
        self.evaluate(expression, locals)
    }

    fn is_assignable(&self, expression: &str) -> bool {
        let expression = expression.trim();
        PATH.is_match(expression) && parse_literal(expression).is_none()
    }

    fn assign(&self, expression: &str, value: Value) {
        if self.is_assignable(expression) {
            self.assign_path(expression.trim(), value);
        }
    }

    fn interpolate(&self, text: &str) -> Value {
        let interpolated = INTERPOLATION.replace_all(text, |captures: &regex::Captures| {
            match self.evaluate(&captures[1], None) {
                Value::Null => String::new(),
                Value::String(value) => value,
                value => value.to_string(),
            }
        });

        Value::String(interpolated.into_owned())
    }

    fn apply(&self, task: Task) -> Result<(), Error> {
        let result = task();
        let digest = self.digest();
        result.and(digest)
    }

    fn apply_async(&self, task: Option<Task>) {
        let mut state = self.state.borrow_mut();
        if let Some(task) = task {
            state.async_queue.push_back(task);
        }
        state.digest_requested = true;
    }

    fn eval_async(&self, task: Task) {
        let mut state = self.state.borrow_mut();
        state.async_queue.push_back(task);
        state.digest_requested = true;
    }

    fn post_digest(&self, task: Task) {
        self.state.borrow_mut().post_digest_queue.push_back(task);
    }

    fn on_destroy(&self, callback: Box<dyn FnOnce()>) {
        self.destroy_callbacks.borrow_mut().push(callback);
    }

    fn parent(&self) -> Option<ScopePtr> {
        self.parent.clone().map(|parent| parent as ScopePtr)
    }
}

fn assign_into(target: &mut Value, segments: &[&str], value: Value) {
    match segments.split_first() {
        None => *target = value,
        Some((head, rest)) => {
            if !target.is_object() {
                *target = Value::Object(Map::new());
            }
            if let Value::Object(map) = target {
                assign_into(
                    map.entry(head.to_string()).or_insert(Value::Null),
                    rest,
                    value,
                );
            }
        }
    }
}

fn parse_literal(expression: &str) -> Option<Value> {
    if expression.len() >= 2 && expression.starts_with('\'') && expression.ends_with('\'') {
        return Some(Value::String(expression[1..expression.len() - 1].to_string()));
    }

    if expression == "undefined" {
        return Some(Value::Null);
    }

    serde_json::from_str(expression).ok()
}

/// Position of a top-level `=` which is not part of a comparison operator.
fn find_assignment(expression: &str) -> Option<usize> {
    let bytes = expression.as_bytes();
    let mut depth = 0_i32;
    let mut quote = None;

    for (index, &byte) in bytes.iter().enumerate() {
        match (quote, byte) {
            (Some(open), _) if byte == open => quote = None,
            (Some(_), _) => {}
            (None, b'\'' | b'"') => quote = Some(byte),
            (None, b'(' | b'[' | b'{') => depth += 1,
            (None, b')' | b']' | b'}') => depth -= 1,
            (None, b'=') if depth == 0 => {
                let previous = index.checked_sub(1).map(|index| bytes[index]);
                let next = bytes.get(index + 1);
                if !matches!(previous, Some(b'=' | b'!' | b'<' | b'>')) && next != Some(&b'=') {
                    return Some(index);
                }
            }
            _ => {}
        }
    }

    None
}

fn split_top_level(input: &str, separator: char) -> Vec<&str> {
    let mut parts = vec![];
    let mut depth = 0_i32;
    let mut quote = None;
    let mut start = 0;

    for (index, character) in input.char_indices() {
        match (quote, character) {
            (Some(open), _) if character == open => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(character),
            (None, '(' | '[' | '{') => depth += 1,
            (None, ')' | ']' | '}') => depth -= 1,
            (None, character) if character == separator && depth == 0 => {
                parts.push(&input[start..index]);
                start = index + character.len_utf8();
            }
            _ => {}
        }
    }

    parts.push(&input[start..]);
    parts
}

type SharedObserveCallback = Rc<RefCell<ObserveCallback>>;

struct Observer {
    id: usize,
    name: String,
    callback: SharedObserveCallback,
}

/// Attributes of an element, keyed by their template form (`title`, `[item]`, `(save)`).
pub struct TestAttributes {
    scope: Rc<TestScope>,
    values: RefCell<IndexMap<String, String>>,
    observers: Rc<RefCell<Vec<Observer>>>,
    next_id: Cell<usize>,
}

impl TestAttributes {
    pub fn new(scope: Rc<TestScope>, values: &[(&str, &str)]) -> Rc<Self> {
        Rc::new(Self {
            scope,
            values: RefCell::new(
                values
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect(),
            ),
            observers: Default::default(),
            next_id: Cell::new(0),
        })
    }

    /// Simulates an interpolation change, notifying observers synchronously. String values are
    /// also stored as the raw attribute value.
    pub fn set_value(&self, name: &str, value: Value) -> Result<(), Error> {
        if let Value::String(raw) = &value {
            self.values
                .borrow_mut()
                .insert(name.to_string(), raw.clone());
        }

        for callback in self.callbacks(name) {
            (*callback.borrow_mut())(&value)?;
        }

        Ok(())
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    fn callbacks(&self, name: &str) -> Vec<SharedObserveCallback> {
        self.observers
            .borrow()
            .iter()
            .filter(|observer| observer.name == name)
            .map(|observer| observer.callback.clone())
            .collect()
    }
}

impl Attributes for TestAttributes {
    fn get(&self, name: &str) -> Option<String> {
        self.values.borrow().get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) {
        if let Err(error) = self.set_value(name, Value::String(value.to_string())) {
            warn!(name, %error, "Attribute observer failed.");
        }
    }

    fn observe(&self, name: &str, callback: ObserveCallback) -> Disposer {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let callback = Rc::new(RefCell::new(callback));
        self.observers.borrow_mut().push(Observer {
            id,
            name: name.to_string(),
            callback: callback.clone(),
        });

        let observers = Rc::downgrade(&self.observers);
        let scope = Rc::downgrade(&self.scope);
        let raw = self.get(name);
        self.scope.eval_async(Box::new(move || {
            let registered = observers
                .upgrade()
                .map(|observers| is_registered(&observers, id))
                .unwrap_or(false);
            match (registered, raw, scope.upgrade()) {
                (true, Some(raw), Some(scope)) => {
                    (*callback.borrow_mut())(&scope.interpolate(&raw))
                }
                _ => Ok(()),
            }
        }));

        let observers = Rc::downgrade(&self.observers);
        Box::new(move || {
            if let Some(observers) = observers.upgrade() {
                observers.borrow_mut().retain(|observer| observer.id != id);
            }
        })
    }
}

fn is_registered(observers: &RefCell<Vec<Observer>>, id: usize) -> bool {
    observers.borrow().iter().any(|observer| observer.id == id)
}

/// Event dispatched through [TestElement::trigger].
#[derive(Debug, Default)]
pub struct TestEvent {
    value: Value,
    prevented: Cell<usize>,
}

impl TestEvent {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            prevented: Cell::new(0),
        }
    }

    #[inline]
    pub fn is_default_prevented(&self) -> bool {
        self.prevented.get() > 0
    }

    /// How many times `prevent_default` was called.
    #[inline]
    pub fn prevent_default_count(&self) -> usize {
        self.prevented.get()
    }
}

impl DomEvent for TestEvent {
    fn value(&self) -> Value {
        self.value.clone()
    }

    fn prevent_default(&self) {
        self.prevented.set(self.prevented.get() + 1);
    }
}

struct ConfiguredQuery {
    target: QueryTarget,
    view: bool,
    matches: Vec<QueryMatch>,
}

/// Element recording attributes, properties, classes, listeners and data set on it.
#[derive(Default)]
pub struct TestElement {
    attributes: RefCell<IndexMap<String, String>>,
    properties: RefCell<IndexMap<String, Value>>,
    classes: RefCell<IndexSet<String>>,
    listeners: RefCell<Vec<(ListenerId, String, EventHandler)>>,
    next_listener: Cell<usize>,
    data: RefCell<HashMap<String, InstancePtr>>,
    globals: RefCell<HashMap<GlobalTarget, Rc<TestElement>>>,
    queries: RefCell<Vec<ConfiguredQuery>>,
}

impl TestElement {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// The element standing for a global listener target, created on first use.
    pub fn global_element(&self, target: GlobalTarget) -> Rc<TestElement> {
        self.globals
            .borrow_mut()
            .entry(target)
            .or_insert_with(TestElement::new)
            .clone()
    }

    /// Configures what a query for the given target returns.
    pub fn set_query_result(&self, target: QueryTarget, view: bool, matches: Vec<QueryMatch>) {
        self.queries.borrow_mut().push(ConfiguredQuery {
            target,
            view,
            matches,
        });
    }

    /// Dispatches an event to all listeners, stopping at the first error.
    pub fn trigger(&self, event: &str, payload: &TestEvent) -> Result<(), Error> {
        let handlers = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, name, _)| name == event)
            .map(|(_, _, handler)| handler.clone())
            .collect::<Vec<_>>();

        for handler in handlers {
            handler(payload)?;
        }

        Ok(())
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(_, name, _)| name == event)
            .count()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    pub fn property(&self, name: &str) -> Value {
        self.properties
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or(Value::Null)
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.borrow().contains(name)
    }

    pub fn has_data(&self, key: &str) -> bool {
        self.data.borrow().contains_key(key)
    }
}

impl Element for TestElement {
    fn set_attribute(&self, name: &str, value: Option<&str>) {
        let mut attributes = self.attributes.borrow_mut();
        match value {
            Some(value) => {
                attributes.insert(name.to_string(), value.to_string());
            }
            None => {
                attributes.shift_remove(name);
            }
        }
    }

    fn set_property(&self, name: &str, value: Value) {
        self.properties.borrow_mut().insert(name.to_string(), value);
    }

    fn toggle_class(&self, name: &str, enabled: bool) {
        let mut classes = self.classes.borrow_mut();
        if enabled {
            classes.insert(name.to_string());
        } else {
            classes.shift_remove(name);
        }
    }

    fn on(&self, event: &str, handler: EventHandler) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners
            .borrow_mut()
            .push((id, event.to_string(), handler));
        id
    }

    fn off(&self, event: &str, listener: ListenerId) {
        self.listeners
            .borrow_mut()
            .retain(|(id, name, _)| !(*id == listener && name == event));
    }

    fn global(&self, target: GlobalTarget) -> ElementPtr {
        self.global_element(target)
    }

    fn query(&self, target: &QueryTarget, _descendants: bool, view: bool) -> Vec<QueryMatch> {
        self.queries
            .borrow()
            .iter()
            .filter(|query| query.target == *target && query.view == view)
            .flat_map(|query| query.matches.iter().cloned())
            .collect()
    }

    fn data(&self, key: &str) -> Option<InstancePtr> {
        self.data.borrow().get(key).cloned()
    }

    fn set_data(&self, key: &str, value: Option<InstancePtr>) {
        let mut data = self.data.borrow_mut();
        match value {
            Some(value) => {
                data.insert(key.to_string(), value);
            }
            None => {
                data.remove(key);
            }
        }
    }
}

#[derive(thiserror::Error, Clone, Debug)]
#[error("Unknown provider: {0}")]
pub struct UnknownProvider(pub String);

/// Injector backed by a name to instance map.
#[derive(Default)]
pub struct TestInjector {
    instances: RefCell<HashMap<String, InstancePtr>>,
}

impl TestInjector {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn register<T: 'static>(&self, name: &str, instance: T) {
        self.register_instance(name, Rc::new(instance));
    }

    pub fn register_instance(&self, name: &str, instance: InstancePtr) {
        self.instances
            .borrow_mut()
            .insert(name.to_string(), instance);
    }
}

impl Injector for TestInjector {
    fn get(&self, name: &str) -> Result<InstancePtr, ErrorPtr> {
        self.instances
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| Rc::new(UnknownProvider(name.to_string())) as ErrorPtr)
    }

    fn has(&self, name: &str) -> bool {
        self.instances.borrow().contains_key(name)
    }
}
