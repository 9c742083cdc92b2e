//! Host element bindings: static attributes, class/attribute/property bindings driven by
//! controller properties and event listeners calling controller methods.

use crate::controller::ControllerPtr;
use crate::element::{DomEvent, ElementPtr, GlobalTarget, ListenerId};
use crate::error::Error;
use crate::scope::{is_truthy, Disposer, ScopePtr};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::rc::Rc;
use tracing::trace;

static HOST_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\[([^\]]+)\])$|^(?:\(([^\)]+)\))$").unwrap());

static LISTENER_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([\w$]+)\s*(?:\((.*)\))?\s*$").unwrap());

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HostBindingTarget {
    Class(String),
    Attribute(String),
    Property(String),
}

/// A host binding driven by a controller property.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HostPropertyBinding {
    pub target: HostBindingTarget,
    pub property: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EventArgument {
    /// `$event`
    Event,
    /// `$event.some.path`
    Path(Vec<String>),
}

impl EventArgument {
    fn parse(method: &str, argument: &str) -> Result<Self, Error> {
        let argument = argument.trim();
        if argument == "$event" {
            return Ok(EventArgument::Event);
        }

        argument
            .strip_prefix("$event.")
            .filter(|path| !path.is_empty())
            .map(|path| EventArgument::Path(path.split('.').map(str::to_string).collect()))
            .ok_or_else(|| Error::UnsupportedEventParam {
                method: method.to_string(),
                argument: argument.to_string(),
            })
    }

    pub fn resolve(&self, event: &Value) -> Value {
        match self {
            EventArgument::Event => event.clone(),
            EventArgument::Path(path) => path
                .iter()
                .try_fold(event, |value, segment| value.get(segment))
                .cloned()
                .unwrap_or(Value::Null),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HostListener {
    pub event: String,
    pub target: Option<GlobalTarget>,
    pub method: String,
    pub arguments: Vec<EventArgument>,
}

/// The `host` map split by key shape.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ParsedHostBindings {
    pub attributes: IndexMap<String, String>,
    pub bindings: Vec<HostPropertyBinding>,
    pub listeners: Vec<HostListener>,
}

impl ParsedHostBindings {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.bindings.is_empty() && self.listeners.is_empty()
    }
}

/// Parses `[binding]`, `(event)` and static attribute keys of a `host` map.
pub fn parse_host_bindings(host: &IndexMap<String, String>) -> Result<ParsedHostBindings, Error> {
    let mut parsed = ParsedHostBindings::default();

    for (key, value) in host {
        match HOST_KEY.captures(key) {
            Some(captures) => {
                if let Some(binding) = captures.get(1) {
                    parsed.bindings.push(parse_binding(binding.as_str(), value));
                } else if let Some(event) = captures.get(2) {
                    parsed.listeners.push(parse_listener(key, event.as_str(), value)?);
                }
            }
            None => {
                parsed.attributes.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(parsed)
}

fn parse_binding(binding: &str, property: &str) -> HostPropertyBinding {
    let binding = binding.trim();
    let target = if let Some(class) = binding.strip_prefix("class.") {
        HostBindingTarget::Class(class.to_string())
    } else if let Some(attribute) = binding.strip_prefix("attr.") {
        HostBindingTarget::Attribute(attribute.to_string())
    } else {
        HostBindingTarget::Property(binding.to_string())
    };

    HostPropertyBinding {
        target,
        property: property.trim().to_string(),
    }
}

fn parse_listener(key: &str, event: &str, expression: &str) -> Result<HostListener, Error> {
    let (target, event) = match event.split_once(':') {
        Some((target, event)) => match GlobalTarget::parse(target.trim()) {
            Some(target) => (Some(target), event.trim()),
            None => (None, event.trim()),
        },
        None => (None, event.trim()),
    };

    let captures = LISTENER_CALL
        .captures(expression)
        .ok_or_else(|| Error::MalformedHostListener {
            key: key.to_string(),
            expression: expression.to_string(),
        })?;

    let method = captures[1].to_string();
    let arguments = captures
        .get(2)
        .map(|arguments| arguments.as_str())
        .filter(|arguments| !arguments.trim().is_empty())
        .map(|arguments| {
            arguments
                .split(',')
                .map(|argument| EventArgument::parse(&method, argument))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?
        .unwrap_or_default();

    Ok(HostListener {
        event: event.to_string(),
        target,
        method,
        arguments,
    })
}

/// A listener attached during setup, to be removed on destroy.
pub struct AttachedListener {
    pub element: ElementPtr,
    pub event: String,
    pub id: ListenerId,
}

impl AttachedListener {
    pub fn detach(self) {
        self.element.off(&self.event, self.id);
    }
}

/// Sets static attributes once.
pub fn apply_static_attributes(host: &ParsedHostBindings, element: &ElementPtr) {
    for (name, value) in &host.attributes {
        element.set_attribute(name, Some(value));
    }
}

/// Registers watchers keeping host bindings in sync with the controller.
pub fn watch_host_bindings(
    host: &ParsedHostBindings,
    scope: &ScopePtr,
    element: &ElementPtr,
    controller: &ControllerPtr,
) -> Vec<Disposer> {
    host.bindings
        .iter()
        .map(|binding| {
            let getter_controller = controller.clone();
            let property = binding.property.clone();
            let element = element.clone();
            let target = binding.target.clone();

            scope.watch_fn(
                Box::new(move || Ok(getter_controller.borrow().property(&property))),
                Box::new(move |value, _| {
                    match &target {
                        HostBindingTarget::Class(class) => {
                            element.toggle_class(class, is_truthy(value))
                        }
                        HostBindingTarget::Attribute(attribute) => match value {
                            Value::Null | Value::Bool(false) => {
                                element.set_attribute(attribute, None)
                            }
                            Value::String(value) => element.set_attribute(attribute, Some(value)),
                            value => element.set_attribute(attribute, Some(&value.to_string())),
                        },
                        HostBindingTarget::Property(name) => {
                            element.set_property(name, value.clone())
                        }
                    }
                    Ok(())
                }),
            )
        })
        .collect()
}

/// Attaches listeners calling controller methods. A method returning exactly `false` prevents the
/// default action. Every dispatch schedules a digest.
pub fn attach_host_listeners(
    host: &ParsedHostBindings,
    scope: &ScopePtr,
    element: &ElementPtr,
    controller: &ControllerPtr,
) -> Vec<AttachedListener> {
    host.listeners
        .iter()
        .map(|listener| {
            let target = match listener.target {
                Some(global) => element.global(global),
                None => element.clone(),
            };

            let handler_controller = controller.clone();
            let handler_scope = scope.clone();
            let method = listener.method.clone();
            let arguments = listener.arguments.clone();

            let id = target.on(
                &listener.event,
                Rc::new(move |event: &dyn DomEvent| {
                    let payload = event.value();
                    let args = arguments
                        .iter()
                        .map(|argument| argument.resolve(&payload))
                        .collect::<Vec<_>>();

                    trace!(%method, "Dispatching host listener.");

                    let result = handler_controller.borrow_mut().call(&method, &args)?;
                    if result == Value::Bool(false) {
                        event.prevent_default();
                    }

                    handler_scope.apply_async(None);
                    Ok(())
                }),
            );

            AttachedListener {
                element: target,
                event: listener.event.clone(),
                id,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::controller::ControllerPtr;
    use crate::directive::host::{
        attach_host_listeners, parse_host_bindings, EventArgument, HostBindingTarget,
        HostListener, HostPropertyBinding,
    };
    use crate::element::{ElementPtr, GlobalTarget};
    use crate::error::Error;
    use crate::scope::ScopePtr;
    use crate::testing::{TestController, TestElement, TestEvent, TestScope};
    use indexmap::IndexMap;
    use serde_json::{json, Value};

    fn host(entries: &[(&str, &str)]) -> IndexMap<String, String> {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn should_split_host_keys() {
        let parsed = parse_host_bindings(&host(&[
            ("role", "button"),
            ("[class.active]", "isActive"),
            ("[attr.aria-label]", "label"),
            ("[title]", "title"),
            ("(click)", "onClick($event, $event.target.value)"),
            ("(document: keyup)", "onKey()"),
        ]))
        .unwrap();

        assert_eq!(parsed.attributes["role"], "button");
        assert_eq!(
            parsed.bindings,
            [
                HostPropertyBinding {
                    target: HostBindingTarget::Class("active".to_string()),
                    property: "isActive".to_string(),
                },
                HostPropertyBinding {
                    target: HostBindingTarget::Attribute("aria-label".to_string()),
                    property: "label".to_string(),
                },
                HostPropertyBinding {
                    target: HostBindingTarget::Property("title".to_string()),
                    property: "title".to_string(),
                },
            ]
        );
        assert_eq!(
            parsed.listeners,
            [
                HostListener {
                    event: "click".to_string(),
                    target: None,
                    method: "onClick".to_string(),
                    arguments: vec![
                        EventArgument::Event,
                        EventArgument::Path(vec!["target".to_string(), "value".to_string()]),
                    ],
                },
                HostListener {
                    event: "keyup".to_string(),
                    target: Some(GlobalTarget::Document),
                    method: "onKey".to_string(),
                    arguments: vec![],
                },
            ]
        );
    }

    #[test]
    fn should_bind_other_keys_as_properties() {
        let parsed = parse_host_bindings(&host(&[("[style.color]", "color")])).unwrap();

        assert_eq!(
            parsed.bindings,
            [HostPropertyBinding {
                target: HostBindingTarget::Property("style.color".to_string()),
                property: "color".to_string(),
            }]
        );
    }

    #[test]
    fn should_reject_unsupported_arguments() {
        assert!(matches!(
            parse_host_bindings(&host(&[("(click)", "onClick(foo)")])).unwrap_err(),
            Error::UnsupportedEventParam { method, argument } if method == "onClick" && argument == "foo"
        ));
    }

    #[test]
    fn should_reject_malformed_listeners() {
        assert!(matches!(
            parse_host_bindings(&host(&[("(click)", "a + b")])).unwrap_err(),
            Error::MalformedHostListener { .. }
        ));
    }

    #[test]
    fn should_resolve_event_paths() {
        let event = json!({"target": {"value": "x"}});

        assert_eq!(
            EventArgument::Path(vec!["target".to_string(), "value".to_string()]).resolve(&event),
            json!("x")
        );
        assert_eq!(
            EventArgument::Path(vec!["missing".to_string()]).resolve(&event),
            json!(null)
        );
        assert_eq!(EventArgument::Event.resolve(&event), event);
    }

    #[test]
    fn should_prevent_default_only_on_false() {
        let scope = TestScope::new();
        let element = TestElement::new();
        let controller = TestController::shared();
        {
            let mut controller = controller.borrow_mut();
            controller.results.insert("zero".to_string(), json!(0));
            controller.results.insert("accept".to_string(), json!(true));
            controller.results.insert("cancel".to_string(), json!(false));
        }
        let parsed = parse_host_bindings(&host(&[
            ("(ignore)", "ignore()"),
            ("(zero)", "zero()"),
            ("(accept)", "accept()"),
            ("(cancel)", "cancel($event)"),
        ]))
        .unwrap();

        let scope_ptr: ScopePtr = scope.clone();
        let element_ptr: ElementPtr = element.clone();
        let controller_ptr: ControllerPtr = controller.clone();
        let listeners = attach_host_listeners(&parsed, &scope_ptr, &element_ptr, &controller_ptr);
        assert_eq!(listeners.len(), 4);

        for event in ["ignore", "zero", "accept"] {
            let payload = TestEvent::new(Value::Null);
            element.trigger(event, &payload).unwrap();
            assert!(!payload.is_default_prevented(), "{event} prevented default");
        }

        let payload = TestEvent::new(json!({"key": "Escape"}));
        element.trigger("cancel", &payload).unwrap();
        assert_eq!(payload.prevent_default_count(), 1);
        assert!(scope.is_digest_requested());

        let controller = controller.borrow();
        assert_eq!(controller.invocations.len(), 4);
        assert_eq!(
            controller.invocations[3],
            ("cancel".to_string(), vec![json!({"key": "Escape"})])
        );
    }
}
