//! Bindings between a controller and the template attributes of its element.
//!
//! Declarations come from `inputs`, `outputs` and `attrs` and have the form `prop`, `prop: attr` or
//! `prop: <attr` (with `<`, `=` or `@`). An explicit mode wins ("type by declaration"); otherwise
//! the mode is taken from the attribute form present in the template ("type by template"): `attr`
//! means `@`, `[attr]` means `<` and `[(attr)]` means `=`.

pub mod changes;
pub mod emitter;

use crate::binding::changes::{ChangesRecorder, SimpleChange, SimpleChanges};
use crate::binding::emitter::EventEmitter;
use crate::controller::ControllerPtr;
use crate::element::Attributes;
use crate::error::Error;
use crate::scope::{Disposer, ScopePtr};
use indexmap::IndexMap;
use itertools::Itertools;
use serde_json::Value;
use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BindingMode {
    /// `<`
    OneWay,
    /// `=`
    TwoWay,
    /// `@`
    Attr,
    /// `&`
    Output,
}

impl BindingMode {
    pub fn from_sigil(sigil: char) -> Option<Self> {
        match sigil {
            '<' => Some(BindingMode::OneWay),
            '=' => Some(BindingMode::TwoWay),
            '@' => Some(BindingMode::Attr),
            '&' => Some(BindingMode::Output),
            _ => None,
        }
    }

    pub fn sigil(&self) -> char {
        match self {
            BindingMode::OneWay => '<',
            BindingMode::TwoWay => '=',
            BindingMode::Attr => '@',
            BindingMode::Output => '&',
        }
    }

}

impl Display for BindingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sigil())
    }
}

/// A single parsed declaration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BindingDeclaration {
    pub property: String,
    pub attr_name: String,
    /// Explicit mode, if declared.
    pub mode: Option<BindingMode>,
}

impl BindingDeclaration {
    /// Parses `prop`, `prop: attr` or `prop: <attr`.
    pub fn parse(field: &str) -> Self {
        let (property, attr) = field
            .split_once(':')
            .map(|(property, attr)| (property.trim(), attr.trim()))
            .unwrap_or((field.trim(), ""));

        let mut chars = attr.chars();
        let (mode, attr_name) = match chars.next().and_then(BindingMode::from_sigil) {
            Some(mode) => (Some(mode), chars.as_str().trim()),
            None => (None, attr),
        };

        Self {
            property: property.to_string(),
            attr_name: if attr_name.is_empty() {
                property.to_string()
            } else {
                attr_name.to_string()
            },
            mode,
        }
    }

    /// Formats back into the declaration form.
    pub fn to_field(&self) -> String {
        match self.mode {
            Some(mode) => format!("{}: {}{}", self.property, mode, self.attr_name),
            None if self.attr_name != self.property => {
                format!("{}: {}", self.property, self.attr_name)
            }
            None => self.property.clone(),
        }
    }
}

/// Declarations of a directive, grouped by origin.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ParsedBindings {
    pub inputs: Vec<BindingDeclaration>,
    pub outputs: Vec<BindingDeclaration>,
    pub attrs: Vec<BindingDeclaration>,
}

impl ParsedBindings {
    pub fn parse(inputs: &[String], outputs: &[String], attrs: &[String]) -> Self {
        let parse_all = |fields: &[String]| {
            fields
                .iter()
                .map(|field| BindingDeclaration::parse(field))
                .collect_vec()
        };

        Self {
            inputs: parse_all(inputs),
            outputs: parse_all(outputs),
            attrs: parse_all(attrs),
        }
    }

    /// Legacy `bindToController` map: property to `<sigil><attr>`.
    pub fn legacy_map(&self) -> IndexMap<String, String> {
        let inputs = self.inputs.iter().map(|declaration| {
            let mode = declaration.mode.unwrap_or(BindingMode::OneWay);
            (declaration.property.clone(), format!("{mode}{}", declaration.attr_name))
        });
        let attrs = self.attrs.iter().map(|declaration| {
            (declaration.property.clone(), format!("@{}", declaration.attr_name))
        });
        let outputs = self.outputs.iter().map(|declaration| {
            (declaration.property.clone(), format!("&{}", declaration.attr_name))
        });

        inputs.chain(attrs).chain(outputs).collect()
    }

    /// Resolves the effective bindings against the attributes present on the element. Declarations
    /// without a matching attribute produce no binding, apart from outputs which always get an
    /// emitter.
    pub fn resolve(&self, attributes: &dyn Attributes) -> Vec<Binding> {
        let inputs = self
            .inputs
            .iter()
            .filter_map(|declaration| match declaration.mode {
                Some(mode) => find_declared_input(declaration, mode, attributes),
                None => INPUT_MODES.into_iter().find_map(|mode| {
                    let name = template_name(mode, &declaration.attr_name);
                    attributes
                        .get(&name)
                        .map(|expression| Binding::new(declaration, mode, expression))
                }),
            });

        let attrs = self.attrs.iter().filter_map(|declaration| {
            find_binding(declaration, BindingMode::Attr, attributes)
        });

        let outputs = self.outputs.iter().map(|declaration| {
            find_binding(declaration, BindingMode::Output, attributes).unwrap_or_else(|| Binding {
                property: declaration.property.clone(),
                attr_name: declaration.attr_name.clone(),
                mode: BindingMode::Output,
                expression: None,
            })
        });

        inputs.chain(attrs).chain(outputs).collect()
    }
}

/// Template forms an input can take, in lookup precedence.
const INPUT_MODES: [BindingMode; 3] = [BindingMode::Attr, BindingMode::OneWay, BindingMode::TwoWay];

fn template_name(mode: BindingMode, attr_name: &str) -> String {
    match mode {
        BindingMode::OneWay => format!("[{attr_name}]"),
        BindingMode::TwoWay => format!("[({attr_name})]"),
        BindingMode::Attr => attr_name.to_string(),
        BindingMode::Output => format!("({attr_name})"),
    }
}

fn find_binding(
    declaration: &BindingDeclaration,
    mode: BindingMode,
    attributes: &dyn Attributes,
) -> Option<Binding> {
    attributes
        .get(&template_name(mode, &declaration.attr_name))
        .map(|expression| Binding::new(declaration, mode, expression))
}

/// An input with a declared mode keeps that mode, whichever input form the template uses. Its own
/// form is looked up first.
fn find_declared_input(
    declaration: &BindingDeclaration,
    mode: BindingMode,
    attributes: &dyn Attributes,
) -> Option<Binding> {
    let own = template_name(mode, &declaration.attr_name);
    let others = INPUT_MODES
        .into_iter()
        .map(|other| template_name(other, &declaration.attr_name))
        .filter(|name| *name != own);

    std::iter::once(own.clone())
        .chain(others)
        .find_map(|name| attributes.get(&name))
        .map(|expression| Binding::new(declaration, mode, expression))
}

/// An effective binding of a directive instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Binding {
    pub property: String,
    pub attr_name: String,
    pub mode: BindingMode,
    /// Parent expression, interpolation text for attribute bindings. Outputs without a bound
    /// expression hold `None`.
    pub expression: Option<String>,
}

impl Binding {
    fn new(declaration: &BindingDeclaration, mode: BindingMode, expression: String) -> Self {
        Self {
            property: declaration.property.clone(),
            attr_name: declaration.attr_name.clone(),
            mode,
            expression: Some(expression),
        }
    }
}

/// Everything needed to wire bindings of a single directive instance.
pub struct BindingContext {
    /// Scope the bound expressions are evaluated against.
    pub scope: ScopePtr,
    pub attributes: Rc<dyn Attributes>,
    pub controller: ControllerPtr,
    pub directive_name: String,
    pub is_component: bool,
    /// Inputs are treated as immutable and only replaced values are propagated.
    pub immutable: bool,
    /// Present if the controller implements `on_changes`.
    pub recorder: Option<ChangesRecorder>,
}

/// Result of [create_bindings].
#[derive(Default)]
pub struct CreatedBindings {
    pub initial_changes: SimpleChanges,
    pub disposers: Vec<Disposer>,
}

/// Creates watchers, observers and emitters for all bindings.
pub fn create_bindings(
    context: &BindingContext,
    bindings: &[Binding],
) -> Result<CreatedBindings, Error> {
    let mut created = CreatedBindings::default();

    for binding in bindings {
        trace!(
            directive = %context.directive_name,
            property = %binding.property,
            mode = %binding.mode,
            "Creating binding."
        );

        match (binding.mode, &binding.expression) {
            (BindingMode::Output, expression) => {
                let emitter = match expression {
                    Some(expression) => EventEmitter::bound(context.scope.clone(), expression),
                    None => EventEmitter::noop(),
                };
                context
                    .controller
                    .borrow_mut()
                    .set_output(&binding.property, emitter);
            }
            (BindingMode::Attr, Some(text)) => {
                create_attr_binding(context, binding, text, &mut created);
            }
            (BindingMode::OneWay, Some(expression)) => {
                create_one_way_binding(context, binding, expression, &mut created);
            }
            (BindingMode::TwoWay, Some(expression)) => {
                if !context.is_component {
                    return Err(Error::TwoWayBindingOnDirective {
                        directive: context.directive_name.clone(),
                        property: binding.property.clone(),
                    });
                }

                create_two_way_binding(context, binding, expression, &mut created);
            }
            (_, None) => {}
        }
    }

    debug!(
        directive = %context.directive_name,
        bindings = bindings.len(),
        "Created bindings."
    );

    Ok(created)
}

fn create_attr_binding(
    context: &BindingContext,
    binding: &Binding,
    text: &str,
    created: &mut CreatedBindings,
) {
    let initial = context.scope.interpolate(text);
    context
        .controller
        .borrow_mut()
        .set_property(&binding.property, initial.clone());
    created
        .initial_changes
        .insert(binding.property.clone(), SimpleChange::first(initial));

    let controller = context.controller.clone();
    let recorder = context.recorder.clone();
    let property = binding.property.clone();
    let disposer = context.attributes.observe(
        &binding.attr_name,
        Box::new(move |value| {
            if !matches!(value, Value::String(_) | Value::Bool(_)) {
                return Ok(());
            }

            let previous = controller.borrow().property(&property);
            if let Some(recorder) = &recorder {
                recorder.record(&property, value, &previous);
            }
            controller
                .borrow_mut()
                .set_property(&property, value.clone());
            Ok(())
        }),
    );

    created.disposers.push(disposer);
}

fn create_one_way_binding(
    context: &BindingContext,
    binding: &Binding,
    expression: &str,
    created: &mut CreatedBindings,
) {
    let initial = context.scope.eval(expression, None);
    context
        .controller
        .borrow_mut()
        .set_property(&binding.property, initial.clone());
    created
        .initial_changes
        .insert(binding.property.clone(), SimpleChange::first(initial.clone()));

    let controller = context.controller.clone();
    let recorder = context.recorder.clone();
    let property = binding.property.clone();
    let disposer = context.scope.watch(
        expression,
        Box::new(move |new_value, old_value| {
            let mut old_value = old_value;
            if new_value == old_value {
                if *new_value == initial {
                    return Ok(());
                }
                old_value = &initial;
            }

            if let Some(recorder) = &recorder {
                recorder.record(&property, new_value, old_value);
            }
            controller
                .borrow_mut()
                .set_property(&property, new_value.clone());
            Ok(())
        }),
        // assigned values are copies, so only structural comparison sees nested mutations
        !context.immutable,
    );

    created.disposers.push(disposer);
}

fn create_two_way_binding(
    context: &BindingContext,
    binding: &Binding,
    expression: &str,
    created: &mut CreatedBindings,
) {
    let initial = context.scope.eval(expression, None);
    context
        .controller
        .borrow_mut()
        .set_property(&binding.property, initial.clone());
    created
        .initial_changes
        .insert(binding.property.clone(), SimpleChange::first(initial.clone()));

    let last_value = Rc::new(RefCell::new(initial));
    let scope = context.scope.clone();
    let controller = context.controller.clone();
    let recorder = context.recorder.clone();
    let property = binding.property.clone();
    let expression = expression.to_string();
    let directive_name = context.directive_name.clone();

    let disposer = context.scope.watch_fn(
        Box::new(move || {
            let mut parent_value = scope.eval(&expression, None);
            let child_value = controller.borrow().property(&property);

            if parent_value != child_value {
                if parent_value != *last_value.borrow() {
                    if let Some(recorder) = &recorder {
                        recorder.record(&property, &parent_value, &child_value);
                    }
                    controller
                        .borrow_mut()
                        .set_property(&property, parent_value.clone());
                } else if scope.is_assignable(&expression) {
                    parent_value = child_value;
                    scope.assign(&expression, parent_value.clone());
                } else {
                    let current = scope.eval(&expression, None);
                    *last_value.borrow_mut() = current.clone();
                    controller.borrow_mut().set_property(&property, current);

                    return Err(Error::NonAssignableExpression {
                        expression: expression.clone(),
                        property: property.clone(),
                        directive: directive_name.clone(),
                    });
                }
            }

            *last_value.borrow_mut() = parent_value.clone();
            Ok(parent_value)
        }),
        Box::new(|_, _| Ok(())),
    );

    created.disposers.push(disposer);
}
