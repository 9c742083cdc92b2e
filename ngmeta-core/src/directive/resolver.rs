use crate::binding::BindingDeclaration;
use crate::error::Error;
use crate::metadata::{Annotation, ComponentMetadata, DirectiveMetadata};
use crate::provider::primary_annotation;
use crate::reflection::Reflector;
use crate::types::Type;
use itertools::Itertools;
use tracing::trace;

/// Class-level directive metadata merged with property-level decorators.
#[derive(Clone, Debug)]
pub enum ResolvedDirective {
    Directive(DirectiveMetadata),
    Component(ComponentMetadata),
}

impl ResolvedDirective {
    pub fn directive(&self) -> &DirectiveMetadata {
        match self {
            ResolvedDirective::Directive(metadata) => metadata,
            ResolvedDirective::Component(metadata) => &metadata.directive,
        }
    }

    fn directive_mut(&mut self) -> &mut DirectiveMetadata {
        match self {
            ResolvedDirective::Directive(metadata) => metadata,
            ResolvedDirective::Component(metadata) => &mut metadata.directive,
        }
    }

    pub fn component(&self) -> Option<&ComponentMetadata> {
        match self {
            ResolvedDirective::Component(metadata) => Some(metadata),
            ResolvedDirective::Directive(_) => None,
        }
    }

    #[inline]
    pub fn is_component(&self) -> bool {
        matches!(self, ResolvedDirective::Component(_))
    }
}

pub struct DirectiveResolver<'a> {
    reflector: &'a Reflector,
}

impl<'a> DirectiveResolver<'a> {
    pub fn new(reflector: &'a Reflector) -> Self {
        Self { reflector }
    }

    /// Merges class and property metadata of a `@Directive` or `@Component` class. Class-level
    /// declarations come first; properties already declared there are not repeated.
    pub fn resolve(&self, class: &Type) -> Result<ResolvedDirective, Error> {
        let annotations = self.reflector.annotations(class);
        if annotations.is_empty() {
            return Err(Error::UndecoratedClass(class.name().to_string()));
        }

        let mut resolved = match primary_annotation(class, annotations)? {
            Annotation::Directive(metadata) => ResolvedDirective::Directive(metadata.clone()),
            Annotation::Component(metadata) => ResolvedDirective::Component(metadata.clone()),
            _ => return Err(Error::NotAType(format!("directive {}", class.name()))),
        };

        if let Some(properties) = self.reflector.store().prop_annotations(class) {
            let metadata = resolved.directive_mut();
            for (property, annotations) in properties {
                for annotation in annotations {
                    merge_property(metadata, property, annotation);
                }
            }
        }

        trace!(class = class.name(), "Resolved directive metadata.");

        Ok(resolved)
    }
}

fn merge_property(metadata: &mut DirectiveMetadata, property: &str, annotation: &Annotation) {
    match annotation {
        Annotation::Input(input) => {
            push_declaration(&mut metadata.inputs, property, input.binding_name.as_deref())
        }
        Annotation::Output(output) => {
            push_declaration(&mut metadata.outputs, property, output.binding_name.as_deref())
        }
        Annotation::Attr(attr) => {
            push_declaration(&mut metadata.attrs, property, attr.binding_name.as_deref())
        }
        Annotation::HostBinding(binding) => {
            let name = binding.host_property_name.as_deref().unwrap_or(property);
            metadata
                .host
                .entry(format!("[{name}]"))
                .or_insert_with(|| property.to_string());
        }
        Annotation::HostListener(listener) => {
            metadata
                .host
                .entry(format!("({})", listener.event_name))
                .or_insert_with(|| format!("{property}({})", listener.args.iter().join(", ")));
        }
        Annotation::Query(query) => {
            metadata
                .queries
                .entry(property.to_string())
                .or_insert_with(|| query.clone());
        }
        _ => {}
    }
}

fn push_declaration(declarations: &mut Vec<String>, property: &str, binding_name: Option<&str>) {
    let declared = declarations
        .iter()
        .any(|declaration| BindingDeclaration::parse(declaration).property == property);
    if declared {
        return;
    }

    declarations.push(match binding_name {
        Some(binding_name) => format!("{property}: {binding_name}"),
        None => property.to_string(),
    });
}
