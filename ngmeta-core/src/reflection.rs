//! Explicit side-tables replacing ambient class reflection. Annotations are stored per class
//! identity and are never inherited - each class owns its own slots.

use crate::key_registry::KeyRegistry;
use crate::metadata::Annotation;
use crate::types::Type;
use fxhash::FxHashMap;
use indexmap::IndexMap;
use std::any::TypeId;

/// Annotations of a single constructor parameter. `None` marks a parameter without annotations.
pub type ParamAnnotations = Option<Vec<Annotation>>;

/// Annotations of all properties of a class, in first-decoration order.
pub type PropAnnotations = IndexMap<String, Vec<Annotation>>;

/// Process-wide storage of class metadata. Pure storage - no validation takes place here.
#[derive(Clone, Debug, Default)]
pub struct ReflectionStore {
    class_annotations: FxHashMap<TypeId, Vec<Annotation>>,
    param_annotations: FxHashMap<TypeId, Vec<ParamAnnotations>>,
    prop_annotations: FxHashMap<TypeId, PropAnnotations>,
    method_injections: FxHashMap<(TypeId, String), Vec<Option<String>>>,
}

impl ReflectionStore {
    #[inline]
    pub fn class_annotations(&self, class: &Type) -> Option<&[Annotation]> {
        self.class_annotations
            .get(&class.id())
            .map(|annotations| annotations.as_slice())
    }

    #[inline]
    pub fn set_class_annotations(&mut self, class: &Type, annotations: Vec<Annotation>) {
        self.class_annotations.insert(class.id(), annotations);
    }

    pub(crate) fn class_annotations_mut(&mut self, class: &Type) -> &mut Vec<Annotation> {
        self.class_annotations.entry(class.id()).or_default()
    }

    #[inline]
    pub fn param_annotations(&self, class: &Type) -> Option<&[ParamAnnotations]> {
        self.param_annotations
            .get(&class.id())
            .map(|annotations| annotations.as_slice())
    }

    #[inline]
    pub fn set_param_annotations(&mut self, class: &Type, annotations: Vec<ParamAnnotations>) {
        self.param_annotations.insert(class.id(), annotations);
    }

    pub(crate) fn param_annotations_mut(&mut self, class: &Type) -> &mut Vec<ParamAnnotations> {
        self.param_annotations.entry(class.id()).or_default()
    }

    #[inline]
    pub fn prop_annotations(&self, class: &Type) -> Option<&PropAnnotations> {
        self.prop_annotations.get(&class.id())
    }

    #[inline]
    pub fn set_prop_annotations(&mut self, class: &Type, annotations: PropAnnotations) {
        self.prop_annotations.insert(class.id(), annotations);
    }

    pub(crate) fn prop_annotations_mut(&mut self, class: &Type) -> &mut PropAnnotations {
        self.prop_annotations.entry(class.id()).or_default()
    }

    #[inline]
    pub fn method_injections(&self, class: &Type, method: &str) -> Option<&[Option<String>]> {
        self.method_injections
            .get(&(class.id(), method.to_string()))
            .map(|tokens| tokens.as_slice())
    }

    #[inline]
    pub fn set_method_injections(
        &mut self,
        class: &Type,
        method: &str,
        tokens: Vec<Option<String>>,
    ) {
        self.method_injections
            .insert((class.id(), method.to_string()), tokens);
    }
}

/// Decoration-time context: the reflection side-tables together with the key registry used to
/// backfill missing injectable ids. Created once per application instance.
#[derive(Clone, Debug, Default)]
pub struct Reflector {
    store: ReflectionStore,
    keys: KeyRegistry,
}

impl Reflector {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn store(&self) -> &ReflectionStore {
        &self.store
    }

    #[inline]
    pub fn store_mut(&mut self) -> &mut ReflectionStore {
        &mut self.store
    }

    #[inline]
    pub fn keys(&self) -> &KeyRegistry {
        &self.keys
    }

    #[inline]
    pub fn keys_mut(&mut self) -> &mut KeyRegistry {
        &mut self.keys
    }

    /// Class annotations, or an empty slice for undecorated classes.
    pub fn annotations(&self, class: &Type) -> &[Annotation] {
        self.store.class_annotations(class).unwrap_or_default()
    }

    /// Injection list eagerly computed for parameters of a method.
    pub fn method_dependencies(&self, class: &Type, method: &str) -> Option<Vec<Option<String>>> {
        self.store
            .method_injections(class, method)
            .map(|tokens| tokens.to_vec())
    }
}
