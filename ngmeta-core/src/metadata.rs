//! Metadata instances attached to classes, constructor parameters and properties. Each decorator
//! produces exactly one [Annotation] variant; consumers match on [MetadataKind] instead of probing
//! runtime types.

use crate::provider::ProviderEntry;
use crate::token::ProviderToken;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// Discriminant of [Annotation].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MetadataKind {
    Inject,
    Optional,
    Host,
    SelfOnly,
    SkipSelf,
    Injectable,
    Directive,
    Component,
    Pipe,
    NgModule,
    RouteConfig,
    Input,
    Output,
    Attr,
    HostBinding,
    HostListener,
    Query,
}

impl MetadataKind {
    /// Kinds which define what a class is and how it gets registered.
    #[inline]
    pub fn is_role(&self) -> bool {
        matches!(
            self,
            MetadataKind::Injectable
                | MetadataKind::Directive
                | MetadataKind::Component
                | MetadataKind::Pipe
                | MetadataKind::NgModule
        )
    }

    /// Parameter modifiers which turn a dependency into a required sibling/ancestor directive.
    #[inline]
    pub fn is_locator(&self) -> bool {
        matches!(
            self,
            MetadataKind::Host | MetadataKind::SelfOnly | MetadataKind::SkipSelf
        )
    }
}

impl Display for MetadataKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MetadataKind::Inject => "Inject",
            MetadataKind::Optional => "Optional",
            MetadataKind::Host => "Host",
            MetadataKind::SelfOnly => "Self",
            MetadataKind::SkipSelf => "SkipSelf",
            MetadataKind::Injectable => "Injectable",
            MetadataKind::Directive => "Directive",
            MetadataKind::Component => "Component",
            MetadataKind::Pipe => "Pipe",
            MetadataKind::NgModule => "NgModule",
            MetadataKind::RouteConfig => "RouteConfig",
            MetadataKind::Input => "Input",
            MetadataKind::Output => "Output",
            MetadataKind::Attr => "Attr",
            MetadataKind::HostBinding => "HostBinding",
            MetadataKind::HostListener => "HostListener",
            MetadataKind::Query => "Query",
        };

        write!(f, "@{name}")
    }
}

#[derive(Clone, Debug)]
pub struct InjectMetadata {
    pub token: ProviderToken,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InjectableMetadata {
    /// Explicit id or the one generated by the key registry at decoration time.
    pub id: Option<String>,
}

/// Fields of the legacy directive definition object which should be taken verbatim.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LegacyDirectiveOptions {
    pub priority: Option<i32>,
    pub terminal: Option<bool>,
    pub restrict: Option<String>,
    pub transclude: Option<Transclude>,
    pub multi_element: Option<bool>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Transclude {
    Content,
    Element,
    Slots(IndexMap<String, String>),
}

#[derive(Clone, Debug, Default)]
pub struct DirectiveMetadata {
    pub selector: String,
    /// `"prop"`, `"prop: attr"` or `"prop: <attr"` / `"prop: =attr"` / `"prop: @attr"`.
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub attrs: Vec<String>,
    pub host: IndexMap<String, String>,
    pub providers: Vec<ProviderEntry>,
    pub queries: IndexMap<String, QueryMetadata>,
    pub legacy: LegacyDirectiveOptions,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ChangeDetectionStrategy {
    #[default]
    Default,
    /// Inputs are treated as immutable and only replaced values are propagated.
    OnPush,
}

#[derive(Clone, Debug, Default)]
pub struct ComponentMetadata {
    pub directive: DirectiveMetadata,
    pub template: Option<String>,
    pub template_url: Option<String>,
    pub view_providers: Vec<ProviderEntry>,
    pub change_detection: ChangeDetectionStrategy,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PipeMetadata {
    pub name: String,
    pub pure: bool,
}

impl PipeMetadata {
    pub fn new<T: ToString>(name: T) -> Self {
        Self {
            name: name.to_string(),
            pure: true,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct NgModuleMetadata {
    pub declarations: Vec<ProviderToken>,
    pub providers: Vec<ProviderEntry>,
    pub imports: Vec<ProviderToken>,
}

/// Routing annotation allowed next to a `@Component`. The payload is consumed by router glue.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RouteConfigMetadata {
    pub routes: Vec<Value>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InputMetadata {
    pub binding_name: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OutputMetadata {
    pub binding_name: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AttrMetadata {
    pub binding_name: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HostBindingMetadata {
    pub host_property_name: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HostListenerMetadata {
    pub event_name: String,
    pub args: Vec<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QueryKind {
    ContentChild,
    ContentChildren,
    ViewChild,
    ViewChildren,
}

#[derive(Clone, Debug)]
pub enum QuerySelector {
    Selector(String),
    Type(ProviderToken),
}

#[derive(Clone, Debug)]
pub struct QueryMetadata {
    pub kind: QueryKind,
    pub selector: QuerySelector,
    pub descendants: bool,
    pub first: bool,
}

impl QueryMetadata {
    pub fn new(kind: QueryKind, selector: QuerySelector) -> Self {
        let first = matches!(kind, QueryKind::ContentChild | QueryKind::ViewChild);
        Self {
            kind,
            selector,
            descendants: first,
            first,
        }
    }

    #[inline]
    pub fn is_view_query(&self) -> bool {
        matches!(self.kind, QueryKind::ViewChild | QueryKind::ViewChildren)
    }
}

/// A single metadata instance, as produced by one decorator application.
#[derive(Clone, Debug)]
pub enum Annotation {
    Inject(InjectMetadata),
    Optional,
    Host,
    SelfOnly,
    SkipSelf,
    Injectable(InjectableMetadata),
    Directive(DirectiveMetadata),
    Component(ComponentMetadata),
    Pipe(PipeMetadata),
    NgModule(NgModuleMetadata),
    RouteConfig(RouteConfigMetadata),
    Input(InputMetadata),
    Output(OutputMetadata),
    Attr(AttrMetadata),
    HostBinding(HostBindingMetadata),
    HostListener(HostListenerMetadata),
    Query(QueryMetadata),
}

impl Annotation {
    pub fn kind(&self) -> MetadataKind {
        match self {
            Annotation::Inject(_) => MetadataKind::Inject,
            Annotation::Optional => MetadataKind::Optional,
            Annotation::Host => MetadataKind::Host,
            Annotation::SelfOnly => MetadataKind::SelfOnly,
            Annotation::SkipSelf => MetadataKind::SkipSelf,
            Annotation::Injectable(_) => MetadataKind::Injectable,
            Annotation::Directive(_) => MetadataKind::Directive,
            Annotation::Component(_) => MetadataKind::Component,
            Annotation::Pipe(_) => MetadataKind::Pipe,
            Annotation::NgModule(_) => MetadataKind::NgModule,
            Annotation::RouteConfig(_) => MetadataKind::RouteConfig,
            Annotation::Input(_) => MetadataKind::Input,
            Annotation::Output(_) => MetadataKind::Output,
            Annotation::Attr(_) => MetadataKind::Attr,
            Annotation::HostBinding(_) => MetadataKind::HostBinding,
            Annotation::HostListener(_) => MetadataKind::HostListener,
            Annotation::Query(_) => MetadataKind::Query,
        }
    }

    /// Directive part of both `@Directive` and `@Component`.
    pub fn as_directive(&self) -> Option<&DirectiveMetadata> {
        match self {
            Annotation::Directive(metadata) => Some(metadata),
            Annotation::Component(metadata) => Some(&metadata.directive),
            _ => None,
        }
    }
}

macro_rules! annotation_from {
    ($($metadata:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$metadata> for Annotation {
                fn from(value: $metadata) -> Self {
                    Annotation::$variant(value)
                }
            }
        )*
    };
}

annotation_from! {
    InjectMetadata => Inject,
    InjectableMetadata => Injectable,
    DirectiveMetadata => Directive,
    ComponentMetadata => Component,
    PipeMetadata => Pipe,
    NgModuleMetadata => NgModule,
    RouteConfigMetadata => RouteConfig,
    InputMetadata => Input,
    OutputMetadata => Output,
    AttrMetadata => Attr,
    HostBindingMetadata => HostBinding,
    HostListenerMetadata => HostListener,
    QueryMetadata => Query,
}

/// Formats a decorator list the way errors report it.
pub(crate) fn describe(annotations: &[Annotation]) -> String {
    annotations
        .iter()
        .map(|annotation| annotation.kind().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
