//! Translation of `@Directive` and `@Component` classes into legacy directive definition objects.
//!
//! The produced [DirectiveDefinition] carries a controller factory and link functions wiring the
//! controller to the host runtime:
//!
//! * the controller factory resolves dependencies through the host injector and, for components,
//!   creates bindings against the parent scope
//! * pre-link (only with `OnInit`) assigns required controllers and calls `on_init`
//! * post-link creates directive bindings, sets up host bindings and listeners, resolves queries,
//!   calls `after_content_init`/`after_view_init` and registers the destroy handler
//!
//! Components therefore see their inputs and initial `on_changes` before `on_init`, while plain
//! directives get `on_init` first and their inputs in post-link.
//!
//! Required controllers are assigned exactly once, in pre-link if present, in post-link otherwise.

pub mod host;
pub mod resolver;
pub mod selector;

use crate::binding::changes::{ChangesQueue, ChangesRecorder, SimpleChanges};
use crate::binding::{create_bindings, BindingContext, CreatedBindings, ParsedBindings};
use crate::controller::{ControllerPtr, NoopController};
use crate::directive::host::{
    apply_static_attributes, attach_host_listeners, parse_host_bindings, watch_host_bindings,
    ParsedHostBindings,
};
use crate::directive::resolver::{DirectiveResolver, ResolvedDirective};
use crate::directive::selector::{directive_name_from_selector, restrict_from_selector};
use crate::element::{AttributesPtr, ElementPtr, QueryResult, QueryTarget};
use crate::error::Error;
use crate::instance::{Dependencies, ErrorPtr, InjectorPtr, InstancePtr};
use crate::metadata::{
    ChangeDetectionStrategy, DirectiveMetadata, LegacyDirectiveOptions, MetadataKind,
    QuerySelector, Transclude,
};
use crate::provider::{dependencies_for, extract_token, get_injectable_name};
use crate::reflection::Reflector;
use crate::scope::{Disposer, ScopePtr};
use crate::types::{Constructor, LifecycleHooks, Type};
use derivative::Derivative;
use indexmap::IndexMap;
use serde_json::Value;
use std::cell::RefCell;
use std::iter::once;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Locals available to a controller factory.
#[derive(Clone)]
pub struct ControllerLocals {
    pub scope: ScopePtr,
    pub element: ElementPtr,
    pub attributes: AttributesPtr,
    pub injector: InjectorPtr,
}

pub type ControllerFactory = Rc<dyn Fn(&ControllerLocals) -> Result<ControllerPtr, Error>>;

/// Arguments of a link function. `controllers` follow the `require` list of the definition, so the
/// first one is the directive's own controller.
#[derive(Clone)]
pub struct LinkContext {
    pub scope: ScopePtr,
    pub element: ElementPtr,
    pub attributes: AttributesPtr,
    pub controllers: Vec<Option<ControllerPtr>>,
}

pub type LinkFn = Rc<dyn Fn(&LinkContext) -> Result<(), Error>>;

#[derive(Clone)]
pub struct Link {
    pub pre: LinkFn,
    pub post: LinkFn,
}

impl Default for Link {
    fn default() -> Self {
        Self {
            pre: Rc::new(|_| Ok(())),
            post: Rc::new(|_| Ok(())),
        }
    }
}

/// Legacy directive definition object.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct DirectiveDefinition {
    pub require: Vec<String>,
    #[derivative(Debug = "ignore")]
    pub controller: ControllerFactory,
    pub controller_as: Option<String>,
    /// Components get an isolated (`{}`) scope.
    pub isolate_scope: bool,
    /// Descriptive `bindToController` map. The bindings themselves are created by the controller
    /// factory.
    pub bind_to_controller: IndexMap<String, String>,
    pub restrict: String,
    pub transclude: Option<Transclude>,
    pub template: Option<String>,
    pub template_url: Option<String>,
    pub priority: Option<i32>,
    pub terminal: Option<bool>,
    pub multi_element: Option<bool>,
    #[derivative(Debug = "ignore")]
    pub link: Link,
}

impl DirectiveDefinition {
    /// Definition doing nothing, the base for computed fields.
    pub fn shell() -> Self {
        Self {
            require: vec![],
            controller: Rc::new(|_| Ok(Rc::new(RefCell::new(NoopController)) as ControllerPtr)),
            controller_as: None,
            isolate_scope: false,
            bind_to_controller: Default::default(),
            restrict: "EA".to_string(),
            transclude: None,
            template: None,
            template_url: None,
            priority: None,
            terminal: None,
            multi_element: None,
            link: Default::default(),
        }
    }

    fn apply_legacy(&mut self, legacy: &LegacyDirectiveOptions) {
        if let Some(priority) = legacy.priority {
            self.priority = Some(priority);
        }
        if let Some(terminal) = legacy.terminal {
            self.terminal = Some(terminal);
        }
        if let Some(restrict) = &legacy.restrict {
            self.restrict = restrict.clone();
        }
        if let Some(transclude) = &legacy.transclude {
            self.transclude = Some(transclude.clone());
        }
        if let Some(multi_element) = legacy.multi_element {
            self.multi_element = Some(multi_element);
        }
    }
}

#[derive(Clone, Debug)]
struct ResolvedQuery {
    property: String,
    target: QueryTarget,
    descendants: bool,
    first: bool,
    view: bool,
}

type ControllerConstructor = fn(&Dependencies) -> Result<ControllerPtr, ErrorPtr>;

/// Everything the controller factory and link functions of a single directive need.
struct DirectiveRuntime {
    class: Type,
    name: String,
    is_component: bool,
    immutable: bool,
    inject: Vec<Option<String>>,
    required: Vec<String>,
    bindings: ParsedBindings,
    host: ParsedHostBindings,
    queries: Vec<ResolvedQuery>,
    changes: ChangesQueue,
    construct: ControllerConstructor,
}

impl DirectiveRuntime {
    fn disposers_key(&self) -> String {
        format!("$$ngMeta.{}.disposers", self.name)
    }

    #[inline]
    fn implements(&self, hooks: LifecycleHooks) -> bool {
        self.class.implements(hooks)
    }

    fn instantiate(&self, locals: &ControllerLocals) -> Result<ControllerPtr, Error> {
        let dependencies = Dependencies::resolve(locals.injector.as_ref(), &self.inject)?;
        let controller = (self.construct)(&dependencies)?;

        trace!(directive = %self.name, "Created controller.");

        if self.is_component {
            let parent = locals
                .scope
                .parent()
                .unwrap_or_else(|| locals.scope.clone());
            let created = self.create_bindings(parent, locals.attributes.clone(), &controller)?;
            self.deliver_initial_changes(&controller, &created.initial_changes);
            self.disposers(&locals.element)
                .borrow_mut()
                .extend(created.disposers);
        }

        Ok(controller)
    }

    fn create_bindings(
        &self,
        scope: ScopePtr,
        attributes: AttributesPtr,
        controller: &ControllerPtr,
    ) -> Result<CreatedBindings, Error> {
        let bindings = self.bindings.resolve(attributes.as_ref());
        let recorder = self.implements(LifecycleHooks::ON_CHANGES).then(|| {
            ChangesRecorder::new(controller.clone(), self.changes.clone(), scope.clone())
        });

        create_bindings(
            &BindingContext {
                scope,
                attributes,
                controller: controller.clone(),
                directive_name: self.name.clone(),
                is_component: self.is_component,
                immutable: self.immutable,
                recorder,
            },
            &bindings,
        )
    }

    fn deliver_initial_changes(&self, controller: &ControllerPtr, changes: &SimpleChanges) {
        if self.implements(LifecycleHooks::ON_CHANGES) && !changes.is_empty() {
            controller.borrow_mut().on_changes(changes);
        }
    }

    /// Per-instance disposers, kept in element data between controller creation and destroy.
    fn disposers(&self, element: &ElementPtr) -> Rc<RefCell<Vec<Disposer>>> {
        let key = self.disposers_key();
        if let Some(disposers) = element
            .data(&key)
            .and_then(|data| data.downcast::<RefCell<Vec<Disposer>>>().ok())
        {
            return disposers;
        }

        let disposers: Rc<RefCell<Vec<Disposer>>> = Default::default();
        element.set_data(&key, Some(disposers.clone() as InstancePtr));
        disposers
    }

    fn own_controller(&self, context: &LinkContext) -> Result<ControllerPtr, Error> {
        context
            .controllers
            .first()
            .cloned()
            .flatten()
            .ok_or_else(|| Error::MissingController(self.name.clone()))
    }

    fn assign_required(&self, controller: &ControllerPtr, context: &LinkContext) {
        let mut controller = controller.borrow_mut();
        for (name, required) in self
            .required
            .iter()
            .zip(context.controllers.iter().skip(1))
        {
            controller.set_required(name, required.clone());
        }
    }

    fn pre_link(&self, context: &LinkContext) -> Result<(), Error> {
        let controller = self.own_controller(context)?;
        self.assign_required(&controller, context);
        controller.borrow_mut().on_init();
        Ok(())
    }

    fn post_link(&self, context: &LinkContext) -> Result<(), Error> {
        let controller = self.own_controller(context)?;
        if !self.implements(LifecycleHooks::ON_INIT) {
            self.assign_required(&controller, context);
        }

        let disposers = self.disposers(&context.element);

        // directives share the scope of their element and bind only once linked
        if !self.is_component {
            let created = self.create_bindings(
                context.scope.clone(),
                context.attributes.clone(),
                &controller,
            )?;
            self.deliver_initial_changes(&controller, &created.initial_changes);
            disposers.borrow_mut().extend(created.disposers);
        }

        apply_static_attributes(&self.host, &context.element);
        disposers.borrow_mut().extend(watch_host_bindings(
            &self.host,
            &context.scope,
            &context.element,
            &controller,
        ));
        let listeners =
            attach_host_listeners(&self.host, &context.scope, &context.element, &controller);

        if self.implements(LifecycleHooks::DO_CHECK) {
            let checked = controller.clone();
            disposers.borrow_mut().push(context.scope.watch_fn(
                Box::new(move || {
                    checked.borrow_mut().do_check();
                    Ok(Value::Null)
                }),
                Box::new(|_, _| Ok(())),
            ));
        }

        self.resolve_queries(&controller, &context.element);

        if self.implements(LifecycleHooks::AFTER_CONTENT_INIT) {
            controller.borrow_mut().after_content_init();
        }
        if self.implements(LifecycleHooks::AFTER_VIEW_INIT) {
            controller.borrow_mut().after_view_init();
        }

        let on_destroy = self.implements(LifecycleHooks::ON_DESTROY);
        let element = context.element.clone();
        let key = self.disposers_key();
        let name = self.name.clone();
        context.scope.on_destroy(Box::new(move || {
            if on_destroy {
                controller.borrow_mut().on_destroy();
            }

            let disposers = disposers.take();
            let count = disposers.len();
            for dispose in disposers {
                dispose();
            }
            for listener in listeners {
                listener.detach();
            }
            element.set_data(&key, None);

            debug!(directive = %name, disposed = count, "Destroyed directive instance.");
        }));

        Ok(())
    }

    fn resolve_queries(&self, controller: &ControllerPtr, element: &ElementPtr) {
        for query in &self.queries {
            let matches = element.query(&query.target, query.descendants, query.view);
            let result = if query.first {
                QueryResult::First(matches.into_iter().next())
            } else {
                QueryResult::All(matches)
            };

            controller.borrow_mut().set_query(&query.property, result);
        }
    }
}

/// Creates directive definitions from decorated controller classes.
pub struct DirectiveProvider<'a> {
    reflector: &'a Reflector,
    changes: ChangesQueue,
}

impl<'a> DirectiveProvider<'a> {
    pub fn new(reflector: &'a Reflector, changes: ChangesQueue) -> Self {
        Self { reflector, changes }
    }

    /// Produces the registration name and definition object of a directive or component class.
    pub fn create_from_type(&self, class: &Type) -> Result<(String, DirectiveDefinition), Error> {
        let resolved = DirectiveResolver::new(self.reflector).resolve(class)?;
        let metadata = resolved.directive();
        let name = directive_name_from_selector(&metadata.selector);

        self.check_lifecycle(class, &resolved)?;

        let inject = dependencies_for(self.reflector, class)?;
        let require_map = self.require_map(class)?;
        let host = parse_host_bindings(&metadata.host)?;
        let bindings = ParsedBindings::parse(&metadata.inputs, &metadata.outputs, &metadata.attrs);
        let queries = self.resolve_queries(metadata)?;

        let construct = match class.constructor() {
            Some(Constructor::Controller(construct)) => construct,
            _ => return Err(Error::MissingConstructor(class.name().to_string())),
        };

        let mut definition = DirectiveDefinition::shell();
        definition.require = once(name.clone())
            .chain(require_map.values().cloned())
            .collect();
        definition.restrict = restrict_from_selector(&metadata.selector).to_string();

        if let Some(component) = resolved.component() {
            definition.isolate_scope = true;
            definition.bind_to_controller = bindings.legacy_map();
            definition.controller_as = Some("$ctrl".to_string());
            definition.transclude = None;
            definition.template = component.template.clone();
            definition.template_url = component.template_url.clone();
        }

        let runtime = Rc::new(DirectiveRuntime {
            class: *class,
            name: name.clone(),
            is_component: resolved.is_component(),
            immutable: resolved.component().map(|component| component.change_detection)
                == Some(ChangeDetectionStrategy::OnPush),
            inject,
            required: require_map.keys().cloned().collect(),
            bindings,
            host,
            queries,
            changes: self.changes.clone(),
            construct,
        });

        let factory_runtime = runtime.clone();
        definition.controller = Rc::new(move |locals| factory_runtime.instantiate(locals));

        if class.implements(LifecycleHooks::ON_INIT) {
            let pre_runtime = runtime.clone();
            definition.link.pre = Rc::new(move |context| pre_runtime.pre_link(context));
        }
        definition.link.post = Rc::new(move |context| runtime.post_link(context));

        definition.apply_legacy(&metadata.legacy);

        debug!(
            %name,
            class = class.name(),
            require = ?definition.require,
            "Created directive definition."
        );

        Ok((name, definition))
    }

    fn check_lifecycle(&self, class: &Type, resolved: &ResolvedDirective) -> Result<(), Error> {
        match resolved.component() {
            Some(component) => {
                if class.implements(
                    LifecycleHooks::AFTER_CONTENT_INIT | LifecycleHooks::AFTER_VIEW_INIT,
                ) {
                    return Err(Error::ConflictingLifecycle(class.name().to_string()));
                }

                if component.template.is_some() && component.template_url.is_some() {
                    return Err(Error::TemplateConflict(class.name().to_string()));
                }
            }
            None => {
                if class.implements(LifecycleHooks::AFTER_VIEW_INIT) {
                    return Err(Error::DirectiveViewHook(class.name().to_string()));
                }
            }
        }

        Ok(())
    }

    /// Require expressions of constructor parameters pointing to other directives, keyed by the
    /// required directive name.
    fn require_map(&self, class: &Type) -> Result<IndexMap<String, String>, Error> {
        let mut requires = IndexMap::new();
        let Some(params) = self.reflector.store().param_annotations(class) else {
            return Ok(requires);
        };

        for (index, annotations) in params.iter().enumerate() {
            let Some(annotations) = annotations else {
                continue;
            };

            let has = |kind: MetadataKind| {
                annotations
                    .iter()
                    .any(|annotation| annotation.kind() == kind)
            };
            if !annotations
                .iter()
                .any(|annotation| annotation.kind().is_locator())
            {
                continue;
            }

            if has(MetadataKind::SelfOnly) && has(MetadataKind::SkipSelf) {
                return Err(Error::ConflictingModifiers {
                    class: class.name().to_string(),
                    index,
                });
            }

            let Some(name) = extract_token(self.reflector, annotations)? else {
                warn!(
                    class = class.name(),
                    index, "Required directive parameter has no @Inject token."
                );
                continue;
            };

            let locate = if has(MetadataKind::SkipSelf) {
                "^^"
            } else if has(MetadataKind::Host) {
                "^"
            } else {
                ""
            };
            let optional = if has(MetadataKind::Optional) { "?" } else { "" };

            requires.insert(name.clone(), format!("{optional}{locate}{name}"));
        }

        Ok(requires)
    }

    fn resolve_queries(
        &self,
        metadata: &DirectiveMetadata,
    ) -> Result<Vec<ResolvedQuery>, Error> {
        metadata
            .queries
            .iter()
            .map(|(property, query)| {
                let target = match &query.selector {
                    QuerySelector::Selector(selector) => QueryTarget::Selector(selector.clone()),
                    QuerySelector::Type(token) => {
                        QueryTarget::Directive(get_injectable_name(self.reflector, token)?)
                    }
                };

                Ok(ResolvedQuery {
                    property: property.clone(),
                    target,
                    descendants: query.descendants,
                    first: query.first,
                    view: query.is_view_query(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::binding::changes::{ChangesQueue, SimpleChanges};
    use crate::controller::Controller;
    use crate::decorators::{component, directive, host, inject, optional, self_, skip_self};
    use crate::directive::{ControllerLocals, DirectiveProvider, LinkContext};
    use crate::error::Error;
    use crate::instance::{Dependencies, ErrorPtr, InstancePtr};
    use crate::metadata::{
        ComponentMetadata, DirectiveMetadata, LegacyDirectiveOptions, Transclude,
    };
    use crate::reflection::Reflector;
    use crate::testing::{
        ContentController, TestAttributes, TestController, TestElement, TestInjector, TestScope,
        ViewAndContentController, ViewController,
    };
    use crate::types::{LifecycleHooks, Type};
    use itertools::Itertools;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = RefCell<Vec<String>>;

    struct Hint {
        log: Rc<Log>,
        text: Value,
    }

    impl Controller for Hint {
        fn create(dependencies: &Dependencies) -> Result<Self, ErrorPtr> {
            Ok(Self {
                log: dependencies
                    .get::<Log>(0)
                    .map_err(|error| Rc::new(error) as ErrorPtr)?,
                text: Value::Null,
            })
        }

        fn hooks() -> LifecycleHooks {
            LifecycleHooks::ON_CHANGES | LifecycleHooks::ON_INIT
        }

        fn property(&self, name: &str) -> Value {
            match name {
                "text" => self.text.clone(),
                _ => Value::Null,
            }
        }

        fn set_property(&mut self, name: &str, value: Value) {
            if name == "text" {
                self.text = value;
            }
        }

        fn on_changes(&mut self, changes: &SimpleChanges) {
            self.log
                .borrow_mut()
                .push(format!("onChanges:{}", changes.keys().join(",")));
        }

        fn on_init(&mut self) {
            self.log.borrow_mut().push(format!("onInit:{}", self.text));
        }
    }

    fn component_metadata(selector: &str) -> ComponentMetadata {
        ComponentMetadata {
            directive: DirectiveMetadata {
                selector: selector.to_string(),
                inputs: vec!["item".to_string()],
                outputs: vec!["save".to_string()],
                attrs: vec!["title".to_string()],
                ..Default::default()
            },
            template: Some("<p></p>".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn should_build_component_definition() {
        let mut reflector = Reflector::new();
        let class = Type::controller::<TestController>();
        component(component_metadata("my-cmp")).apply(&mut reflector, class);

        let (name, definition) = DirectiveProvider::new(&reflector, ChangesQueue::default())
            .create_from_type(&class)
            .unwrap();

        assert_eq!(name, "myCmp");
        assert_eq!(definition.require, ["myCmp"]);
        assert_eq!(definition.restrict, "E");
        assert!(definition.isolate_scope);
        assert_eq!(definition.controller_as.as_deref(), Some("$ctrl"));
        assert_eq!(definition.template.as_deref(), Some("<p></p>"));
        assert_eq!(definition.bind_to_controller["item"], "<item");
        assert_eq!(definition.bind_to_controller["title"], "@title");
        assert_eq!(definition.bind_to_controller["save"], "&save");
    }

    #[test]
    fn should_build_require_expressions() {
        let mut reflector = Reflector::new();
        let class = Type::controller::<TestController>();
        let parent = Type::controller::<ContentController>();
        let form = Type::controller::<ViewController>();
        directive(DirectiveMetadata {
            selector: "[my-dir]".to_string(),
            ..Default::default()
        })
        .apply(&mut reflector, class);
        component(component_metadata("my-parent")).apply(&mut reflector, parent);
        directive(DirectiveMetadata {
            selector: "[ng-form]".to_string(),
            ..Default::default()
        })
        .apply(&mut reflector, form);

        inject("$log").apply(&mut reflector, class.into(), 0);
        inject(parent).apply(&mut reflector, class.into(), 1);
        host().apply(&mut reflector, class.into(), 1);
        inject(form).apply(&mut reflector, class.into(), 2);
        skip_self().apply(&mut reflector, class.into(), 2);
        optional().apply(&mut reflector, class.into(), 2);

        let (_, definition) = DirectiveProvider::new(&reflector, ChangesQueue::default())
            .create_from_type(&class)
            .unwrap();

        assert_eq!(definition.require, ["myDir", "^myParent", "?^^ngForm"]);
        assert_eq!(definition.restrict, "A");
        assert!(!definition.isolate_scope);
    }

    #[test]
    fn should_reject_conflicting_modifiers() {
        let mut reflector = Reflector::new();
        let class = Type::controller::<TestController>();
        directive(DirectiveMetadata {
            selector: "[my-dir]".to_string(),
            ..Default::default()
        })
        .apply(&mut reflector, class);
        inject("other").apply(&mut reflector, class.into(), 0);
        self_().apply(&mut reflector, class.into(), 0);
        skip_self().apply(&mut reflector, class.into(), 0);

        assert!(matches!(
            DirectiveProvider::new(&reflector, ChangesQueue::default())
                .create_from_type(&class)
                .unwrap_err(),
            Error::ConflictingModifiers { index: 0, .. }
        ));
    }

    #[test]
    fn should_reject_conflicting_lifecycle() {
        let mut reflector = Reflector::new();
        let class = Type::controller::<ViewAndContentController>();
        component(component_metadata("my-cmp")).apply(&mut reflector, class);

        assert!(matches!(
            DirectiveProvider::new(&reflector, ChangesQueue::default())
                .create_from_type(&class)
                .unwrap_err(),
            Error::ConflictingLifecycle(_)
        ));
    }

    #[test]
    fn should_reject_view_hooks_on_directives() {
        let mut reflector = Reflector::new();
        let class = Type::controller::<ViewController>();
        directive(DirectiveMetadata {
            selector: "[my-dir]".to_string(),
            ..Default::default()
        })
        .apply(&mut reflector, class);

        assert!(matches!(
            DirectiveProvider::new(&reflector, ChangesQueue::default())
                .create_from_type(&class)
                .unwrap_err(),
            Error::DirectiveViewHook(_)
        ));
    }

    #[test]
    fn should_reject_template_conflict() {
        let mut reflector = Reflector::new();
        let class = Type::controller::<TestController>();
        component(ComponentMetadata {
            template_url: Some("cmp.html".to_string()),
            ..component_metadata("my-cmp")
        })
        .apply(&mut reflector, class);

        assert!(matches!(
            DirectiveProvider::new(&reflector, ChangesQueue::default())
                .create_from_type(&class)
                .unwrap_err(),
            Error::TemplateConflict(_)
        ));
    }

    #[test]
    fn should_apply_legacy_overrides() {
        let mut reflector = Reflector::new();
        let class = Type::controller::<TestController>();
        component(ComponentMetadata {
            directive: DirectiveMetadata {
                selector: "my-cmp".to_string(),
                legacy: LegacyDirectiveOptions {
                    priority: Some(10),
                    restrict: Some("EA".to_string()),
                    transclude: Some(Transclude::Content),
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        })
        .apply(&mut reflector, class);

        let (_, definition) = DirectiveProvider::new(&reflector, ChangesQueue::default())
            .create_from_type(&class)
            .unwrap();

        assert_eq!(definition.priority, Some(10));
        assert_eq!(definition.restrict, "EA");
        assert_eq!(definition.transclude, Some(Transclude::Content));
    }

    #[test]
    fn should_require_controller_constructor() {
        struct Plain;

        let mut reflector = Reflector::new();
        let class = Type::of::<Plain>();
        directive(DirectiveMetadata {
            selector: "[plain]".to_string(),
            ..Default::default()
        })
        .apply(&mut reflector, class);

        assert!(matches!(
            DirectiveProvider::new(&reflector, ChangesQueue::default())
                .create_from_type(&class)
                .unwrap_err(),
            Error::MissingConstructor(name) if name == "Plain"
        ));
    }

    #[test]
    fn should_bind_directive_inputs_after_on_init() {
        let mut reflector = Reflector::new();
        let class = Type::controller::<Hint>();
        directive(DirectiveMetadata {
            selector: "[hint]".to_string(),
            inputs: vec!["text: hint".to_string()],
            ..Default::default()
        })
        .apply(&mut reflector, class);
        inject("log").apply(&mut reflector, class.into(), 0);

        let (_, definition) = DirectiveProvider::new(&reflector, ChangesQueue::default())
            .create_from_type(&class)
            .unwrap();

        let log: Rc<Log> = Default::default();
        let injector = TestInjector::new();
        injector.register_instance("log", log.clone() as InstancePtr);
        let scope = TestScope::new();
        scope.set("vm.hint", json!("Hi"));
        let element = TestElement::new();
        let attributes = TestAttributes::new(scope.clone(), &[("[hint]", "vm.hint")]);

        let controller = (definition.controller)(&ControllerLocals {
            scope: scope.clone(),
            element: element.clone(),
            attributes: attributes.clone(),
            injector,
        })
        .unwrap();
        assert_eq!(controller.borrow().property("text"), Value::Null);

        let context = LinkContext {
            scope,
            element,
            attributes,
            controllers: vec![Some(controller.clone())],
        };
        (definition.link.pre)(&context).unwrap();
        assert_eq!(*log.borrow(), ["onInit:null"]);

        (definition.link.post)(&context).unwrap();
        assert_eq!(*log.borrow(), ["onInit:null", "onChanges:text"]);
        assert_eq!(controller.borrow().property("text"), json!("Hi"));
    }
}
