use itertools::Itertools;
use ngmeta::application::Application;
use ngmeta::bundle::HostModule;
use ngmeta::config::BootstrapConfig;
use ngmeta_core::binding::changes::SimpleChanges;
use ngmeta_core::binding::emitter::EventEmitter;
use ngmeta_core::controller::{Controller, ControllerPtr};
use ngmeta_core::decorators::{
    component, content_children, directive, host, host_binding, host_listener, inject, ng_module,
    output,
};
use ngmeta_core::directive::{ControllerLocals, DirectiveDefinition, LinkContext};
use ngmeta_core::element::{QueryMatch, QueryResult, QueryTarget};
use ngmeta_core::instance::{Dependencies, ErrorPtr, InstancePtr};
use ngmeta_core::metadata::{ComponentMetadata, DirectiveMetadata, NgModuleMetadata};
use ngmeta_core::pipe::PipeFilter;
use ngmeta_core::provider::{FactoryProvider, ServiceProvider};
use ngmeta_core::reflection::Reflector;
use ngmeta_core::testing::{TestAttributes, TestElement, TestEvent, TestInjector, TestScope};
use ngmeta_core::types::{LifecycleHooks, Type};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct Journal(RefCell<Vec<String>>);

impl Journal {
    fn log<T: Into<String>>(&self, entry: T) {
        self.0.borrow_mut().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    fn count(&self, entry: &str) -> usize {
        self.0.borrow().iter().filter(|logged| *logged == entry).count()
    }
}

fn journal_of(dependencies: &Dependencies, index: usize) -> Result<Rc<Journal>, ErrorPtr> {
    dependencies
        .get::<Journal>(index)
        .map_err(|error| Rc::new(error) as ErrorPtr)
}

struct Panel {
    journal: Rc<Journal>,
    item: Value,
    title: Value,
    active: bool,
    changed: Option<EventEmitter>,
}

impl Controller for Panel {
    fn create(dependencies: &Dependencies) -> Result<Self, ErrorPtr> {
        let journal = journal_of(dependencies, 0)?;
        journal.log("create");

        Ok(Self {
            journal,
            item: Value::Null,
            title: Value::Null,
            active: false,
            changed: None,
        })
    }

    fn hooks() -> LifecycleHooks {
        LifecycleHooks::ON_CHANGES
            | LifecycleHooks::ON_INIT
            | LifecycleHooks::DO_CHECK
            | LifecycleHooks::AFTER_CONTENT_INIT
            | LifecycleHooks::ON_DESTROY
    }

    fn property(&self, name: &str) -> Value {
        match name {
            "item" => self.item.clone(),
            "title" => self.title.clone(),
            "active" => Value::Bool(self.active),
            _ => Value::Null,
        }
    }

    fn set_property(&mut self, name: &str, value: Value) {
        match name {
            "item" => self.item = value,
            "title" => self.title = value,
            _ => {}
        }
    }

    fn set_output(&mut self, name: &str, emitter: EventEmitter) {
        if name == "changed" {
            self.changed = Some(emitter);
        }
    }

    fn set_query(&mut self, name: &str, result: QueryResult) {
        let count = match result {
            QueryResult::All(matches) => matches.len(),
            QueryResult::First(found) => found.iter().count(),
        };
        self.journal.log(format!("query:{name}:{count}"));
    }

    fn call(&mut self, method: &str, args: &[Value]) -> Result<Value, ErrorPtr> {
        if method != "toggle" {
            return Ok(Value::Null);
        }

        self.active = !self.active;
        self.journal.log(format!(
            "toggle:{}",
            args.first().cloned().unwrap_or(Value::Null)
        ));
        if let Some(changed) = &self.changed {
            changed.emit(Value::Bool(self.active));
        }

        Ok(Value::Bool(false))
    }

    fn on_changes(&mut self, changes: &SimpleChanges) {
        self.journal
            .log(format!("onChanges:{}", changes.keys().join(",")));
    }

    fn on_init(&mut self) {
        self.journal.log("onInit");
    }

    fn do_check(&mut self) {
        self.journal.log("doCheck");
    }

    fn after_content_init(&mut self) {
        self.journal.log("afterContentInit");
    }

    fn on_destroy(&mut self) {
        self.journal.log("onDestroy");
    }
}

struct Tooltip {
    journal: Rc<Journal>,
    text: Value,
}

impl Controller for Tooltip {
    fn create(dependencies: &Dependencies) -> Result<Self, ErrorPtr> {
        Ok(Self {
            journal: journal_of(dependencies, 1)?,
            text: Value::Null,
        })
    }

    fn hooks() -> LifecycleHooks {
        LifecycleHooks::ON_DESTROY
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

    fn set_required(&mut self, name: &str, controller: Option<ControllerPtr>) {
        self.journal
            .log(format!("required:{name}:{}", controller.is_some()));
    }

    fn on_destroy(&mut self) {
        self.journal.log("tooltip.onDestroy");
    }
}

struct PanelModule;

#[derive(Default)]
struct RecordingHost {
    registered: RefCell<Vec<String>>,
    directives: RefCell<Vec<(String, DirectiveDefinition)>>,
}

impl RecordingHost {
    fn definition(&self, name: &str) -> DirectiveDefinition {
        self.directives
            .borrow()
            .iter()
            .find(|(registered, _)| registered == name)
            .map(|(_, definition)| definition.clone())
            .unwrap()
    }
}

impl HostModule for RecordingHost {
    fn value(&self, name: &str, _value: InstancePtr) {
        self.registered.borrow_mut().push(name.to_string());
    }

    fn factory(&self, name: &str, _provider: FactoryProvider) {
        self.registered.borrow_mut().push(name.to_string());
    }

    fn service(&self, name: &str, _provider: ServiceProvider) {
        self.registered.borrow_mut().push(name.to_string());
    }

    fn directive(&self, name: &str, definition: DirectiveDefinition) {
        self.registered.borrow_mut().push(name.to_string());
        self.directives
            .borrow_mut()
            .push((name.to_string(), definition));
    }

    fn filter(&self, name: &str, _filter: PipeFilter) {
        self.registered.borrow_mut().push(name.to_string());
    }

    fn config(&self, class: Type, _inject: Vec<Option<String>>) {
        self.registered.borrow_mut().push(class.name().to_string());
    }
}

fn decorate() -> Reflector {
    let mut reflector = Reflector::new();
    let panel = Type::controller::<Panel>();
    let tooltip = Type::controller::<Tooltip>();

    component(ComponentMetadata {
        directive: DirectiveMetadata {
            selector: "my-panel".to_string(),
            inputs: vec!["item".to_string()],
            attrs: vec!["title".to_string()],
            host: [("role".to_string(), "region".to_string())]
                .into_iter()
                .collect(),
            ..Default::default()
        },
        template: Some("<section ng-transclude></section>".to_string()),
        ..Default::default()
    })
    .apply(&mut reflector, panel);
    output(None).apply(&mut reflector, panel, "changed");
    host_binding(Some("class.active")).apply(&mut reflector, panel, "active");
    host_listener("click", &["$event.button"]).apply(&mut reflector, panel, "toggle");
    content_children("item").apply(&mut reflector, panel, "items");
    inject("journal").apply(&mut reflector, panel.into(), 0);

    directive(DirectiveMetadata {
        selector: "[panel-tooltip]".to_string(),
        inputs: vec!["text: panelTooltip".to_string()],
        ..Default::default()
    })
    .apply(&mut reflector, tooltip);
    inject(panel).apply(&mut reflector, tooltip.into(), 0);
    host().apply(&mut reflector, tooltip.into(), 0);
    inject("journal").apply(&mut reflector, tooltip.into(), 1);

    ng_module(NgModuleMetadata {
        declarations: vec![panel.into(), tooltip.into()],
        ..Default::default()
    })
    .apply(&mut reflector, Type::of::<PanelModule>());

    reflector
}

fn bootstrap(reflector: &Reflector) -> RecordingHost {
    let host_module = RecordingHost::default();
    let application = Application::new(
        reflector,
        BootstrapConfig::default().with_tracing_logger(false),
    );

    let bundle = application
        .bootstrap(Type::of::<PanelModule>(), &[], &host_module)
        .unwrap();
    assert_eq!(bundle.len(), 2);
    assert_eq!(*host_module.registered.borrow(), ["myPanel", "panelTooltip"]);

    host_module
}

fn journal_injector() -> (Rc<Journal>, Rc<TestInjector>) {
    let journal = Rc::new(Journal::default());
    let injector = TestInjector::new();
    injector.register_instance("journal", journal.clone());
    (journal, injector)
}

#[test]
fn should_run_component_lifecycle() {
    let reflector = decorate();
    let definition = bootstrap(&reflector).definition("myPanel");
    let (journal, injector) = journal_injector();

    let root = TestScope::new();
    root.set("vm", json!({"item": {"id": 1}, "name": "Inbox"}));
    let scope = root.child(true);
    let attributes = TestAttributes::new(
        root.clone(),
        &[
            ("[item]", "vm.item"),
            ("title", "{{vm.name}}"),
            ("(changed)", "vm.active = $event"),
        ],
    );
    let element = TestElement::new();
    element.set_query_result(
        QueryTarget::Selector("item".to_string()),
        false,
        vec![
            QueryMatch::Element(TestElement::new()),
            QueryMatch::Element(TestElement::new()),
        ],
    );

    let controller = (definition.controller)(&ControllerLocals {
        scope: scope.clone(),
        element: element.clone(),
        attributes: attributes.clone(),
        injector,
    })
    .unwrap();
    assert_eq!(controller.borrow().property("title"), json!("Inbox"));

    let context = LinkContext {
        scope: scope.clone(),
        element: element.clone(),
        attributes: attributes.clone(),
        controllers: vec![Some(controller.clone())],
    };
    (definition.link.pre)(&context).unwrap();
    (definition.link.post)(&context).unwrap();

    assert_eq!(
        journal.entries(),
        [
            "create",
            "onChanges:item,title",
            "onInit",
            "query:items:2",
            "afterContentInit"
        ]
    );

    root.digest().unwrap();
    assert_eq!(element.attribute("role").as_deref(), Some("region"));
    assert!(!element.has_class("active"));
    assert!(journal.count("doCheck") >= 1);
    assert_eq!(journal.count("onChanges:title"), 0);

    root.set("vm.item", json!({"id": 2}));
    root.digest().unwrap();
    assert_eq!(journal.count("onChanges:item"), 1);
    assert_eq!(controller.borrow().property("item"), json!({"id": 2}));

    attributes.set_value("title", json!("Archive")).unwrap();
    root.digest().unwrap();
    assert_eq!(journal.count("onChanges:title"), 1);
    assert_eq!(controller.borrow().property("title"), json!("Archive"));

    let click = TestEvent::new(json!({"button": 0}));
    element.trigger("click", &click).unwrap();
    assert!(click.is_default_prevented());
    assert!(root.is_digest_requested());
    assert_eq!(root.get("vm.active"), json!(true));

    root.flush().unwrap();
    assert!(element.has_class("active"));
    assert_eq!(journal.count("toggle:0"), 1);

    scope.destroy();
    assert_eq!(journal.count("onDestroy"), 1);
    assert_eq!(element.listener_count("click"), 0);
    assert_eq!(attributes.observer_count(), 0);
    assert_eq!(root.watcher_count(), 0);
    assert!(!element.has_data("$$ngMeta.myPanel.disposers"));

    root.set("vm.item", json!({"id": 3}));
    root.digest().unwrap();
    assert_eq!(journal.count("onChanges:item"), 1);
}

#[test]
fn should_link_directive_to_host_component() {
    let reflector = decorate();
    let host_module = bootstrap(&reflector);
    let panel_definition = host_module.definition("myPanel");
    let tooltip_definition = host_module.definition("panelTooltip");
    let (journal, injector) = journal_injector();

    assert_eq!(tooltip_definition.require, ["panelTooltip", "^myPanel"]);
    assert!(!tooltip_definition.isolate_scope);

    let root = TestScope::new();
    root.set("vm.hint", json!("Close"));
    let panel_scope = root.child(true);
    let panel = (panel_definition.controller)(&ControllerLocals {
        scope: panel_scope,
        element: TestElement::new(),
        attributes: TestAttributes::new(root.clone(), &[]),
        injector: injector.clone(),
    })
    .unwrap();

    let content_scope = root.child(false);
    let attributes = TestAttributes::new(content_scope.clone(), &[("[panelTooltip]", "vm.hint")]);
    let element = TestElement::new();
    let tooltip = (tooltip_definition.controller)(&ControllerLocals {
        scope: content_scope.clone(),
        element: element.clone(),
        attributes: attributes.clone(),
        injector,
    })
    .unwrap();
    assert_eq!(tooltip.borrow().property("text"), Value::Null);

    let context = LinkContext {
        scope: content_scope.clone(),
        element: element.clone(),
        attributes,
        controllers: vec![Some(tooltip.clone()), Some(panel)],
    };
    (tooltip_definition.link.pre)(&context).unwrap();
    (tooltip_definition.link.post)(&context).unwrap();

    assert_eq!(journal.count("required:myPanel:true"), 1);
    assert_eq!(tooltip.borrow().property("text"), json!("Close"));

    root.set("vm.hint", json!("Open"));
    root.digest().unwrap();
    assert_eq!(tooltip.borrow().property("text"), json!("Open"));

    content_scope.destroy();
    assert_eq!(journal.count("tooltip.onDestroy"), 1);
    assert_eq!(journal.count("onDestroy"), 0);

    root.set("vm.hint", json!("Gone"));
    root.digest().unwrap();
    assert_eq!(tooltip.borrow().property("text"), json!("Open"));
}
