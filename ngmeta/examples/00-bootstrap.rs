use ngmeta::application::Application;
use ngmeta::bundle::HostModule;
use ngmeta::config::BootstrapConfig;
use ngmeta_core::controller::Controller;
use ngmeta_core::decorators::{component, injectable, ng_module};
use ngmeta_core::directive::DirectiveDefinition;
use ngmeta_core::instance::{Dependencies, ErrorPtr, InstancePtr};
use ngmeta_core::metadata::{ComponentMetadata, DirectiveMetadata, NgModuleMetadata};
use ngmeta_core::pipe::PipeFilter;
use ngmeta_core::provider::{FactoryProvider, ServiceProvider};
use ngmeta_core::reflection::Reflector;
use ngmeta_core::types::Type;
use serde_json::Value;

struct Store;

#[derive(Default)]
struct TodoList {
    title: Value,
}

impl Controller for TodoList {
    fn create(_dependencies: &Dependencies) -> Result<Self, ErrorPtr> {
        Ok(Self::default())
    }

    fn property(&self, name: &str) -> Value {
        match name {
            "title" => self.title.clone(),
            _ => Value::Null,
        }
    }

    fn set_property(&mut self, name: &str, value: Value) {
        if name == "title" {
            self.title = value;
        }
    }
}

struct TodoModule;

// the host module receives registrations - a real one would forward them to the host runtime
struct PrintingHost;

impl HostModule for PrintingHost {
    fn value(&self, name: &str, _value: InstancePtr) {
        println!("value {name}");
    }

    fn factory(&self, name: &str, provider: FactoryProvider) {
        println!("factory {name} {:?}", provider.inject);
    }

    fn service(&self, name: &str, provider: ServiceProvider) {
        println!("service {name} {:?}", provider.inject);
    }

    fn directive(&self, name: &str, definition: DirectiveDefinition) {
        println!("directive {name} {:?}", definition.bind_to_controller);
    }

    fn filter(&self, name: &str, _filter: PipeFilter) {
        println!("filter {name}");
    }

    fn config(&self, class: Type, inject: Vec<Option<String>>) {
        println!("config {} {inject:?}", class.name());
    }
}

fn main() {
    let mut reflector = Reflector::new();
    injectable(Some("store")).apply(&mut reflector, Type::of::<Store>());
    component(ComponentMetadata {
        directive: DirectiveMetadata {
            selector: "todo-list".to_string(),
            inputs: vec!["title".to_string()],
            ..Default::default()
        },
        template: Some("<h1>{{ $ctrl.title }}</h1>".to_string()),
        ..Default::default()
    })
    .apply(&mut reflector, Type::controller::<TodoList>());
    ng_module(NgModuleMetadata {
        providers: vec![Type::of::<Store>().into()],
        declarations: vec![Type::controller::<TodoList>().into()],
        ..Default::default()
    })
    .apply(&mut reflector, Type::of::<TodoModule>());

    let application = Application::new(
        &reflector,
        BootstrapConfig::default().with_module_name("todo"),
    );

    // prints:
    // service store []
    // directive todoList {"title": "<title"}
    application
        .bootstrap(Type::of::<TodoModule>(), &[], &PrintingHost)
        .expect("error bootstrapping application");
}
