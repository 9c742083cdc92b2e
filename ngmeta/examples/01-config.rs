// note: this example assumes you've analyzed the previous one

use ngmeta::application::Application;
use ngmeta_core::reflection::Reflector;

// bootstrap configuration is read from the optional "ngmeta.json" file and then from environment
// variables prefixed with "NGMETA_", e.g. NGMETA_MODULE_NAME=admin or NGMETA_ON_CHANGES_TTL=20
fn main() {
    let reflector = Reflector::new();
    let application =
        Application::from_environment(&reflector).expect("error reading configuration");

    let config = application.config();
    println!("Module name: {}", config.module_name);
    println!("onChanges TTL: {}", application.changes().ttl());
    println!("Using built-in logger: {}", config.install_tracing_logger);
}
