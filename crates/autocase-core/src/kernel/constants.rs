/// Application name
pub const APP_NAME: &str = "autocase";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the plugin vtable layout. Bumped whenever `PluginVTable` changes.
pub const PLUGIN_ABI_VERSION: u32 = 1;

/// Exported factory symbol every plugin module must provide
pub const CREATE_PLUGIN_SYMBOL: &str = "create_plugin";

/// Exported destructor symbol every plugin module must provide
pub const DESTROY_PLUGIN_SYMBOL: &str = "destroy_plugin";

/// Default plugins directory
pub const DEFAULT_PLUGINS_DIR: &str = "plugins";

/// Advisory step timeout used when a case file does not specify one
pub const DEFAULT_STEP_TIMEOUT_MS: u64 = 3000;
