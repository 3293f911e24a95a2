use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::data::model::DataSetId;
use crate::data::resolver::Resolution;
use crate::data::store::DataStore;
use crate::engine::model::{ExecutionResult, TestCase};
use crate::engine::orchestrator::Orchestrator;
use crate::engine::serializer;
use crate::kernel::constants;
use crate::kernel::error::Result;
use crate::logging::{FacadeSink, Level, LogRecord, LogSink, MemorySink, TeeSink, emit};
use crate::plugin_system::loader::{LibraryLoader, ModuleLoader};
use crate::plugin_system::registry::PluginRegistry;

/// Facade that owns every component of one automation session.
///
/// Records emitted by the store, the registry and the orchestrator go both
/// to the `log` facade and to an in-memory execution log.
pub struct Application {
    config: AppConfig,
    data_store: DataStore,
    registry: PluginRegistry,
    orchestrator: Orchestrator,
    execution_log: Arc<MemorySink>,
    sink: Arc<dyn LogSink>,
    plugin_dir: Option<PathBuf>,
}

impl Application {
    /// Application with default settings loading plugins from disk.
    pub fn new() -> Self {
        Self::build(AppConfig::default(), Level::Info, Box::new(LibraryLoader))
    }

    /// Application built from `config`. Fails if the configured log level
    /// is not a level name.
    pub fn with_config(config: AppConfig) -> Result<Self> {
        Self::with_loader(config, Box::new(LibraryLoader))
    }

    /// Like [`with_config`](Self::with_config) with a custom module loader.
    pub fn with_loader(config: AppConfig, loader: Box<dyn ModuleLoader>) -> Result<Self> {
        // `off` still keeps errors in the execution log.
        let level = config.level_filter()?.to_level().unwrap_or(Level::Error);
        Ok(Self::build(config, level, loader))
    }

    fn build(config: AppConfig, level: Level, loader: Box<dyn ModuleLoader>) -> Self {
        let execution_log = Arc::new(MemorySink::new(level));
        let facade: Arc<dyn LogSink> = Arc::new(FacadeSink);
        let captured: Arc<dyn LogSink> = execution_log.clone();
        let sink: Arc<dyn LogSink> = Arc::new(TeeSink::new(vec![facade, captured]));

        let mut orchestrator = Orchestrator::new(sink.clone()).with_dispatch_key(config.dispatch_key);
        orchestrator.set_verbose(config.verbose);

        emit!(sink, Info, "Initializing {} v{}", constants::APP_NAME, constants::APP_VERSION);
        Self {
            data_store: DataStore::with_sink(sink.clone()),
            registry: PluginRegistry::with_loader(loader, sink.clone()),
            orchestrator,
            execution_log,
            sink,
            plugin_dir: None,
            config,
        }
    }

    /// Load every plugin in `plugin_dir`. Returns how many were accepted.
    pub fn initialize(&mut self, plugin_dir: impl AsRef<Path>) -> usize {
        let plugin_dir = plugin_dir.as_ref();
        emit!(self.sink, Info, "Loading plugins from {}", plugin_dir.display());
        let count = self.registry.load_from_directory(plugin_dir);
        self.plugin_dir = Some(plugin_dir.to_path_buf());
        emit!(self.sink, Info, "Application initialized with {} plugins", count);
        count
    }

    /// Import the configured data files, then load plugins from the
    /// configured directory. Returns the plugin count.
    pub fn initialize_from_config(&mut self) -> Result<usize> {
        let files = self.config.data_files.clone();
        for file in &files {
            self.import_data(file)?;
        }
        let dir = self.config.plugin_dir.clone();
        Ok(self.initialize(dir))
    }

    /// Unload every plugin.
    pub fn uninitialize(&mut self) {
        if self.registry.is_empty() && self.plugin_dir.is_none() {
            return;
        }
        emit!(self.sink, Info, "Shutting down: unloading {} plugins", self.registry.len());
        self.registry.unload_all();
        self.plugin_dir = None;
    }

    /// Directory the last [`initialize`](Self::initialize) scanned
    pub fn plugin_dir(&self) -> Option<&Path> {
        self.plugin_dir.as_deref()
    }

    /// Name to version of every registered plugin
    pub fn plugin_infos(&self) -> BTreeMap<String, String> {
        self.registry.plugin_infos()
    }

    /// Supported actions of `plugin_name`, sorted. Empty for unknown plugins.
    pub fn plugin_actions(&self, plugin_name: &str) -> Vec<String> {
        self.registry
            .supported_actions(plugin_name)
            .map(|actions| actions.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_plugin_available(&self, plugin_name: &str) -> bool {
        self.registry.has_plugin(plugin_name)
    }

    /// Import a data set file into the configured project.
    pub fn import_data(&mut self, path: impl AsRef<Path>) -> Result<DataSetId> {
        let id = self.data_store.import_from_file(path, self.config.project_id)?;
        Ok(id)
    }

    /// Substitute `${set.item}` placeholders. Unresolved ones are logged and
    /// left in the output.
    pub fn resolve_data_references(&self, text: &str) -> Resolution {
        let resolution = self.data_store.substitute_references(text);
        for unresolved in &resolution.unresolved {
            emit!(self.sink, Warn, "Unresolved data reference {}", unresolved);
        }
        resolution
    }

    fn resolve_case(&self, case: &TestCase) -> TestCase {
        let mut resolved = case.clone();
        for step in &mut resolved.steps {
            step.param.target = self.resolve_data_references(&step.param.target).output;
            step.param.value = self.resolve_data_references(&step.param.value).output;
            for value in step.param.params.values_mut() {
                *value = self.resolve_data_references(value).output;
            }
        }
        resolved
    }

    /// Resolve data references in a copy of `case` and run it.
    pub fn execute_test_case(&self, case: &TestCase) -> ExecutionResult {
        let resolved = self.resolve_case(case);
        self.orchestrator.execute_test_case(&self.registry, &resolved)
    }

    pub fn execute_test_cases(&self, cases: &[TestCase]) -> Vec<ExecutionResult> {
        cases.iter().map(|case| self.execute_test_case(case)).collect()
    }

    pub fn save_test_cases(&self, cases: &[TestCase], path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        serializer::save_to_file(cases, path)?;
        emit!(self.sink, Info, "Saved {} test cases to {}", cases.len(), path.display());
        Ok(())
    }

    pub fn load_test_cases(&self, path: impl AsRef<Path>) -> Result<Vec<TestCase>> {
        let path = path.as_ref();
        let cases = serializer::load_from_file(path)?;
        emit!(self.sink, Info, "Loaded {} test cases from {}", cases.len(), path.display());
        Ok(cases)
    }

    /// Captured log output, one record per line
    pub fn execution_log(&self) -> String {
        self.execution_log.contents()
    }

    pub fn execution_records(&self) -> Vec<LogRecord> {
        self.execution_log.records()
    }

    pub fn clear_execution_log(&self) {
        self.execution_log.clear();
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.config.verbose = verbose;
        self.orchestrator.set_verbose(verbose);
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn data_store(&self) -> &DataStore {
        &self.data_store
    }

    pub fn data_store_mut(&mut self) -> &mut DataStore {
        &mut self.data_store
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PluginRegistry {
        &mut self.registry
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut Orchestrator {
        &mut self.orchestrator
    }

    /// Sink shared by every component of this application
    pub fn sink(&self) -> Arc<dyn LogSink> {
        self.sink.clone()
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        self.uninitialize();
    }
}
