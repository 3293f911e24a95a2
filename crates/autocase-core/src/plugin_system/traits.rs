use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::kernel::constants::DEFAULT_STEP_TIMEOUT_MS;

/// Parameters handed to a plugin for one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepParam {
    /// Identifier the owning case uses for logging (e.g. `click`, `input`)
    pub action: String,
    /// Operation to perform on the plugin; also the plugin-internal dispatch key
    pub target: String,
    /// Operation value (text to type, wait time, ...)
    pub value: String,
    /// Extra named arguments
    pub params: BTreeMap<String, String>,
    /// Advisory timeout the plugin is expected to enforce itself
    pub timeout_ms: u64,
}

impl Default for StepParam {
    fn default() -> Self {
        Self {
            action: String::new(),
            target: String::new(),
            value: String::new(),
            params: BTreeMap::new(),
            timeout_ms: DEFAULT_STEP_TIMEOUT_MS,
        }
    }
}

impl StepParam {
    pub fn new(action: impl Into<String>, target: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            target: target.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepResult {
    pub success: bool,
    pub message: String,
    /// 0 means no error. Negative codes are reserved for the orchestrator.
    pub error_code: i32,
    /// Data returned by the plugin (e.g. text read from a control)
    pub extra_data: String,
    pub duration_ms: u64,
}

impl StepResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn failure(error_code: i32, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error_code,
            ..Self::default()
        }
    }

    pub fn with_extra_data(mut self, data: impl Into<String>) -> Self {
        self.extra_data = data.into();
        self
    }
}

/// Identity of a registered plugin, captured when it was loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginDescriptor {
    pub name: String,
    /// Advisory, may be empty
    pub version: String,
    pub supported_actions: BTreeSet<String>,
}

/// Failure raised by a plugin while executing a step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PluginError {
    /// The plugin reported an error instead of a result
    #[error("plugin raised an error: {0}")]
    Raised(String),
    /// The plugin panicked; the payload is the panic message if it had one
    #[error("plugin panicked: {0}")]
    Panicked(String),
    /// The plugin answered with something that could not be decoded
    #[error("invalid response from plugin: {0}")]
    InvalidResponse(String),
}

/// Contract every automation plugin satisfies, whether it is compiled into
/// the host or loaded from a shared library.
pub trait AutomationPlugin: Send + Sync {
    /// Unique, non-empty registry key
    fn name(&self) -> String;

    fn version(&self) -> String;

    /// Called once after loading. Returning false rejects the plugin.
    fn initialize(&self) -> bool;

    /// Called once before the instance is destroyed.
    fn uninitialize(&self);

    fn execute_step(&self, param: &StepParam) -> Result<StepResult, PluginError>;

    fn supported_actions(&self) -> BTreeSet<String>;
}

impl fmt::Debug for dyn AutomationPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutomationPlugin")
            .field("name", &self.name())
            .field("version", &self.version())
            .finish()
    }
}
