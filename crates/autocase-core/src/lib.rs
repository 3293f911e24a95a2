//! # autocase-core
//!
//! Plugin-driven UI test automation: a registry of dynamically loaded
//! automation plugins, named test data with `${set.item}` references, and an
//! orchestrator that runs test cases step by step.
pub mod config;
pub mod data;
pub mod engine;
pub mod kernel;
pub mod logging;
pub mod plugin_system;

// Re-export key public types for the binary and for plugin crates
pub use config::AppConfig;
pub use data::{DataItem, DataSet, DataStore};
pub use engine::{DispatchKey, ExecutionResult, Orchestrator, TestCase, TestStep};
pub use kernel::Application;
pub use kernel::error::Error as KernelError;
pub use logging::LogSink;
pub use plugin_system::{AutomationPlugin, PluginError, PluginRegistry, StepParam, StepResult};
