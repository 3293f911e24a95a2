//! # Autocase Core Test Engine
//!
//! Test case model, the [`Orchestrator`] that executes cases against the
//! plugin registry, setup/teardown [`ScriptHooks`], and the JSON
//! [`serializer`] for case files.
pub mod error;
pub mod hooks;
pub mod model;
pub mod orchestrator;
pub mod serializer;

pub use error::CaseFormatError;
pub use hooks::{LoggingHooks, ScriptError, ScriptHooks};
pub use model::{
    CaseId, DispatchKey, ERR_ACTION_NOT_SUPPORTED, ERR_PLUGIN_NOT_FOUND, ERR_PLUGIN_RAISED,
    ERR_UNKNOWN_FAILURE, ExecutionResult, RunPhase, StepId, StepRecord, TestCase, TestStep,
};
pub use orchestrator::Orchestrator;

#[cfg(test)]
mod tests;
