use std::sync::Arc;

use crate::logging::{LogSink, emit};

/// A setup or teardown script reported failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ScriptError(pub String);

/// Runs the opaque setup/teardown scripts attached to a test case.
pub trait ScriptHooks: Send + Sync {
    /// A failure here skips every step and the teardown.
    fn setup(&self, script: &str) -> Result<(), ScriptError>;

    /// Failures are logged by the orchestrator and otherwise ignored.
    fn teardown(&self, script: &str) -> Result<(), ScriptError>;
}

/// Default hooks: record the script in the log and succeed.
pub struct LoggingHooks {
    sink: Arc<dyn LogSink>,
}

impl LoggingHooks {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }
}

impl ScriptHooks for LoggingHooks {
    fn setup(&self, script: &str) -> Result<(), ScriptError> {
        emit!(self.sink, Info, "Setup script execution: {}", script);
        Ok(())
    }

    fn teardown(&self, script: &str) -> Result<(), ScriptError> {
        emit!(self.sink, Info, "Teardown script execution: {}", script);
        Ok(())
    }
}
