use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::model::{DataSetId, ProjectId};
use crate::plugin_system::traits::{StepParam, StepResult};

pub type CaseId = i64;
pub type StepId = i64;

/// The step named a plugin the registry does not know.
pub const ERR_PLUGIN_NOT_FOUND: i32 = -1;
/// The plugin does not list the step's dispatch key among its actions.
pub const ERR_ACTION_NOT_SUPPORTED: i32 = -2;
/// The plugin reported an error instead of a result.
pub const ERR_PLUGIN_RAISED: i32 = -3;
/// The plugin panicked or failed in a way it did not describe.
pub const ERR_UNKNOWN_FAILURE: i32 = -4;

/// One authored step of a [`TestCase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestStep {
    /// Unique within the owning case
    pub id: StepId,
    pub plugin_name: String,
    pub param: StepParam,
    /// A failed optional step never fails the case
    pub is_optional: bool,
    /// Abort the case when this step fails; ignored for optional steps
    pub stop_on_failure: bool,
}

impl TestStep {
    pub fn new(id: StepId, plugin_name: impl Into<String>, param: StepParam) -> Self {
        Self {
            id,
            plugin_name: plugin_name.into(),
            param,
            is_optional: false,
            stop_on_failure: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    pub fn continue_on_failure(mut self) -> Self {
        self.stop_on_failure = false;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestCase {
    pub id: CaseId,
    pub name: String,
    pub description: String,
    pub project_id: ProjectId,
    /// Executed in this order
    pub steps: Vec<TestStep>,
    /// Opaque to the orchestrator; handed to the setup hook when non-empty
    pub setup_script: String,
    pub teardown_script: String,
    pub data_set_ids: Vec<DataSetId>,
}

impl TestCase {
    pub fn new(id: CaseId, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), ..Self::default() }
    }

    pub fn with_step(mut self, step: TestStep) -> Self {
        self.steps.push(step);
        self
    }
}

/// Result of one executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step_id: StepId,
    pub result: StepResult,
    pub started_at: DateTime<Utc>,
    /// Wall time measured by the orchestrator
    pub duration_ms: u64,
}

/// Result of one case run. Created fresh per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub case_id: CaseId,
    pub case_name: String,
    pub overall_success: bool,
    /// One record per executed step, in authored order
    pub step_results: Vec<StepRecord>,
    pub total_duration_ms: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Remaining steps were skipped after a stop-on-failure step failed
    pub aborted: bool,
    pub error_message: Option<String>,
}

/// Stages a case run passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunPhase {
    Created,
    SetupRunning,
    StepsRunning,
    /// A stop-on-failure step failed; teardown still follows
    Aborted,
    TeardownRunning,
    Completed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Which [`StepParam`] field must appear in a plugin's supported actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchKey {
    #[default]
    Action,
    Target,
    /// Accept a step if either field is supported
    Either,
}

impl DispatchKey {
    /// Whether `param` passes the support check.
    pub fn accepts(self, param: &StepParam, is_supported: impl Fn(&str) -> bool) -> bool {
        match self {
            DispatchKey::Action => is_supported(&param.action),
            DispatchKey::Target => is_supported(&param.target),
            DispatchKey::Either => is_supported(&param.action) || is_supported(&param.target),
        }
    }

    /// The field reported in an "action not supported" message
    pub fn key_of(self, param: &StepParam) -> &str {
        match self {
            DispatchKey::Target => &param.target,
            DispatchKey::Action | DispatchKey::Either => &param.action,
        }
    }
}

impl FromStr for DispatchKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "action" => Ok(DispatchKey::Action),
            "target" => Ok(DispatchKey::Target),
            "either" => Ok(DispatchKey::Either),
            other => Err(format!("unknown dispatch key '{}', expected action, target or either", other)),
        }
    }
}
