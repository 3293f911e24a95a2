//! JSON form of [`TestCase`]s.
//!
//! A file holds either one case object or an array of them:
//!
//! ```json
//! [{
//!   "id": 1, "name": "login", "description": "", "project_id": 1,
//!   "steps": [
//!     { "id": 1, "plugin_name": "Win32Plugin", "action": "click",
//!       "target": "okButton", "value": "", "stop_on_failure": true }
//!   ]
//! }]
//! ```
//!
//! Missing fields take their defaults; `stop_on_failure` defaults to true.
use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::model::{DataSetId, ProjectId};
use crate::engine::error::CaseFormatError;
use crate::engine::model::{CaseId, StepId, TestCase, TestStep};
use crate::kernel::constants::DEFAULT_STEP_TIMEOUT_MS;
use crate::plugin_system::traits::StepParam;

// --- Intermediate structs for (de)serialization ---

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    DEFAULT_STEP_TIMEOUT_MS
}

fn is_default_timeout(timeout: &u64) -> bool {
    *timeout == DEFAULT_STEP_TIMEOUT_MS
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Serialize, Deserialize, Debug)]
struct RawTestStep {
    #[serde(default)]
    id: StepId,
    #[serde(default)]
    plugin_name: String,
    #[serde(default)]
    action: String,
    #[serde(default)]
    target: String,
    #[serde(default)]
    value: String,
    #[serde(default = "default_true")]
    stop_on_failure: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    is_optional: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, String>,
    #[serde(default = "default_timeout", skip_serializing_if = "is_default_timeout")]
    timeout_ms: u64,
}

#[derive(Serialize, Deserialize, Debug)]
struct RawTestCase {
    #[serde(default)]
    id: CaseId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    project_id: ProjectId,
    #[serde(default)]
    steps: Vec<RawTestStep>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    setup_script: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    teardown_script: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    data_set_ids: Vec<DataSetId>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RawCaseFile {
    Many(Vec<RawTestCase>),
    One(RawTestCase),
}

// --- End intermediate structs ---

impl From<RawTestStep> for TestStep {
    fn from(raw: RawTestStep) -> Self {
        TestStep {
            id: raw.id,
            plugin_name: raw.plugin_name,
            param: StepParam {
                action: raw.action,
                target: raw.target,
                value: raw.value,
                params: raw.params,
                timeout_ms: raw.timeout_ms,
            },
            is_optional: raw.is_optional,
            stop_on_failure: raw.stop_on_failure,
        }
    }
}

impl From<&TestStep> for RawTestStep {
    fn from(step: &TestStep) -> Self {
        RawTestStep {
            id: step.id,
            plugin_name: step.plugin_name.clone(),
            action: step.param.action.clone(),
            target: step.param.target.clone(),
            value: step.param.value.clone(),
            stop_on_failure: step.stop_on_failure,
            is_optional: step.is_optional,
            params: step.param.params.clone(),
            timeout_ms: step.param.timeout_ms,
        }
    }
}

impl From<RawTestCase> for TestCase {
    fn from(raw: RawTestCase) -> Self {
        TestCase {
            id: raw.id,
            name: raw.name,
            description: raw.description,
            project_id: raw.project_id,
            steps: raw.steps.into_iter().map(TestStep::from).collect(),
            setup_script: raw.setup_script,
            teardown_script: raw.teardown_script,
            data_set_ids: raw.data_set_ids,
        }
    }
}

impl From<&TestCase> for RawTestCase {
    fn from(case: &TestCase) -> Self {
        RawTestCase {
            id: case.id,
            name: case.name.clone(),
            description: case.description.clone(),
            project_id: case.project_id,
            steps: case.steps.iter().map(RawTestStep::from).collect(),
            setup_script: case.setup_script.clone(),
            teardown_script: case.teardown_script.clone(),
            data_set_ids: case.data_set_ids.clone(),
        }
    }
}

/// Pretty-printed JSON array of `cases`.
pub fn to_json(cases: &[TestCase]) -> Result<String, CaseFormatError> {
    let raw: Vec<RawTestCase> = cases.iter().map(RawTestCase::from).collect();
    serde_json::to_string_pretty(&raw).map_err(CaseFormatError::Encode)
}

/// Parse a single case object or an array of cases.
pub fn from_json(text: &str) -> Result<Vec<TestCase>, CaseFormatError> {
    let raw: RawCaseFile =
        serde_json::from_str(text).map_err(|source| CaseFormatError::Parse { path: None, source })?;
    Ok(match raw {
        RawCaseFile::Many(cases) => cases.into_iter().map(TestCase::from).collect(),
        RawCaseFile::One(case) => vec![TestCase::from(case)],
    })
}

pub fn save_to_file(cases: &[TestCase], path: impl AsRef<Path>) -> Result<(), CaseFormatError> {
    let path = path.as_ref();
    let json = to_json(cases)?;
    std::fs::write(path, json).map_err(|source| CaseFormatError::Io {
        path: path.to_path_buf(),
        operation: "write",
        source,
    })
}

pub fn load_from_file(path: impl AsRef<Path>) -> Result<Vec<TestCase>, CaseFormatError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| CaseFormatError::Io {
        path: path.to_path_buf(),
        operation: "read",
        source,
    })?;
    from_json(&text).map_err(|e| match e {
        CaseFormatError::Parse { source, .. } => CaseFormatError::Parse {
            path: Some(path.to_path_buf()),
            source,
        },
        other => other,
    })
}
