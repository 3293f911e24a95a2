use serde_json::Value;
use tempfile::tempdir;

use crate::engine::error::CaseFormatError;
use crate::engine::model::{TestCase, TestStep};
use crate::engine::serializer;
use crate::kernel::constants::DEFAULT_STEP_TIMEOUT_MS;
use crate::plugin_system::traits::StepParam;

#[test]
fn test_minimal_step_takes_defaults() {
    let cases = serializer::from_json(
        r#"{"id": 3, "name": "login", "steps": [{"id": 1, "plugin_name": "Win32Plugin", "action": "click", "target": "ok"}]}"#,
    )
    .expect("parse single case");

    assert_eq!(cases.len(), 1);
    let step = &cases[0].steps[0];
    assert_eq!(step.plugin_name, "Win32Plugin");
    assert_eq!(step.param.action, "click");
    assert_eq!(step.param.value, "");
    assert!(step.stop_on_failure);
    assert!(!step.is_optional);
    assert_eq!(step.param.timeout_ms, DEFAULT_STEP_TIMEOUT_MS);
}

#[test]
fn test_array_with_optional_fields() {
    let cases = serializer::from_json(
        r#"[
            {"id": 1, "name": "a", "project_id": 4, "setup_script": "start", "data_set_ids": [2],
             "steps": [{"id": 1, "plugin_name": "p", "action": "input", "target": "box", "value": "${Users.admin}",
                        "stop_on_failure": false, "is_optional": true, "params": {"mode": "fast"}, "timeout_ms": 500}]},
            {"id": 2, "name": "b"}
        ]"#,
    )
    .expect("parse array");

    assert_eq!(cases.len(), 2);
    assert_eq!(cases[0].project_id, 4);
    assert_eq!(cases[0].setup_script, "start");
    assert_eq!(cases[0].data_set_ids, vec![2]);
    let step = &cases[0].steps[0];
    assert!(!step.stop_on_failure);
    assert!(step.is_optional);
    assert_eq!(step.param.params.get("mode").map(String::as_str), Some("fast"));
    assert_eq!(step.param.timeout_ms, 500);
    assert!(cases[1].steps.is_empty());
}

#[test]
fn test_written_shape_and_file_reload() {
    let case = TestCase::new(9, "checkout")
        .with_step(TestStep::new(1, "web", StepParam::new("click", "buy", "")))
        .with_step(TestStep::new(2, "web", StepParam::new("input", "qty", "2")).continue_on_failure());

    let json = serializer::to_json(std::slice::from_ref(&case)).expect("encode");
    let value: Value = serde_json::from_str(&json).expect("valid json");
    let step = &value[0]["steps"][1];
    assert_eq!(step["plugin_name"], "web");
    assert_eq!(step["value"], "2");
    assert_eq!(step["stop_on_failure"], false);
    assert!(step.get("timeout_ms").is_none(), "default timeout is omitted");
    assert_eq!(value[0]["description"], "");

    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("cases.json");
    serializer::save_to_file(std::slice::from_ref(&case), &path).expect("save");
    let loaded = serializer::load_from_file(&path).expect("load");
    assert_eq!(loaded, vec![case]);
}

#[test]
fn test_errors_carry_context() {
    let dir = tempdir().expect("tempdir");
    let missing = dir.path().join("missing.json");
    assert!(matches!(
        serializer::load_from_file(&missing),
        Err(CaseFormatError::Io { operation: "read", .. })
    ));

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "[{").expect("write");
    match serializer::load_from_file(&broken) {
        Err(CaseFormatError::Parse { path, .. }) => assert_eq!(path.as_deref(), Some(broken.as_path())),
        other => panic!("expected Parse error, got {:?}", other),
    }

    assert!(serializer::from_json("42").is_err());
}
