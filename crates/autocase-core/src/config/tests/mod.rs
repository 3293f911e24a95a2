use std::path::{Path, PathBuf};

use tempfile::tempdir;

use crate::config::{AppConfig, ConfigError, ConfigFormat};
use crate::engine::model::DispatchKey;

#[test]
fn test_format_from_extension() {
    assert_eq!(ConfigFormat::from_path(Path::new("a.json")), Some(ConfigFormat::Json));
    assert_eq!(ConfigFormat::from_path(Path::new("a.JSON")), Some(ConfigFormat::Json));
    assert_eq!(ConfigFormat::from_path(Path::new("a.ini")), None);
    assert_eq!(ConfigFormat::from_path(Path::new("noext")), None);
    #[cfg(feature = "yaml-config")]
    assert_eq!(ConfigFormat::from_path(Path::new("a.yml")), Some(ConfigFormat::Yaml));
    #[cfg(feature = "toml-config")]
    assert_eq!(ConfigFormat::from_path(Path::new("a.toml")), Some(ConfigFormat::Toml));
}

#[test]
fn test_missing_keys_take_defaults() {
    let config = AppConfig::deserialize(r#"{"verbose": true}"#, ConfigFormat::Json).expect("parse");
    assert!(config.verbose);
    assert_eq!(config.plugin_dir, PathBuf::from("plugins"));
    assert_eq!(config.log_level, "info");
    assert_eq!(config.dispatch_key, DispatchKey::Action);
    assert!(config.data_files.is_empty());
}

#[test]
fn test_json_file_round_trip() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("autocase.json");
    let config = AppConfig {
        plugin_dir: PathBuf::from("/opt/autocase/plugins"),
        log_level: "debug".to_string(),
        verbose: true,
        dispatch_key: DispatchKey::Either,
        project_id: 12,
        data_files: vec![PathBuf::from("users.json")],
    };
    config.save(&path).expect("save");
    assert!(std::fs::read_to_string(&path).expect("read").contains("\"either\""));
    assert_eq!(AppConfig::load(&path).expect("load"), config);
}

#[cfg(feature = "toml-config")]
#[test]
fn test_toml_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("autocase.toml");
    std::fs::write(
        &path,
        "plugin_dir = \"mods\"\ndispatch_key = \"target\"\ndata_files = [\"a.json\", \"b.json\"]\n",
    )
    .expect("write");

    let config = AppConfig::load(&path).expect("load toml");
    assert_eq!(config.plugin_dir, PathBuf::from("mods"));
    assert_eq!(config.dispatch_key, DispatchKey::Target);
    assert_eq!(config.data_files.len(), 2);
}

#[cfg(feature = "yaml-config")]
#[test]
fn test_yaml_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("autocase.yaml");
    std::fs::write(&path, "log_level: warn\nproject_id: 3\n").expect("write");

    let config = AppConfig::load(&path).expect("load yaml");
    assert_eq!(config.level_filter().expect("level"), log::LevelFilter::Warn);
    assert_eq!(config.project_id, 3);
}

#[test]
fn test_invalid_inputs_are_reported() {
    let dir = tempdir().expect("tempdir");

    assert!(matches!(
        AppConfig::load(dir.path().join("settings.ini")),
        Err(ConfigError::UnsupportedFormat { .. })
    ));
    assert!(matches!(
        AppConfig::load(dir.path().join("absent.json")),
        Err(ConfigError::Io { .. })
    ));

    let bad_key = dir.path().join("bad_key.json");
    std::fs::write(&bad_key, r#"{"dispatch_key": "sideways"}"#).expect("write");
    assert!(matches!(AppConfig::load(&bad_key), Err(ConfigError::Parse { format: "json", .. })));

    let bad_level = dir.path().join("bad_level.json");
    std::fs::write(&bad_level, r#"{"log_level": "loud"}"#).expect("write");
    assert!(matches!(
        AppConfig::load(&bad_level),
        Err(ConfigError::InvalidValue { key: "log_level", .. })
    ));
}
