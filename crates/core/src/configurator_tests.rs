use super::*;
use std::io::Write;

fn write_cfg(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn empty_path_is_rejected() {
    let err = ConfiguratorManager::initialize("").unwrap_err();
    assert!(matches!(err, ConfiguratorError::EmptyPath));
}

#[test]
fn missing_key_returns_null_not_error() {
    let file = write_cfg("executor:\n  executors: []\n");
    let cfg = ConfiguratorManager::initialize(file.path()).unwrap();
    assert_eq!(cfg.get_node_options_by_key("nonexistent"), Value::Null);
}

#[test]
fn present_key_round_trips() {
    let file = write_cfg("log:\n  level: info\n");
    let cfg = ConfiguratorManager::initialize(file.path()).unwrap();
    let node = cfg.get_node_options_by_key("log");
    assert_eq!(node.get("level").and_then(Value::as_str), Some("info"));
}

#[test]
fn shutdown_is_idempotent() {
    let file = write_cfg("executor: {}\n");
    let cfg = ConfiguratorManager::initialize(file.path()).unwrap();
    cfg.start();
    cfg.shutdown();
    cfg.shutdown();
}

#[test]
#[should_panic(expected = "Init state")]
fn query_outside_init_panics() {
    let file = write_cfg("executor: {}\n");
    let cfg = ConfiguratorManager::initialize(file.path()).unwrap();
    cfg.start();
    let _ = cfg.get_node_options_by_key("executor");
}
