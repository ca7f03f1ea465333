use serial_test::serial;

use super::*;

fn write(
    path: &std::path::Path,
    content: &str,
) {
    std::fs::write(path, content).unwrap();
}

#[test]
#[serial]
fn get_targets_should_reread_file_on_every_call() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("collector.toml");
    write(
        &path,
        r#"
        [targets.router1]
        address = "10.0.0.1:57400"
        "#,
    );
    let loader = FileTargetLoader::new(Some(path.clone()), CollectorConfig::default());

    let first = loader.get_targets().unwrap();
    assert_eq!(first.len(), 1);
    assert!(first.contains_key("router1"));

    write(
        &path,
        r#"
        [targets.router2]
        address = "10.0.0.2:57400"

        [targets.router3]
        address = "10.0.0.3:57400"
        "#,
    );

    let second = loader.get_targets().unwrap();
    assert_eq!(second.len(), 2);
    assert!(!second.contains_key("router1"));
    assert_eq!(loader.current().targets.len(), 2);
}

#[test]
#[serial]
fn get_targets_should_report_no_targets_for_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("collector.toml");
    write(&path, "[global]\nformat = \"json\"\n");
    let loader = FileTargetLoader::new(Some(path), CollectorConfig::default());

    let err = loader.get_targets().unwrap_err();
    assert!(err.is_no_targets());
    assert_eq!(loader.current().global.format, "json");
}

#[test]
#[serial]
fn get_targets_should_keep_last_good_snapshot_on_parse_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("collector.toml");
    write(
        &path,
        r#"
        [targets.router1]
        address = "10.0.0.1:57400"
        "#,
    );
    let loader = FileTargetLoader::new(Some(path.clone()), CollectorConfig::default());
    loader.get_targets().unwrap();

    write(&path, "[targets.router1\naddress = ");

    let err = loader.get_targets().unwrap_err();
    assert!(!err.is_no_targets());
    assert!(loader.current().targets.contains_key("router1"));
}

#[test]
fn get_targets_without_file_should_serve_initial_config() {
    let mut initial = CollectorConfig::default();
    initial
        .targets
        .insert("router1".to_string(), TargetConfig::new("router1", "10.0.0.1:57400"));
    let loader = FileTargetLoader::new(None, initial);

    let targets = loader.get_targets().unwrap();
    assert_eq!(targets.len(), 1);
    assert!(loader.watch_path().is_none());
}
