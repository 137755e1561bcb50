//! Configuration behavior
//!
//! Verify how ctd finds and validates its config file.

use crate::prelude::*;
use similar_asserts::assert_eq;

const INSERT: &str = r#"{"_id":"t1","operationType":"insert","fullDocument":{"_id":1,"sku":"a-1"}}"#;

#[test]
fn missing_config_file_fails() {
    let connector = Connector::new();
    let missing = connector.path().join("missing.toml");

    ctd()
        .arg(&missing)
        .env_remove("CHANGETAIL_CONFIG")
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .failure()
        .code(1);

    assert!(connector.archived().is_empty());
}

#[test]
fn missing_config_file_is_named_in_error() {
    let connector = Connector::new();
    let missing = connector.path().join("missing.toml");

    let output = ctd()
        .arg(&missing)
        .env_remove("CHANGETAIL_CONFIG")
        .output()
        .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing.toml"), "{}", stderr);
}

#[test]
fn config_path_from_environment() {
    let connector = Connector::new();
    connector.feed(&[INSERT]);
    connector.write_config();

    ctd()
        .env("CHANGETAIL_CONFIG", connector.config_path())
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .failure();

    assert_eq!(connector.archived().len(), 1);
}

#[test]
fn default_config_file_in_working_directory() {
    let connector = Connector::new();
    connector.feed(&[INSERT]);
    connector.write_config();

    ctd()
        .current_dir(connector.path())
        .env_remove("CHANGETAIL_CONFIG")
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .failure();

    assert_eq!(connector.archived().len(), 1);
}

#[test]
fn nested_container_is_rejected() {
    let connector = Connector::new();
    let config = connector.path().join("bad.toml");
    std::fs::write(
        &config,
        "[feed]\nsource = \"stdin\"\n\n[archive]\nroot = \"archive\"\ncontainer = \"a/b\"\n",
    )
    .unwrap();

    let output = ctd().arg(&config).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("archive.container must be a single path segment"),
        "{}",
        stderr
    );
}

#[test]
fn unknown_keys_are_rejected() {
    let connector = Connector::new().with_config("bogus = true\n");
    connector.feed(&[INSERT]);

    connector.ctd().fails().code(1).stderr_has("unknown field");

    assert!(connector.archived().is_empty());
}

#[test]
fn http_sink_requires_endpoint() {
    let connector = Connector::new().with_config("\n[publish]\nsink = \"http\"\n");
    connector.feed(&[INSERT]);

    connector
        .ctd()
        .fails()
        .code(1)
        .stderr_has("publish.endpoint is required for the http sink");
}
