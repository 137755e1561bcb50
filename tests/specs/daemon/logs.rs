//! Daemon log behavior
//!
//! Verify what ctd writes to its log file.

use crate::prelude::*;
use similar_asserts::assert_eq;

const INSERT: &str = r#"{"_id":"t1","operationType":"insert","fullDocument":{"_id":1,"sku":"a-1"}}"#;

#[test]
fn log_starts_with_marker() {
    let connector = Connector::new();
    connector.feed(&[INSERT]);

    connector.ctd().fails();

    let log = connector.log();
    assert!(log.starts_with("--- ctd: starting (pid: "), "{}", log);
}

#[test]
fn markers_accumulate_across_runs() {
    let connector = Connector::new();
    connector.feed(&[INSERT]);

    connector.ctd().fails();
    connector.ctd().fails();

    assert_eq!(connector.log().matches("--- ctd: starting (pid: ").count(), 2);
}

#[test]
fn log_records_each_published_change() {
    let connector = Connector::new();
    connector.feed(&[INSERT]);

    connector.ctd().fails();

    let log = connector.log();
    assert!(log.contains("Daemon started"), "{}", log);
    assert!(log.contains("change archived and published"), "{}", log);
    assert!(log.contains("operation=insert"), "{}", log);
}

#[test]
fn rust_log_filters_output() {
    let connector = Connector::new();
    connector.feed(&[INSERT]);

    connector.ctd().env("RUST_LOG", "error").fails();

    let log = connector.log();
    assert!(!log.contains("change archived and published"), "{}", log);
    assert!(log.contains("giving up on change pipeline"), "{}", log);
}
