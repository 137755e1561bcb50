//! Daemon lifecycle behavior
//!
//! Verify startup, give-up and cleanup behavior of ctd.

use crate::prelude::*;
use similar_asserts::assert_eq;

const INSERT: &str = r#"{"_id":"t1","operationType":"insert","fullDocument":{"_id":1,"sku":"a-1"}}"#;
const UPDATE: &str = r#"{"_id":"t2","operationType":"update","fullDocument":{"_id":1,"sku":"a-2"}}"#;

#[test]
fn gives_up_at_end_of_feed_without_restarts() {
    let connector = Connector::new();
    connector.feed(&[INSERT]);

    connector
        .ctd()
        .fails()
        .code(1)
        .stderr_has("GaveUp");

    assert!(connector.log().contains("giving up on change pipeline"));
}

#[test]
fn lock_file_removed_on_exit() {
    let connector = Connector::new();
    connector.feed(&[INSERT]);

    connector.ctd().fails();

    assert!(!connector.lock_path().exists());
}

#[test]
fn restarts_resume_after_last_change() {
    let connector = Connector::new()
        .with_supervisor("restart = \"always\"\nmax_restarts = 2\nbackoff = \"10ms\"");
    connector.feed(&[INSERT, UPDATE]);

    connector.ctd().fails().code(1);

    // Each restart reopens the file after the last handled token
    assert_eq!(connector.archived().len(), 2);
    let log = connector.log();
    assert_eq!(log.matches("restarting change pipeline").count(), 2);
    assert!(log.contains("giving up on change pipeline"));
}

#[test]
fn missing_feed_file_gives_up() {
    let connector = Connector::new();

    connector.ctd().fails().code(1);

    assert!(connector.log().contains("failed to open change feed"));
    assert!(connector.archived().is_empty());
}

#[test]
fn listen_address_in_use_fails_startup() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap();
    let connector = Connector::new().with_config(&format!("listen = \"{}\"\n", addr));
    connector.feed(&[INSERT]);

    connector.ctd().fails().code(1).stderr_has("BindFailed");

    assert!(connector
        .log()
        .contains("ERROR Failed to start daemon: Failed to bind liveness endpoint"));
    assert!(!connector.lock_path().exists());
    assert!(connector.archived().is_empty());
}
