//! Change feed behavior
//!
//! Verify how ctd reads JSON lines from a file or stdin.

use crate::prelude::*;
use similar_asserts::assert_eq;

const INSERT: &str = r#"{"_id":"t1","operationType":"insert","fullDocument":{"_id":1,"sku":"a-1"}}"#;

#[test]
fn stdin_feed_is_archived() {
    let connector = Connector::new().from_stdin();

    connector
        .ctd()
        .stdin(&format!("{}\n", INSERT))
        .fails()
        .code(1);

    let contents: Vec<String> = connector.archived().into_iter().map(|(_, c)| c).collect();
    assert_eq!(contents, vec![r#"{"sku":"a-1"}"#.to_string()]);
}

#[test]
fn empty_entries_are_no_ops() {
    let connector = Connector::new();
    connector.feed(&["", "null", INSERT]);

    connector.ctd().fails();

    assert_eq!(connector.archived().len(), 1);
    let log = connector.log();
    assert_eq!(log.matches("no changes tracked by change feed").count(), 2, "{}", log);
}

#[test]
fn malformed_line_is_skipped() {
    let connector = Connector::new();
    connector.feed(&["{not json", INSERT]);

    connector.ctd().fails();

    assert_eq!(connector.archived().len(), 1);
    assert!(connector.log().contains("transient change feed error"));
}

#[test]
fn unsupported_operations_are_ignored() {
    let connector = Connector::new();
    connector.feed(&[
        r#"{"_id":"t0","operationType":"drop"}"#,
        INSERT,
    ]);

    connector.ctd().fails();

    assert_eq!(connector.archived().len(), 1);
}

#[test]
fn empty_feed_archives_nothing() {
    let connector = Connector::new();
    connector.feed(&[]);

    connector.ctd().fails().code(1);

    assert!(connector.archived().is_empty());
    assert!(connector.log().contains("watching change feed"));
}
