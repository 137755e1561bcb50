//! Archive behavior
//!
//! Verify the objects ctd writes for each kind of change.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[test]
fn insert_is_archived_without_id() {
    let connector = Connector::new();
    connector.feed(&[
        r#"{"_id":"t1","operationType":"insert","fullDocument":{"_id":1,"sku":"a-1","qty":2}}"#,
    ]);

    connector.ctd().fails();

    let archived = connector.archived();
    assert_eq!(archived.len(), 1);
    let (name, content) = &archived[0];
    assert!(name.starts_with("orders-"), "{}", name);
    assert!(name.ends_with(".json"), "{}", name);
    assert_eq!(content, r#"{"sku":"a-1","qty":2}"#);
}

#[test]
fn update_archives_looked_up_document() {
    let connector = Connector::new();
    connector.feed(&[
        r#"{"_id":"t1","operationType":"update","fullDocument":{"_id":1,"sku":"a-1","qty":5},"documentKey":{"_id":1}}"#,
    ]);

    connector.ctd().fails();

    let contents: Vec<String> = connector.archived().into_iter().map(|(_, c)| c).collect();
    assert_eq!(contents, vec![r#"{"sku":"a-1","qty":5}"#.to_string()]);
}

#[test]
fn delete_archives_pre_image_when_present() {
    let connector = Connector::new();
    connector.feed(&[
        r#"{"_id":"t1","operationType":"delete","documentKey":{"_id":1},"fullDocumentBeforeChange":{"_id":1,"sku":"gone"}}"#,
        r#"{"_id":"t2","operationType":"delete","documentKey":{"_id":2}}"#,
    ]);

    connector.ctd().fails();

    let mut contents: Vec<String> = connector.archived().into_iter().map(|(_, c)| c).collect();
    contents.sort();
    assert_eq!(
        contents,
        vec![r#"{"sku":"gone"}"#.to_string(), "{}".to_string()]
    );
}

#[test]
fn every_change_gets_its_own_object() {
    let connector = Connector::new();
    let lines: Vec<String> = (0..5)
        .map(|i| {
            format!(
                r#"{{"_id":"t{i}","operationType":"insert","fullDocument":{{"_id":{i},"n":{i}}}}}"#
            )
        })
        .collect();
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    connector.feed(&lines);

    connector.ctd().fails();

    let mut contents: Vec<String> = connector.archived().into_iter().map(|(_, c)| c).collect();
    contents.sort();
    let expected: Vec<String> = (0..5).map(|i| format!(r#"{{"n":{i}}}"#)).collect();
    assert_eq!(contents, expected);
}

#[cfg(unix)]
#[test]
fn archived_objects_carry_archive_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let connector = Connector::new();
    connector.feed(&[r#"{"_id":"t1","operationType":"insert","fullDocument":{"_id":1}}"#]);

    connector.ctd().fails();

    let (name, _) = &connector.archived()[0];
    let path = connector.path().join("archive").join(CONTAINER).join(name);
    let mode = std::fs::metadata(path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o776);
}

#[test]
fn publish_failure_keeps_archived_object() {
    let connector = Connector::new().with_config(
        "\n[publish]\nsink = \"http\"\nendpoint = \"http://127.0.0.1:9/api/events\"\ntimeout = \"1s\"\n",
    );
    connector.feed(&[
        r#"{"_id":"t1","operationType":"insert","fullDocument":{"_id":1,"sku":"a-1"}}"#,
    ]);

    connector.ctd().fails().code(1);

    assert_eq!(connector.archived().len(), 1);
    let log = connector.log();
    assert!(
        log.contains("change archived but notification failed; reconcile manually"),
        "{}",
        log
    );
}
