// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ct_adapters::FeedError;
use ct_engine::Termination;
use std::time::Duration;
use tempfile::TempDir;

fn write_feed(dir: &Path, lines: &[&str]) -> PathBuf {
    let path = dir.join("feed.jsonl");
    std::fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

fn test_config(dir: &Path, feed: &Path) -> Config {
    Config::parse(&format!(
        r#"
[feed]
collection = "orders"
source = {{ path = "{feed}" }}

[archive]
root = "{root}"
container = "orders"

[supervisor]
restart = "never"

[daemon]
lock_path = "{lock}"
listen = "127.0.0.1:0"
"#,
        feed = feed.display(),
        root = dir.join("archive").display(),
        lock = dir.join("ctd.lock").display(),
    ))
    .unwrap()
}

#[test]
fn config_path_prefers_argument_then_env() {
    assert_eq!(
        config_path(Some("a.toml".into()), Some("b.toml".into())),
        PathBuf::from("a.toml")
    );
    assert_eq!(
        config_path(None, Some("b.toml".into())),
        PathBuf::from("b.toml")
    );
    assert_eq!(config_path(None, None), PathBuf::from(DEFAULT_CONFIG_FILE));
    assert_eq!(
        config_path(None, Some(String::new())),
        PathBuf::from(DEFAULT_CONFIG_FILE)
    );
}

#[test]
fn pipeline_config_maps_publish_and_feed_settings() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &dir.path().join("feed.jsonl"));

    let pipeline = pipeline_config(&config);

    assert_eq!(pipeline.container, "orders");
    assert_eq!(pipeline.collection.as_deref(), Some("orders"));
    assert_eq!(pipeline.subject, config.publish.subject);
    assert_eq!(pipeline.data_version, config.publish.data_version);
    assert_eq!(pipeline.resume_after, None);
}

#[test]
fn noop_sink_is_the_default() {
    let sink = ConfiguredSink::from_config(&PublishConfig::default()).unwrap();
    assert!(matches!(sink, ConfiguredSink::Noop(_)));
}

#[test]
fn http_sink_uses_configured_endpoint() {
    let config = PublishConfig {
        sink: SinkKind::Http,
        endpoint: Some("http://127.0.0.1:9/api/events".into()),
        key_env: "CT_LIFECYCLE_TEST_UNSET_KEY".into(),
        ..PublishConfig::default()
    };

    let sink = ConfiguredSink::from_config(&config).unwrap();

    match sink {
        ConfiguredSink::Http(sink) => assert_eq!(sink.endpoint(), "http://127.0.0.1:9/api/events"),
        other => panic!("expected http sink, got {:?}", other),
    }
}

#[test]
fn http_sink_requires_endpoint() {
    let config = PublishConfig {
        sink: SinkKind::Http,
        ..PublishConfig::default()
    };

    let result = ConfiguredSink::from_config(&config);

    assert!(matches!(
        result,
        Err(LifecycleError::Config(ConfigError::Invalid(_)))
    ));
}

#[test]
fn lock_is_exclusive() {
    let dir = TempDir::new().unwrap();
    let lock_path = dir.path().join("run").join("ctd.lock");

    let held = acquire_lock(&lock_path).unwrap();
    let pid = std::fs::read_to_string(&lock_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());

    let second = acquire_lock(&lock_path);
    assert!(matches!(second, Err(LifecycleError::LockFailed(_))));

    drop(held);
    assert!(acquire_lock(&lock_path).is_ok());
}

#[test]
fn cleanup_keeps_lock_owned_by_another_daemon() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &dir.path().join("feed.jsonl"));
    let lock_path = config.daemon.lock_path.clone().unwrap();
    std::fs::write(&lock_path, "1\n").unwrap();

    let busy = std::io::Error::new(std::io::ErrorKind::WouldBlock, "busy");
    cleanup_on_failure(&config, &LifecycleError::LockFailed(busy));
    assert!(lock_path.exists());

    let bind = std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use");
    let addr: SocketAddr = "127.0.0.1:1".parse().unwrap();
    cleanup_on_failure(&config, &LifecycleError::BindFailed(addr, bind));
    assert!(!lock_path.exists());
}

#[tokio::test]
async fn startup_archives_feed_and_gives_up_at_end_of_feed() {
    let dir = TempDir::new().unwrap();
    let feed = write_feed(
        dir.path(),
        &[
            r#"{"_id":"t1","operationType":"insert","fullDocument":{"_id":1,"sku":"a-1"}}"#,
            r#"{"_id":"t2","operationType":"delete","documentKey":{"_id":1}}"#,
        ],
    );
    let config = test_config(dir.path(), &feed);
    let shutdown = CancellationToken::new();

    let mut daemon = startup(&config, shutdown.clone()).await.unwrap();
    assert!(daemon.listen_addr.is_some());

    let supervisor = daemon.take_supervisor().unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), supervisor.join())
        .await
        .unwrap();
    assert_eq!(
        result,
        Err(SupervisorError::GaveUp {
            restarts: 0,
            last: Termination::Fatal(FeedError::Closed),
        })
    );

    let snapshot = daemon.monitor.snapshot();
    assert_eq!(snapshot.archived, 2);
    assert_eq!(snapshot.published, 2);

    let container = dir.path().join("archive").join("orders");
    let mut objects: Vec<String> = std::fs::read_dir(&container)
        .unwrap()
        .map(|entry| std::fs::read_to_string(entry.unwrap().path()).unwrap())
        .collect();
    objects.sort();
    assert_eq!(objects, vec!["{\"sku\":\"a-1\"}".to_string(), "{}".to_string()]);

    shutdown.cancel();
    daemon.shutdown().await;
    assert!(!config.daemon.lock_path.unwrap().exists());
}

#[tokio::test]
async fn startup_fails_when_lock_is_held() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &dir.path().join("feed.jsonl"));
    let lock_path = config.daemon.lock_path.clone().unwrap();
    let _held = acquire_lock(&lock_path).unwrap();

    let result = startup(&config, CancellationToken::new()).await;

    assert!(matches!(result, Err(LifecycleError::LockFailed(_))));
    assert!(lock_path.exists());
}
