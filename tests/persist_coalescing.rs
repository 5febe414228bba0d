//! Write coalescing through the public engine API
//!
//! `#[tokio::test]` runs on a current-thread runtime and `join!` polls its
//! futures in order, so the first write is always in flight by the time
//! the later ones are submitted.

use std::fs;

use docstore::persist::TextFile;
use tempfile::TempDir;

#[tokio::test]
async fn test_three_writes_become_two() {
    let temp_dir = TempDir::new().unwrap();
    let engine = TextFile::new(temp_dir.path().join("db.json")).unwrap();

    let (w1, w2, w3) = tokio::join!(engine.write("w1"), engine.write("w2"), engine.write("w3"));

    assert!(w1.is_ok());
    assert!(w2.is_ok());
    assert!(w3.is_ok());

    let metrics = engine.metrics().snapshot();
    assert_eq!(metrics.physical_writes, 2);
    assert_eq!(metrics.coalesced_writes, 1);
    assert_eq!(fs::read_to_string(engine.path()).unwrap(), "w3");
    assert!(engine.is_idle());
}

#[tokio::test]
async fn test_only_latest_queued_payload_lands() {
    let temp_dir = TempDir::new().unwrap();
    let engine = TextFile::new(temp_dir.path().join("db.json")).unwrap();

    let results = tokio::join!(
        engine.write("v1"),
        engine.write("v2"),
        engine.write("v3"),
        engine.write("v4"),
        engine.write("v5"),
    );

    for result in [results.0, results.1, results.2, results.3, results.4] {
        assert!(result.is_ok());
    }
    let metrics = engine.metrics().snapshot();
    assert_eq!(metrics.physical_writes, 2);
    assert_eq!(metrics.coalesced_writes, 3);
    assert_eq!(fs::read_to_string(engine.path()).unwrap(), "v5");
}

#[tokio::test]
async fn test_failure_rejects_every_coalesced_caller() {
    let temp_dir = TempDir::new().unwrap();
    let engine = TextFile::new(temp_dir.path().join("db.json")).unwrap();
    // A directory at the target makes every rename fail
    fs::create_dir(engine.path()).unwrap();

    let (w1, w2, w3) = tokio::join!(engine.write("w1"), engine.write("w2"), engine.write("w3"));

    for result in [w1, w2, w3] {
        assert_eq!(result.unwrap_err().code(), "DOCSTORE_PERSIST_RENAME_FAILED");
    }
    assert_eq!(engine.metrics().snapshot().failed_writes, 2);
    assert!(engine.is_idle());
}

#[tokio::test]
async fn test_writes_after_idle_start_fresh() {
    let temp_dir = TempDir::new().unwrap();
    let engine = TextFile::new(temp_dir.path().join("db.json")).unwrap();

    engine.write("a").await.unwrap();
    engine.write("b").await.unwrap();

    assert_eq!(engine.metrics().snapshot().physical_writes, 2);
    assert_eq!(engine.metrics().snapshot().coalesced_writes, 0);
    assert_eq!(engine.read().await.as_deref(), Some("b"));
}
