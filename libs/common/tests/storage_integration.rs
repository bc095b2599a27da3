//! Integration tests for the storage components
//!
//! These tests verify that independent collections sharing one data
//! directory persist and reload without interfering with each other.

use common::storage::{JsonCollection, StorageConfig, health_check, init_data_dir};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Record {
    record_id: u32,
    owner: String,
}

/// Test that verifies two collections round through the same directory
/// and survive a fresh handle being opened on them
#[tokio::test]
async fn test_storage_integration() -> Result<(), Box<dyn std::error::Error>> {
    let root = tempfile::tempdir()?;
    let config = StorageConfig {
        data_dir: root.path().join("nested").join("data"),
    };

    // The directory does not exist until initialised
    assert!(!health_check(&config.data_dir).await?);
    init_data_dir(&config).await?;
    assert!(
        health_check(&config.data_dir).await?,
        "Storage health check failed"
    );

    let left: JsonCollection<Record> = JsonCollection::new(&config.data_dir, "left");
    let right: JsonCollection<Record> = JsonCollection::new(&config.data_dir, "right");

    left.save_all(&[Record {
        record_id: 1,
        owner: "ada".into(),
    }])
    .await?;
    right.save_all(&[]).await?;

    // A fresh handle sees the last saved snapshot
    let reopened: JsonCollection<Record> = JsonCollection::new(&config.data_dir, "left");
    let loaded = reopened.load_all().await?;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].owner, "ada");
    assert!(right.load_all().await?.is_empty());

    // Files hold a JSON array with camelCase keys
    let raw = std::fs::read_to_string(config.data_dir.join("left.json"))?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    assert_eq!(value[0]["recordId"], 1);

    Ok(())
}
