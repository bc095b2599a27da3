//! File-backed storage for entity collections
//!
//! Every collection lives in its own JSON file under a shared data
//! directory and is rewritten wholesale on each save. Saves go through a
//! temporary sibling file followed by a rename, so a concurrent reader
//! only ever observes the previous or the new snapshot.

use crate::error::{StorageError, StorageResult};
use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, error, info};

/// Storage configuration struct
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding one JSON file per collection
    pub data_dir: PathBuf,
}

/// Create the data directory if it does not exist yet
pub async fn init_data_dir(config: &StorageConfig) -> StorageResult<()> {
    fs::create_dir_all(&config.data_dir)
        .await
        .map_err(|e| StorageError::io(&config.data_dir, e))?;

    info!("Data directory ready at {}", config.data_dir.display());
    Ok(())
}

/// Check that the data directory exists and accepts writes
///
/// # Returns
///
/// * `StorageResult<bool>` - True if a marker file could be written and removed
pub async fn health_check(data_dir: &Path) -> StorageResult<bool> {
    match fs::metadata(data_dir).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Ok(false),
        Err(e) => {
            error!("Data directory {} unavailable: {}", data_dir.display(), e);
            return Ok(false);
        }
    }

    let marker = data_dir.join(".health");
    if let Err(e) = fs::write(&marker, b"ok").await {
        error!(
            "Data directory {} is not writable: {}",
            data_dir.display(), e
        );
        return Ok(false);
    }
    fs::remove_file(&marker)
        .await
        .map_err(|e| StorageError::io(&marker, e))?;

    Ok(true)
}

/// One persisted collection of records, stored as a JSON array
#[derive(Debug, Clone)]
pub struct JsonCollection<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Bind a collection named `name` inside `data_dir` (`<data_dir>/<name>.json`)
    pub fn new(data_dir: impl AsRef<Path>, name: &str) -> Self {
        Self {
            path: data_dir.as_ref().join(format!("{name}.json")),
            _record: PhantomData,
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every record; a missing file is an empty collection
    pub async fn load_all(&self) -> StorageResult<Vec<T>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No file at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes).map_err(|e| StorageError::serialization(&self.path, e))
    }

    /// Replace the stored collection with `records`
    ///
    /// The data is durable on disk when this returns `Ok`.
    pub async fn save_all(&self, records: &[T]) -> StorageResult<()> {
        let body = serde_json::to_vec_pretty(records)
            .map_err(|e| StorageError::serialization(&self.path, e))?;

        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp)
            .await
            .map_err(|e| StorageError::io(&tmp, e))?;
        file.write_all(&body)
            .await
            .map_err(|e| StorageError::io(&tmp, e))?;
        file.sync_all()
            .await
            .map_err(|e| StorageError::io(&tmp, e))?;
        drop(file);

        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StorageError::io(&self.path, e))?;

        debug!("Saved {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Widget {
        id: u32,
        label: String,
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let widgets: JsonCollection<Widget> = JsonCollection::new(dir.path(), "widgets");

        assert!(widgets.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let widgets = JsonCollection::new(dir.path(), "widgets");

        let first = vec![
            Widget {
                id: 1,
                label: "bolt".into(),
            },
            Widget {
                id: 2,
                label: "nut".into(),
            },
        ];
        widgets.save_all(&first).await.unwrap();

        let second = vec![Widget {
            id: 3,
            label: "washer".into(),
        }];
        widgets.save_all(&second).await.unwrap();

        assert_eq!(widgets.load_all().await.unwrap(), second);
        assert!(!dir.path().join("widgets.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let widgets: JsonCollection<Widget> = JsonCollection::new(dir.path(), "widgets");
        std::fs::write(widgets.path(), b"{ not json").unwrap();

        let err = widgets.load_all().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization { .. }));
    }

    #[tokio::test]
    async fn test_health_check_on_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        assert!(!health_check(&missing).await.unwrap());
        assert!(health_check(dir.path()).await.unwrap());
    }
}
