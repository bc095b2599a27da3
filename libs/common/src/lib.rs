//! Common library for the shop service
//!
//! This crate provides the persistence collaborator shared by the shop
//! stores: every entity collection is loaded whole from, and saved whole
//! to, its own JSON file.

pub mod error;
pub mod storage;

pub use error::{StorageError, StorageResult};
pub use storage::{JsonCollection, StorageConfig};

/// Example usage of the storage module
///
/// ```rust,no_run
/// use common::storage::{JsonCollection, StorageConfig, health_check, init_data_dir};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = StorageConfig {
///         data_dir: "data".into(),
///     };
///     init_data_dir(&config).await?;
///     let tags: JsonCollection<String> = JsonCollection::new(&config.data_dir, "tags");
///     tags.save_all(&["new".to_string()]).await?;
///     println!("Storage health check: {}", health_check(&config.data_dir).await?);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
