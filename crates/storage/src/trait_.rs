//! Storage trait abstraction.

use async_trait::async_trait;
use tally_core::{Settings, Task};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Storage abstraction for Tally data.
///
/// The task list is read and written as a whole; there is no per-task
/// transaction.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Load every task in list order. Missing data yields an empty list.
    async fn load_tasks(&self) -> Result<Vec<Task>>;

    /// Replace the stored task list.
    async fn save_tasks(&mut self, tasks: &[Task]) -> Result<()>;

    /// Load settings. Missing data yields the defaults.
    async fn load_settings(&self) -> Result<Settings>;

    /// Replace the stored settings.
    async fn save_settings(&mut self, settings: &Settings) -> Result<()>;
}
