//! JSON file storage implementation.
//!
//! Stores the task list as `tasks.json` and the settings as `settings.json`
//! inside a data directory. Every save rewrites the whole file.

use std::path::{Path, PathBuf};

use tally_core::{Settings, Task};
use tokio::fs;
use tracing::{debug, info};

use super::{Result, Storage, StorageError};

const TASKS_FILE: &str = "tasks.json";
const SETTINGS_FILE: &str = "settings.json";

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Create storage rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if fs::metadata(&root).await.map(|m| !m.is_dir()).unwrap_or(false) {
            return Err(StorageError::Other(format!(
                "{} exists and is not a directory",
                root.display()
            )));
        }
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn tasks_path(&self) -> PathBuf {
        self.root.join(TASKS_FILE)
    }

    fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn load_tasks(&self) -> Result<Vec<Task>> {
        let tasks: Vec<Task> = read_json(&self.tasks_path()).await?.unwrap_or_default();
        debug!("Loaded {} tasks from {}", tasks.len(), self.tasks_path().display());
        Ok(tasks)
    }

    async fn save_tasks(&mut self, tasks: &[Task]) -> Result<()> {
        write_json(&self.tasks_path(), &tasks).await?;
        info!("Saved {} tasks", tasks.len());
        Ok(())
    }

    async fn load_settings(&self) -> Result<Settings> {
        Ok(read_json(&self.settings_path()).await?.unwrap_or_default())
    }

    async fn save_settings(&mut self, settings: &Settings) -> Result<()> {
        write_json(&self.settings_path(), settings).await?;
        info!("Saved settings (recent_x = {})", settings.recent_x);
        Ok(())
    }
}

/// Read a JSON file. A missing or blank file yields `None`.
async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) if json.trim().is_empty() => Ok(None),
        Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json.as_bytes()).await?;
    Ok(())
}
