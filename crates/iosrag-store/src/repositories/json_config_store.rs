//! JSON file implementation of the `ConfigStore` trait.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use iosrag_core::{ConfigStore, RepositoryError, SystemConfig};

/// Stores the whole [`SystemConfig`] as one pretty-printed JSON file.
///
/// Writes go to `<file>.tmp` first and are renamed over the target, so a
/// crash mid-write never leaves a truncated config behind.
pub struct JsonConfigStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(ToOwned::to_owned)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn storage_error(path: &Path, err: &io::Error) -> RepositoryError {
    RepositoryError::Storage(format!("{}: {err}", path.display()))
}

#[async_trait]
impl ConfigStore for JsonConfigStore {
    async fn load(&self) -> Result<SystemConfig, RepositoryError> {
        match fs::read_to_string(&self.path).await {
            Ok(json) => serde_json::from_str(&json)
                .map_err(|e| RepositoryError::Serialization(e.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(
                    target: "iosrag.store",
                    path = %self.path.display(),
                    "No config file yet, using defaults"
                );
                Ok(SystemConfig::with_defaults())
            }
            Err(e) => Err(storage_error(&self.path, &e)),
        }
    }

    async fn save(&self, config: &SystemConfig) -> Result<(), RepositoryError> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        let _guard = self.write_lock.lock().await;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| storage_error(dir, &e))?;
        }
        let temp = self.temp_path();
        fs::write(&temp, json)
            .await
            .map_err(|e| storage_error(&temp, &e))?;
        fs::rename(&temp, &self.path)
            .await
            .map_err(|e| storage_error(&self.path, &e))?;

        tracing::debug!(target: "iosrag.store", path = %self.path.display(), "Config saved");
        Ok(())
    }
}
