//! JSON snapshots in the Home Assistant `.storage/` directory
//!
//! Each registry lives in one versioned file:
//!
//! ```json
//! {
//!   "version": 1,
//!   "minor_version": 12,
//!   "key": "core.device_registry",
//!   "data": { ... }
//! }
//! ```

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage key mismatch: expected {expected}, found {found}")]
    KeyMismatch { expected: String, found: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Data that is persisted under a fixed key
pub trait Storable: Serialize + DeserializeOwned {
    const KEY: &'static str;
    const VERSION: u32;
    const MINOR_VERSION: u32;
}

/// On-disk envelope around registry data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageFile<T> {
    pub version: u32,
    pub minor_version: u32,
    pub key: String,
    pub data: T,
}

impl<T: Storable> StorageFile<T> {
    pub fn wrap(data: T) -> Self {
        Self {
            version: T::VERSION,
            minor_version: T::MINOR_VERSION,
            key: T::KEY.to_string(),
            data,
        }
    }
}

/// Reader/writer for `<config_dir>/.storage`
#[derive(Debug, Clone)]
pub struct Storage {
    storage_dir: PathBuf,
}

impl Storage {
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        Self {
            storage_dir: config_dir.as_ref().join(".storage"),
        }
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.storage_dir.join(key)
    }

    /// Load a snapshot; `None` if the file does not exist
    pub async fn load<T: Storable>(&self) -> StorageResult<Option<StorageFile<T>>> {
        let path = self.file_path(T::KEY);
        if !fs::try_exists(&path).await? {
            debug!("Storage file not found: {}", T::KEY);
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        let file: StorageFile<T> = serde_json::from_str(&content)?;

        if file.key != T::KEY {
            return Err(StorageError::KeyMismatch {
                expected: T::KEY.to_string(),
                found: file.key,
            });
        }
        if file.version != T::VERSION {
            // Older/newer major versions are read best-effort
            warn!(
                "Storage file {} has version {}, expected {}",
                T::KEY,
                file.version,
                T::VERSION
            );
        }

        debug!(
            "Loaded storage file: {} (v{}.{})",
            T::KEY,
            file.version,
            file.minor_version
        );
        Ok(Some(file))
    }

    /// Save a snapshot atomically (temp file + rename)
    pub async fn save<T: Storable>(&self, data: T) -> StorageResult<()> {
        fs::create_dir_all(&self.storage_dir).await?;

        let path = self.file_path(T::KEY);
        let temp_path = self.file_path(&format!("{}.tmp", T::KEY));

        let content = serde_json::to_string_pretty(&StorageFile::wrap(data))?;
        fs::write(&temp_path, &content).await?;
        fs::rename(&temp_path, &path).await?;

        debug!("Saved storage file: {}", T::KEY);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        names: Vec<String>,
    }

    impl Storable for Sample {
        const KEY: &'static str = "test.sample";
        const VERSION: u32 = 1;
        const MINOR_VERSION: u32 = 2;
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path());
        assert!(storage.load::<Sample>().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path());
        storage
            .save(Sample {
                names: vec!["Кухня".to_string()],
            })
            .await
            .unwrap();

        let file = storage.load::<Sample>().await.unwrap().unwrap();
        assert_eq!(file.key, "test.sample");
        assert_eq!(file.minor_version, 2);
        assert_eq!(file.data.names, vec!["Кухня".to_string()]);
        assert!(!storage.storage_dir().join("test.sample.tmp").exists());
    }

    #[tokio::test]
    async fn test_key_mismatch() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path());
        std::fs::create_dir_all(storage.storage_dir()).unwrap();
        std::fs::write(
            storage.storage_dir().join("test.sample"),
            r#"{"version": 1, "minor_version": 1, "key": "other", "data": {"names": []}}"#,
        )
        .unwrap();

        let err = storage.load::<Sample>().await.unwrap_err();
        assert!(matches!(err, StorageError::KeyMismatch { .. }));
    }
}
