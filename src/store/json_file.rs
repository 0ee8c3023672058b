use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, warn};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("serialize document {name}: {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Named JSON documents in one directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Load document `name`, or `default` when it is absent or unparsable.
    pub async fn load<T: DeserializeOwned>(&self, name: &str, default: T) -> T {
        match self.read(name).await {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                debug!(document = name, "document not found; using default");
                default
            }
            Err(e) => {
                warn!(error = %e, document = name, "document unreadable; using default");
                default
            }
        }
    }

    /// Read document `name`. `None` only when the file does not exist.
    pub async fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StoreError> {
        let path = self.path(name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt { path, source })
    }

    /// Replace document `name` with `doc`.
    pub async fn save<T: Serialize>(&self, name: &str, doc: &T) -> Result<(), StoreError> {
        let path = self.path(name);
        let result = self.write_atomic(name, &path, doc).await;
        if let Err(e) = &result {
            error!(error = %e, document = name, "document save failed");
        }
        result
    }

    async fn write_atomic<T: Serialize>(
        &self,
        name: &str,
        path: &Path,
        doc: &T,
    ) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(doc).map_err(|source| StoreError::Serialize {
            name: name.to_string(),
            source,
        })?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StoreError::Io {
                path: self.dir.clone(),
                source,
            })?;

        // Same directory as the target so the rename never crosses filesystems.
        let tmp = self
            .dir
            .join(format!(".{name}.json.{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp.clone(),
                source,
            })?;

        if let Err(source) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }

        debug!(document = name, bytes = bytes.len(), "document saved");
        Ok(())
    }
}
