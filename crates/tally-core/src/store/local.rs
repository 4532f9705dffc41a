//! Uploaded documents on the local filesystem.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{DocumentStore, Result, StoredDocument};
use crate::error::StorageError;

/// Stores each upload as `<millis>-<uuid><ext>` inside one directory.
#[derive(Debug, Clone)]
pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    /// Open the store, creating the directory if needed. The root is made
    /// absolute so stored locators stay valid from any working directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            StorageError::Write(format!(
                "failed to create upload directory {}: {}",
                root.display(),
                e
            ))
        })?;
        let root = fs::canonicalize(&root).map_err(|e| {
            StorageError::Write(format!(
                "failed to resolve upload directory {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn generate_filename(original_name: &str) -> String {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default();
        format!(
            "{}-{}{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            ext
        )
    }

    /// Reject locators that escape the upload directory.
    fn check_locator(&self, locator: &Path) -> Result<()> {
        let escapes = locator
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir));
        if escapes || !locator.starts_with(&self.root) {
            return Err(StorageError::InvalidKey(format!(
                "{} is outside {}",
                locator.display(),
                self.root.display()
            )));
        }
        Ok(())
    }

    fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(data)?;
        file.sync_all()
    }
}

impl DocumentStore for LocalDocumentStore {
    fn put(&self, original_name: &str, data: &[u8]) -> Result<StoredDocument> {
        let filename = Self::generate_filename(original_name);
        let locator = self.root.join(&filename);

        if let Err(e) = Self::write_file(&locator, data) {
            if locator.exists() {
                if let Err(cleanup) = fs::remove_file(&locator) {
                    warn!("Failed to remove partial file {}: {}", locator.display(), cleanup);
                }
            }
            return Err(StorageError::Write(format!(
                "failed to write {}: {}",
                locator.display(),
                e
            )));
        }

        debug!("Stored {} bytes at {}", data.len(), locator.display());

        Ok(StoredDocument {
            filename,
            locator,
            size: data.len() as u64,
        })
    }

    fn delete(&self, locator: &Path) -> Result<()> {
        self.check_locator(locator)?;

        match fs::remove_file(locator) {
            Ok(()) => {
                debug!("Deleted {}", locator.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Delete(format!(
                "failed to delete {}: {}",
                locator.display(),
                e
            ))),
        }
    }

    fn exists(&self, locator: &Path) -> bool {
        locator.is_file()
    }
}
