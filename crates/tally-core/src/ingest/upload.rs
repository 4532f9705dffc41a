//! Upload input and the report returned to the caller.

use std::path::Path;

use serde::Serialize;

use crate::error::{Result, TallyError};
use crate::extract::Strategy;
use crate::models::receipt::{MediaType, Receipt};
use crate::models::transaction::Transaction;
use crate::rules::Category;

pub const MESSAGE_PROCESSED: &str = "Receipt uploaded and processed successfully";
pub const MESSAGE_EXTRACTION_FAILED: &str = "Receipt uploaded but OCR processing failed";
pub const WARNING_EXTRACTION_FAILED: &str = "Text extraction was unsuccessful";
pub const WARNING_UPDATE_FAILED: &str = "Extraction results could not be saved";

/// An accepted upload: decoded bytes plus what the upload layer validated.
#[derive(Debug, Clone)]
pub struct Upload {
    pub owner: String,
    pub original_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(
        owner: impl Into<String>,
        original_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            owner: owner.into(),
            original_name: original_name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// Read a local file, deriving the content type from its extension.
    pub fn from_file(owner: impl Into<String>, path: &Path) -> Result<Self> {
        let content_type = MediaType::content_type_for(path).ok_or_else(|| {
            TallyError::UnsupportedMediaType(format!(
                "{} (only JPEG, PNG and PDF files are accepted)",
                path.display()
            ))
        })?;

        let original_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let data = std::fs::read(path)?;
        Ok(Self::new(owner, original_name, content_type, data))
    }
}

/// Outcome of one ingestion. Always a success once the document is stored.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    pub processed: bool,

    pub strategy: Strategy,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,

    pub receipt: Receipt,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<Transaction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Dinner.PNG");
        std::fs::write(&path, b"png").unwrap();

        let upload = Upload::from_file("alice", &path).unwrap();
        assert_eq!(upload.original_name, "Dinner.PNG");
        assert_eq!(upload.content_type, "image/png");
        assert_eq!(upload.data, b"png");
    }

    #[test]
    fn test_from_file_rejects_other_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        assert!(matches!(
            Upload::from_file("alice", &path),
            Err(TallyError::UnsupportedMediaType(_))
        ));
    }
}
