//! Error types for the tally-core library.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

/// Main error type for the tally library.
#[derive(Error, Debug)]
pub enum TallyError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Document or ledger storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The declared content type is neither an image nor a PDF.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// No record with this id belongs to the requesting user.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: Uuid },
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// No OCR backend is configured or installed.
    #[error("OCR backend unavailable: {0}")]
    Unavailable(String),

    /// Failed to launch an external OCR process.
    #[error("failed to start {program}: {reason}")]
    Spawn { program: String, reason: String },

    /// The backend ran but reported a failure.
    #[error("OCR backend failed: {0}")]
    Backend(String),

    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Recognition did not finish within the configured bound.
    #[error("recognition timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors related to the document store and the ledger.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to write a document or record.
    #[error("write failed: {0}")]
    Write(String),

    /// Failed to read a document or record.
    #[error("read failed: {0}")]
    Read(String),

    /// Failed to delete a document or record.
    #[error("delete failed: {0}")]
    Delete(String),

    /// The ledger file could not be decoded.
    #[error("ledger is corrupt: {0}")]
    Corrupt(String),

    /// A locator points outside the storage root.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Result type for the tally library.
pub type Result<T> = std::result::Result<T, TallyError>;
