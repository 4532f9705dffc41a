//! PDF processing module.

mod extractor;

pub use extractor::{PdfExtractor, PdfTextLayer};

use std::path::Path;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Reads the embedded text layer of a document.
pub trait TextLayer: Send + Sync {
    /// Return the document's embedded text. Scanned PDFs yield empty text.
    fn read_text(&self, path: &Path) -> Result<String>;
}

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text from the entire PDF.
    fn extract_text(&self) -> Result<String>;
}
