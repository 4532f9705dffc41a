//! Receipt records and their extraction state.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TallyError;

/// Coarse document kind, fixed when the upload is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Photographed or scanned image (JPEG, PNG).
    Image,
    /// PDF document, digital or scanned.
    Pdf,
}

impl MediaType {
    /// Classify a declared content type such as `application/pdf` or `image/png`.
    pub fn from_content_type(content_type: &str) -> Result<Self, TallyError> {
        let normalized = content_type.trim().to_ascii_lowercase();
        if normalized.contains("pdf") {
            Ok(MediaType::Pdf)
        } else if normalized.starts_with("image/") {
            Ok(MediaType::Image)
        } else {
            Err(TallyError::UnsupportedMediaType(content_type.to_string()))
        }
    }

    /// Guess the content type from a file extension.
    pub fn content_type_for(path: &Path) -> Option<&'static str> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some("application/pdf"),
            "jpg" | "jpeg" => Some("image/jpeg"),
            "png" => Some("image/png"),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Image => write!(f, "image"),
            MediaType::Pdf => write!(f, "pdf"),
        }
    }
}

/// A single purchased item. Never populated by the heuristics, kept for
/// records edited by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: Decimal,
    pub price: Decimal,
}

/// Fields derived from a successful extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    /// Full text returned by the extraction strategy.
    pub raw_text: String,

    /// Likely printed total. Always positive when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,

    /// Purchase date printed on the receipt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_date: Option<NaiveDate>,

    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

/// Where a receipt stands in the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionState {
    /// Stored, extraction not attempted yet.
    Pending,
    /// Text was found.
    Extracted(ExtractedFields),
    /// Every strategy came back empty; the sentinel replaces the raw text.
    Failed { sentinel: String },
}

/// One uploaded document and its extraction outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: Uuid,

    /// Owning user.
    pub owner: String,

    /// Name of the file inside the document store.
    pub filename: String,

    /// Name of the file as uploaded.
    pub original_name: String,

    /// Location of the persisted binary.
    pub locator: PathBuf,

    pub media_type: MediaType,

    pub extraction: ExtractionState,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Receipt {
    /// Create a pending receipt for a freshly stored document.
    pub fn pending(
        owner: impl Into<String>,
        original_name: impl Into<String>,
        filename: impl Into<String>,
        locator: impl Into<PathBuf>,
        media_type: MediaType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            filename: filename.into(),
            original_name: original_name.into(),
            locator: locator.into(),
            media_type,
            extraction: ExtractionState::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// True only once text extraction produced non-empty output.
    pub fn processed(&self) -> bool {
        matches!(self.extraction, ExtractionState::Extracted(_))
    }

    /// Raw text, or the failure sentinel if extraction failed.
    pub fn raw_text(&self) -> Option<&str> {
        match &self.extraction {
            ExtractionState::Pending => None,
            ExtractionState::Extracted(fields) => Some(&fields.raw_text),
            ExtractionState::Failed { sentinel } => Some(sentinel),
        }
    }

    pub fn fields(&self) -> Option<&ExtractedFields> {
        match &self.extraction {
            ExtractionState::Extracted(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn total_amount(&self) -> Option<Decimal> {
        self.fields().and_then(|f| f.total_amount)
    }

    /// Record a successful extraction.
    pub fn mark_extracted(&mut self, fields: ExtractedFields) {
        self.extraction = ExtractionState::Extracted(fields);
        self.updated_at = Utc::now();
    }

    /// Record a failed extraction.
    pub fn mark_failed(&mut self, sentinel: impl Into<String>) {
        self.extraction = ExtractionState::Failed {
            sentinel: sentinel.into(),
        };
        self.updated_at = Utc::now();
    }
}
