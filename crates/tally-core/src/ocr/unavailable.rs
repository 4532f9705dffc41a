//! Null OCR backend used when no engine is installed or configured.

use std::path::Path;

use tracing::warn;

use super::OcrCapability;
use crate::error::OcrError;

/// Always recognizes empty text.
#[derive(Debug, Clone)]
pub struct UnavailableOcr {
    reason: String,
}

impl UnavailableOcr {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Why no backend is present.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl OcrCapability for UnavailableOcr {
    fn recognize(&self, path: &Path) -> Result<String, OcrError> {
        warn!(
            "OCR backend unavailable ({}), no text recognized for {}",
            self.reason,
            path.display()
        );
        Ok(String::new())
    }

    fn backend(&self) -> &'static str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }
}
