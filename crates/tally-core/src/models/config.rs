//! Configuration structures for the ingestion pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the tally pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Document and ledger storage configuration.
    pub storage: StorageConfig,

    /// Ingestion behavior.
    pub ingest: IngestConfig,
}

/// Which OCR backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackendKind {
    /// System `tesseract` binary.
    Tesseract,
    /// Pure Rust ONNX models from `model_dir`.
    Onnx,
    /// No OCR; images always come back empty.
    None,
}

impl std::str::FromStr for OcrBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tesseract" => Ok(OcrBackendKind::Tesseract),
            "onnx" => Ok(OcrBackendKind::Onnx),
            "none" | "off" => Ok(OcrBackendKind::None),
            other => Err(format!("unknown OCR backend: {}", other)),
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub backend: OcrBackendKind,

    /// Recognition language passed to tesseract.
    pub language: String,

    /// Tesseract OCR engine mode (1 = LSTM only).
    pub engine_mode: u8,

    /// Tesseract page segmentation mode (6 = single uniform block of text).
    pub page_segmentation_mode: u8,

    /// Path or name of the tesseract executable.
    pub tesseract_path: PathBuf,

    /// Directory containing `det.onnx`, `latin_rec.onnx` and `latin_dict.txt`.
    pub model_dir: PathBuf,

    /// Keep `[UNK]` tokens in ONNX recognition output.
    pub keep_unk: bool,

    /// Upper bound for one recognition call in seconds (0 = unbounded).
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: OcrBackendKind::Tesseract,
            language: "eng".to_string(),
            engine_mode: 1,
            page_segmentation_mode: 6,
            tesseract_path: PathBuf::from("tesseract"),
            model_dir: PathBuf::from("models"),
            keep_unk: false,
            timeout_secs: 120,
        }
    }
}

impl OcrConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory receiving uploaded documents.
    pub upload_dir: PathBuf,

    /// JSON file holding receipts and transactions.
    pub ledger_path: PathBuf,

    /// Largest accepted upload in bytes.
    pub max_file_size: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            ledger_path: PathBuf::from("ledger.json"),
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

/// Ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Stored in place of raw text when every strategy fails.
    pub failure_sentinel: String,

    /// Create an expense transaction from a positive extracted total.
    pub derive_transactions: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            failure_sentinel: "OCR processing failed".to_string(),
            derive_transactions: true,
        }
    }
}

impl TallyConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Apply `TALLY_UPLOAD_DIR`, `TALLY_LEDGER` and `TALLY_OCR_BACKEND`.
    pub fn with_env_overrides(mut self) -> Result<Self, crate::TallyError> {
        if let Ok(dir) = std::env::var("TALLY_UPLOAD_DIR") {
            self.storage.upload_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("TALLY_LEDGER") {
            self.storage.ledger_path = PathBuf::from(path);
        }
        if let Ok(backend) = std::env::var("TALLY_OCR_BACKEND") {
            self.ocr.backend = backend.parse().map_err(crate::TallyError::Config)?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = TallyConfig::default();
        assert_eq!(config.ocr.backend, OcrBackendKind::Tesseract);
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.ocr.page_segmentation_mode, 6);
        assert_eq!(config.ocr.timeout(), Some(Duration::from_secs(120)));
        assert_eq!(config.ingest.failure_sentinel, "OCR processing failed");
        assert_eq!(config.storage.max_file_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TallyConfig =
            serde_json::from_str(r#"{"ocr": {"backend": "none", "timeout_secs": 0}}"#).unwrap();
        assert_eq!(config.ocr.backend, OcrBackendKind::None);
        assert_eq!(config.ocr.timeout(), None);
        assert_eq!(config.ocr.language, "eng");
        assert!(config.ingest.derive_transactions);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = TallyConfig::default();
        config.storage.upload_dir = PathBuf::from("/srv/receipts");
        config.save(&path).unwrap();

        let loaded = TallyConfig::from_file(&path).unwrap();
        assert_eq!(loaded.storage.upload_dir, PathBuf::from("/srv/receipts"));
    }

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!("ONNX".parse::<OcrBackendKind>(), Ok(OcrBackendKind::Onnx));
        assert_eq!("off".parse::<OcrBackendKind>(), Ok(OcrBackendKind::None));
        assert!("easyocr".parse::<OcrBackendKind>().is_err());
    }
}
