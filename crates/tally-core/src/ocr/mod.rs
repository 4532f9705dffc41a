//! OCR capability: recognize the text in a stored document.

#[cfg(feature = "native")]
mod pure_engine;
mod tesseract;
mod unavailable;

#[cfg(feature = "native")]
pub use pure_engine::OnnxOcr;
pub use tesseract::TesseractCli;
pub use unavailable::UnavailableOcr;

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::OcrError;
use crate::models::config::{OcrBackendKind, OcrConfig};

/// A backend able to turn a document on disk into text.
pub trait OcrCapability: Send + Sync {
    /// Recognize the text of the document at `path`.
    fn recognize(&self, path: &Path) -> Result<String, OcrError>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// False for the null backend.
    fn is_available(&self) -> bool {
        true
    }
}

/// A detected text box with its coordinates and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Sort boxes top-to-bottom, left-to-right and join their text with newlines.
pub fn reading_order_text(boxes: &mut [TextBox]) -> String {
    boxes.sort_by(|a, b| {
        let (ax, ay, _, _) = a.rect();
        let (bx, by, _, _) = b.rect();

        // Group by approximate vertical position (within 20 pixels)
        let row_a = (ay / 20.0) as i32;
        let row_b = (by / 20.0) as i32;

        if row_a != row_b {
            row_a.cmp(&row_b)
        } else {
            ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal)
        }
    });

    boxes
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the configured backend, degrading to [`UnavailableOcr`].
pub fn create_capability(config: &OcrConfig) -> Arc<dyn OcrCapability> {
    match config.backend {
        OcrBackendKind::Tesseract => match TesseractCli::detect(config) {
            Ok(engine) => {
                info!("Using tesseract OCR backend ({})", config.tesseract_path.display());
                Arc::new(engine)
            }
            Err(e) => {
                warn!("Tesseract not available, OCR disabled: {}", e);
                Arc::new(UnavailableOcr::new(e.to_string()))
            }
        },
        OcrBackendKind::Onnx => create_onnx(config),
        OcrBackendKind::None => Arc::new(UnavailableOcr::new("OCR disabled in configuration")),
    }
}

#[cfg(feature = "native")]
fn create_onnx(config: &OcrConfig) -> Arc<dyn OcrCapability> {
    match OnnxOcr::from_dir(&config.model_dir, config.keep_unk) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            warn!("ONNX OCR models not loaded, OCR disabled: {}", e);
            Arc::new(UnavailableOcr::new(e.to_string()))
        }
    }
}

#[cfg(not(feature = "native"))]
fn create_onnx(_config: &OcrConfig) -> Arc<dyn OcrCapability> {
    warn!("Built without the `native` feature, ONNX OCR disabled");
    Arc::new(UnavailableOcr::new("built without ONNX support"))
}

/// Run `recognize` on a worker thread, giving up after `timeout`.
///
/// Without a timeout the call runs inline. A panicking backend becomes
/// [`OcrError::Backend`] either way. A timed-out worker is left to finish on its own; its result is dropped.
pub fn recognize_bounded(
    ocr: &Arc<dyn OcrCapability>,
    path: &Path,
    timeout: Option<Duration>,
) -> Result<String, OcrError> {
    let Some(limit) = timeout else {
        return panic::catch_unwind(AssertUnwindSafe(|| ocr.recognize(path)))
            .unwrap_or_else(|_| Err(OcrError::Backend("recognition panicked".to_string())));
    };

    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(ocr);
    let owned_path = path.to_path_buf();

    thread::Builder::new()
        .name("ocr-recognize".to_string())
        .spawn(move || {
            let _ = tx.send(worker.recognize(&owned_path));
        })
        .map_err(|e| OcrError::Spawn {
            program: "ocr worker thread".to_string(),
            reason: e.to_string(),
        })?;

    match rx.recv_timeout(limit) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(OcrError::Timeout(limit)),
        Err(RecvTimeoutError::Disconnected) => {
            Err(OcrError::Backend("recognition worker panicked".to_string()))
        }
    }
}
