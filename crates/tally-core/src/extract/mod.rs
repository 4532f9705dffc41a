//! Text extraction: embedded PDF text first, OCR as the fallback.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::receipt::MediaType;
use crate::ocr::{recognize_bounded, OcrCapability};
use crate::pdf::{PdfTextLayer, TextLayer};

/// Which strategy produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Embedded PDF text layer.
    Structured,
    /// Optical character recognition.
    Ocr,
    /// Nothing found.
    None,
}

/// Text produced for one document. Empty text always carries [`Strategy::None`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOutcome {
    pub text: String,
    pub strategy: Strategy,
}

impl ExtractionOutcome {
    fn new(text: String, strategy: Strategy) -> Self {
        if text.trim().is_empty() {
            Self::empty()
        } else {
            Self { text, strategy }
        }
    }

    pub fn empty() -> Self {
        Self {
            text: String::new(),
            strategy: Strategy::None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.strategy == Strategy::None
    }
}

/// Dispatches a stored document to the right extraction strategy.
#[derive(Clone)]
pub struct TextExtractor {
    text_layer: Arc<dyn TextLayer>,
    ocr: Arc<dyn OcrCapability>,
    ocr_timeout: Option<Duration>,
}

impl TextExtractor {
    /// Extractor reading PDFs with [`PdfTextLayer`].
    pub fn new(ocr: Arc<dyn OcrCapability>) -> Self {
        Self {
            text_layer: Arc::new(PdfTextLayer),
            ocr,
            ocr_timeout: None,
        }
    }

    /// Replace the structured text reader.
    pub fn with_text_layer(mut self, text_layer: Arc<dyn TextLayer>) -> Self {
        self.text_layer = text_layer;
        self
    }

    /// Bound each OCR call; expiry counts as no text.
    pub fn with_ocr_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.ocr_timeout = timeout;
        self
    }

    pub fn ocr(&self) -> &Arc<dyn OcrCapability> {
        &self.ocr
    }

    /// Extract text from a stored document. Never fails: every error degrades
    /// to an empty outcome.
    pub fn extract(&self, path: &Path, media_type: MediaType) -> ExtractionOutcome {
        match media_type {
            MediaType::Pdf => {
                let structured = self.read_text_layer(path);
                if !structured.trim().is_empty() {
                    debug!("Extracted embedded text from {}", path.display());
                    return ExtractionOutcome::new(structured, Strategy::Structured);
                }

                debug!(
                    "No embedded text in {}, trying OCR on the PDF",
                    path.display()
                );
                self.run_ocr(path)
            }
            MediaType::Image => self.run_ocr(path),
        }
    }

    fn read_text_layer(&self, path: &Path) -> String {
        match panic::catch_unwind(AssertUnwindSafe(|| self.text_layer.read_text(path))) {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!("Embedded text read failed for {}: {}", path.display(), e);
                String::new()
            }
            Err(_) => {
                warn!("Embedded text reader panicked on {}", path.display());
                String::new()
            }
        }
    }

    fn run_ocr(&self, path: &Path) -> ExtractionOutcome {
        match recognize_bounded(&self.ocr, path, self.ocr_timeout) {
            Ok(text) => {
                if text.trim().is_empty() && self.ocr.is_available() {
                    debug!(
                        "OCR backend {} found no text in {}",
                        self.ocr.backend(),
                        path.display()
                    );
                }
                ExtractionOutcome::new(text, Strategy::Ocr)
            }
            Err(e) => {
                warn!(
                    "OCR backend {} failed on {}: {}",
                    self.ocr.backend(),
                    path.display(),
                    e
                );
                ExtractionOutcome::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OcrError, PdfError};
    use crate::ocr::UnavailableOcr;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubOcr {
        result: Result<&'static str, ()>,
        calls: AtomicUsize,
    }

    impl StubOcr {
        fn text(text: &'static str) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(text),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                result: Err(()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl OcrCapability for StubOcr {
        fn recognize(&self, _path: &Path) -> Result<String, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .map(str::to_string)
                .map_err(|_| OcrError::Backend("stub failure".to_string()))
        }

        fn backend(&self) -> &'static str {
            "stub"
        }
    }

    struct StubLayer(Result<&'static str, ()>);

    impl TextLayer for StubLayer {
        fn read_text(&self, _path: &Path) -> crate::pdf::Result<String> {
            self.0
                .map(str::to_string)
                .map_err(|_| PdfError::Encrypted)
        }
    }

    struct PanickingOcr;

    impl OcrCapability for PanickingOcr {
        fn recognize(&self, _path: &Path) -> Result<String, OcrError> {
            panic!("backend crashed")
        }

        fn backend(&self) -> &'static str {
            "panicking"
        }
    }

    struct PanickingLayer;

    impl TextLayer for PanickingLayer {
        fn read_text(&self, _path: &Path) -> crate::pdf::Result<String> {
            panic!("parser crashed")
        }
    }

    fn extractor(ocr: Arc<StubOcr>, layer: StubLayer) -> TextExtractor {
        TextExtractor::new(ocr).with_text_layer(Arc::new(layer))
    }

    #[test]
    fn test_pdf_with_text_layer_skips_ocr() {
        let ocr = StubOcr::text("ocr text");
        let outcome = extractor(ocr.clone(), StubLayer(Ok("INVOICE 12.00")))
            .extract(Path::new("a.pdf"), MediaType::Pdf);

        assert_eq!(outcome.strategy, Strategy::Structured);
        assert_eq!(outcome.text, "INVOICE 12.00");
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_pdf_whitespace_layer_falls_back_to_ocr() {
        let ocr = StubOcr::text("SCANNED 9.99");
        let outcome = extractor(ocr.clone(), StubLayer(Ok(" \n\t ")))
            .extract(Path::new("a.pdf"), MediaType::Pdf);

        assert_eq!(outcome.strategy, Strategy::Ocr);
        assert_eq!(outcome.text, "SCANNED 9.99");
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pdf_layer_error_falls_back_to_ocr() {
        let outcome = extractor(StubOcr::text("from ocr"), StubLayer(Err(())))
            .extract(Path::new("a.pdf"), MediaType::Pdf);

        assert_eq!(outcome.strategy, Strategy::Ocr);
    }

    #[test]
    fn test_pdf_nothing_found() {
        let outcome = extractor(StubOcr::text(""), StubLayer(Err(())))
            .extract(Path::new("a.pdf"), MediaType::Pdf);

        assert_eq!(outcome, ExtractionOutcome::empty());
    }

    #[test]
    fn test_image_never_reads_text_layer() {
        let outcome = extractor(StubOcr::text("CAFE 3.50"), StubLayer(Ok("should not be used")))
            .extract(Path::new("a.jpg"), MediaType::Image);

        assert_eq!(outcome.strategy, Strategy::Ocr);
        assert_eq!(outcome.text, "CAFE 3.50");
    }

    #[test]
    fn test_ocr_error_degrades_to_empty() {
        let outcome = extractor(StubOcr::failing(), StubLayer(Ok("")))
            .extract(Path::new("a.jpg"), MediaType::Image);

        assert!(outcome.is_empty());
        assert_eq!(outcome.text, "");
    }

    #[test]
    fn test_every_combination_returns_an_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let garbage = dir.path().join("broken.pdf");
        std::fs::write(&garbage, b"%PDF-1.4 truncated").unwrap();

        let unavailable: Arc<dyn OcrCapability> = Arc::new(UnavailableOcr::new("not installed"));
        let finds_text: Arc<dyn OcrCapability> = StubOcr::text("TOTAL 1.00");
        let fails: Arc<dyn OcrCapability> = StubOcr::failing();
        let crashes: Arc<dyn OcrCapability> = Arc::new(PanickingOcr);
        let backends = [unavailable, finds_text, fails, crashes];
        let layers: [Arc<dyn TextLayer>; 2] = [Arc::new(PdfTextLayer), Arc::new(PanickingLayer)];

        for ocr in backends {
            for layer in &layers {
                for timeout in [None, Some(Duration::from_secs(5))] {
                    let extractor = TextExtractor::new(ocr.clone())
                        .with_text_layer(layer.clone())
                        .with_ocr_timeout(timeout);
                    for media_type in [MediaType::Pdf, MediaType::Image] {
                        for path in [garbage.as_path(), Path::new("/does/not/exist")] {
                            let outcome = extractor.extract(path, media_type);
                            assert_eq!(outcome.text.is_empty(), outcome.strategy == Strategy::None);
                            if !ocr.is_available() || ocr.backend() == "panicking" {
                                assert!(outcome.is_empty());
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_panicking_backend_without_timeout_degrades_to_empty() {
        let outcome = TextExtractor::new(Arc::new(PanickingOcr))
            .extract(Path::new("a.jpg"), MediaType::Image);

        assert_eq!(outcome, ExtractionOutcome::empty());
    }

    #[test]
    fn test_panicking_text_layer_falls_back_to_ocr() {
        let outcome = TextExtractor::new(StubOcr::text("KIOSK 2.00"))
            .with_text_layer(Arc::new(PanickingLayer))
            .extract(Path::new("a.pdf"), MediaType::Pdf);

        assert_eq!(outcome.strategy, Strategy::Ocr);
        assert_eq!(outcome.text, "KIOSK 2.00");
    }
}
