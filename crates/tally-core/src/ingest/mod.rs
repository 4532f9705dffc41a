//! Receipt ingestion: store, extract, classify, derive the expense.
//!
//! Per receipt the pipeline moves through
//! `Stored -> Extracting -> {Extracted | ExtractionFailed} -> [TransactionDerived]`.
//! Only the `Stored` step can fail the request; everything after it is
//! recovered locally and never removes the stored file or the receipt record.

mod upload;

pub use upload::{
    IngestReport, Upload, MESSAGE_EXTRACTION_FAILED, MESSAGE_PROCESSED,
    WARNING_EXTRACTION_FAILED, WARNING_UPDATE_FAILED,
};

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{Result, TallyError};
use crate::extract::{ExtractionOutcome, Strategy, TextExtractor};
use crate::models::config::{IngestConfig, TallyConfig};
use crate::models::receipt::{ExtractedFields, MediaType, Receipt};
use crate::models::transaction::{NewTransaction, Transaction, TransactionFilter};
use crate::ocr::{create_capability, UnavailableOcr};
use crate::rules::{classify, find_likely_amount, find_receipt_date, guess_merchant, Category};
use crate::store::{DocumentStore, JsonLedger, LocalDocumentStore, ReceiptStore, TransactionStore};

/// Fields derived from extracted text.
struct Analysis {
    fields: ExtractedFields,
    category: Category,
}

/// Coordinates storage, extraction, classification and the derived expense.
pub struct Ingestor {
    documents: Arc<dyn DocumentStore>,
    receipts: Arc<dyn ReceiptStore>,
    transactions: Arc<dyn TransactionStore>,
    extractor: TextExtractor,
    config: IngestConfig,
}

impl Ingestor {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        receipts: Arc<dyn ReceiptStore>,
        transactions: Arc<dyn TransactionStore>,
        extractor: TextExtractor,
    ) -> Self {
        Self {
            documents,
            receipts,
            transactions,
            extractor,
            config: IngestConfig::default(),
        }
    }

    pub fn with_config(mut self, config: IngestConfig) -> Self {
        self.config = config;
        self
    }

    /// Wire the local document store, the JSON ledger and the configured OCR backend.
    pub fn from_config(config: &TallyConfig) -> Result<Self> {
        let documents = LocalDocumentStore::new(config.storage.upload_dir.clone())?;
        let ledger = Arc::new(JsonLedger::open(config.storage.ledger_path.clone())?);
        let extractor =
            TextExtractor::new(create_capability(&config.ocr)).with_ocr_timeout(config.ocr.timeout());

        Ok(Self::new(Arc::new(documents), ledger.clone(), ledger, extractor)
            .with_config(config.ingest.clone()))
    }

    /// Wire the stores only, for commands that look records up or delete
    /// them. No OCR backend is started or loaded.
    pub fn records_from_config(config: &TallyConfig) -> Result<Self> {
        let documents = LocalDocumentStore::new(config.storage.upload_dir.clone())?;
        let ledger = Arc::new(JsonLedger::open(config.storage.ledger_path.clone())?);
        let extractor = TextExtractor::new(Arc::new(UnavailableOcr::new("opened for lookups only")));

        Ok(Self::new(Arc::new(documents), ledger.clone(), ledger, extractor)
            .with_config(config.ingest.clone()))
    }

    pub fn extractor(&self) -> &TextExtractor {
        &self.extractor
    }

    /// Store an upload and run extraction on it.
    ///
    /// Errors only when the document or its receipt record cannot be created.
    pub fn ingest(&self, upload: Upload) -> Result<IngestReport> {
        let start = Instant::now();
        let receipt = self.store(&upload)?;

        info!(
            "Stored receipt {} ({}, {}) for {}",
            receipt.id, upload.original_name, receipt.media_type, receipt.owner
        );

        let extraction = panic::catch_unwind(AssertUnwindSafe(|| {
            let outcome = self.extractor.extract(&receipt.locator, receipt.media_type);
            let analysis = analyze(&outcome);
            (outcome.strategy, analysis)
        }));

        let report = match extraction {
            Ok((strategy, Some(analysis))) => self.complete(receipt, strategy, analysis),
            Ok((_, None)) => {
                warn!("No text extracted from receipt {}", receipt.id);
                self.fail(receipt)
            }
            Err(_) => {
                error!("Extraction aborted unexpectedly for receipt {}", receipt.id);
                self.fail(receipt)
            }
        };

        debug!("Ingestion finished in {}ms", start.elapsed().as_millis());
        Ok(report)
    }

    /// `Stored`: write the document, then the pending record.
    fn store(&self, upload: &Upload) -> Result<Receipt> {
        let media_type = MediaType::from_content_type(&upload.content_type)?;
        let stored = self.documents.put(&upload.original_name, &upload.data)?;

        let receipt = Receipt::pending(
            upload.owner.clone(),
            upload.original_name.clone(),
            stored.filename,
            stored.locator,
            media_type,
        );

        if let Err(e) = self.receipts.insert(&receipt) {
            error!("Failed to create receipt record: {}", e);
            if let Err(cleanup) = self.documents.delete(&receipt.locator) {
                warn!(
                    "Failed to clean up {} after record failure: {}",
                    receipt.locator.display(),
                    cleanup
                );
            }
            return Err(e.into());
        }

        Ok(receipt)
    }

    /// `Extracted`, then `TransactionDerived` when the total is positive.
    fn complete(&self, mut receipt: Receipt, strategy: Strategy, analysis: Analysis) -> IngestReport {
        let amount = analysis.fields.total_amount;
        receipt.mark_extracted(analysis.fields);

        info!(
            "Extracted receipt {} via {:?}: total={:?}, category={}",
            receipt.id, strategy, amount, analysis.category
        );

        if let Err(e) = self.receipts.update(&receipt) {
            error!("Failed to save extraction for receipt {}: {}", receipt.id, e);
            return IngestReport {
                message: MESSAGE_PROCESSED.to_string(),
                warning: Some(WARNING_UPDATE_FAILED.to_string()),
                processed: true,
                strategy,
                category: Some(analysis.category),
                receipt,
                transaction: None,
            };
        }

        let transaction = match amount {
            Some(amount) if self.config.derive_transactions => {
                self.derive_transaction(&receipt, amount, analysis.category)
            }
            _ => None,
        };

        IngestReport {
            message: MESSAGE_PROCESSED.to_string(),
            warning: None,
            processed: true,
            strategy,
            category: Some(analysis.category),
            receipt,
            transaction,
        }
    }

    /// `ExtractionFailed`: keep the record, store the sentinel.
    fn fail(&self, mut receipt: Receipt) -> IngestReport {
        receipt.mark_failed(self.config.failure_sentinel.clone());

        if let Err(e) = self.receipts.update(&receipt) {
            error!("Failed to save extraction failure for receipt {}: {}", receipt.id, e);
        }

        IngestReport {
            message: MESSAGE_EXTRACTION_FAILED.to_string(),
            warning: Some(WARNING_EXTRACTION_FAILED.to_string()),
            processed: false,
            strategy: Strategy::None,
            category: None,
            receipt,
            transaction: None,
        }
    }

    /// Create the linked expense. A failure here never fails the ingestion.
    fn derive_transaction(
        &self,
        receipt: &Receipt,
        amount: Decimal,
        category: Category,
    ) -> Option<Transaction> {
        if amount <= Decimal::ZERO {
            return None;
        }

        let new = NewTransaction::expense_from_receipt(
            receipt.owner.clone(),
            receipt.id,
            &receipt.original_name,
            amount,
            category.label(),
        );

        match self.transactions.create(new) {
            Ok(tx) => {
                info!(
                    "Created transaction {} ({} in {}) from receipt {}",
                    tx.id, tx.amount, tx.category, receipt.id
                );
                Some(tx)
            }
            Err(e) => {
                error!(
                    "Failed to create transaction for receipt {}: {}",
                    receipt.id, e
                );
                None
            }
        }
    }

    /// Receipts of a user, newest first.
    pub fn receipts(&self, owner: &str) -> Result<Vec<Receipt>> {
        Ok(self.receipts.receipts_for_owner(owner)?)
    }

    /// One receipt owned by `owner`.
    pub fn receipt(&self, owner: &str, id: Uuid) -> Result<Receipt> {
        self.receipts
            .get(id)?
            .filter(|r| r.owner == owner)
            .ok_or(TallyError::NotFound { kind: "receipt", id })
    }

    /// Delete the stored document and then the record. Derived transactions stay.
    pub fn delete_receipt(&self, owner: &str, id: Uuid) -> Result<Receipt> {
        let receipt = self.receipt(owner, id)?;

        if self.documents.exists(&receipt.locator) {
            self.documents.delete(&receipt.locator)?;
        }
        self.receipts.remove(id)?;

        info!("Deleted receipt {} for {}", id, owner);
        Ok(receipt)
    }

    /// Transactions of a user, newest first.
    pub fn transactions(&self, owner: &str, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        Ok(self
            .transactions
            .transactions_for_owner(owner)?
            .into_iter()
            .filter(|tx| filter.matches(tx))
            .collect())
    }
}

/// Run the heuristics over extracted text; `None` when nothing was extracted.
fn analyze(outcome: &ExtractionOutcome) -> Option<Analysis> {
    if outcome.is_empty() {
        return None;
    }

    let text = &outcome.text;
    let fields = ExtractedFields {
        raw_text: text.clone(),
        total_amount: find_likely_amount(text).filter(|a| *a > Decimal::ZERO),
        merchant_name: guess_merchant(text),
        transaction_date: find_receipt_date(text),
        line_items: Vec::new(),
    };

    Some(Analysis {
        fields,
        category: classify(text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OcrError, StorageError};
    use crate::ocr::{OcrCapability, UnavailableOcr};
    use crate::pdf::TextLayer;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use std::str::FromStr;
    use tempfile::TempDir;

    struct StubOcr(&'static str);

    impl OcrCapability for StubOcr {
        fn recognize(&self, _path: &Path) -> std::result::Result<String, OcrError> {
            Ok(self.0.to_string())
        }

        fn backend(&self) -> &'static str {
            "stub"
        }
    }

    struct PanickingOcr;

    impl OcrCapability for PanickingOcr {
        fn recognize(&self, _path: &Path) -> std::result::Result<String, OcrError> {
            panic!("native OCR crashed")
        }

        fn backend(&self) -> &'static str {
            "panicking"
        }
    }

    struct StubLayer(&'static str);

    impl TextLayer for StubLayer {
        fn read_text(&self, _path: &Path) -> crate::pdf::Result<String> {
            Ok(self.0.to_string())
        }
    }

    /// Delegates to a ledger, failing the selected operations.
    struct FlakyLedger {
        inner: Arc<JsonLedger>,
        fail_insert: bool,
        fail_update: bool,
        fail_create: bool,
    }

    impl ReceiptStore for FlakyLedger {
        fn insert(&self, receipt: &Receipt) -> crate::store::Result<()> {
            if self.fail_insert {
                return Err(StorageError::Write("database offline".to_string()));
            }
            self.inner.insert(receipt)
        }

        fn update(&self, receipt: &Receipt) -> crate::store::Result<()> {
            if self.fail_update {
                return Err(StorageError::Write("database offline".to_string()));
            }
            self.inner.update(receipt)
        }

        fn get(&self, id: Uuid) -> crate::store::Result<Option<Receipt>> {
            self.inner.get(id)
        }

        fn receipts_for_owner(&self, owner: &str) -> crate::store::Result<Vec<Receipt>> {
            self.inner.receipts_for_owner(owner)
        }

        fn remove(&self, id: Uuid) -> crate::store::Result<bool> {
            ReceiptStore::remove(self.inner.as_ref(), id)
        }
    }

    impl TransactionStore for FlakyLedger {
        fn create(&self, transaction: NewTransaction) -> crate::store::Result<Transaction> {
            if self.fail_create {
                return Err(StorageError::Write("ledger offline".to_string()));
            }
            self.inner.create(transaction)
        }

        fn transactions_for_owner(&self, owner: &str) -> crate::store::Result<Vec<Transaction>> {
            self.inner.transactions_for_owner(owner)
        }

        fn for_receipt(&self, receipt_id: Uuid) -> crate::store::Result<Vec<Transaction>> {
            self.inner.for_receipt(receipt_id)
        }
    }

    struct Harness {
        _dir: TempDir,
        upload_dir: std::path::PathBuf,
        ledger: Arc<JsonLedger>,
        ingestor: Ingestor,
    }

    #[derive(Default)]
    struct Failures {
        insert: bool,
        update: bool,
        create: bool,
    }

    fn harness_with(
        ocr: Arc<dyn OcrCapability>,
        layer: Option<Arc<dyn TextLayer>>,
        failures: Failures,
    ) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let upload_dir = dir.path().join("uploads");
        let documents = Arc::new(LocalDocumentStore::new(&upload_dir).unwrap());
        let ledger = Arc::new(JsonLedger::open(dir.path().join("ledger.json")).unwrap());
        let flaky = Arc::new(FlakyLedger {
            inner: ledger.clone(),
            fail_insert: failures.insert,
            fail_update: failures.update,
            fail_create: failures.create,
        });

        let mut extractor = TextExtractor::new(ocr);
        if let Some(layer) = layer {
            extractor = extractor.with_text_layer(layer);
        }

        Harness {
            _dir: dir,
            upload_dir,
            ledger,
            ingestor: Ingestor::new(documents, flaky.clone(), flaky, extractor),
        }
    }

    fn harness(ocr: Arc<dyn OcrCapability>) -> Harness {
        harness_with(ocr, None, Failures::default())
    }

    fn image_upload(owner: &str) -> Upload {
        Upload::new(owner, "pizza.jpg", "image/jpeg", b"fake jpeg".to_vec())
    }

    fn stored_files(h: &Harness) -> usize {
        std::fs::read_dir(&h.upload_dir).unwrap().count()
    }

    const PIZZA_RECEIPT: &str = "PIZZA HUT\n12/03/2024\nLarge Pizza 1 x 200.00\nTax 50.75\nTotal 250.75\n";

    #[test]
    fn test_scanned_pizza_receipt() {
        let h = harness(Arc::new(StubOcr(PIZZA_RECEIPT)));

        let report = h.ingestor.ingest(image_upload("alice")).unwrap();

        assert_eq!(report.message, MESSAGE_PROCESSED);
        assert_eq!(report.warning, None);
        assert!(report.processed);
        assert_eq!(report.strategy, Strategy::Ocr);
        assert_eq!(report.category, Some(Category::FoodAndDining));

        let stored = h.ingestor.receipt("alice", report.receipt.id).unwrap();
        assert!(stored.processed());
        let fields = stored.fields().unwrap();
        assert_eq!(fields.total_amount, Some(Decimal::from_str("250.75").unwrap()));
        assert_eq!(fields.merchant_name.as_deref(), Some("PIZZA HUT"));
        assert!(fields.transaction_date.is_some());
        assert!(fields.line_items.is_empty());

        let txs = h.ledger.for_receipt(stored.id).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].amount, Decimal::from_str("250.75").unwrap());
        assert_eq!(txs[0].category, "Food & Dining");
        assert_eq!(txs[0].description, "Expense from receipt: pizza.jpg");
        assert_eq!(txs[0].owner, "alice");
        assert_eq!(report.transaction.as_ref(), Some(&txs[0]));
    }

    #[test]
    fn test_backend_unavailable_preserves_receipt() {
        let h = harness(Arc::new(UnavailableOcr::new("not installed")));

        let report = h.ingestor.ingest(image_upload("alice")).unwrap();

        assert_eq!(report.message, MESSAGE_EXTRACTION_FAILED);
        assert_eq!(report.warning.as_deref(), Some(WARNING_EXTRACTION_FAILED));
        assert!(!report.processed);
        assert!(report.transaction.is_none());

        let stored = h.ingestor.receipt("alice", report.receipt.id).unwrap();
        assert!(!stored.processed());
        assert_eq!(stored.raw_text(), Some("OCR processing failed"));
        assert!(stored.locator.is_file());
        assert!(h.ledger.for_receipt(stored.id).unwrap().is_empty());
    }

    #[test]
    fn test_text_without_amount_derives_nothing() {
        let h = harness(Arc::new(StubOcr("Corner Shop\nThank you for visiting 0.00")));

        let report = h.ingestor.ingest(image_upload("alice")).unwrap();

        assert!(report.processed);
        assert_eq!(report.receipt.total_amount(), None);
        assert_eq!(report.category, Some(Category::Others));
        assert!(report.transaction.is_none());
        assert!(h.ledger.for_receipt(report.receipt.id).unwrap().is_empty());
    }

    #[test]
    fn test_pdf_uses_text_layer() {
        let layer: Arc<dyn TextLayer> = Arc::new(StubLayer("City Electric Co\nAmount due 1,204.10"));
        let h = harness_with(Arc::new(UnavailableOcr::new("none")), Some(layer), Failures::default());

        let upload = Upload::new("bob", "bill.pdf", "application/pdf", b"%PDF".to_vec());
        let report = h.ingestor.ingest(upload).unwrap();

        assert_eq!(report.strategy, Strategy::Structured);
        assert_eq!(report.receipt.media_type, MediaType::Pdf);
        let tx = report.transaction.unwrap();
        assert_eq!(tx.amount, Decimal::from_str("1204.10").unwrap());
        assert_eq!(tx.category, "Utilities");
    }

    #[test]
    fn test_transaction_failure_is_isolated() {
        let h = harness_with(
            Arc::new(StubOcr(PIZZA_RECEIPT)),
            None,
            Failures {
                create: true,
                ..Failures::default()
            },
        );

        let report = h.ingestor.ingest(image_upload("alice")).unwrap();

        assert_eq!(report.message, MESSAGE_PROCESSED);
        assert_eq!(report.warning, None);
        assert!(report.transaction.is_none());

        let stored = h.ingestor.receipt("alice", report.receipt.id).unwrap();
        assert!(stored.processed());
        assert_eq!(stored.total_amount(), Some(Decimal::from_str("250.75").unwrap()));
    }

    #[test]
    fn test_record_failure_cleans_up_file() {
        let h = harness_with(
            Arc::new(StubOcr(PIZZA_RECEIPT)),
            None,
            Failures {
                insert: true,
                ..Failures::default()
            },
        );

        let err = h.ingestor.ingest(image_upload("alice")).unwrap_err();

        assert!(matches!(err, TallyError::Storage(StorageError::Write(_))));
        assert_eq!(stored_files(&h), 0);
        assert!(h.ingestor.receipts("alice").unwrap().is_empty());
    }

    #[test]
    fn test_update_failure_keeps_file_and_record() {
        let h = harness_with(
            Arc::new(StubOcr(PIZZA_RECEIPT)),
            None,
            Failures {
                update: true,
                ..Failures::default()
            },
        );

        let report = h.ingestor.ingest(image_upload("alice")).unwrap();

        assert_eq!(report.warning.as_deref(), Some(WARNING_UPDATE_FAILED));
        assert!(report.transaction.is_none());
        assert_eq!(stored_files(&h), 1);

        // The persisted record is still the pending one.
        let stored = h.ingestor.receipt("alice", report.receipt.id).unwrap();
        assert!(!stored.processed());
        assert!(h.ledger.for_receipt(stored.id).unwrap().is_empty());
    }

    #[test]
    fn test_unsupported_media_type_stores_nothing() {
        let h = harness(Arc::new(StubOcr(PIZZA_RECEIPT)));

        let upload = Upload::new("alice", "notes.txt", "text/plain", b"hi".to_vec());
        let err = h.ingestor.ingest(upload).unwrap_err();

        assert!(matches!(err, TallyError::UnsupportedMediaType(_)));
        assert_eq!(stored_files(&h), 0);
    }

    #[test]
    fn test_panicking_backend_marks_failure() {
        let h = harness(Arc::new(PanickingOcr));

        let report = h.ingestor.ingest(image_upload("alice")).unwrap();

        assert!(!report.processed);
        assert_eq!(report.warning.as_deref(), Some(WARNING_EXTRACTION_FAILED));
        let stored = h.ingestor.receipt("alice", report.receipt.id).unwrap();
        assert_eq!(stored.raw_text(), Some("OCR processing failed"));
        assert!(stored.locator.is_file());
    }

    struct SlowOcr;

    impl OcrCapability for SlowOcr {
        fn recognize(&self, _path: &Path) -> std::result::Result<String, OcrError> {
            std::thread::sleep(std::time::Duration::from_millis(500));
            Ok(PIZZA_RECEIPT.to_string())
        }

        fn backend(&self) -> &'static str {
            "slow"
        }
    }

    #[test]
    fn test_ocr_timeout_marks_failure() {
        let h = harness(Arc::new(SlowOcr));
        let ingestor = Ingestor {
            extractor: h
                .ingestor
                .extractor()
                .clone()
                .with_ocr_timeout(Some(std::time::Duration::from_millis(20))),
            ..h.ingestor
        };

        let report = ingestor.ingest(image_upload("alice")).unwrap();

        assert!(!report.processed);
        assert_eq!(report.message, MESSAGE_EXTRACTION_FAILED);
        assert!(report.transaction.is_none());
        let stored = ingestor.receipt("alice", report.receipt.id).unwrap();
        assert_eq!(stored.raw_text(), Some("OCR processing failed"));
        assert!(stored.locator.is_file());
        assert!(h.ledger.for_receipt(report.receipt.id).unwrap().is_empty());
    }

    #[test]
    fn test_derivation_can_be_disabled() {
        let h = harness(Arc::new(StubOcr(PIZZA_RECEIPT)));
        let ingestor = Ingestor {
            config: IngestConfig {
                derive_transactions: false,
                ..IngestConfig::default()
            },
            ..h.ingestor
        };

        let report = ingestor.ingest(image_upload("alice")).unwrap();
        assert!(report.processed);
        assert!(report.transaction.is_none());
    }

    #[test]
    fn test_delete_receipt() {
        let h = harness(Arc::new(StubOcr(PIZZA_RECEIPT)));
        let report = h.ingestor.ingest(image_upload("alice")).unwrap();
        let id = report.receipt.id;

        assert!(matches!(
            h.ingestor.delete_receipt("mallory", id),
            Err(TallyError::NotFound { .. })
        ));

        let deleted = h.ingestor.delete_receipt("alice", id).unwrap();
        assert!(!deleted.locator.exists());
        assert!(matches!(
            h.ingestor.receipt("alice", id),
            Err(TallyError::NotFound { .. })
        ));

        // The derived expense is not owned by the receipt.
        assert_eq!(h.ledger.for_receipt(id).unwrap().len(), 1);
    }

    #[test]
    fn test_receipts_are_private() {
        let h = harness(Arc::new(StubOcr(PIZZA_RECEIPT)));
        let report = h.ingestor.ingest(image_upload("alice")).unwrap();

        assert!(h.ingestor.receipts("bob").unwrap().is_empty());
        assert!(h.ingestor.receipt("bob", report.receipt.id).is_err());
        assert!(h
            .ingestor
            .transactions("bob", &TransactionFilter::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_transaction_exists_iff_processed_with_positive_total() {
        let texts = [
            PIZZA_RECEIPT,
            "",
            "WALMART\nTOTAL 0.00",
            "   ",
            "Apollo Pharmacy 45.20",
            "no digits at all",
        ];

        for text in texts {
            let h = harness(Arc::new(StubOcr(text)));
            let report = h.ingestor.ingest(image_upload("alice")).unwrap();
            let stored = h.ingestor.receipt("alice", report.receipt.id).unwrap();
            let derived = h.ledger.for_receipt(stored.id).unwrap();

            let expected = stored.processed()
                && stored.total_amount().map_or(false, |a| a > Decimal::ZERO);
            assert_eq!(derived.len(), usize::from(expected), "text: {:?}", text);
        }
    }

    fn config_in(dir: &Path) -> TallyConfig {
        let mut config = TallyConfig::default();
        config.storage.upload_dir = dir.join("uploads");
        config.storage.ledger_path = dir.join("ledger.json");
        config
    }

    #[test]
    fn test_records_share_the_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.ocr.backend = crate::models::config::OcrBackendKind::None;

        let report = Ingestor::from_config(&config)
            .unwrap()
            .ingest(image_upload("alice"))
            .unwrap();

        let records = Ingestor::records_from_config(&config).unwrap();
        assert!(!records.extractor().ocr().is_available());
        assert_eq!(records.receipts("alice").unwrap().len(), 1);
        let deleted = records.delete_receipt("alice", report.receipt.id).unwrap();
        assert!(!deleted.locator.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_records_do_not_start_ocr_backend() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("started");
        let script = dir.path().join("tesseract");
        std::fs::write(
            &script,
            format!("#!/bin/sh\ntouch '{}'\necho tesseract 5.3.0\n", marker.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut config = config_in(dir.path());
        config.ocr.backend = crate::models::config::OcrBackendKind::Tesseract;
        config.ocr.tesseract_path = script;

        Ingestor::records_from_config(&config).unwrap();
        assert!(!marker.exists());

        Ingestor::from_config(&config).unwrap();
        assert!(marker.exists());
    }
}
