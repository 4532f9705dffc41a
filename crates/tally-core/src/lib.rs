//! Core library for receipt ingestion.
//!
//! This crate provides:
//! - Text extraction (embedded PDF text, OCR fallback for scans and photos)
//! - Heuristic field extraction (total amount, date, merchant)
//! - Keyword classification into spending categories
//! - Local document storage and a JSON ledger of receipts and transactions
//! - The ingestion pipeline tying these together

pub mod error;
pub mod extract;
pub mod ingest;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod rules;
pub mod store;

pub use error::{Result, TallyError};
pub use extract::{ExtractionOutcome, Strategy, TextExtractor};
pub use ingest::{IngestReport, Ingestor, Upload};
pub use models::config::TallyConfig;
pub use models::receipt::{ExtractedFields, ExtractionState, MediaType, Receipt};
pub use models::transaction::{Transaction, TransactionFilter, TransactionKind};
pub use ocr::{create_capability, OcrCapability};
pub use rules::{classify, find_likely_amount, Category};
pub use store::{DocumentStore, JsonLedger, LocalDocumentStore, ReceiptStore, TransactionStore};
