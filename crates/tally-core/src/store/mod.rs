//! Persistence seams: the document store and the receipt/transaction ledger.

mod ledger;
mod local;

pub use ledger::JsonLedger;
pub use local::LocalDocumentStore;

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::StorageError;
use crate::models::receipt::Receipt;
use crate::models::transaction::{NewTransaction, Transaction};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A document durably written by a [`DocumentStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// Generated file name.
    pub filename: String,
    /// Where the bytes live.
    pub locator: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

/// Holds the uploaded binaries.
pub trait DocumentStore: Send + Sync {
    /// Write `data` under a fresh unique name derived from `original_name`.
    fn put(&self, original_name: &str, data: &[u8]) -> Result<StoredDocument>;

    /// Delete a stored document. Deleting a missing document is not an error.
    fn delete(&self, locator: &Path) -> Result<()>;

    fn exists(&self, locator: &Path) -> bool;
}

/// Persists receipt records.
pub trait ReceiptStore: Send + Sync {
    fn insert(&self, receipt: &Receipt) -> Result<()>;

    /// Replace an existing receipt.
    fn update(&self, receipt: &Receipt) -> Result<()>;

    fn get(&self, id: Uuid) -> Result<Option<Receipt>>;

    /// Receipts of one user, newest first.
    fn receipts_for_owner(&self, owner: &str) -> Result<Vec<Receipt>>;

    /// Returns false if nothing was removed.
    fn remove(&self, id: Uuid) -> Result<bool>;
}

/// Persists ledger transactions.
pub trait TransactionStore: Send + Sync {
    fn create(&self, transaction: NewTransaction) -> Result<Transaction>;

    /// Transactions of one user, newest first.
    fn transactions_for_owner(&self, owner: &str) -> Result<Vec<Transaction>>;

    /// Transactions referencing a receipt.
    fn for_receipt(&self, receipt_id: Uuid) -> Result<Vec<Transaction>>;
}
