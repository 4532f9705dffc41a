//! Receipts and transactions kept in a single JSON file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{ReceiptStore, Result, TransactionStore};
use crate::error::StorageError;
use crate::models::receipt::Receipt;
use crate::models::transaction::{NewTransaction, Transaction};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerData {
    #[serde(default)]
    receipts: Vec<Receipt>,
    #[serde(default)]
    transactions: Vec<Transaction>,
}

/// JSON-file ledger. Every change is written atomically (temp file + rename)
/// before it becomes visible in memory.
#[derive(Debug)]
pub struct JsonLedger {
    path: PathBuf,
    data: Mutex<LedgerData>,
}

impl JsonLedger {
    /// Open a ledger, starting empty if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let data = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| StorageError::Read(format!("{}: {}", path.display(), e)))?;
            if content.trim().is_empty() {
                LedgerData::default()
            } else {
                serde_json::from_str(&content)
                    .map_err(|e| StorageError::Corrupt(format!("{}: {}", path.display(), e)))?
            }
        } else {
            LedgerData::default()
        };

        debug!(
            "Opened ledger {} ({} receipts, {} transactions)",
            path.display(),
            data.receipts.len(),
            data.transactions.len()
        );

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerData>> {
        self.data
            .lock()
            .map_err(|_| StorageError::Read("ledger lock poisoned".to_string()))
    }

    /// Apply `change` to a copy, persist it, then publish it.
    fn commit<T>(&self, change: impl FnOnce(&mut LedgerData) -> Result<T>) -> Result<T> {
        let mut guard = self.lock()?;
        let mut next = guard.clone();
        let value = change(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(value)
    }

    fn persist(&self, data: &LedgerData) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)
            .map_err(|e| StorageError::Write(format!("{}: {}", dir.display(), e)))?;

        let content = serde_json::to_vec_pretty(data)
            .map_err(|e| StorageError::Write(e.to_string()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .map_err(|e| StorageError::Write(format!("{}: {}", dir.display(), e)))?;
        tmp.write_all(&content)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| StorageError::Write(e.to_string()))?;
        tmp.persist(&self.path)
            .map_err(|e| StorageError::Write(format!("{}: {}", self.path.display(), e)))?;

        Ok(())
    }
}

impl ReceiptStore for JsonLedger {
    fn insert(&self, receipt: &Receipt) -> Result<()> {
        self.commit(|data| {
            if data.receipts.iter().any(|r| r.id == receipt.id) {
                return Err(StorageError::Write(format!(
                    "receipt {} already exists",
                    receipt.id
                )));
            }
            data.receipts.push(receipt.clone());
            Ok(())
        })
    }

    fn update(&self, receipt: &Receipt) -> Result<()> {
        self.commit(|data| {
            let slot = data
                .receipts
                .iter_mut()
                .find(|r| r.id == receipt.id)
                .ok_or_else(|| StorageError::Write(format!("receipt {} not found", receipt.id)))?;
            *slot = receipt.clone();
            Ok(())
        })
    }

    fn get(&self, id: Uuid) -> Result<Option<Receipt>> {
        Ok(self.lock()?.receipts.iter().find(|r| r.id == id).cloned())
    }

    fn receipts_for_owner(&self, owner: &str) -> Result<Vec<Receipt>> {
        let mut receipts: Vec<Receipt> = self
            .lock()?
            .receipts
            .iter()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect();
        receipts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(receipts)
    }

    fn remove(&self, id: Uuid) -> Result<bool> {
        self.commit(|data| {
            let before = data.receipts.len();
            data.receipts.retain(|r| r.id != id);
            Ok(data.receipts.len() != before)
        })
    }
}

impl TransactionStore for JsonLedger {
    fn create(&self, transaction: NewTransaction) -> Result<Transaction> {
        let issues = transaction.validate();
        if !issues.is_empty() {
            return Err(StorageError::Write(issues.join(", ")));
        }

        let transaction = transaction.into_transaction();
        self.commit(|data| {
            data.transactions.push(transaction.clone());
            Ok(transaction)
        })
    }

    fn transactions_for_owner(&self, owner: &str) -> Result<Vec<Transaction>> {
        let mut transactions: Vec<Transaction> = self
            .lock()?
            .transactions
            .iter()
            .filter(|t| t.owner == owner)
            .cloned()
            .collect();
        transactions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(transactions)
    }

    fn for_receipt(&self, receipt_id: Uuid) -> Result<Vec<Transaction>> {
        Ok(self
            .lock()?
            .transactions
            .iter()
            .filter(|t| t.receipt_id == Some(receipt_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::receipt::MediaType;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn receipt(owner: &str) -> Receipt {
        Receipt::pending(owner, "r.png", "1-x.png", "uploads/1-x.png", MediaType::Image)
    }

    #[test]
    fn test_receipts_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let r = receipt("alice");
        {
            let ledger = JsonLedger::open(&path).unwrap();
            ledger.insert(&r).unwrap();
        }

        let ledger = JsonLedger::open(&path).unwrap();
        assert_eq!(ledger.get(r.id).unwrap(), Some(r));
    }

    #[test]
    fn test_update_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = JsonLedger::open(dir.path().join("ledger.json")).unwrap();

        let mut r = receipt("alice");
        ledger.insert(&r).unwrap();
        assert!(ledger.insert(&r).is_err());

        r.mark_failed("OCR processing failed");
        ledger.update(&r).unwrap();
        assert_eq!(
            ledger.get(r.id).unwrap().unwrap().raw_text(),
            Some("OCR processing failed")
        );

        assert!(ledger.remove(r.id).unwrap());
        assert!(!ledger.remove(r.id).unwrap());
        assert!(ledger.update(&r).is_err());
    }

    #[test]
    fn test_receipts_scoped_to_owner() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = JsonLedger::open(dir.path().join("ledger.json")).unwrap();

        ledger.insert(&receipt("alice")).unwrap();
        ledger.insert(&receipt("bob")).unwrap();
        ledger.insert(&receipt("alice")).unwrap();

        let alice = ledger.receipts_for_owner("alice").unwrap();
        assert_eq!(alice.len(), 2);
        assert!(alice[0].created_at >= alice[1].created_at);
        assert_eq!(ledger.receipts_for_owner("carol").unwrap().len(), 0);
    }

    #[test]
    fn test_create_transaction() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = JsonLedger::open(dir.path().join("ledger.json")).unwrap();

        let receipt_id = Uuid::new_v4();
        let tx = ledger
            .create(NewTransaction::expense_from_receipt(
                "alice",
                receipt_id,
                "r.png",
                Decimal::new(1250, 2),
                "Grocery",
            ))
            .unwrap();

        assert_eq!(ledger.for_receipt(receipt_id).unwrap(), vec![tx.clone()]);
        assert_eq!(ledger.transactions_for_owner("alice").unwrap(), vec![tx]);
        assert!(ledger.transactions_for_owner("bob").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_transaction_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = JsonLedger::open(dir.path().join("ledger.json")).unwrap();

        let result = ledger.create(NewTransaction::expense_from_receipt(
            "alice",
            Uuid::new_v4(),
            "r.png",
            Decimal::new(-5, 0),
            "Grocery",
        ));
        assert!(matches!(result, Err(StorageError::Write(_))));
        assert!(ledger.transactions_for_owner("alice").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(JsonLedger::open(&path), Err(StorageError::Corrupt(_))));
    }
}
