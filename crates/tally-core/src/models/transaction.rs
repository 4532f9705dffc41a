//! Ledger transactions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum description length accepted by the ledger.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("unknown transaction kind: {}", other)),
        }
    }
}

/// A persisted ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub owner: String,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    pub date: DateTime<Utc>,

    /// Receipt this entry was derived from. A lookup reference only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub owner: String,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub receipt_id: Option<Uuid>,
}

impl NewTransaction {
    /// Expense derived from an extracted receipt total.
    pub fn expense_from_receipt(
        owner: impl Into<String>,
        receipt_id: Uuid,
        original_name: &str,
        amount: Decimal,
        category: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            kind: TransactionKind::Expense,
            amount,
            category: category.into(),
            description: format!("Expense from receipt: {}", original_name),
            date: Utc::now(),
            receipt_id: Some(receipt_id),
        }
    }

    /// Check the ledger constraints before persisting.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.amount < Decimal::ZERO {
            issues.push(format!("Amount must not be negative: {}", self.amount));
        }

        if self.category.trim().is_empty() {
            issues.push("Missing category".to_string());
        }

        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            issues.push(format!(
                "Description longer than {} characters",
                MAX_DESCRIPTION_LEN
            ));
        }

        issues
    }

    /// Assign an id and creation time.
    pub fn into_transaction(self) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            owner: self.owner,
            kind: self.kind,
            amount: self.amount,
            category: self.category.trim().to_string(),
            description: self.description.trim().to_string(),
            date: self.date,
            receipt_id: self.receipt_id,
            created_at: Utc::now(),
        }
    }
}

/// Filter for listing a user's transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(kind) = self.kind {
            if tx.kind != kind {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !tx.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        true
    }
}
