use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::month::MonthKey;

/// A single movement of money, recorded once and never mutated by derived
/// reads. Amounts are always positive; direction comes from `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category_id: Uuid,
    pub account_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_account_id: Option<Uuid>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    /// Marker rows that record the full price of an installment purchase.
    /// They exist for reporting only and are excluded from every derived
    /// aggregate; the actual cash flow arrives through the per-installment
    /// scheduled payments.
    #[serde(default)]
    pub is_installment_total: bool,
    #[serde(default)]
    pub is_scheduled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_payment_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
}

/// Caller-supplied fields for a new transaction. Bookkeeping flags and
/// timestamps are filled in when the draft is committed to the ledger.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub amount: f64,
    pub kind: TransactionKind,
    pub category_id: Uuid,
    pub account_id: Uuid,
    pub target_account_id: Option<Uuid>,
    pub date: NaiveDate,
    pub note: Option<String>,
}

impl TransactionDraft {
    pub fn new(
        amount: f64,
        kind: TransactionKind,
        category_id: Uuid,
        account_id: Uuid,
        date: NaiveDate,
    ) -> Self {
        Self {
            amount,
            kind,
            category_id,
            account_id,
            target_account_id: None,
            date,
            note: None,
        }
    }

    pub fn transfer_to(mut self, target_account_id: Uuid) -> Self {
        self.target_account_id = Some(target_account_id);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

impl Transaction {
    pub fn from_draft(draft: TransactionDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount: draft.amount,
            kind: draft.kind,
            category_id: draft.category_id,
            account_id: draft.account_id,
            target_account_id: draft.target_account_id,
            date: draft.date,
            created_at,
            is_installment_total: false,
            is_scheduled: false,
            scheduled_payment_id: None,
            installment_index: None,
            note: draft.note,
        }
    }

    pub fn month(&self) -> MonthKey {
        MonthKey::from_date(self.date)
    }
}
