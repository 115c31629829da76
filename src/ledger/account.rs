use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a place money lives: bank accounts, cards, cash, investments.
///
/// `initial_balance` is the opening balance at the moment the account was
/// registered; the current balance is always derived from it plus the
/// transaction history, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    pub initial_balance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_limit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut_off_day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_day: Option<u32>,
    #[serde(default)]
    pub color: String,
}

/// Broad account classification used by the health score and credit logic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccountKind {
    Debit,
    Credit,
    Cash,
    Investment,
}

impl Account {
    pub fn new(name: impl Into<String>, kind: AccountKind, initial_balance: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            initial_balance,
            credit_limit: None,
            cut_off_day: None,
            payment_day: None,
            color: String::new(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Attaches card terms: the statement limit, the statement cut-off day,
    /// and the day of month the bill is due.
    pub fn with_credit_terms(
        mut self,
        credit_limit: f64,
        cut_off_day: u32,
        payment_day: u32,
    ) -> Self {
        self.credit_limit = Some(credit_limit);
        self.cut_off_day = Some(cut_off_day);
        self.payment_day = Some(payment_day);
        self
    }

    pub fn is_credit(&self) -> bool {
        self.kind == AccountKind::Credit
    }
}
