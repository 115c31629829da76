use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::ledger::{Ledger, MonthKey, TransactionKind};

/// Day of month a credit bill falls due when the account does not say.
pub const DEFAULT_PAYMENT_DAY: u32 = 15;

/// Derived position of a credit account.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreditStatus {
    pub current_debt: f64,
    pub available_credit: f64,
    pub next_payment_date: NaiveDate,
    /// Percentage of the limit in use, `0.0` when no limit is set.
    pub utilization: f64,
}

/// Folds the whole transaction log once and returns the derived balance of
/// every account. Installment-total records are informational and never
/// touch balances.
pub fn balances(ledger: &Ledger) -> HashMap<Uuid, f64> {
    let mut balances: HashMap<Uuid, f64> = ledger
        .accounts
        .iter()
        .map(|account| (account.id, account.initial_balance))
        .collect();

    for txn in &ledger.transactions {
        if txn.is_installment_total {
            continue;
        }
        match txn.kind {
            TransactionKind::Income => {
                if let Some(balance) = balances.get_mut(&txn.account_id) {
                    *balance += txn.amount;
                }
            }
            TransactionKind::Expense => {
                if let Some(balance) = balances.get_mut(&txn.account_id) {
                    *balance -= txn.amount;
                }
            }
            TransactionKind::Transfer => {
                if let Some(balance) = balances.get_mut(&txn.account_id) {
                    *balance -= txn.amount;
                }
                if let Some(target) = txn.target_account_id {
                    if let Some(balance) = balances.get_mut(&target) {
                        *balance += txn.amount;
                    }
                }
            }
        }
    }

    balances
}

pub fn balance_of(ledger: &Ledger, account_id: Uuid) -> Option<f64> {
    balances(ledger).remove(&account_id)
}

/// Net worth across every account.
pub fn total_balance(ledger: &Ledger) -> f64 {
    balances(ledger).values().sum()
}

/// Debt, headroom, and the next bill date for a credit account. Returns
/// `None` for unknown ids and for accounts of any other kind.
pub fn credit_status(ledger: &Ledger, account_id: Uuid, today: NaiveDate) -> Option<CreditStatus> {
    let account = ledger.account(account_id)?;
    if !account.is_credit() {
        return None;
    }

    let balance = balance_of(ledger, account_id).unwrap_or(account.initial_balance);
    let current_debt = (-balance).max(0.0);
    let limit = account.credit_limit.unwrap_or(0.0);
    let utilization = if limit > 0.0 {
        current_debt / limit * 100.0
    } else {
        0.0
    };

    let payment_day = account.payment_day.unwrap_or(DEFAULT_PAYMENT_DAY);
    let this_month = MonthKey::from_date(today);
    let next_payment_date = if today.day() <= payment_day {
        this_month.clamp_day(payment_day)
    } else {
        this_month.next().clamp_day(payment_day)
    };

    Some(CreditStatus {
        current_debt,
        available_credit: limit - current_debt,
        next_payment_date,
        utilization,
    })
}
