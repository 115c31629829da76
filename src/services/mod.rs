//! Validated mutation layer. Services check input and referential integrity
//! before touching the ledger, so a failed call never leaves a half-applied
//! write behind.

pub mod account_service;
pub mod budget_service;
pub mod category_service;
pub mod goal_service;
pub mod schedule_service;
pub mod transaction_service;

pub use account_service::AccountService;
pub use budget_service::BudgetService;
pub use category_service::CategoryService;
pub use goal_service::GoalService;
pub use schedule_service::ScheduleService;
pub use transaction_service::{InstallmentPurchase, InstallmentTerms, TransactionService};

use chrono::Utc;

use crate::engine::balance::total_balance;
use crate::errors::LedgerError;
use crate::ledger::Ledger;

pub type ServiceResult<T> = Result<T, LedgerError>;

pub(crate) fn ensure_amount(amount: f64, what: &str) -> ServiceResult<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(LedgerError::Validation(format!(
            "{} amount must be a positive number",
            what
        )));
    }
    Ok(())
}

/// Writes today's net-worth snapshot after a balance-affecting mutation,
/// overwriting any snapshot already taken today.
pub(crate) fn refresh_net_worth(ledger: &mut Ledger) {
    let today = Utc::now().date_naive();
    let total = total_balance(ledger);
    ledger.record_net_worth(today, total);
}
