use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::engine::balance::total_balance;
use crate::engine::projector::{occurrences_for, OccurrenceState};
use crate::ledger::{Frequency, Ledger, MonthKey, TransactionKind};

/// Window used to estimate day-to-day spending velocity.
const TRAILING_SPEND_DAYS: i64 = 30;

/// Projected end-of-month position, combining scheduled cash flow still due
/// this month with recent unscheduled spending velocity.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Forecast {
    pub current_balance: f64,
    pub pending_income: f64,
    pub pending_expenses: f64,
    pub estimated_daily_expenses: f64,
    pub forecast_balance: f64,
    pub pending_count: usize,
}

pub fn forecast(ledger: &Ledger, today: NaiveDate) -> Forecast {
    let current_balance = total_balance(ledger);
    let month = MonthKey::from_date(today);

    let mut pending_income = 0.0;
    let mut pending_expenses = 0.0;
    let mut pending_count = 0usize;
    for occurrence in occurrences_for(ledger, month) {
        // One-time rules count while their due date is still ahead; repeating
        // rules count until the month's occurrence is actually paid.
        let pending = match occurrence.frequency {
            Frequency::OneTime => occurrence.date >= today,
            _ => occurrence.state != OccurrenceState::Paid,
        };
        if !pending {
            continue;
        }
        pending_count += 1;
        match occurrence.kind {
            TransactionKind::Income => pending_income += occurrence.amount,
            TransactionKind::Expense => pending_expenses += occurrence.amount,
            TransactionKind::Transfer => {}
        }
    }

    let window_start = today - Duration::days(TRAILING_SPEND_DAYS);
    let trailing_spend: f64 = ledger
        .transactions
        .iter()
        .filter(|txn| {
            txn.kind == TransactionKind::Expense
                && !txn.is_scheduled
                && !txn.is_installment_total
                && txn.date > window_start
                && txn.date <= today
        })
        .map(|txn| txn.amount)
        .sum();
    let avg_daily_spend = trailing_spend / TRAILING_SPEND_DAYS as f64;
    let days_remaining = (month.days_in_month() - today.day()) as f64;
    let estimated_daily_expenses = avg_daily_spend * days_remaining;

    let forecast_balance =
        current_balance + pending_income - pending_expenses - estimated_daily_expenses;

    Forecast {
        current_balance,
        pending_income,
        pending_expenses,
        estimated_daily_expenses,
        forecast_balance,
        pending_count,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::ledger::{
        Account, AccountKind, Category, CategoryKind, ScheduledPayment, Transaction,
        TransactionDraft,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixture() -> (Ledger, Uuid, Uuid) {
        let mut ledger = Ledger::new("Test");
        let account = ledger.add_account(Account::new("Checking", AccountKind::Debit, 1000.0));
        let category = ledger.add_category(Category::new("Food", CategoryKind::Expense));
        (ledger, account, category)
    }

    #[test]
    fn quiet_ledger_forecasts_current_balance() {
        let (ledger, _, _) = fixture();
        let report = forecast(&ledger, date(2025, 4, 10));
        assert_eq!(report.current_balance, 1000.0);
        assert_eq!(report.forecast_balance, 1000.0);
        assert_eq!(report.pending_count, 0);
        assert_eq!(report.estimated_daily_expenses, 0.0);
    }

    #[test]
    fn velocity_uses_only_recent_unscheduled_expenses() {
        let (mut ledger, account, category) = fixture();
        let today = date(2025, 4, 10);

        let recent =
            TransactionDraft::new(60.0, TransactionKind::Expense, category, account, date(2025, 4, 5));
        ledger.add_transaction(Transaction::from_draft(recent, Utc::now()));

        // Outside the trailing window.
        let stale =
            TransactionDraft::new(900.0, TransactionKind::Expense, category, account, date(2025, 1, 5));
        ledger.add_transaction(Transaction::from_draft(stale, Utc::now()));

        // Scheduled payments are excluded from velocity.
        let draft =
            TransactionDraft::new(300.0, TransactionKind::Expense, category, account, date(2025, 4, 6));
        let mut scheduled = Transaction::from_draft(draft, Utc::now());
        scheduled.is_scheduled = true;
        ledger.add_transaction(scheduled);

        let report = forecast(&ledger, today);
        // 60 over 30 days, projected over the 20 days left in April.
        assert!((report.estimated_daily_expenses - 40.0).abs() < 1e-9);
    }

    #[test]
    fn one_time_rules_fall_out_of_pending_once_due_date_passes() {
        let (mut ledger, account, category) = fixture();
        ledger.add_scheduled_payment(
            ScheduledPayment::new(
                "Insurance",
                120.0,
                TransactionKind::Expense,
                category,
                account,
                Frequency::OneTime,
                MonthKey::new(2025, 4).unwrap(),
            )
            .with_due_date(date(2025, 4, 12))
            .with_end_month(MonthKey::new(2025, 4).unwrap()),
        );

        let before = forecast(&ledger, date(2025, 4, 10));
        assert_eq!(before.pending_expenses, 120.0);
        assert_eq!(before.pending_count, 1);

        let after = forecast(&ledger, date(2025, 4, 20));
        assert_eq!(after.pending_expenses, 0.0);
        assert_eq!(after.pending_count, 0);
    }
}
