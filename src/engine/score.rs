use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::engine::balance::balances;
use crate::engine::budget_status::budget_status;
use crate::engine::forecast::forecast;
use crate::ledger::{Ledger, MonthKey, TransactionKind};

/// Advisory output is capped so the caller always gets a short, ranked list.
const MAX_ADVISORIES: usize = 3;

/// Composite financial-health score. Five factors, each capped at 200,
/// summing to a 0-1000 total.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthScore {
    pub total: u32,
    pub details: ScoreDetails,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScoreDetails {
    pub liquidity: u32,
    pub debt: u32,
    pub growth: u32,
    pub savings: u32,
    pub discipline: u32,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Severity {
    Danger,
    Warning,
    Info,
    Success,
}

/// One rule-based finding, ready for display.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Advisory {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Advisory {
    fn new(severity: Severity, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Scores the ledger as of `now`. Everything is recomputed from scratch;
/// nothing about the ledger is mutated or cached.
pub fn score(ledger: &Ledger, now: DateTime<Utc>) -> HealthScore {
    let today = now.date_naive();
    let month = MonthKey::from_date(today);

    let details = ScoreDetails {
        liquidity: liquidity_score(ledger, today),
        debt: debt_score(ledger),
        growth: growth_score(ledger),
        savings: savings_score(ledger, month),
        discipline: discipline_score(ledger, now, month),
    };
    let total = details.liquidity + details.debt + details.growth + details.savings
        + details.discipline;

    HealthScore { total, details }
}

fn liquidity_score(ledger: &Ledger, today: chrono::NaiveDate) -> u32 {
    let report = forecast(ledger, today);
    if report.forecast_balance <= 0.0 {
        return 0;
    }
    let buffer = if report.current_balance <= 0.0 {
        1.0
    } else {
        report.forecast_balance / report.current_balance
    };
    if buffer > 0.3 {
        200
    } else if buffer > 0.1 {
        120
    } else {
        40
    }
}

fn debt_score(ledger: &Ledger) -> u32 {
    let credit_accounts: Vec<_> = ledger.accounts.iter().filter(|a| a.is_credit()).collect();
    if credit_accounts.is_empty() {
        return 200;
    }

    let balances = balances(ledger);
    let mut total_debt = 0.0;
    let mut total_limit = 0.0;
    for account in credit_accounts {
        let balance = balances.get(&account.id).copied().unwrap_or(0.0);
        total_debt += (-balance).max(0.0);
        total_limit += account.credit_limit.unwrap_or(0.0);
    }
    if total_limit <= 0.0 {
        return 120;
    }

    let utilization = total_debt / total_limit;
    if utilization < 0.1 {
        200
    } else if utilization < 0.3 {
        160
    } else if utilization < 0.5 {
        80
    } else if utilization < 0.9 {
        40
    } else {
        0
    }
}

fn growth_score(ledger: &Ledger) -> u32 {
    if ledger.net_worth_history.len() < 2 {
        return 100;
    }
    let mut history: Vec<_> = ledger.net_worth_history.iter().collect();
    history.sort_by_key(|snapshot| snapshot.date);
    let latest = history[history.len() - 1].balance;
    let previous = history[history.len() - 2].balance;
    if latest >= previous {
        200
    } else {
        100
    }
}

fn savings_score(ledger: &Ledger, month: MonthKey) -> u32 {
    let (income, expense) = monthly_flows(ledger, month);
    if income <= 0.0 {
        return 100;
    }
    let rate = (income - expense) / income;
    if rate > 0.20 {
        200
    } else if rate > 0.10 {
        160
    } else if rate > 0.0 {
        100
    } else {
        40
    }
}

/// Up to 100 points for keeping the ledger current plus up to 100 for
/// staying inside budgets.
fn discipline_score(ledger: &Ledger, now: DateTime<Utc>, month: MonthKey) -> u32 {
    let recency = match ledger.transactions.iter().map(|txn| txn.created_at).max() {
        Some(latest) => {
            let age = now - latest;
            if age < Duration::days(2) {
                100
            } else if age < Duration::days(5) {
                60
            } else {
                0
            }
        }
        None => 0,
    };

    let statuses = budget_status(ledger, month);
    let adherence = if statuses.is_empty() {
        50
    } else {
        match statuses.iter().filter(|status| status.is_over()).count() {
            0 => 100,
            1 => 50,
            _ => 0,
        }
    };

    recency + adherence
}

/// Income and expense totals for one month, ignoring transfers and the
/// informational installment-total records.
fn monthly_flows(ledger: &Ledger, month: MonthKey) -> (f64, f64) {
    let mut income = 0.0;
    let mut expense = 0.0;
    for txn in ledger.transactions_in_month(month) {
        if txn.is_installment_total {
            continue;
        }
        match txn.kind {
            TransactionKind::Income => income += txn.amount,
            TransactionKind::Expense => expense += txn.amount,
            TransactionKind::Transfer => {}
        }
    }
    (income, expense)
}

/// Rule-based findings in fixed priority order, at most three. Each rule
/// fires once; when nothing fires a single neutral entry is returned.
pub fn recommendations(ledger: &Ledger, now: DateTime<Utc>) -> Vec<Advisory> {
    let today = now.date_naive();
    let month = MonthKey::from_date(today);
    let mut advisories = Vec::new();

    let report = forecast(ledger, today);
    if report.forecast_balance < 0.0 {
        advisories.push(Advisory::new(
            Severity::Danger,
            "Forecast negative",
            format!(
                "This month is on track to end {:.2} in the red. Review upcoming payments.",
                -report.forecast_balance
            ),
        ));
    }

    let statuses = budget_status(ledger, month);
    if advisories.len() < MAX_ADVISORIES {
        if let Some(status) = statuses.iter().find(|status| status.percentage > 75.0) {
            advisories.push(Advisory::new(
                Severity::Warning,
                "Budget almost used",
                format!(
                    "{} is at {:.0}% of its budget.",
                    status.category_name, status.percentage
                ),
            ));
        }
    }

    if advisories.len() < MAX_ADVISORIES {
        let previous = budget_status(ledger, month.prev());
        for status in &statuses {
            if status.percentage <= 100.0 {
                continue;
            }
            let prev_pct = previous
                .iter()
                .find(|prev| prev.category_id == status.category_id)
                .map(|prev| prev.percentage);
            if let Some(prev_pct) = prev_pct {
                if status.percentage - prev_pct > 20.0 {
                    advisories.push(Advisory::new(
                        Severity::Info,
                        "Spending trend",
                        format!(
                            "{} spending is {:.0}% of budget, up from {:.0}% last month.",
                            status.category_name, status.percentage, prev_pct
                        ),
                    ));
                    break;
                }
            }
        }
    }

    if advisories.len() < MAX_ADVISORIES {
        let (income, expense) = monthly_flows(ledger, month);
        if income > 0.0 && expense / income > 0.85 {
            advisories.push(Advisory::new(
                Severity::Warning,
                "High expense ratio",
                format!("Expenses are {:.0}% of income this month.", expense / income * 100.0),
            ));
        }
    }

    if advisories.len() < MAX_ADVISORIES {
        let health = score(ledger, now);
        if health.total > 750 {
            advisories.push(Advisory::new(
                Severity::Success,
                "Healthy finances",
                format!("Your financial health score is {}.", health.total),
            ));
        }
    }

    if advisories.is_empty() {
        advisories.push(Advisory::new(
            Severity::Info,
            "Looking steady",
            "No pressing issues found this month.",
        ));
    }
    advisories.truncate(MAX_ADVISORIES);
    advisories
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::ledger::{Account, AccountKind};

    #[test]
    fn empty_ledger_scores_the_documented_floor() {
        let ledger = Ledger::new("Empty");
        let health = score(&ledger, Utc::now());
        // liquidity 0, debt 200, growth 100, savings 100, discipline 50.
        assert_eq!(health.details.liquidity, 0);
        assert_eq!(health.details.debt, 200);
        assert_eq!(health.details.growth, 100);
        assert_eq!(health.details.savings, 100);
        assert_eq!(health.details.discipline, 50);
        assert_eq!(health.total, 450);
    }

    #[test]
    fn debt_score_pools_limits_across_cards() {
        let mut ledger = Ledger::new("Cards");
        ledger.add_account(
            Account::new("Visa", AccountKind::Credit, -400.0).with_credit_terms(1000.0, 28, 5),
        );
        ledger.add_account(
            Account::new("Amex", AccountKind::Credit, 0.0).with_credit_terms(1000.0, 28, 5),
        );
        // 400 / 2000 = 20% pooled utilization.
        assert_eq!(debt_score(&ledger), 160);
    }

    #[test]
    fn debt_score_handles_missing_limits() {
        let mut ledger = Ledger::new("Cards");
        ledger.add_account(Account::new("Store card", AccountKind::Credit, -50.0));
        assert_eq!(debt_score(&ledger), 120);
    }

    #[test]
    fn growth_rewards_rising_net_worth() {
        let mut ledger = Ledger::new("Growth");
        assert_eq!(growth_score(&ledger), 100);
        ledger.record_net_worth(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(), 100.0);
        assert_eq!(growth_score(&ledger), 100);
        ledger.record_net_worth(NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(), 150.0);
        assert_eq!(growth_score(&ledger), 200);
        ledger.record_net_worth(NaiveDate::from_ymd_opt(2025, 4, 3).unwrap(), 120.0);
        assert_eq!(growth_score(&ledger), 100);
    }

    #[test]
    fn default_advisory_when_nothing_fires() {
        let ledger = Ledger::new("Quiet");
        let advisories = recommendations(&ledger, Utc::now());
        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0].severity, Severity::Info);
    }
}
