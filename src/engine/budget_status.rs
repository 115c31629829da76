use std::cmp::Ordering;

use serde::Serialize;
use uuid::Uuid;

use crate::ledger::{Ledger, MonthKey, TransactionKind};

/// How one monthly budget is tracking against actual spend.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BudgetStatus {
    pub budget_id: Uuid,
    pub category_id: Uuid,
    pub category_name: String,
    pub amount: f64,
    pub spent: f64,
    pub remaining: f64,
    /// Spend as a percentage of the budgeted amount; `0.0` for a zero budget.
    pub percentage: f64,
}

impl BudgetStatus {
    pub fn is_over(&self) -> bool {
        self.spent > self.amount
    }
}

/// Status of every budget set for `month`, most at-risk first.
pub fn budget_status(ledger: &Ledger, month: MonthKey) -> Vec<BudgetStatus> {
    let mut statuses: Vec<BudgetStatus> = ledger
        .budgets_for_month(month)
        .into_iter()
        .map(|budget| {
            let spent: f64 = ledger
                .transactions_in_month(month)
                .filter(|txn| {
                    txn.kind == TransactionKind::Expense
                        && !txn.is_installment_total
                        && txn.category_id == budget.category_id
                })
                .map(|txn| txn.amount)
                .sum();
            let percentage = if budget.amount > 0.0 {
                spent / budget.amount * 100.0
            } else {
                0.0
            };
            let category_name = ledger
                .category(budget.category_id)
                .map(|category| category.name.clone())
                .unwrap_or_else(|| "(unknown)".into());
            BudgetStatus {
                budget_id: budget.id,
                category_id: budget.category_id,
                category_name,
                amount: budget.amount,
                spent,
                remaining: budget.amount - spent,
                percentage,
            }
        })
        .collect();

    statuses.sort_by(|a, b| {
        b.percentage
            .partial_cmp(&a.percentage)
            .unwrap_or(Ordering::Equal)
    });
    statuses
}
