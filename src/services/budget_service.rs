use uuid::Uuid;

use crate::errors::LedgerError;
use crate::ledger::{Budget, Ledger, MonthKey};

use super::ServiceResult;

pub struct BudgetService;

impl BudgetService {
    /// Sets the ceiling for `(month, category)`. Writing the same pair again
    /// replaces the amount; a zero amount is allowed and simply reports 0%
    /// usage downstream.
    pub fn upsert(
        ledger: &mut Ledger,
        month: MonthKey,
        category_id: Uuid,
        amount: f64,
    ) -> ServiceResult<Uuid> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(LedgerError::Validation(
                "Budget amount must be zero or positive".into(),
            ));
        }
        if ledger.category(category_id).is_none() {
            return Err(LedgerError::NotFound("Category".into()));
        }
        Ok(ledger.upsert_budget(month, category_id, amount))
    }

    pub fn remove(ledger: &mut Ledger, id: Uuid) -> ServiceResult<Budget> {
        ledger
            .remove_budget(id)
            .ok_or_else(|| LedgerError::NotFound("Budget".into()))
    }

    pub fn list_for_month(ledger: &Ledger, month: MonthKey) -> Vec<&Budget> {
        ledger.budgets_for_month(month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Category, CategoryKind};

    #[test]
    fn upsert_validates_category_and_amount() {
        let mut ledger = Ledger::new("Test");
        let month = MonthKey::new(2025, 4).unwrap();

        let err = BudgetService::upsert(&mut ledger, month, Uuid::new_v4(), 100.0).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));

        let category = ledger.add_category(Category::new("Food", CategoryKind::Expense));
        let err = BudgetService::upsert(&mut ledger, month, category, -1.0).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        BudgetService::upsert(&mut ledger, month, category, 150.0).unwrap();
        BudgetService::upsert(&mut ledger, month, category, 175.0).unwrap();
        assert_eq!(ledger.budgets.len(), 1);
        assert_eq!(ledger.budgets[0].amount, 175.0);
    }
}
