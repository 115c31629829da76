use uuid::Uuid;

use crate::errors::LedgerError;
use crate::ledger::{Goal, Ledger};

use super::{ensure_amount, ServiceResult};

pub struct GoalService;

impl GoalService {
    pub fn add(ledger: &mut Ledger, name: impl Into<String>, target_amount: f64) -> ServiceResult<Uuid> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(LedgerError::Validation("Goal name is required".into()));
        }
        if !target_amount.is_finite() || target_amount < 0.0 {
            return Err(LedgerError::Validation(
                "Goal target must be zero or positive".into(),
            ));
        }
        Ok(ledger.add_goal(Goal::new(name, target_amount)))
    }

    pub fn contribute(ledger: &mut Ledger, id: Uuid, amount: f64) -> ServiceResult<f64> {
        ensure_amount(amount, "Contribution")?;
        let goal = ledger
            .goal_mut(id)
            .ok_or_else(|| LedgerError::NotFound("Goal".into()))?;
        goal.current_saved += amount;
        let saved = goal.current_saved;
        ledger.touch();
        Ok(saved)
    }

    pub fn remove(ledger: &mut Ledger, id: Uuid) -> ServiceResult<Goal> {
        ledger
            .remove_goal(id)
            .ok_or_else(|| LedgerError::NotFound("Goal".into()))
    }

    pub fn list(ledger: &Ledger) -> Vec<&Goal> {
        ledger.goals.iter().collect()
    }
}
