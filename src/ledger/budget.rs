use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::month::MonthKey;

/// A spending ceiling for one category in one calendar month. At most one
/// budget exists per `(month, category)` pair; re-setting the pair replaces
/// the amount in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub month: MonthKey,
    pub category_id: Uuid,
    pub amount: f64,
}

impl Budget {
    pub fn new(month: MonthKey, category_id: Uuid, amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            month,
            category_id,
            amount,
        }
    }
}
