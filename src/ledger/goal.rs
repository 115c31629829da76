use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A savings target the user contributes toward over time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub name: String,
    pub target_amount: f64,
    pub current_saved: f64,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    pub fn new(name: impl Into<String>, target_amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            target_amount,
            current_saved: 0.0,
            created_at: Utc::now(),
        }
    }

    /// Fraction complete in `0.0..=1.0`. A zero target reads as no progress
    /// rather than dividing by zero.
    pub fn progress(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 0.0;
        }
        (self.current_saved / self.target_amount).clamp(0.0, 1.0)
    }
}
