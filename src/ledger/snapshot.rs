use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Point-in-time record of total net worth, at most one per calendar day.
/// The history feeds the growth component of the health score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NetWorthSnapshot {
    pub date: NaiveDate,
    pub balance: f64,
}

impl NetWorthSnapshot {
    pub fn new(date: NaiveDate, balance: f64) -> Self {
        Self { date, balance }
    }
}
