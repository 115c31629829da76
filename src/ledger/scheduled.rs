use std::fmt;

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::month::MonthKey;
use super::transaction::TransactionKind;

/// A recurring or one-off payment rule. Rules are pure templates: projecting
/// them into a month never writes anything, and the only durable record of
/// "this occurrence happened" is a [`PaymentInstance`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledPayment {
    pub id: Uuid,
    pub name: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category_id: Uuid,
    pub account_id: Uuid,
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub start_month: MonthKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_month: Option<MonthKey>,
    #[serde(default)]
    pub status: ScheduleStatus,
    /// Present on masters created by an installment purchase; drives the
    /// date-cursor projection instead of the day-of-month rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installments: Option<InstallmentPlan>,
}

/// How often a rule fires.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Frequency {
    Monthly,
    Fortnightly,
    OneTime,
}

impl Frequency {
    /// Next occurrence date after `from`, or `None` when the rule does not
    /// repeat or the calendar runs out. Projection loops stop as soon as this
    /// returns `None`, which is what keeps one-time rules from spinning
    /// forever. Monthly steps clamp the day into shorter target months.
    pub fn advance(&self, from: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Monthly => from.checked_add_months(Months::new(1)),
            Frequency::Fortnightly => from.checked_add_days(Days::new(15)),
            Frequency::OneTime => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ScheduleStatus {
    #[default]
    Active,
    Paused,
}

impl ScheduleStatus {
    pub fn toggled(&self) -> Self {
        match self {
            ScheduleStatus::Active => ScheduleStatus::Paused,
            ScheduleStatus::Paused => ScheduleStatus::Active,
        }
    }
}

/// Installment terms attached to a master rule: how many payments and when
/// the first one lands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallmentPlan {
    pub total: u32,
    pub start_date: NaiveDate,
}

impl ScheduledPayment {
    pub fn new(
        name: impl Into<String>,
        amount: f64,
        kind: TransactionKind,
        category_id: Uuid,
        account_id: Uuid,
        frequency: Frequency,
        start_month: MonthKey,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            amount,
            kind,
            category_id,
            account_id,
            frequency,
            day_of_month: None,
            due_date: None,
            start_month,
            end_month: None,
            status: ScheduleStatus::Active,
            installments: None,
        }
    }

    pub fn with_day_of_month(mut self, day: u32) -> Self {
        self.day_of_month = Some(day);
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_end_month(mut self, end_month: MonthKey) -> Self {
        self.end_month = Some(end_month);
        self
    }

    pub fn with_installments(mut self, plan: InstallmentPlan) -> Self {
        self.installments = Some(plan);
        self
    }

    pub fn is_installment_master(&self) -> bool {
        self.installments.is_some()
    }

    /// Whether the rule is eligible to produce occurrences in `month`.
    pub fn active_in(&self, month: MonthKey) -> bool {
        self.status == ScheduleStatus::Active
            && self.start_month <= month
            && self.end_month.map_or(true, |end| end >= month)
    }
}

/// Durable record that one projected occurrence was acted on. Keyed by
/// `(rule, installment index, month)` so resolving the same occurrence twice
/// replaces the record instead of stacking a second one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInstance {
    pub id: Uuid,
    pub scheduled_payment_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment_index: Option<u32>,
    pub month: MonthKey,
    pub state: InstanceState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_transaction_id: Option<Uuid>,
    pub resolved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InstanceState {
    Paid,
    Skipped,
}

impl PaymentInstance {
    pub fn paid(key: InstanceKey, transaction_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            scheduled_payment_id: key.scheduled_payment_id,
            installment_index: key.installment_index,
            month: key.month,
            state: InstanceState::Paid,
            generated_transaction_id: Some(transaction_id),
            resolved_at: Utc::now(),
        }
    }

    pub fn skipped(key: InstanceKey) -> Self {
        Self {
            id: Uuid::new_v4(),
            scheduled_payment_id: key.scheduled_payment_id,
            installment_index: key.installment_index,
            month: key.month,
            state: InstanceState::Skipped,
            generated_transaction_id: None,
            resolved_at: Utc::now(),
        }
    }

    pub fn key(&self) -> InstanceKey {
        InstanceKey {
            scheduled_payment_id: self.scheduled_payment_id,
            installment_index: self.installment_index,
            month: self.month,
        }
    }
}

/// Identity of one occurrence of one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    pub scheduled_payment_id: Uuid,
    pub installment_index: Option<u32>,
    pub month: MonthKey,
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.installment_index {
            Some(index) => write!(f, "{}#{} in {}", self.scheduled_payment_id, index, self.month),
            None => write!(f, "{} in {}", self.scheduled_payment_id, self.month),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(year: i32, month: u32) -> MonthKey {
        MonthKey::new(year, month).unwrap()
    }

    #[test]
    fn frequency_advance_steps_or_stops() {
        let jan31 = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(
            Frequency::Monthly.advance(jan31),
            Some(NaiveDate::from_ymd_opt(2025, 2, 28).unwrap())
        );
        assert_eq!(
            Frequency::Fortnightly.advance(jan31),
            Some(NaiveDate::from_ymd_opt(2025, 2, 15).unwrap())
        );
        assert_eq!(Frequency::OneTime.advance(jan31), None);
    }

    #[test]
    fn active_window_respects_status_and_bounds() {
        let mut rule = ScheduledPayment::new(
            "Rent",
            900.0,
            TransactionKind::Expense,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Frequency::Monthly,
            month(2025, 2),
        )
        .with_day_of_month(1)
        .with_end_month(month(2025, 6));

        assert!(!rule.active_in(month(2025, 1)));
        assert!(rule.active_in(month(2025, 2)));
        assert!(rule.active_in(month(2025, 6)));
        assert!(!rule.active_in(month(2025, 7)));

        rule.status = rule.status.toggled();
        assert!(!rule.active_in(month(2025, 3)));
    }

    #[test]
    fn instance_key_round_trips_through_instance() {
        let key = InstanceKey {
            scheduled_payment_id: Uuid::new_v4(),
            installment_index: Some(2),
            month: month(2025, 3),
        };
        let instance = PaymentInstance::skipped(key);
        assert_eq!(instance.key(), key);
        assert_eq!(instance.state, InstanceState::Skipped);
        assert!(instance.generated_transaction_id.is_none());
    }
}
