//! Validated entry points for scheduled-payment rules and their resolution.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::engine::projector;
use crate::engine::{Occurrence, ResolveAction};
use crate::errors::LedgerError;
use crate::ledger::{
    Frequency, Ledger, MonthKey, PaymentInstance, ScheduleStatus, ScheduledPayment,
    TransactionKind,
};

use super::{ensure_amount, refresh_net_worth, ServiceResult};

pub struct ScheduleService;

impl ScheduleService {
    pub fn add(ledger: &mut Ledger, rule: ScheduledPayment) -> ServiceResult<Uuid> {
        Self::validate(ledger, &rule)?;
        Ok(ledger.add_scheduled_payment(rule))
    }

    /// Flips a rule between active and paused, returning the new status.
    pub fn toggle_status(ledger: &mut Ledger, id: Uuid) -> ServiceResult<ScheduleStatus> {
        let rule = ledger
            .scheduled_payment_mut(id)
            .ok_or_else(|| LedgerError::NotFound("Scheduled payment".into()))?;
        rule.status = rule.status.toggled();
        let status = rule.status;
        ledger.touch();
        Ok(status)
    }

    /// Removes a rule along with its resolution records. Transactions already
    /// generated by past resolutions are history and stay in the ledger.
    pub fn remove(ledger: &mut Ledger, id: Uuid) -> ServiceResult<()> {
        ledger
            .remove_scheduled_payment(id)
            .ok_or_else(|| LedgerError::NotFound("Scheduled payment".into()))?;
        ledger.remove_instances_for_schedule(id);
        Ok(())
    }

    pub fn occurrences(ledger: &Ledger, month: MonthKey) -> Vec<Occurrence> {
        projector::occurrences_for(ledger, month)
    }

    pub fn list(ledger: &Ledger) -> Vec<&ScheduledPayment> {
        ledger.scheduled_payments.iter().collect()
    }

    pub fn resolve(
        ledger: &mut Ledger,
        occurrence: &Occurrence,
        action: ResolveAction,
        date_override: Option<NaiveDate>,
    ) -> ServiceResult<PaymentInstance> {
        let instance = projector::resolve(ledger, occurrence, action, date_override)?;
        refresh_net_worth(ledger);
        Ok(instance)
    }

    /// Like [`Self::resolve`] but fails if the occurrence was already
    /// resolved, closing the double-submission hazard.
    pub fn resolve_strict(
        ledger: &mut Ledger,
        occurrence: &Occurrence,
        action: ResolveAction,
        date_override: Option<NaiveDate>,
    ) -> ServiceResult<PaymentInstance> {
        let instance = projector::resolve_strict(ledger, occurrence, action, date_override)?;
        refresh_net_worth(ledger);
        Ok(instance)
    }

    fn validate(ledger: &Ledger, rule: &ScheduledPayment) -> ServiceResult<()> {
        if rule.name.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Scheduled payment name is required".into(),
            ));
        }
        ensure_amount(rule.amount, "Scheduled payment")?;
        if rule.kind == TransactionKind::Transfer {
            return Err(LedgerError::Validation(
                "Scheduled payments must be income or expense".into(),
            ));
        }
        if ledger.category(rule.category_id).is_none() {
            return Err(LedgerError::NotFound("Category".into()));
        }
        if ledger.account(rule.account_id).is_none() {
            return Err(LedgerError::NotFound("Account".into()));
        }
        if let Some(day) = rule.day_of_month {
            if !(1..=31).contains(&day) {
                return Err(LedgerError::Validation(
                    "Day of month must be between 1 and 31".into(),
                ));
            }
        }
        if let Some(end) = rule.end_month {
            if end < rule.start_month {
                return Err(LedgerError::Validation(
                    "End month cannot precede start month".into(),
                ));
            }
        }

        match &rule.installments {
            Some(plan) => {
                if plan.total < 1 {
                    return Err(LedgerError::Validation(
                        "Installment count must be at least 1".into(),
                    ));
                }
                if rule.frequency == Frequency::OneTime {
                    return Err(LedgerError::Validation(
                        "Installment frequency must repeat".into(),
                    ));
                }
                if MonthKey::from_date(plan.start_date) != rule.start_month {
                    return Err(LedgerError::Validation(
                        "Installment start date must fall in the start month".into(),
                    ));
                }
            }
            None => match rule.frequency {
                Frequency::OneTime => {
                    let due = rule.due_date.ok_or_else(|| {
                        LedgerError::Validation("One-time payments need a due date".into())
                    })?;
                    if MonthKey::from_date(due) != rule.start_month {
                        return Err(LedgerError::Validation(
                            "Due date must fall in the start month".into(),
                        ));
                    }
                    if rule.end_month != Some(rule.start_month) {
                        return Err(LedgerError::Validation(
                            "One-time payments start and end in the same month".into(),
                        ));
                    }
                }
                Frequency::Monthly => {
                    if rule.day_of_month.is_none() && rule.due_date.is_none() {
                        return Err(LedgerError::Validation(
                            "Monthly payments need a day of month or a due date".into(),
                        ));
                    }
                }
                Frequency::Fortnightly => {
                    return Err(LedgerError::Validation(
                        "Fortnightly is only used by installment plans".into(),
                    ));
                }
            },
        }
        Ok(())
    }
}
