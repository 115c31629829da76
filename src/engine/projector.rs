use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::LedgerError;
use crate::ledger::{
    Frequency, InstanceKey, InstanceState, Ledger, MonthKey, PaymentInstance, Transaction,
    TransactionKind,
};

/// Hard ceiling on cursor steps when walking one rule, independent of the
/// month-exceeded and installment-count exits.
const MAX_PROJECTION_STEPS: usize = 1024;

/// One concrete, month-scoped projection of a scheduled-payment rule,
/// reconciled against any stored resolution for its key.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Occurrence {
    pub scheduled_payment_id: Uuid,
    pub name: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category_id: Uuid,
    pub account_id: Uuid,
    pub date: NaiveDate,
    pub month: MonthKey,
    pub frequency: Frequency,
    pub installment_index: Option<u32>,
    pub state: OccurrenceState,
    pub instance_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum OccurrenceState {
    Pending,
    Paid,
    Skipped,
}

impl From<InstanceState> for OccurrenceState {
    fn from(state: InstanceState) -> Self {
        match state {
            InstanceState::Paid => OccurrenceState::Paid,
            InstanceState::Skipped => OccurrenceState::Skipped,
        }
    }
}

/// What to do with a projected occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveAction {
    Pay,
    Skip,
}

impl Occurrence {
    pub fn key(&self) -> InstanceKey {
        InstanceKey {
            scheduled_payment_id: self.scheduled_payment_id,
            installment_index: self.installment_index,
            month: self.month,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == OccurrenceState::Pending
    }
}

/// Projects every active rule onto `month` and returns the occurrences in
/// date order. Pure: calling this twice with no intervening mutation returns
/// identical results.
pub fn occurrences_for(ledger: &Ledger, month: MonthKey) -> Vec<Occurrence> {
    let mut occurrences = Vec::new();

    for rule in ledger.scheduled_payments.iter().filter(|r| r.active_in(month)) {
        match rule.installments {
            Some(plan) => {
                // Walk the installment cursor from its start date. Occurrences
                // are chronological, so the walk ends as soon as the cursor
                // passes the target month, the plan runs out of installments,
                // or the frequency stops advancing.
                let mut cursor = plan.start_date;
                for index in 0..plan.total {
                    if index as usize >= MAX_PROJECTION_STEPS {
                        break;
                    }
                    let cursor_month = MonthKey::from_date(cursor);
                    if cursor_month > month {
                        break;
                    }
                    if cursor_month == month {
                        occurrences.push(Occurrence {
                            scheduled_payment_id: rule.id,
                            name: format!("{} ({}/{})", rule.name, index + 1, plan.total),
                            amount: rule.amount,
                            kind: rule.kind,
                            category_id: rule.category_id,
                            account_id: rule.account_id,
                            date: cursor,
                            month,
                            frequency: rule.frequency,
                            installment_index: Some(index),
                            state: OccurrenceState::Pending,
                            instance_id: None,
                        });
                    }
                    cursor = match rule.frequency.advance(cursor) {
                        Some(next) => next,
                        None => break,
                    };
                }
            }
            None => {
                let day = rule
                    .day_of_month
                    .or_else(|| rule.due_date.map(|date| date.day()))
                    .unwrap_or(1);
                occurrences.push(Occurrence {
                    scheduled_payment_id: rule.id,
                    name: rule.name.clone(),
                    amount: rule.amount,
                    kind: rule.kind,
                    category_id: rule.category_id,
                    account_id: rule.account_id,
                    date: month.clamp_day(day),
                    month,
                    frequency: rule.frequency,
                    installment_index: None,
                    state: OccurrenceState::Pending,
                    instance_id: None,
                });
            }
        }
    }

    for occurrence in &mut occurrences {
        if let Some(instance) = ledger.instance(&occurrence.key()) {
            occurrence.state = instance.state.into();
            occurrence.instance_id = Some(instance.id);
        }
    }

    occurrences.sort_by(|a, b| (a.date, &a.name).cmp(&(b.date, &b.name)));
    occurrences
}

/// Records the outcome of one occurrence. `Pay` posts a ledger transaction
/// and stores a paid instance pointing at it; `Skip` stores a skipped
/// instance and posts nothing. Either way the write replaces whatever
/// instance previously held the occurrence's key.
///
/// Replace semantics make re-resolution converge on one instance per key,
/// but each `Pay` call posts its own transaction. Callers are responsible
/// for not submitting the same payment twice; use [`resolve_strict`] to have
/// the engine reject a second resolution outright.
pub fn resolve(
    ledger: &mut Ledger,
    occurrence: &Occurrence,
    action: ResolveAction,
    date_override: Option<NaiveDate>,
) -> Result<PaymentInstance, LedgerError> {
    let key = occurrence.key();
    let instance = match action {
        ResolveAction::Pay => {
            if ledger.account(occurrence.account_id).is_none() {
                return Err(LedgerError::NotFound(format!(
                    "account {}",
                    occurrence.account_id
                )));
            }
            if ledger.category(occurrence.category_id).is_none() {
                return Err(LedgerError::NotFound(format!(
                    "category {}",
                    occurrence.category_id
                )));
            }
            let transaction = Transaction {
                id: Uuid::new_v4(),
                amount: occurrence.amount,
                kind: occurrence.kind,
                category_id: occurrence.category_id,
                account_id: occurrence.account_id,
                target_account_id: None,
                date: date_override.unwrap_or(occurrence.date),
                created_at: Utc::now(),
                is_installment_total: false,
                is_scheduled: true,
                scheduled_payment_id: Some(occurrence.scheduled_payment_id),
                installment_index: occurrence.installment_index,
                note: None,
            };
            let transaction_id = ledger.add_transaction(transaction);
            PaymentInstance::paid(key, transaction_id)
        }
        ResolveAction::Skip => PaymentInstance::skipped(key),
    };

    ledger.upsert_instance(instance.clone());
    Ok(instance)
}

/// [`resolve`] with the idempotency hazard closed: if the key already has an
/// instance, the call fails instead of replacing it.
pub fn resolve_strict(
    ledger: &mut Ledger,
    occurrence: &Occurrence,
    action: ResolveAction,
    date_override: Option<NaiveDate>,
) -> Result<PaymentInstance, LedgerError> {
    let key = occurrence.key();
    if ledger.instance(&key).is_some() {
        return Err(LedgerError::AlreadyResolved(key.to_string()));
    }
    resolve(ledger, occurrence, action, date_override)
}
