use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    account::Account,
    budget::Budget,
    category::Category,
    goal::Goal,
    month::MonthKey,
    scheduled::{InstanceKey, PaymentInstance, ScheduledPayment},
    snapshot::NetWorthSnapshot,
    transaction::Transaction,
};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// The whole in-memory state for one user's finances. One ledger is owned by
/// one writer at a time; all derived figures (balances, forecasts, scores)
/// are recomputed from this state on demand and never cached inside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default)]
    pub scheduled_payments: Vec<ScheduledPayment>,
    #[serde(default, with = "instance_map")]
    pub payment_instances: HashMap<InstanceKey, PaymentInstance>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub net_worth_history: Vec<NetWorthSnapshot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "Ledger::schema_version_default")]
    pub schema_version: u8,
}

impl Ledger {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            accounts: Vec::new(),
            categories: Vec::new(),
            transactions: Vec::new(),
            budgets: Vec::new(),
            scheduled_payments: Vec::new(),
            payment_instances: HashMap::new(),
            goals: Vec::new(),
            net_worth_history: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    // Collection mutators push records and bump `updated_at`. Validation and
    // referential guards live in the service layer.

    pub fn add_account(&mut self, account: Account) -> Uuid {
        let id = account.id;
        self.accounts.push(account);
        self.touch();
        id
    }

    pub fn add_category(&mut self, category: Category) -> Uuid {
        let id = category.id;
        self.categories.push(category);
        self.touch();
        id
    }

    pub fn add_transaction(&mut self, transaction: Transaction) -> Uuid {
        let id = transaction.id;
        self.transactions.push(transaction);
        self.touch();
        id
    }

    pub fn add_scheduled_payment(&mut self, payment: ScheduledPayment) -> Uuid {
        let id = payment.id;
        self.scheduled_payments.push(payment);
        self.touch();
        id
    }

    pub fn add_goal(&mut self, goal: Goal) -> Uuid {
        let id = goal.id;
        self.goals.push(goal);
        self.touch();
        id
    }

    /// Sets the budget for `(month, category)`, replacing any existing amount
    /// for the same pair.
    pub fn upsert_budget(&mut self, month: MonthKey, category_id: Uuid, amount: f64) -> Uuid {
        let id = match self
            .budgets
            .iter_mut()
            .find(|budget| budget.month == month && budget.category_id == category_id)
        {
            Some(existing) => {
                existing.amount = amount;
                existing.id
            }
            None => {
                let budget = Budget::new(month, category_id, amount);
                let id = budget.id;
                self.budgets.push(budget);
                id
            }
        };
        self.touch();
        id
    }

    pub fn account(&self, id: Uuid) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn account_mut(&mut self, id: Uuid) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|account| account.id == id)
    }

    pub fn category(&self, id: Uuid) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn category_mut(&mut self, id: Uuid) -> Option<&mut Category> {
        self.categories.iter_mut().find(|category| category.id == id)
    }

    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn transaction_mut(&mut self, id: Uuid) -> Option<&mut Transaction> {
        self.transactions.iter_mut().find(|txn| txn.id == id)
    }

    pub fn scheduled_payment(&self, id: Uuid) -> Option<&ScheduledPayment> {
        self.scheduled_payments.iter().find(|rule| rule.id == id)
    }

    pub fn scheduled_payment_mut(&mut self, id: Uuid) -> Option<&mut ScheduledPayment> {
        self.scheduled_payments.iter_mut().find(|rule| rule.id == id)
    }

    pub fn goal(&self, id: Uuid) -> Option<&Goal> {
        self.goals.iter().find(|goal| goal.id == id)
    }

    pub fn goal_mut(&mut self, id: Uuid) -> Option<&mut Goal> {
        self.goals.iter_mut().find(|goal| goal.id == id)
    }

    pub fn instance(&self, key: &InstanceKey) -> Option<&PaymentInstance> {
        self.payment_instances.get(key)
    }

    /// Stores the instance under its own key, returning the record it
    /// replaced. The last write wins, which is what makes re-resolving an
    /// occurrence idempotent at the storage level.
    pub fn upsert_instance(&mut self, instance: PaymentInstance) -> Option<PaymentInstance> {
        let replaced = self.payment_instances.insert(instance.key(), instance);
        self.touch();
        replaced
    }

    pub fn remove_account(&mut self, id: Uuid) -> Option<Account> {
        let position = self.accounts.iter().position(|account| account.id == id)?;
        let removed = self.accounts.remove(position);
        self.touch();
        Some(removed)
    }

    pub fn remove_category(&mut self, id: Uuid) -> Option<Category> {
        let position = self
            .categories
            .iter()
            .position(|category| category.id == id)?;
        let removed = self.categories.remove(position);
        self.touch();
        Some(removed)
    }

    pub fn remove_transaction(&mut self, id: Uuid) -> Option<Transaction> {
        let position = self.transactions.iter().position(|txn| txn.id == id)?;
        let removed = self.transactions.remove(position);
        self.touch();
        Some(removed)
    }

    pub fn remove_scheduled_payment(&mut self, id: Uuid) -> Option<ScheduledPayment> {
        let position = self
            .scheduled_payments
            .iter()
            .position(|rule| rule.id == id)?;
        let removed = self.scheduled_payments.remove(position);
        self.touch();
        Some(removed)
    }

    pub fn remove_goal(&mut self, id: Uuid) -> Option<Goal> {
        let position = self.goals.iter().position(|goal| goal.id == id)?;
        let removed = self.goals.remove(position);
        self.touch();
        Some(removed)
    }

    pub fn remove_budget(&mut self, id: Uuid) -> Option<Budget> {
        let position = self.budgets.iter().position(|budget| budget.id == id)?;
        let removed = self.budgets.remove(position);
        self.touch();
        Some(removed)
    }

    /// Drops every resolution record belonging to one rule, returning how
    /// many were removed.
    pub fn remove_instances_for_schedule(&mut self, scheduled_payment_id: Uuid) -> usize {
        let before = self.payment_instances.len();
        self.payment_instances
            .retain(|key, _| key.scheduled_payment_id != scheduled_payment_id);
        let removed = before - self.payment_instances.len();
        if removed > 0 {
            self.touch();
        }
        removed
    }

    pub fn budgets_for_month(&self, month: MonthKey) -> Vec<&Budget> {
        self.budgets
            .iter()
            .filter(|budget| budget.month == month)
            .collect()
    }

    pub fn transactions_in_month(&self, month: MonthKey) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(move |txn| month.contains(txn.date))
    }

    /// Records total net worth for `date`, overwriting an existing snapshot
    /// on the same day and keeping the history date-ordered.
    pub fn record_net_worth(&mut self, date: NaiveDate, balance: f64) {
        match self
            .net_worth_history
            .iter_mut()
            .find(|snapshot| snapshot.date == date)
        {
            Some(existing) => existing.balance = balance,
            None => {
                self.net_worth_history.push(NetWorthSnapshot::new(date, balance));
                self.net_worth_history.sort_by_key(|snapshot| snapshot.date);
            }
        }
        self.touch();
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}

/// Serde shim that stores the instance map as a plain array. Keys are
/// recomputed from the records on load, and the on-disk order is fixed so
/// repeated saves of the same ledger produce the same bytes.
mod instance_map {
    use std::collections::HashMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::ledger::scheduled::{InstanceKey, PaymentInstance};

    pub fn serialize<S: Serializer>(
        map: &HashMap<InstanceKey, PaymentInstance>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut instances: Vec<&PaymentInstance> = map.values().collect();
        instances.sort_by(|a, b| (a.resolved_at, a.id).cmp(&(b.resolved_at, b.id)));
        instances.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<InstanceKey, PaymentInstance>, D::Error> {
        let instances = Vec::<PaymentInstance>::deserialize(deserializer)?;
        Ok(instances
            .into_iter()
            .map(|instance| (instance.key(), instance))
            .collect())
    }
}
