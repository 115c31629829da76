//! Ledger domain records: the owned state that everything else derives from.

pub mod account;
pub mod budget;
pub mod category;
pub mod goal;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod month;
pub mod scheduled;
pub mod snapshot;
pub mod transaction;

pub use account::{Account, AccountKind};
pub use budget::Budget;
pub use category::{Category, CategoryKind};
pub use goal::Goal;
pub use ledger::{Ledger, CURRENT_SCHEMA_VERSION};
pub use month::MonthKey;
pub use scheduled::{
    Frequency, InstallmentPlan, InstanceKey, InstanceState, PaymentInstance, ScheduleStatus,
    ScheduledPayment,
};
pub use snapshot::NetWorthSnapshot;
pub use transaction::{Transaction, TransactionDraft, TransactionKind};
