//! Derived reads over the ledger: balances, projections, forecasts, budget
//! tracking, and the composite health score. Every function here recomputes
//! from the ledger snapshot it is handed; none of them cache or mutate
//! derived state.

pub mod balance;
pub mod budget_status;
pub mod forecast;
pub mod projector;
pub mod score;

pub use balance::{balance_of, balances, credit_status, total_balance, CreditStatus};
pub use budget_status::{budget_status, BudgetStatus};
pub use forecast::{forecast, Forecast};
pub use projector::{
    occurrences_for, resolve, resolve_strict, Occurrence, OccurrenceState, ResolveAction,
};
pub use score::{recommendations, score, Advisory, HealthScore, ScoreDetails, Severity};
