#![doc(test(attr(deny(warnings))))]

//! Vantt Core is the ledger, projection, and financial-health engine behind
//! the Vantt personal-finance tracker: derived balances, scheduled-payment
//! projection with idempotent per-occurrence state, liquidity forecasting,
//! budget tracking, and a 0-1000 composite health score with advisories.

pub mod engine;
pub mod errors;
pub mod ledger;
pub mod services;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Vantt Core tracing initialized.");
    });
}
