#![doc(test(attr(deny(warnings))))]

//! Daily Budget keeps a per-day spending budget with a bounded archive of past
//! days, persisting the whole ledger as one JSON blob in a key-value store.

pub mod config;
pub mod errors;
pub mod format;
pub mod ledger;
pub mod session;
pub mod storage;
pub mod time;
pub mod utils;

pub use errors::{LedgerError, LedgerResult};
pub use ledger::{Confirmation, DayRecord, Expense, ExpenseOutcome, Ledger, StatusBand};
pub use session::Session;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Daily Budget tracing initialized.");
    });
}
