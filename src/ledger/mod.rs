//! Daily budget ledger: today's record, the bounded archive, and derived figures.

pub mod day;
pub mod expense;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod palette;

pub use day::{
    CategoryTotal, DayRecord, DaySummary, FlaggedExpense, HistoryEntry, StatusBand,
    OVER_THRESHOLD_PERCENT, WARNING_THRESHOLD_PERCENT,
};
pub use expense::Expense;
pub use ledger::{
    Confirmation, ExpenseOutcome, Ledger, LedgerState, OverspendWarning, RolloverOutcome,
    DEFAULT_STORAGE_KEY, HISTORY_LIMIT,
};
pub use palette::category_color;
