use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    day::{DayRecord, DaySummary, HistoryEntry},
    expense::{validate_amount, validate_category, Expense},
};
use crate::{
    errors::{LedgerError, LedgerResult, StoreError},
    storage::KeyValueStore,
    time::Clock,
};

/// Maximum number of archived days; the oldest are dropped first.
pub const HISTORY_LIMIT: usize = 365;
/// Store key for the serialized ledger. Changing it acts as a schema version bump.
pub const DEFAULT_STORAGE_KEY: &str = "daily_ledger_v1";

/// Root persisted state: the current day plus the archive, most recent first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerState {
    #[serde(default)]
    pub last_open_date: Option<NaiveDate>,
    pub today: DayRecord,
    #[serde(default)]
    pub history: Vec<DayRecord>,
}

impl LedgerState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            last_open_date: None,
            today: DayRecord::new(today),
            history: Vec::new(),
        }
    }

    /// Moves the state onto `date`, archiving or discarding the previous day.
    fn roll_to(&mut self, date: NaiveDate) -> RolloverOutcome {
        if self.today.date == date {
            return RolloverOutcome::SameDay;
        }
        let previous_date = self.today.date;
        if date < previous_date {
            warn!(
                from = %previous_date,
                to = %date,
                "calendar date moved backwards"
            );
        }

        // Take a restorable day out before archiving so truncation cannot drop it.
        // Only possible when the clock went backwards onto an archived day.
        let position = self.history.iter().position(|day| day.date == date);
        let restored = position.map(|position| self.history.remove(position));
        let is_restored = restored.is_some();

        let fresh = restored.unwrap_or_else(|| DayRecord::new(date));
        let previous = std::mem::replace(&mut self.today, fresh);
        let outcome = if previous.has_activity() {
            self.history.insert(0, previous);
            if self.history.len() > HISTORY_LIMIT {
                let dropped = self.history.len() - HISTORY_LIMIT;
                self.history.truncate(HISTORY_LIMIT);
                warn!(dropped, limit = HISTORY_LIMIT, "archive truncated");
            }
            RolloverOutcome::Archived(previous_date)
        } else {
            RolloverOutcome::Discarded(previous_date)
        };

        if is_restored {
            info!(date = %date, "restored archived day as today");
        }
        outcome
    }
}

/// Result of a rollover check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverOutcome {
    /// The stored day already matches the clock.
    SameDay,
    /// The previous day had a budget or expenses and was archived.
    Archived(NaiveDate),
    /// The previous day was empty and was dropped.
    Discarded(NaiveDate),
}

/// Raised before committing an expense that would push spending past the budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverspendWarning {
    pub budget: f64,
    pub spent: f64,
    pub amount: f64,
    pub projected: f64,
}

impl OverspendWarning {
    pub fn excess(&self) -> f64 {
        self.projected - self.budget
    }
}

/// Caller's answer to a potential overspend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Confirmation {
    /// Commit only when the expense stays within budget.
    #[default]
    Unconfirmed,
    /// The caller has already accepted going over budget.
    Confirmed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpenseOutcome {
    Added(Expense),
    /// Nothing was committed; re-submit with [`Confirmation::Confirmed`] to proceed.
    NeedsConfirmation(OverspendWarning),
}

/// Owns the ledger state and writes it through to the store after every mutation.
pub struct Ledger {
    state: LedgerState,
    key: String,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    pub fn open(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> LedgerResult<Self> {
        Self::open_with_key(store, clock, DEFAULT_STORAGE_KEY)
    }

    /// Loads the state stored under `key`, or starts empty on the clock's current day.
    pub fn open_with_key(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        key: impl Into<String>,
    ) -> LedgerResult<Self> {
        let key = key.into();
        let state = match store.get(&key)? {
            Some(value) => serde_json::from_value(value).map_err(StoreError::from)?,
            None => {
                debug!(key = %key, "no stored ledger, starting fresh");
                LedgerState::new(clock.today())
            }
        };
        Ok(Self {
            state,
            key,
            store,
            clock,
        })
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn today(&self) -> &DayRecord {
        &self.state.today
    }

    pub fn history(&self) -> &[DayRecord] {
        &self.state.history
    }

    pub fn last_open_date(&self) -> Option<NaiveDate> {
        self.state.last_open_date
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    pub fn summary(&self) -> DaySummary {
        self.state.today.summary()
    }

    pub fn history_overview(&self) -> Vec<HistoryEntry> {
        self.state
            .history
            .iter()
            .map(DayRecord::history_entry)
            .collect()
    }

    pub fn history_day(&self, date: NaiveDate) -> Option<&DayRecord> {
        self.state.history.iter().find(|day| day.date == date)
    }

    /// Rolls over to the clock's current day if it changed. Safe to call repeatedly.
    pub fn ensure_today(&mut self) -> LedgerResult<RolloverOutcome> {
        let date = self.clock.today();
        let mut next = self.state.clone();
        let outcome = next.roll_to(date);
        next.last_open_date = Some(date);
        self.commit(next)?;
        match outcome {
            RolloverOutcome::SameDay => {}
            RolloverOutcome::Archived(previous) => {
                info!(previous = %previous, today = %date, "archived previous day")
            }
            RolloverOutcome::Discarded(previous) => {
                info!(previous = %previous, today = %date, "discarded empty day")
            }
        }
        Ok(outcome)
    }

    /// Sets or replaces today's budget.
    pub fn set_budget(&mut self, amount: f64) -> LedgerResult<()> {
        let amount = validate_amount(amount, "budget")?;
        let mut next = self.state.clone();
        next.today.budget = Some(amount);
        next.today.set_time = Some(self.clock.now());
        self.commit(next)?;
        info!(budget = amount, date = %self.state.today.date, "budget set");
        Ok(())
    }

    /// Reports whether adding `amount` now would exceed today's budget.
    pub fn check_expense(&self, amount: f64) -> LedgerResult<Option<OverspendWarning>> {
        let amount = validate_amount(amount, "expense amount")?;
        let today = &self.state.today;
        let Some(budget) = today.budget else {
            return Ok(None);
        };
        let spent = today.total_spent();
        let projected = spent + amount;
        if projected > budget {
            Ok(Some(OverspendWarning {
                budget,
                spent,
                amount,
                projected,
            }))
        } else {
            Ok(None)
        }
    }

    pub fn add_expense(
        &mut self,
        category: &str,
        amount: f64,
        confirmation: Confirmation,
    ) -> LedgerResult<ExpenseOutcome> {
        let category = validate_category(category)?;
        let warning = self.check_expense(amount)?;
        if let (Some(warning), Confirmation::Unconfirmed) = (warning, confirmation) {
            debug!(
                projected = warning.projected,
                budget = warning.budget,
                "expense awaiting overspend confirmation"
            );
            return Ok(ExpenseOutcome::NeedsConfirmation(warning));
        }

        let expense = Expense::new(&category, amount, self.clock.now())?;
        let mut next = self.state.clone();
        next.today.expenses.push(expense.clone());
        self.commit(next)?;

        if let Some(warning) = warning {
            warn!(
                excess = warning.excess(),
                budget = warning.budget,
                "confirmed expense exceeds budget"
            );
        }
        debug!(id = %expense.id, category = %expense.category, amount, "expense added");
        Ok(ExpenseOutcome::Added(expense))
    }

    /// Removes the expense with the given identity from today.
    pub fn delete_expense(&mut self, id: Uuid) -> LedgerResult<Expense> {
        let position = self
            .state
            .today
            .expenses
            .iter()
            .position(|expense| expense.id == id)
            .ok_or(LedgerError::NotFound(id))?;
        let mut next = self.state.clone();
        let removed = next.today.expenses.remove(position);
        self.commit(next)?;
        debug!(id = %id, "expense deleted");
        Ok(removed)
    }

    /// Clears today and the whole archive. Irreversible.
    pub fn reset_all(&mut self) -> LedgerResult<()> {
        let date = self.clock.today();
        let mut next = LedgerState::new(date);
        next.last_open_date = Some(date);
        let archived = self.state.history.len();
        self.commit(next)?;
        info!(archived, "ledger reset");
        Ok(())
    }

    /// Persists `next` and adopts it only once the store accepted it.
    fn commit(&mut self, next: LedgerState) -> LedgerResult<()> {
        let value = serde_json::to_value(&next).map_err(StoreError::from)?;
        self.store.set(&self.key, &value)?;
        debug!(key = %self.key, "ledger persisted");
        self.state = next;
        Ok(())
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("key", &self.key)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{storage::MemoryStore, time::ManualClock};
    use chrono::Duration;
    use serde_json::Value;

    fn start_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 10).unwrap()
    }

    fn fixture() -> (Ledger, Arc<ManualClock>, Arc<MemoryStore>) {
        let clock = Arc::new(ManualClock::at(start_day(), 9, 0));
        let store = Arc::new(MemoryStore::new());
        let ledger = Ledger::open(store.clone(), clock.clone()).expect("open ledger");
        (ledger, clock, store)
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> crate::storage::Result<Option<Value>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &Value) -> crate::storage::Result<()> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        }
    }

    #[test]
    fn fresh_ledger_starts_on_clock_day_without_persisting() {
        let (ledger, _, store) = fixture();
        assert_eq!(ledger.today().date, start_day());
        assert_eq!(ledger.today().budget, None);
        assert!(ledger.history().is_empty());
        assert_eq!(ledger.last_open_date(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn ensure_today_same_day_only_records_open_date() {
        let (mut ledger, _, store) = fixture();
        let outcome = ledger.ensure_today().unwrap();
        assert_eq!(outcome, RolloverOutcome::SameDay);
        assert_eq!(ledger.last_open_date(), Some(start_day()));
        assert!(store.get(DEFAULT_STORAGE_KEY).unwrap().is_some());
    }

    #[test]
    fn clock_moving_back_onto_archived_day_restores_it() {
        let (mut ledger, clock, _) = fixture();
        ledger.set_budget(20.0).unwrap();
        clock.advance(Duration::days(1));
        ledger.ensure_today().unwrap();
        ledger.set_budget(30.0).unwrap();

        clock.advance(Duration::days(-1));
        let outcome = ledger.ensure_today().unwrap();

        assert_eq!(outcome, RolloverOutcome::Archived(start_day() + Duration::days(1)));
        assert_eq!(ledger.today().date, start_day());
        assert_eq!(ledger.today().budget, Some(20.0));
        assert_eq!(ledger.history().len(), 1);
        assert!(ledger.history().iter().all(|day| day.date != start_day()));
    }

    #[test]
    fn restoring_oldest_day_from_full_archive_keeps_its_data() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let clock = Arc::new(ManualClock::at(start, 9, 0));
        let mut ledger = Ledger::open(Arc::new(MemoryStore::new()), clock.clone()).unwrap();
        for _ in 0..HISTORY_LIMIT {
            ledger.set_budget(10.0).unwrap();
            clock.advance(Duration::days(1));
            ledger.ensure_today().unwrap();
        }
        assert_eq!(ledger.history().len(), HISTORY_LIMIT);
        assert_eq!(ledger.history().last().unwrap().date, start);
        ledger.set_budget(25.0).unwrap();
        let latest = ledger.today().date;

        clock.set(start.and_hms_opt(9, 0, 0).unwrap().and_utc());
        let outcome = ledger.ensure_today().unwrap();

        assert_eq!(outcome, RolloverOutcome::Archived(latest));
        assert_eq!(ledger.today().date, start);
        assert_eq!(ledger.today().budget, Some(10.0));
        assert_eq!(ledger.history().len(), HISTORY_LIMIT);
        assert_eq!(ledger.history()[0].date, latest);
        assert!(ledger.history().iter().all(|day| day.date != start));
    }

    #[test]
    fn set_budget_rejects_non_positive_values() {
        let (mut ledger, _, store) = fixture();
        for amount in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                ledger.set_budget(amount),
                Err(LedgerError::InvalidInput(_))
            ));
        }
        assert_eq!(ledger.today().budget, None);
        assert!(store.is_empty());
    }

    #[test]
    fn set_budget_stamps_time_and_allows_updates() {
        let (mut ledger, clock, _) = fixture();
        ledger.set_budget(50.0).unwrap();
        let first = ledger.today().set_time.expect("set time");

        clock.advance(Duration::minutes(5));
        ledger.set_budget(80.0).unwrap();
        assert_eq!(ledger.today().budget, Some(80.0));
        assert_eq!(ledger.today().set_time, Some(first + Duration::minutes(5)));
    }

    #[test]
    fn unconfirmed_overspend_is_not_committed() {
        let (mut ledger, _, _) = fixture();
        ledger.set_budget(40.0).unwrap();
        ledger
            .add_expense("Lunch", 30.0, Confirmation::Unconfirmed)
            .unwrap();

        let outcome = ledger
            .add_expense("Dinner", 15.0, Confirmation::Unconfirmed)
            .unwrap();
        let ExpenseOutcome::NeedsConfirmation(warning) = outcome else {
            panic!("expected confirmation request, got {outcome:?}");
        };
        assert_eq!(warning.spent, 30.0);
        assert_eq!(warning.projected, 45.0);
        assert_eq!(warning.excess(), 5.0);
        assert_eq!(ledger.today().expenses.len(), 1);

        let outcome = ledger
            .add_expense("Dinner", 15.0, Confirmation::Confirmed)
            .unwrap();
        assert!(matches!(outcome, ExpenseOutcome::Added(_)));
        assert_eq!(ledger.today().total_spent(), 45.0);
    }

    #[test]
    fn exactly_reaching_budget_needs_no_confirmation() {
        let (mut ledger, _, _) = fixture();
        ledger.set_budget(25.0).unwrap();
        assert_eq!(ledger.check_expense(25.0).unwrap(), None);
        let outcome = ledger
            .add_expense("Books", 25.0, Confirmation::Unconfirmed)
            .unwrap();
        assert!(matches!(outcome, ExpenseOutcome::Added(_)));
    }

    #[test]
    fn expenses_without_budget_never_warn() {
        let (mut ledger, _, _) = fixture();
        assert_eq!(ledger.check_expense(1_000.0).unwrap(), None);
        let outcome = ledger
            .add_expense("Rent", 1_000.0, Confirmation::Unconfirmed)
            .unwrap();
        assert!(matches!(outcome, ExpenseOutcome::Added(_)));
    }

    #[test]
    fn invalid_expense_input_is_rejected_before_overspend_check() {
        let (mut ledger, _, _) = fixture();
        ledger.set_budget(1.0).unwrap();
        assert!(matches!(
            ledger.add_expense("  ", 5.0, Confirmation::Confirmed),
            Err(LedgerError::InvalidInput(_))
        ));
        assert!(matches!(
            ledger.add_expense("Food", -5.0, Confirmation::Confirmed),
            Err(LedgerError::InvalidInput(_))
        ));
        assert!(ledger.today().expenses.is_empty());
    }

    #[test]
    fn delete_unknown_expense_reports_not_found() {
        let (mut ledger, _, _) = fixture();
        ledger
            .add_expense("Snacks", 4.0, Confirmation::Unconfirmed)
            .unwrap();
        let before = ledger.state().clone();
        let missing = Uuid::new_v4();
        let err = ledger.delete_expense(missing).expect_err("must fail");
        assert!(matches!(err, LedgerError::NotFound(id) if id == missing));
        assert_eq!(ledger.state(), &before);
    }

    #[test]
    fn failed_persist_leaves_state_untouched() {
        let clock = Arc::new(ManualClock::at(start_day(), 9, 0));
        let mut ledger = Ledger::open(Arc::new(FailingStore), clock).unwrap();
        let before = ledger.state().clone();

        let err = ledger.set_budget(10.0).expect_err("store rejects writes");
        assert!(matches!(err, LedgerError::StoreFailure(_)));
        assert!(ledger
            .add_expense("Tea", 2.0, Confirmation::Confirmed)
            .is_err());
        assert_eq!(ledger.state(), &before);
    }

    #[test]
    fn reset_clears_today_and_history() {
        let (mut ledger, clock, _) = fixture();
        ledger.set_budget(10.0).unwrap();
        clock.advance(Duration::days(1));
        ledger.ensure_today().unwrap();
        ledger
            .add_expense("Taxi", 12.0, Confirmation::Unconfirmed)
            .unwrap();

        ledger.reset_all().unwrap();
        let today = start_day() + Duration::days(1);
        assert_eq!(ledger.state(), &{
            let mut expected = LedgerState::new(today);
            expected.last_open_date = Some(today);
            expected
        });
    }
}
