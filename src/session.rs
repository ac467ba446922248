//! Wires configuration, the file-backed store and the system clock into a [`Ledger`].

use std::sync::Arc;

use tracing::info;

use crate::{
    config::{Config, ConfigManager},
    errors::LedgerResult,
    format::{format_amount, format_optional_amount, format_timestamp},
    ledger::{category_color, DayRecord, Ledger, RolloverOutcome},
    storage::{JsonFileStore, KeyValueStore},
    time::{Clock, SystemClock},
};

/// A ledger opened for interactive use. Opening runs the rollover check once.
#[derive(Debug)]
pub struct Session {
    config: Config,
    ledger: Ledger,
}

impl Session {
    /// Loads the config from the default location and opens the ledger it points at.
    pub fn open_default() -> LedgerResult<Self> {
        let config = ConfigManager::default_location()?.load()?;
        Self::open(config)
    }

    pub fn open(config: Config) -> LedgerResult<Self> {
        let store = JsonFileStore::new(config.store_dir())?;
        Self::open_with(config, Arc::new(store), Arc::new(SystemClock))
    }

    pub fn open_with(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> LedgerResult<Self> {
        let mut ledger = Ledger::open_with_key(store, clock, config.storage_key.clone())?;
        let outcome = ledger.ensure_today()?;
        info!(
            key = %ledger.storage_key(),
            today = %ledger.today().date,
            ?outcome,
            "session opened"
        );
        Ok(Self { config, ledger })
    }

    /// Re-checks the date when the host regains focus.
    pub fn on_focus(&mut self) -> LedgerResult<RolloverOutcome> {
        self.ledger.ensure_today()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    /// Headline for today in the configured currency.
    pub fn describe_today(&self) -> String {
        self.ledger.summary().describe(&self.config.currency)
    }

    /// `(date, budget, spent)` lines for the archive, most recent first.
    pub fn describe_history(&self) -> Vec<String> {
        let currency = &self.config.currency;
        self.ledger
            .history_overview()
            .into_iter()
            .map(|entry| {
                format!(
                    "{} | budget {} | spent {}",
                    entry.date,
                    format_optional_amount(entry.budget, currency),
                    format_amount(entry.spent, currency)
                )
            })
            .collect()
    }

    /// One line per entry in display order: time, category, amount, colour and
    /// an `over` marker once the running total passes the budget.
    pub fn describe_entries(&self, day: &DayRecord) -> Vec<String> {
        let currency = &self.config.currency;
        day.overspent_entries()
            .into_iter()
            .map(|flagged| {
                let expense = flagged.expense;
                let mut line = format!(
                    "{} | {} | {} | {}",
                    format_timestamp(expense.time),
                    expense.category,
                    format_amount(expense.amount, currency),
                    category_color(&expense.category)
                );
                if flagged.over {
                    line.push_str(" | over");
                }
                line
            })
            .collect()
    }
}
