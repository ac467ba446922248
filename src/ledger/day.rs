//! One calendar day of spending plus every figure derived from it.
//!
//! Derived values are recomputed from the expense list on each call and never
//! stored on the entries themselves, so edits to the budget or to earlier
//! expenses are reflected immediately.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::expense::Expense;
use crate::format::{format_amount, format_percent};
use crate::time::date_key;

/// Percentage at which a day moves from `Ok` to `Warning`.
pub const WARNING_THRESHOLD_PERCENT: f64 = 70.0;
/// Percentage at which a day is considered over budget.
pub const OVER_THRESHOLD_PERCENT: f64 = 100.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
    pub date: NaiveDate,
    /// `None` means no budget has been set for the day, which differs from a zero budget.
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub set_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

impl DayRecord {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            budget: None,
            set_time: None,
            expenses: Vec::new(),
        }
    }

    pub fn date_key(&self) -> String {
        date_key(self.date)
    }

    /// Whether the day carries anything worth archiving at rollover.
    pub fn has_activity(&self) -> bool {
        self.budget.is_some() || !self.expenses.is_empty()
    }

    pub fn expense(&self, id: Uuid) -> Option<&Expense> {
        self.expenses.iter().find(|expense| expense.id == id)
    }

    pub fn total_spent(&self) -> f64 {
        self.expenses.iter().map(|expense| expense.amount).sum()
    }

    /// Budget minus spending, or `None` while no budget is set.
    pub fn remaining(&self) -> Option<f64> {
        self.budget.map(|budget| budget - self.total_spent())
    }

    pub fn percent_used(&self) -> f64 {
        match self.budget {
            Some(budget) if budget > 0.0 => self.total_spent() / budget * 100.0,
            _ => 0.0,
        }
    }

    pub fn status_band(&self) -> StatusBand {
        StatusBand::from_percent(self.percent_used())
    }

    /// Expenses in display order (ascending by time, ties keep insertion order).
    pub fn sorted_expenses(&self) -> Vec<&Expense> {
        let mut sorted: Vec<&Expense> = self.expenses.iter().collect();
        sorted.sort_by_key(|expense| expense.time);
        sorted
    }

    /// Flags each expense whose running total, in time order, exceeds the budget.
    pub fn overspent_entries(&self) -> Vec<FlaggedExpense<'_>> {
        let mut running = 0.0;
        self.sorted_expenses()
            .into_iter()
            .map(|expense| {
                running += expense.amount;
                FlaggedExpense {
                    expense,
                    running_total: running,
                    over: self.budget.is_some_and(|budget| running > budget),
                }
            })
            .collect()
    }

    /// Spending grouped by category in order of first appearance.
    pub fn category_totals(&self) -> Vec<CategoryTotal> {
        let mut totals: Vec<CategoryTotal> = Vec::new();
        for expense in &self.expenses {
            match totals
                .iter_mut()
                .find(|entry| entry.category == expense.category)
            {
                Some(entry) => {
                    entry.total += expense.amount;
                    entry.count += 1;
                }
                None => totals.push(CategoryTotal {
                    category: expense.category.clone(),
                    total: expense.amount,
                    count: 1,
                    share: 0.0,
                }),
            }
        }
        let spent = self.total_spent();
        if spent > 0.0 {
            for entry in &mut totals {
                entry.share = entry.total / spent;
            }
        }
        totals
    }

    pub fn summary(&self) -> DaySummary {
        let percent_used = self.percent_used();
        DaySummary {
            date: self.date,
            budget: self.budget,
            set_time: self.set_time,
            spent: self.total_spent(),
            remaining: self.remaining(),
            percent_used,
            progress: percent_used.clamp(0.0, 100.0),
            band: StatusBand::from_percent(percent_used),
            expense_count: self.expenses.len(),
        }
    }

    pub fn history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            date: self.date,
            budget: self.budget,
            spent: self.total_spent(),
            expense_count: self.expenses.len(),
        }
    }
}

/// Overspend band derived from the percentage of budget consumed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StatusBand {
    Ok,
    Warning,
    Over,
}

impl StatusBand {
    pub fn from_percent(percent: f64) -> Self {
        if percent >= OVER_THRESHOLD_PERCENT {
            StatusBand::Over
        } else if percent >= WARNING_THRESHOLD_PERCENT {
            StatusBand::Warning
        } else {
            StatusBand::Ok
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusBand::Ok => "ok",
            StatusBand::Warning => "warning",
            StatusBand::Over => "over",
        }
    }
}

impl fmt::Display for StatusBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An expense paired with its running-total overspend flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlaggedExpense<'a> {
    pub expense: &'a Expense,
    pub running_total: f64,
    pub over: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    pub count: usize,
    /// Fraction of the day's spending, in `[0, 1]`.
    pub share: f64,
}

/// Snapshot of the headline figures for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub budget: Option<f64>,
    pub set_time: Option<DateTime<Utc>>,
    pub spent: f64,
    pub remaining: Option<f64>,
    pub percent_used: f64,
    /// `percent_used` clamped to `[0, 100]` for progress indicators.
    pub progress: f64,
    pub band: StatusBand,
    pub expense_count: usize,
}

impl DaySummary {
    pub fn rounded_percent(&self) -> u64 {
        self.percent_used.round().max(0.0) as u64
    }

    /// One-line description, e.g. `2024-05-01: 30 / 100 USD (30%, ok)`.
    pub fn describe(&self, currency: &str) -> String {
        match self.budget {
            Some(budget) => format!(
                "{}: {} / {} ({}, {})",
                date_key(self.date),
                format_amount(self.spent, currency),
                format_amount(budget, currency),
                format_percent(self.percent_used),
                self.band
            ),
            None => format!(
                "{}: {} spent, no budget set",
                date_key(self.date),
                format_amount(self.spent, currency)
            ),
        }
    }
}

/// Row of the archive overview.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub budget: Option<f64>,
    pub spent: f64,
    pub expense_count: usize,
}
