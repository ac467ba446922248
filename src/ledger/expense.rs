use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{LedgerError, LedgerResult};

/// A single spending entry owned by one day's record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub category: String,
    pub amount: f64,
    pub time: DateTime<Utc>,
}

impl Expense {
    /// Validates the input and builds an expense stamped at `time`.
    pub fn new(category: &str, amount: f64, time: DateTime<Utc>) -> LedgerResult<Self> {
        let category = validate_category(category)?;
        let amount = validate_amount(amount, "expense amount")?;
        Ok(Self {
            id: Uuid::new_v4(),
            category,
            amount,
            time,
        })
    }
}

/// Returns the trimmed category or rejects it when empty.
pub fn validate_category(category: &str) -> LedgerResult<String> {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidInput(
            "category must not be empty".into(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Accepts finite amounts strictly greater than zero.
pub fn validate_amount(amount: f64, what: &str) -> LedgerResult<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(LedgerError::InvalidInput(format!(
            "{what} must be a positive number, got {amount}"
        )));
    }
    Ok(amount)
}
