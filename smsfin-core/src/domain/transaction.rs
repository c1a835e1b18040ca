//! Parsed transaction domain model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which way the money moved, seen from the account holder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Income,
    Expense,
    Transfer,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Income => "income",
            Direction::Expense => "expense",
            Direction::Transfer => "transfer",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured record extracted from one financial SMS
///
/// `direction` and `amount` are always present and `amount` is strictly
/// positive; everything else is best-effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTransaction {
    pub direction: Direction,
    pub amount: Decimal,
    pub currency: String,
    pub counterparty_name: Option<String>,
    pub reference_code: Option<String>,
    pub balance_after: Option<Decimal>,
    pub occurred_at: DateTime<Utc>,
    pub raw_message_text: String,
    pub institution_id: String,
    /// Fixed score of the rule that produced this record, in [0, 1]
    pub confidence: f64,
}

impl ParsedTransaction {
    /// True when the record came from a rule below the given confidence
    pub fn is_low_confidence(&self, threshold: f64) -> bool {
        self.confidence < threshold
    }
}
