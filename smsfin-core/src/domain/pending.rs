//! Pending transaction candidates and the save hand-off

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::message::RawMessage;
use super::transaction::{Direction, ParsedTransaction};

/// A parsed transaction that has been given its pending id
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub transaction: ParsedTransaction,
}

impl Candidate {
    /// Derive the pending id from the source message
    ///
    /// The platform message id is used when present. Messages without one
    /// get `<timestamp>-<random suffix>`, so two of them never collide.
    pub fn from_message(message: &RawMessage, transaction: ParsedTransaction) -> Self {
        let id = if message.id.trim().is_empty() {
            format!("{}-{:08x}", message.timestamp_millis, rand::random::<u32>())
        } else {
            message.id.clone()
        };
        Self { id, transaction }
    }
}

/// A candidate awaiting review, with its engine-managed state
///
/// Both flags only ever go from false to true. The entry is visible to the
/// user while neither is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransaction {
    pub id: String,
    #[serde(flatten)]
    pub transaction: ParsedTransaction,
    pub dismissed: bool,
    pub saved: bool,
    pub suggested_category: String,
    /// Detection time, recorded on the ledger entry as `sms_detected_at`
    pub detected_at: DateTime<Utc>,
}

impl PendingTransaction {
    pub fn new(candidate: Candidate, suggested_category: String) -> Self {
        Self {
            id: candidate.id,
            transaction: candidate.transaction,
            dismissed: false,
            saved: false,
            suggested_category,
            detected_at: Utc::now(),
        }
    }

    /// Neither dismissed nor saved
    pub fn is_active(&self) -> bool {
        !self.dismissed && !self.saved
    }

    /// Needs explicit user confirmation rather than a quick save
    pub fn requires_review(&self, threshold: f64) -> bool {
        self.transaction.is_low_confidence(threshold)
    }

    /// Best description for a ledger entry: the counterparty if we found one
    pub fn default_description(&self) -> Option<&str> {
        self.transaction.counterparty_name.as_deref()
    }
}

/// What the consumer decides when confirming a candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub category: String,
    pub account: String,
    /// Overrides the default description (counterparty or institution name)
    #[serde(default)]
    pub description: Option<String>,
}

impl SaveRequest {
    pub fn new(category: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            account: account.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Ledger entry kind; transfers are recorded as expenses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerKind {
    Income,
    Expense,
}

impl From<Direction> for LedgerKind {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Income => LedgerKind::Income,
            Direction::Expense | Direction::Transfer => LedgerKind::Expense,
        }
    }
}

/// Entry handed to the external ledger when a candidate is confirmed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryDraft {
    pub amount: Decimal,
    pub kind: LedgerKind,
    pub currency: String,
    pub category: String,
    pub account: String,
    pub description: String,
    pub date: NaiveDate,
    pub reference: Option<String>,
    /// Always "SMS" for entries produced by this engine
    pub source: String,
    pub sms_reference: Option<String>,
    pub sms_detected_at: DateTime<Utc>,
}

impl LedgerEntryDraft {
    /// Build the hand-off entry for a pending transaction
    ///
    /// `fallback_description` is used when neither the request nor the
    /// parsed record supplies one (typically the institution's name).
    pub fn build(pending: &PendingTransaction, request: &SaveRequest, fallback_description: &str) -> Self {
        let tx = &pending.transaction;
        let description = request
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .or_else(|| pending.default_description().map(str::to_string))
            .unwrap_or_else(|| fallback_description.to_string());

        Self {
            amount: tx.amount,
            kind: tx.direction.into(),
            currency: tx.currency.clone(),
            category: request.category.clone(),
            account: request.account.clone(),
            description,
            date: tx.occurred_at.date_naive(),
            reference: tx.reference_code.clone(),
            source: "SMS".to_string(),
            sms_reference: tx.reference_code.clone(),
            sms_detected_at: pending.detected_at,
        }
    }
}
