//! Generic bank alert templates
//!
//! Tried for every institution after its dedicated templates (if any).
//! Bank alerts rarely print a parseable timestamp, so the receipt time is
//! used.

use std::sync::OnceLock;

use super::fields::{AMOUNT_SLOT, CURRENCY_PREFIX};
use super::template::{CounterpartyRule, Template};
use crate::domain::Direction;

pub const GENERIC_CONFIDENCE: f64 = 0.80;

/// Credit, debit, transfer, in that order
pub fn generic() -> &'static [Template] {
    static TEMPLATES: OnceLock<Vec<Template>> = OnceLock::new();
    TEMPLATES.get_or_init(|| build().expect("invalid bank template"))
}

fn build() -> Result<Vec<Template>, regex::Error> {
    let credit = Template::new(
        "bank-credit",
        Direction::Income,
        GENERIC_CONFIDENCE,
        &format!(r"(?i)\b(?:credited|deposited|received)\s+(?:with\s+)?{CURRENCY_PREFIX}?\.?\s*{AMOUNT_SLOT}"),
    )?;

    let debit = Template::new(
        "bank-debit",
        Direction::Expense,
        GENERIC_CONFIDENCE,
        &format!(r"(?i)\b(?:debited|withdrawn|paid)\s+(?:with\s+)?{CURRENCY_PREFIX}?\.?\s*{AMOUNT_SLOT}"),
    )?
    .counterparty(CounterpartyRule::Recipient);

    let transfer = Template::new(
        "bank-transfer",
        Direction::Transfer,
        GENERIC_CONFIDENCE,
        &format!(
            r"(?i)\btransfer\s+(?:of\s+)?{CURRENCY_PREFIX}?\.?\s*{AMOUNT_SLOT}\s+to\s+(?P<counterparty>.+?)\s+(?:was\s+|is\s+)?(?:successful|completed)"
        ),
    )?
    .counterparty(CounterpartyRule::Captured);

    Ok(vec![credit, debit, transfer])
}
