//! M-PESA confirmation messages
//!
//! Every M-PESA confirmation starts with the transaction code and carries
//! the wall-clock date and time of the transaction, so these templates use
//! the embedded timestamp instead of the receipt time.

use std::sync::OnceLock;

use super::fields::{AMOUNT_SLOT, DATE_SLOT, TIME_SLOT};
use super::template::{CounterpartyRule, CurrencyRule, Template, TimestampRule};
use crate::domain::Direction;

/// Code-anchored templates
pub const ANCHORED_CONFIDENCE: f64 = 0.95;
/// Withdrawals are matched with a looser shape
pub const WITHDRAW_CONFIDENCE: f64 = 0.90;

const CODE: &str = r"(?P<reference>[A-Z0-9]+)\s+Confirmed\.?\s*";
const PHONE: &str = r"(?:\d{10}|\d{12})?";

/// M-PESA templates in matching order
///
/// Bill payments come before plain "sent to" because their body is a
/// superset of it.
pub fn mpesa() -> &'static [Template] {
    static TEMPLATES: OnceLock<Vec<Template>> = OnceLock::new();
    TEMPLATES.get_or_init(|| build().expect("invalid M-PESA template"))
}

fn build() -> Result<Vec<Template>, regex::Error> {
    let on_at = format!(r"on\s+{}\s+at\s+{}", DATE_SLOT, TIME_SLOT);

    let received = Template::new(
        "mpesa-received",
        Direction::Income,
        ANCHORED_CONFIDENCE,
        &format!(
            r"(?i){CODE}You have received\s+Ksh?\s*{AMOUNT_SLOT}\s+from\s+(?P<counterparty>.+?)\s+{PHONE}\s*{on_at}"
        ),
    )?
    .counterparty(CounterpartyRule::Captured);

    let paybill = Template::new(
        "mpesa-paybill",
        Direction::Expense,
        ANCHORED_CONFIDENCE,
        &format!(
            r"(?i){CODE}Ksh?\s*{AMOUNT_SLOT}\s+sent\s+to\s+(?P<counterparty>.+?)\s+for\s+account\s+(?P<account>.+?)\s+{on_at}"
        ),
    )?
    .counterparty(CounterpartyRule::CapturedWithAccount);

    let sent = Template::new(
        "mpesa-sent",
        Direction::Expense,
        ANCHORED_CONFIDENCE,
        &format!(r"(?i){CODE}Ksh?\s*{AMOUNT_SLOT}\s+sent\s+to\s+(?P<counterparty>.+?)\s+{PHONE}\s*{on_at}"),
    )?
    .counterparty(CounterpartyRule::Captured);

    let paid = Template::new(
        "mpesa-paid",
        Direction::Expense,
        ANCHORED_CONFIDENCE,
        &format!(r"(?i){CODE}Ksh?\s*{AMOUNT_SLOT}\s+paid\s+to\s+(?P<counterparty>.+?)\.?\s*{on_at}"),
    )?
    .counterparty(CounterpartyRule::Captured);

    let withdraw = Template::new(
        "mpesa-withdraw",
        Direction::Expense,
        WITHDRAW_CONFIDENCE,
        &format!(
            r"(?i){CODE}{on_at}\s*Withdraw\s+Ksh?\s*{AMOUNT_SLOT}\s+from\s+(?P<counterparty>.+?)\.?\s*(?:New\s+)?(?:M-?PESA\s+)?balance\s+is\s+Ksh?\s*(?P<balance>\d[\d,]*(?:\.\d+)?)"
        ),
    )?
    .counterparty(CounterpartyRule::Captured);

    let airtime = Template::new(
        "mpesa-airtime",
        Direction::Expense,
        ANCHORED_CONFIDENCE,
        &format!(r"(?i){CODE}You bought\s+Ksh?\s*{AMOUNT_SLOT}\s+of\s+airtime\s+{on_at}"),
    )?
    .counterparty(CounterpartyRule::Fixed("Airtime"));

    Ok([received, paybill, sent, paid, withdraw, airtime]
        .into_iter()
        .map(|t| t.currency(CurrencyRule::Fixed("KES")).timestamp(TimestampRule::Embedded))
        .collect())
}
