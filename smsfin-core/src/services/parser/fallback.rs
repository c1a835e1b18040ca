//! Last-resort extraction
//!
//! Finds an amount-like token and infers direction from keywords alone.
//! A message with both credit and debit words (a reversal notice, say) or
//! with neither is dropped rather than guessed at.

use std::sync::OnceLock;

use regex::Regex;

use super::fields;
use crate::domain::{Direction, Institution, ParsedTransaction, RawMessage};

pub const FALLBACK_CONFIDENCE: f64 = 0.50;

fn prefixed_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:KES|Ksh|UGX|TZS|NGN|ZAR|USD|[₦$£€])\.?\s*(?P<amount>\d[\d,]*(?:\.\d+)?)")
            .expect("invalid amount regex")
    })
}

fn bare_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?P<amount>\d[\d,]*\.?\d{2})").expect("invalid amount regex"))
}

fn credit_words_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)credit|received|deposit").expect("invalid keyword regex"))
}

fn debit_words_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)debit|sent|paid|withdraw|bought").expect("invalid keyword regex"))
}

/// Direction implied by keywords, if exactly one class is present
fn keyword_direction(body: &str) -> Option<Direction> {
    match (credit_words_re().is_match(body), debit_words_re().is_match(body)) {
        (true, false) => Some(Direction::Income),
        (false, true) => Some(Direction::Expense),
        _ => None,
    }
}

/// First amount token, preferring one printed with a currency
fn find_amount(body: &str) -> Option<rust_decimal::Decimal> {
    let token = prefixed_amount_re()
        .captures(body)
        .or_else(|| bare_amount_re().captures(body))?;
    fields::parse_amount(token.name("amount")?.as_str())
}

pub fn extract(message: &RawMessage, institution: &Institution) -> Option<ParsedTransaction> {
    let body = message.body.as_str();
    let amount = find_amount(body)?;
    let direction = keyword_direction(body)?;

    let counterparty_name = match direction {
        Direction::Expense => fields::extract_recipient(body),
        _ => None,
    };

    Some(ParsedTransaction {
        direction,
        amount,
        currency: fields::detect_currency(body, &institution.currency),
        counterparty_name,
        reference_code: fields::extract_reference(body),
        balance_after: fields::extract_balance(body),
        occurred_at: message.received_at(),
        raw_message_text: message.body.clone(),
        institution_id: institution.id.clone(),
        confidence: FALLBACK_CONFIDENCE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_classes() {
        assert_eq!(keyword_direction("Deposit of 100.00"), Some(Direction::Income));
        assert_eq!(keyword_direction("You bought 50.00"), Some(Direction::Expense));
        assert_eq!(keyword_direction("Reversal: credit of debit 100.00"), None);
        assert_eq!(keyword_direction("Balance 100.00"), None);
    }

    #[test]
    fn test_prefers_currency_amount() {
        assert_eq!(
            find_amount("Acct 0712345678 KES 250.00 sent"),
            Some(rust_decimal::Decimal::new(25000, 2))
        );
    }
}
