//! Typed message templates
//!
//! A template is one regular expression with named capture slots plus a
//! small set of rules telling the parser how to turn the captures into a
//! [`ParsedTransaction`]. Slots the parser understands:
//!
//! - `amount` (required)
//! - `reference`, `balance`: fall back to a scan of the whole body when absent
//! - `counterparty`, `account`
//! - `date`, `time`: the embedded timestamp

use regex::{Captures, Regex};

use super::fields;
use crate::domain::{Direction, Institution, ParsedTransaction, RawMessage};

/// How the counterparty name is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterpartyRule {
    /// Never set
    None,
    /// The `counterparty` slot, cleaned up
    Captured,
    /// `counterparty (account)`, for bill payments
    CapturedWithAccount,
    /// A fixed label
    Fixed(&'static str),
    /// Heuristic recipient search over the body
    Recipient,
}

/// Where the currency comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyRule {
    Fixed(&'static str),
    /// First marker found in the body, else the institution's currency
    Detect,
}

/// Where the transaction time comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampRule {
    /// The `date`/`time` slots; malformed values fall back to now
    Embedded,
    /// The time the message was received
    Receipt,
}

#[derive(Debug, Clone)]
pub struct Template {
    pub name: &'static str,
    pub direction: Direction,
    pub confidence: f64,
    pattern: Regex,
    counterparty: CounterpartyRule,
    currency: CurrencyRule,
    timestamp: TimestampRule,
}

impl Template {
    pub fn new(
        name: &'static str,
        direction: Direction,
        confidence: f64,
        pattern: &str,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            direction,
            confidence,
            pattern: Regex::new(pattern)?,
            counterparty: CounterpartyRule::None,
            currency: CurrencyRule::Detect,
            timestamp: TimestampRule::Receipt,
        })
    }

    pub fn counterparty(mut self, rule: CounterpartyRule) -> Self {
        self.counterparty = rule;
        self
    }

    pub fn currency(mut self, rule: CurrencyRule) -> Self {
        self.currency = rule;
        self
    }

    pub fn timestamp(mut self, rule: TimestampRule) -> Self {
        self.timestamp = rule;
        self
    }

    /// Try this template against a message
    ///
    /// None when the pattern does not match or the captured amount is not a
    /// positive number; the caller moves on to the next template.
    pub fn apply(&self, message: &RawMessage, institution: &Institution) -> Option<ParsedTransaction> {
        let body = message.body.as_str();
        let caps = self.pattern.captures(body)?;
        let amount = fields::parse_amount(caps.name("amount")?.as_str())?;

        let reference_code = slot(&caps, "reference")
            .map(str::to_string)
            .or_else(|| fields::extract_reference(body));
        let balance_after = slot(&caps, "balance")
            .and_then(fields::parse_amount)
            .or_else(|| fields::extract_balance(body));

        let currency = match self.currency {
            CurrencyRule::Fixed(code) => code.to_string(),
            CurrencyRule::Detect => fields::detect_currency(body, &institution.currency),
        };

        let occurred_at = match self.timestamp {
            TimestampRule::Receipt => message.received_at(),
            TimestampRule::Embedded => slot(&caps, "date")
                .and_then(|date| fields::parse_embedded_datetime(date, slot(&caps, "time")))
                .unwrap_or_else(chrono::Utc::now),
        };

        Some(ParsedTransaction {
            direction: self.direction,
            amount,
            currency,
            counterparty_name: self.counterparty_name(&caps, body),
            reference_code,
            balance_after,
            occurred_at,
            raw_message_text: message.body.clone(),
            institution_id: institution.id.clone(),
            confidence: self.confidence,
        })
    }

    fn counterparty_name(&self, caps: &Captures<'_>, body: &str) -> Option<String> {
        match self.counterparty {
            CounterpartyRule::None => None,
            CounterpartyRule::Fixed(label) => Some(label.to_string()),
            CounterpartyRule::Recipient => fields::extract_recipient(body),
            CounterpartyRule::Captured => slot(caps, "counterparty").and_then(fields::clean_counterparty),
            CounterpartyRule::CapturedWithAccount => {
                let name = slot(caps, "counterparty").and_then(fields::clean_counterparty)?;
                match slot(caps, "account").and_then(fields::trim_label) {
                    Some(account) => Some(format!("{} ({})", name, account)),
                    None => Some(name),
                }
            }
        }
    }
}

fn slot<'t>(caps: &Captures<'t>, name: &str) -> Option<&'t str> {
    caps.name(name).map(|m| m.as_str()).filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InstitutionRegistry;
    use rust_decimal::Decimal;

    fn kcb() -> Institution {
        InstitutionRegistry::builtin().get("KCB").cloned().unwrap()
    }

    #[test]
    fn test_apply_fills_scanned_slots() {
        let template = Template::new("credit", Direction::Income, 0.8, r"(?i)credited\s+with\s+(?:KES)?\s*(?P<amount>\d[\d,]*(?:\.\d+)?)")
            .unwrap();
        let msg = RawMessage::new("1", "KCB", "Account credited with KES 5,000.00. Balance: KES 10,000.00. Ref: TXN123456", 1_767_263_400_000);

        let tx = template.apply(&msg, &kcb()).unwrap();
        assert_eq!(tx.amount, Decimal::new(500000, 2));
        assert_eq!(tx.balance_after, Some(Decimal::new(1000000, 2)));
        assert_eq!(tx.reference_code.as_deref(), Some("TXN123456"));
        assert_eq!(tx.currency, "KES");
        assert_eq!(tx.occurred_at, msg.received_at());
        assert!(tx.counterparty_name.is_none());
    }

    #[test]
    fn test_zero_amount_is_not_a_match() {
        let template = Template::new("credit", Direction::Income, 0.8, r"credited\s+(?P<amount>\d[\d,]*(?:\.\d+)?)").unwrap();
        let msg = RawMessage::new("1", "KCB", "credited 0.00", 0);
        assert!(template.apply(&msg, &kcb()).is_none());
    }

    #[test]
    fn test_counterparty_with_account() {
        let template = Template::new(
            "paybill",
            Direction::Expense,
            0.95,
            r"(?P<amount>\d+) to (?P<counterparty>\w+) for account (?P<account>\w+)",
        )
        .unwrap()
        .counterparty(CounterpartyRule::CapturedWithAccount);
        let msg = RawMessage::new("1", "KCB", "100 to KPLC for account 123456", 0);
        let tx = template.apply(&msg, &kcb()).unwrap();
        assert_eq!(tx.counterparty_name.as_deref(), Some("KPLC (123456)"));
    }

    #[test]
    fn test_malformed_embedded_date_falls_back_to_now() {
        let template = Template::new("t", Direction::Expense, 0.9, r"(?P<amount>\d+) on (?P<date>[\d/]+)")
            .unwrap()
            .timestamp(TimestampRule::Embedded);
        let msg = RawMessage::new("1", "KCB", "100 on 99/99/26", 0);
        let before = chrono::Utc::now();
        let tx = template.apply(&msg, &kcb()).unwrap();
        assert!(tx.occurred_at >= before);
    }
}
