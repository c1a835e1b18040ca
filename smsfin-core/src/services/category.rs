//! Category suggestion - first matching keyword rule wins

use crate::domain::{CategoryRule, Direction, ParsedTransaction};

/// Suggests a spending category for a parsed transaction
///
/// Rules are evaluated in order against the raw message text and the
/// counterparty. When none match, the direction decides: transfers become
/// "Transfer", income "Income", anything else "Other".
#[derive(Debug, Clone)]
pub struct CategorySuggester {
    rules: Vec<CategoryRule>,
}

impl CategorySuggester {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    /// The built-in rule set
    pub fn builtin() -> Result<Self, regex::Error> {
        let rules = vec![
            CategoryRule::new("Communication", &["airtime", "bundles?", "data"])?.with_counterparties(&["Airtime"]),
            CategoryRule::new("Utilities", &["kplc", r"kenya\s*power", "electricity", "water", "umeme"])?,
            CategoryRule::new(
                "Transport",
                &["uber", "bolt", "taxi", "bus", "matatu", "fare", "fuel", "petrol", "shell", "total"],
            )?,
            CategoryRule::new(
                "Food & Dining",
                &["restaurant", "cafe", "hotel", "food", "kfc", "java", "chicken", "pizza"],
            )?,
            CategoryRule::new(
                "Groceries",
                &["supermarket", "naivas", "carrefour", "quickmart", "tuskys", "shoprite", "spar"],
            )?,
            CategoryRule::new(
                "Healthcare",
                &["hospital", "clinic", "pharmacy", "chemist", "doctor", "medical", "health"],
            )?,
            CategoryRule::new(
                "Entertainment",
                &["netflix", "spotify", "dstv", "showmax", "cinema", "movie", "game"],
            )?,
            CategoryRule::new(
                "Education",
                &["school", "university", "college", "tuition", "fees", "education"],
            )?,
            CategoryRule::new("Insurance", &["insurance", "jubilee", "britam", "aar", "nhif"])?,
            CategoryRule::new("Rent", &["rent", "landlord", "housing"])?,
        ];
        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn suggest(&self, transaction: &ParsedTransaction) -> String {
        let counterparty = transaction.counterparty_name.as_deref();
        self.rules
            .iter()
            .find(|rule| rule.matches(&transaction.raw_message_text, counterparty))
            .map(|rule| rule.label.clone())
            .unwrap_or_else(|| Self::by_direction(transaction.direction).to_string())
    }

    fn by_direction(direction: Direction) -> &'static str {
        match direction {
            Direction::Transfer => "Transfer",
            Direction::Income => "Income",
            Direction::Expense => "Other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn tx(direction: Direction, body: &str, counterparty: Option<&str>) -> ParsedTransaction {
        ParsedTransaction {
            direction,
            amount: Decimal::new(100, 0),
            currency: "KES".to_string(),
            counterparty_name: counterparty.map(str::to_string),
            reference_code: None,
            balance_after: None,
            occurred_at: Utc::now(),
            raw_message_text: body.to_string(),
            institution_id: "MPESA".to_string(),
            confidence: 0.95,
        }
    }

    #[test]
    fn test_first_rule_wins() {
        let s = CategorySuggester::builtin().unwrap();
        assert_eq!(s.suggest(&tx(Direction::Expense, "Paid to KPLC PREPAID", None)), "Utilities");
        assert_eq!(s.suggest(&tx(Direction::Expense, "Paid to NAIVAS WESTLANDS", None)), "Groceries");
        // "airtime" outranks "kplc"
        assert_eq!(s.suggest(&tx(Direction::Expense, "airtime via KPLC", None)), "Communication");
    }

    #[test]
    fn test_airtime_counterparty() {
        let s = CategorySuggester::builtin().unwrap();
        assert_eq!(s.suggest(&tx(Direction::Expense, "You bought Ksh50.00", Some("Airtime"))), "Communication");
    }

    #[test]
    fn test_direction_defaults() {
        let s = CategorySuggester::builtin().unwrap();
        assert_eq!(s.suggest(&tx(Direction::Income, "Received from JOHN", None)), "Income");
        assert_eq!(s.suggest(&tx(Direction::Transfer, "Moved to savings", None)), "Transfer");
        assert_eq!(s.suggest(&tx(Direction::Expense, "Paid to JOHN", None)), "Other");
    }
}
