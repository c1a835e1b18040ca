//! Category keyword rule domain entity

use regex::Regex;
use serde::Serialize;

/// A keyword rule that maps matching messages to a spending category
///
/// Keywords are regex fragments (so "kenya\s*power" can absorb spacing)
/// matched case-insensitively anywhere in the text.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryRule {
    /// Category label returned when the rule matches
    pub label: String,
    /// Keyword fragments, any one of which triggers the rule
    pub keywords: Vec<String>,
    /// Counterparty names that trigger the rule on an exact (case-insensitive) match
    pub counterparties: Vec<String>,
    #[serde(skip)]
    matcher: Regex,
}

impl CategoryRule {
    pub fn new(label: &str, keywords: &[&str]) -> Result<Self, regex::Error> {
        let alternation = keywords.join("|");
        let matcher = Regex::new(&format!("(?i)(?:{})", alternation))?;
        Ok(Self {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            counterparties: Vec::new(),
            matcher,
        })
    }

    /// Also match when the counterparty is exactly one of these names
    pub fn with_counterparties(mut self, names: &[&str]) -> Self {
        self.counterparties = names.iter().map(|n| n.to_lowercase()).collect();
        self
    }

    /// Test message text and counterparty against this rule
    pub fn matches(&self, text: &str, counterparty: Option<&str>) -> bool {
        if let Some(name) = counterparty {
            let name = name.trim().to_lowercase();
            if self.counterparties.iter().any(|c| *c == name) || self.matcher.is_match(&name) {
                return true;
            }
        }
        self.matcher.is_match(text)
    }
}
