//! Financial institution registry
//!
//! Static mapping from institution id to display name, known SMS sender
//! addresses, country, and currency. Registration order is significant:
//! when several institutions accept an address, the first one registered wins.

use serde::Serialize;

/// Id of the generic catch-all entry (any address mentioning "bank")
pub const GENERIC_BANK_ID: &str = "BANK";

/// Currency assumed when neither the message nor the institution says otherwise
pub const DEFAULT_CURRENCY: &str = "KES";

/// A rule for recognising a sender address
///
/// Matching is always case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderPattern {
    /// The whole address equals the pattern
    Exact(String),
    /// The address contains the pattern somewhere
    Contains(String),
}

impl SenderPattern {
    pub fn exact(s: &str) -> Self {
        Self::Exact(s.to_uppercase())
    }

    pub fn contains(s: &str) -> Self {
        Self::Contains(s.to_uppercase())
    }

    /// Test an address against this pattern
    pub fn matches(&self, address: &str) -> bool {
        let address = address.to_uppercase();
        match self {
            Self::Exact(p) => address == *p,
            Self::Contains(p) => address.contains(p.as_str()),
        }
    }
}

/// A financial institution whose SMS we know how to read
#[derive(Debug, Clone)]
pub struct Institution {
    pub id: String,
    pub display_name: String,
    /// ISO country code (KE, NG, ZA); None for the generic entry
    pub country: Option<String>,
    pub sender_patterns: Vec<SenderPattern>,
    pub currency: String,
    /// Custom entries come from the user's monitored-sender settings
    pub is_custom: bool,
}

impl Institution {
    fn builtin(id: &str, name: &str, country: &str, currency: &str, exact: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            display_name: name.to_string(),
            country: Some(country.to_string()),
            sender_patterns: exact.iter().map(|p| SenderPattern::exact(p)).collect(),
            currency: currency.to_string(),
            is_custom: false,
        }
    }

    /// A user-added sender, recognised by exact address match
    pub fn custom(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: name.to_string(),
            country: None,
            sender_patterns: vec![SenderPattern::exact(id)],
            currency: DEFAULT_CURRENCY.to_string(),
            is_custom: true,
        }
    }

    /// True if any of this institution's patterns accepts the address
    pub fn accepts(&self, address: &str) -> bool {
        self.sender_patterns.iter().any(|p| p.matches(address))
    }
}

/// Id and display name, as offered to a settings screen
#[derive(Debug, Clone, Serialize)]
pub struct InstitutionSummary {
    pub id: String,
    pub name: String,
    pub country: Option<String>,
    pub currency: String,
}

/// Ordered, immutable set of institutions
#[derive(Debug, Clone)]
pub struct InstitutionRegistry {
    institutions: Vec<Institution>,
}

impl InstitutionRegistry {
    /// The built-in institutions, in matching priority order
    pub fn builtin() -> Self {
        let institutions = vec![
            // Kenya
            Institution::builtin("MPESA", "M-PESA", "KE", "KES", &["M-PESA", "MPESA", "Safaricom"]),
            Institution::builtin("KCB", "KCB Bank", "KE", "KES", &["KCB", "KCB-MPESA", "KCBGroup"]),
            Institution::builtin("EQUITY", "Equity Bank", "KE", "KES", &["EQUITY", "EquityBcdc", "EQUITYMobile"]),
            Institution::builtin("COOP", "Co-operative Bank", "KE", "KES", &["ABORSHA", "Co-opBank", "COOP"]),
            Institution::builtin("ABSA", "ABSA Bank", "KE", "KES", &["ABSA", "Barclays"]),
            Institution::builtin("STANBIC", "Stanbic Bank", "KE", "KES", &["STANBIC", "StanbicBank"]),
            Institution::builtin("DTB", "Diamond Trust Bank", "KE", "KES", &["DTB", "DTBKenya"]),
            Institution::builtin("NCBA", "NCBA Bank", "KE", "KES", &["NCBA", "NIC", "CBA"]),
            Institution::builtin("FAMILY", "Family Bank", "KE", "KES", &["FamilyBank"]),
            Institution::builtin("IMBANK", "I&M Bank", "KE", "KES", &["I&M", "IMBank"]),
            // Nigeria
            Institution::builtin("GTB", "GTBank", "NG", "NGN", &["GTBank", "737"]),
            Institution::builtin("FIRSTBANK", "First Bank", "NG", "NGN", &["FirstBank"]),
            Institution::builtin("ACCESS", "Access Bank", "NG", "NGN", &["AccessBank", "ACCESS"]),
            Institution::builtin("UBA", "UBA", "NG", "NGN", &["UBA", "UBAGroup"]),
            Institution::builtin("ZENITH", "Zenith Bank", "NG", "NGN", &["ZENITH", "ZenithBank"]),
            // South Africa
            Institution::builtin("FNB", "FNB", "ZA", "ZAR", &["FNB", "FirstNational"]),
            Institution::builtin("STANDARDBANK", "Standard Bank", "ZA", "ZAR", &["StandardBank", "SBSA"]),
            Institution::builtin("CAPITEC", "Capitec", "ZA", "ZAR", &["Capitec"]),
            Institution::builtin("NEDBANK", "Nedbank", "ZA", "ZAR", &["Nedbank"]),
            // Catch-all, must stay last
            Institution {
                id: GENERIC_BANK_ID.to_string(),
                display_name: "Bank".to_string(),
                country: None,
                sender_patterns: vec![SenderPattern::contains("bank")],
                currency: DEFAULT_CURRENCY.to_string(),
                is_custom: false,
            },
        ];

        Self { institutions }
    }

    /// Built-ins plus user-added senders
    ///
    /// Custom entries are registered after the named institutions but before
    /// the generic catch-all, so a custom "MYBANK" sender is not swallowed by
    /// the "bank" pattern. Ids that already exist are ignored.
    pub fn with_custom(custom: &[(String, String)]) -> Self {
        let mut registry = Self::builtin();
        let insert_at = registry
            .institutions
            .iter()
            .position(|i| i.id == GENERIC_BANK_ID)
            .unwrap_or(registry.institutions.len());

        let mut added = Vec::new();
        for (id, name) in custom {
            if registry.get(id).is_none() && !added.iter().any(|i: &Institution| i.id == *id) {
                added.push(Institution::custom(id, name));
            }
        }
        registry.institutions.splice(insert_at..insert_at, added);
        registry
    }

    /// Institutions in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Institution> {
        self.institutions.iter()
    }

    pub fn len(&self) -> usize {
        self.institutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.institutions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Institution> {
        self.institutions.iter().find(|i| i.id == id)
    }

    /// Display name for an institution id, falling back to the id itself
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|i| i.display_name.as_str()).unwrap_or(id)
    }

    /// Currency declared by an institution (default currency if unknown)
    pub fn currency(&self, id: &str) -> &str {
        self.get(id).map(|i| i.currency.as_str()).unwrap_or(DEFAULT_CURRENCY)
    }

    /// All institutions as (id, name) summaries for a settings screen
    pub fn available(&self) -> Vec<InstitutionSummary> {
        self.institutions
            .iter()
            .map(|i| InstitutionSummary {
                id: i.id.clone(),
                name: i.display_name.clone(),
                country: i.country.clone(),
                currency: i.currency.clone(),
            })
            .collect()
    }
}

impl Default for InstitutionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_case_insensitive() {
        assert!(SenderPattern::exact("M-PESA").matches("m-pesa"));
        assert!(!SenderPattern::exact("MPESA").matches("MPESA2"));
        assert!(SenderPattern::contains("bank").matches("MyBankAlerts"));
    }

    #[test]
    fn test_generic_entry_is_last() {
        let registry = InstitutionRegistry::builtin();
        let last = registry.iter().last().unwrap();
        assert_eq!(last.id, GENERIC_BANK_ID);
    }

    #[test]
    fn test_display_name_fallback() {
        let registry = InstitutionRegistry::builtin();
        assert_eq!(registry.display_name("MPESA"), "M-PESA");
        assert_eq!(registry.display_name("UNKNOWN"), "UNKNOWN");
    }

    #[test]
    fn test_custom_registered_before_catch_all() {
        let registry = InstitutionRegistry::with_custom(&[
            ("MYBANK".to_string(), "My Bank".to_string()),
            ("MPESA".to_string(), "Duplicate".to_string()),
        ]);
        let ids: Vec<&str> = registry.iter().map(|i| i.id.as_str()).collect();
        let custom_pos = ids.iter().position(|id| *id == "MYBANK").unwrap();
        let generic_pos = ids.iter().position(|id| *id == GENERIC_BANK_ID).unwrap();
        assert!(custom_pos < generic_pos);
        assert_eq!(registry.display_name("MPESA"), "M-PESA");
        assert_eq!(registry.len(), InstitutionRegistry::builtin().len() + 1);
    }

    #[test]
    fn test_currency_by_country() {
        let registry = InstitutionRegistry::builtin();
        assert_eq!(registry.currency("GTB"), "NGN");
        assert_eq!(registry.currency("CAPITEC"), "ZAR");
        assert_eq!(registry.currency("nope"), DEFAULT_CURRENCY);
    }
}
