//! Sender identification - map an SMS address to an institution id

use std::sync::Arc;

use crate::domain::{Institution, InstitutionRegistry};

/// Resolves raw sender addresses against the institution registry
#[derive(Debug, Clone)]
pub struct SenderIdentifier {
    registry: Arc<InstitutionRegistry>,
}

impl SenderIdentifier {
    pub fn new(registry: Arc<InstitutionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &InstitutionRegistry {
        &self.registry
    }

    /// Institution id for an address, or None for non-financial senders
    ///
    /// The trimmed, uppercased address and the address as received are both
    /// tried against every institution in registration order.
    pub fn identify(&self, address: &str) -> Option<&str> {
        self.resolve(address).map(|i| i.id.as_str())
    }

    /// Like `identify`, but returns the whole institution
    pub fn resolve(&self, address: &str) -> Option<&Institution> {
        let normalized = address.trim().to_uppercase();
        if normalized.is_empty() {
            return None;
        }
        self.registry
            .iter()
            .find(|institution| institution.accepts(&normalized) || institution.accepts(address))
    }
}

impl Default for SenderIdentifier {
    fn default() -> Self {
        Self::new(Arc::new(InstitutionRegistry::builtin()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_known_senders() {
        let identifier = SenderIdentifier::default();
        assert_eq!(identifier.identify("MPESA"), Some("MPESA"));
        assert_eq!(identifier.identify("m-pesa"), Some("MPESA"));
        assert_eq!(identifier.identify("  Safaricom "), Some("MPESA"));
        assert_eq!(identifier.identify("KCB-MPESA"), Some("KCB"));
        assert_eq!(identifier.identify("737"), Some("GTB"));
        assert_eq!(identifier.identify("I&M"), Some("IMBANK"));
    }

    #[test]
    fn test_generic_bank_catch_all() {
        let identifier = SenderIdentifier::default();
        assert_eq!(identifier.identify("SomeBankAlerts"), Some("BANK"));
        // Named institutions still win over the catch-all
        assert_eq!(identifier.identify("FamilyBank"), Some("FAMILY"));
    }

    #[test]
    fn test_unknown_and_empty_addresses() {
        let identifier = SenderIdentifier::default();
        assert_eq!(identifier.identify("+254712345678"), None);
        assert_eq!(identifier.identify("MPESA2"), None);
        assert_eq!(identifier.identify(""), None);
        assert_eq!(identifier.identify("   "), None);
    }

    #[test]
    fn test_custom_sender_resolves() {
        let registry = InstitutionRegistry::with_custom(&[("SACCO".to_string(), "My Sacco".to_string())]);
        let identifier = SenderIdentifier::new(Arc::new(registry));
        assert_eq!(identifier.identify("sacco"), Some("SACCO"));
    }
}
