//! Message parser - raw SMS to structured transaction
//!
//! Extraction runs in tiers, stopping at the first success:
//!
//! 1. the institution's dedicated templates, in their fixed order
//! 2. the generic bank templates (credit, debit, transfer)
//! 3. the keyword fallback, at low confidence
//!
//! Parsing never fails loudly. Messages from unknown senders and messages
//! nothing can read both come back as None.

mod bank;
mod fallback;
pub mod fields;
mod mobile_money;
mod template;

use serde::Serialize;

use super::identify::SenderIdentifier;
use crate::domain::{Institution, ParsedTransaction, RawMessage};

pub use bank::GENERIC_CONFIDENCE;
pub use fallback::FALLBACK_CONFIDENCE;
pub use mobile_money::{ANCHORED_CONFIDENCE, WITHDRAW_CONFIDENCE};
pub use template::{CounterpartyRule, CurrencyRule, Template, TimestampRule};

/// Which tier produced a parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Dedicated,
    Generic,
    Fallback,
}

/// Detailed parse result, for diagnostics and the CLI
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    /// Sender is not a known institution
    NotFinancial,
    /// Sender is known but no tier could read the body
    Unmatched { institution_id: String },
    Parsed {
        transaction: ParsedTransaction,
        tier: Tier,
        template: &'static str,
    },
}

impl ParseOutcome {
    pub fn into_transaction(self) -> Option<ParsedTransaction> {
        match self {
            ParseOutcome::Parsed { transaction, .. } => Some(transaction),
            _ => None,
        }
    }
}

/// Dedicated templates for an institution, if it has any
fn dedicated_templates(institution_id: &str) -> &'static [Template] {
    match institution_id {
        "MPESA" => mobile_money::mpesa(),
        _ => &[],
    }
}

#[derive(Debug, Clone, Default)]
pub struct MessageParser {
    identifier: SenderIdentifier,
}

impl MessageParser {
    pub fn new(identifier: SenderIdentifier) -> Self {
        Self { identifier }
    }

    pub fn identifier(&self) -> &SenderIdentifier {
        &self.identifier
    }

    /// Parse a message; None for non-financial or unreadable messages
    pub fn parse(&self, message: &RawMessage) -> Option<ParsedTransaction> {
        self.parse_detailed(message).into_transaction()
    }

    pub fn parse_detailed(&self, message: &RawMessage) -> ParseOutcome {
        let Some(institution) = self.identifier.resolve(&message.address) else {
            return ParseOutcome::NotFinancial;
        };

        match Self::run_tiers(message, institution) {
            Some((transaction, tier, template)) => ParseOutcome::Parsed {
                transaction,
                tier,
                template,
            },
            None => {
                tracing::debug!(
                    institution = %institution.id,
                    fingerprint = %message.fingerprint(),
                    "no template matched message"
                );
                ParseOutcome::Unmatched {
                    institution_id: institution.id.clone(),
                }
            }
        }
    }

    fn run_tiers(
        message: &RawMessage,
        institution: &Institution,
    ) -> Option<(ParsedTransaction, Tier, &'static str)> {
        let tiers = [
            (Tier::Dedicated, dedicated_templates(&institution.id)),
            (Tier::Generic, bank::generic()),
        ];
        for (tier, templates) in tiers {
            for template in templates {
                if let Some(tx) = template.apply(message, institution) {
                    return Some((tx, tier, template.name));
                }
            }
        }
        fallback::extract(message, institution).map(|tx| (tx, Tier::Fallback, "fallback"))
    }
}
