//! Core domain entities
//!
//! Pure data structures with validation logic - no I/O, no async.

pub mod institution;
mod message;
mod pending;
pub mod result;
mod rule;
mod transaction;

pub use institution::{Institution, InstitutionRegistry, InstitutionSummary, SenderPattern};
pub use message::RawMessage;
pub use pending::{Candidate, LedgerEntryDraft, LedgerKind, PendingTransaction, SaveRequest};
pub use rule::CategoryRule;
pub use transaction::{Direction, ParsedTransaction};
