//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external collaborators. The engine
//! depends only on these traits, not on concrete platform bridges.

mod ledger;
mod message_source;

pub use ledger::LedgerSink;
pub use message_source::{
    MessageQuery, MessageSource, PermissionStatus, Subscription, SubscriptionHandle,
};
