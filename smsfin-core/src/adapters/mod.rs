//! Adapter implementations
//!
//! Adapters implement the message-source port:
//! - an in-memory inbox, loadable from an exported JSON file
//! - a no-op source for platforms that cannot read SMS

pub mod inbox;
pub mod unsupported;

pub use inbox::InboxMessageSource;
pub use unsupported::UnsupportedMessageSource;
