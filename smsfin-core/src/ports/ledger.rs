//! Ledger hand-off port
//!
//! The engine never talks to the backend ledger itself. The consumer that
//! owns persistence implements this trait and passes it in when the user
//! confirms a candidate.

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::LedgerEntryDraft;

#[async_trait]
pub trait LedgerSink: Send + Sync {
    /// Persist a confirmed entry; an error leaves the candidate pending
    async fn persist(&self, entry: &LedgerEntryDraft) -> Result<()>;
}
