//! Message access port
//!
//! Defines the interface to the platform bridge that can read the SMS inbox
//! and deliver newly received messages (Android content provider, a test
//! inbox, a platform with no SMS access at all, ...).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::RawMessage;

/// Outcome of a permission check or request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Identifies one live subscription on the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub Uuid);

impl SubscriptionHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// A registered live subscription
///
/// Messages arrive on `receiver` in the order the platform received them.
/// Dropping the receiver closes the channel; sources treat a closed channel
/// as an implicit unsubscribe.
#[derive(Debug)]
pub struct Subscription {
    pub handle: SubscriptionHandle,
    pub receiver: mpsc::Receiver<RawMessage>,
}

/// Query for historical messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQuery {
    /// Monitored sender ids (substring match on the address)
    pub senders: Vec<String>,
    pub limit: usize,
    /// Only messages received strictly after this instant
    pub since: Option<DateTime<Utc>>,
}

/// Platform message access trait
///
/// Every call may take an OS or network round-trip; implementations should
/// surface their own timeouts as `Error::Source` rather than hang.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Source name (e.g., "inbox", "unsupported")
    fn name(&self) -> &str;

    /// Current permission state, without prompting the user
    async fn check_permission(&self) -> Result<PermissionStatus>;

    /// Ask the user (or OS) for permission
    async fn request_permission(&self) -> Result<PermissionStatus>;

    /// Fetch historical messages, newest first
    async fn get_messages(&self, query: &MessageQuery) -> Result<Vec<RawMessage>>;

    /// Register for live delivery of messages from the given senders
    async fn subscribe(&self, senders: &[String]) -> Result<Subscription>;

    /// Release a subscription; unknown handles are ignored
    async fn unsubscribe(&self, handle: SubscriptionHandle) -> Result<()>;
}
