//! In-memory inbox message source
//!
//! Stands in for the device SMS bridge: holds a list of messages, answers
//! permission queries from a script, and pushes delivered messages to live
//! subscribers. The CLI loads it from an exported inbox file; tests drive
//! it directly.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::domain::result::{Error, Result};
use crate::domain::RawMessage;
use crate::ports::{
    MessageQuery, MessageSource, PermissionStatus, Subscription, SubscriptionHandle,
};

/// Buffered live messages per subscriber before `deliver` waits
pub const LIVE_CHANNEL_CAPACITY: usize = 64;

/// Exported inbox files are either a bare array or `{ "messages": [...] }`
#[derive(Deserialize)]
#[serde(untagged)]
enum InboxFile {
    Bare(Vec<RawMessage>),
    Wrapped { messages: Vec<RawMessage> },
}

struct Subscriber {
    handle: SubscriptionHandle,
    senders: Vec<String>,
    tx: mpsc::Sender<RawMessage>,
}

struct PermissionScript {
    current: PermissionStatus,
    on_request: PermissionStatus,
}

struct State {
    messages: Vec<RawMessage>,
    permission: PermissionScript,
    subscribers: Vec<Subscriber>,
    failure: Option<String>,
}

pub struct InboxMessageSource {
    state: Mutex<State>,
}

impl InboxMessageSource {
    /// Empty inbox with permission already granted
    pub fn new() -> Self {
        Self::with_messages(Vec::new())
    }

    pub fn with_messages(messages: Vec<RawMessage>) -> Self {
        Self {
            state: Mutex::new(State {
                messages,
                permission: PermissionScript {
                    current: PermissionStatus::Granted,
                    on_request: PermissionStatus::Granted,
                },
                subscribers: Vec::new(),
                failure: None,
            }),
        }
    }

    /// Load an exported inbox (JSON array or `{ "messages": [...] }`)
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let messages = match serde_json::from_str::<InboxFile>(content)? {
            InboxFile::Bare(messages) => messages,
            InboxFile::Wrapped { messages } => messages,
        };
        Ok(Self::with_messages(messages))
    }

    /// Script the permission answers: the current state and what a request yields
    pub fn with_permission(self, current: PermissionStatus, on_request: PermissionStatus) -> Self {
        {
            let mut state = self.lock();
            state.permission = PermissionScript { current, on_request };
        }
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Change the permission as if the user toggled it in system settings
    pub fn set_permission(&self, status: PermissionStatus) {
        self.lock().permission.current = status;
    }

    /// Make subsequent reads fail with `Error::Source`; None restores them
    pub fn set_failure(&self, message: Option<&str>) {
        self.lock().failure = message.map(str::to_string);
    }

    /// Add a message to the inbox without live delivery
    pub fn push(&self, message: RawMessage) {
        self.lock().messages.push(message);
    }

    pub fn message_count(&self) -> usize {
        self.lock().messages.len()
    }

    /// Live subscriptions whose receiver is still open
    pub fn active_subscriptions(&self) -> usize {
        self.lock().subscribers.iter().filter(|s| !s.tx.is_closed()).count()
    }

    /// Receive a new message: store it and push it to matching subscribers
    ///
    /// A message without an id gets its receipt timestamp as id. Returns how
    /// many subscribers it was delivered to.
    pub async fn deliver(&self, mut message: RawMessage) -> usize {
        if message.id.trim().is_empty() {
            message.id = message.timestamp_millis.to_string();
        }

        let targets: Vec<mpsc::Sender<RawMessage>> = {
            let mut state = self.lock();
            state.messages.push(message.clone());
            state.subscribers.retain(|s| !s.tx.is_closed());
            state
                .subscribers
                .iter()
                .filter(|s| message.matches_sender_filter(&s.senders))
                .map(|s| s.tx.clone())
                .collect()
        };

        let mut delivered = 0;
        for tx in targets {
            if tx.send(message.clone()).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    fn ensure_readable(state: &State) -> Result<()> {
        if let Some(failure) = &state.failure {
            return Err(Error::source(failure.clone()));
        }
        if !state.permission.current.is_granted() {
            return Err(Error::permission("SMS permission not granted"));
        }
        Ok(())
    }
}

impl Default for InboxMessageSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageSource for InboxMessageSource {
    fn name(&self) -> &str {
        "inbox"
    }

    async fn check_permission(&self) -> Result<PermissionStatus> {
        Ok(self.lock().permission.current)
    }

    async fn request_permission(&self) -> Result<PermissionStatus> {
        let mut state = self.lock();
        if !state.permission.current.is_granted() {
            state.permission.current = state.permission.on_request;
        }
        Ok(state.permission.current)
    }

    async fn get_messages(&self, query: &MessageQuery) -> Result<Vec<RawMessage>> {
        let state = self.lock();
        Self::ensure_readable(&state)?;
        if query.senders.is_empty() {
            return Err(Error::source("No senders specified"));
        }

        let since = query.since.map(|t| t.timestamp_millis());
        let mut matched: Vec<RawMessage> = state
            .messages
            .iter()
            .filter(|m| m.matches_sender_filter(&query.senders))
            .filter(|m| since.map_or(true, |s| m.timestamp_millis > s))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.timestamp_millis.cmp(&a.timestamp_millis));
        matched.truncate(query.limit);
        Ok(matched)
    }

    async fn subscribe(&self, senders: &[String]) -> Result<Subscription> {
        let mut state = self.lock();
        Self::ensure_readable(&state)?;
        if senders.is_empty() {
            return Err(Error::source("No senders specified"));
        }

        let (tx, receiver) = mpsc::channel(LIVE_CHANNEL_CAPACITY);
        let handle = SubscriptionHandle::new();
        state.subscribers.push(Subscriber {
            handle,
            senders: senders.to_vec(),
            tx,
        });
        Ok(Subscription { handle, receiver })
    }

    async fn unsubscribe(&self, handle: SubscriptionHandle) -> Result<()> {
        self.lock().subscribers.retain(|s| s.handle != handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn senders(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn inbox() -> InboxMessageSource {
        InboxMessageSource::with_messages(vec![
            RawMessage::new("1", "MPESA", "a", 1_000),
            RawMessage::new("2", "KCB-MPESA", "b", 3_000),
            RawMessage::new("3", "+254700000000", "c", 2_000),
            RawMessage::new("4", "EQUITY", "d", 4_000),
        ])
    }

    #[tokio::test]
    async fn test_get_messages_filters_and_orders() {
        let source = inbox();
        let query = MessageQuery {
            senders: senders(&["mpesa"]),
            limit: 10,
            since: None,
        };
        let ids: Vec<_> = source.get_messages(&query).await.unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[tokio::test]
    async fn test_get_messages_since_is_exclusive_and_limited() {
        let source = inbox();
        let query = MessageQuery {
            senders: senders(&["MPESA", "EQUITY"]),
            limit: 1,
            since: Utc.timestamp_millis_opt(1_000).single(),
        };
        let ids: Vec<_> = source.get_messages(&query).await.unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["4"]);
    }

    #[tokio::test]
    async fn test_empty_sender_filter_is_an_error() {
        let source = inbox();
        let query = MessageQuery {
            senders: Vec::new(),
            limit: 10,
            since: None,
        };
        let err = source.get_messages(&query).await.unwrap_err();
        assert!(matches!(err, Error::Source(_)));
    }

    #[tokio::test]
    async fn test_reads_require_permission() {
        let source = inbox().with_permission(PermissionStatus::Denied, PermissionStatus::Denied);
        let query = MessageQuery {
            senders: senders(&["MPESA"]),
            limit: 10,
            since: None,
        };
        assert!(source.get_messages(&query).await.unwrap_err().is_permission());
        assert_eq!(source.request_permission().await.unwrap(), PermissionStatus::Denied);
    }

    #[tokio::test]
    async fn test_deliver_reaches_matching_subscribers_only() {
        let source = InboxMessageSource::new();
        let mut mpesa = source.subscribe(&senders(&["MPESA"])).await.unwrap();
        let _kcb = source.subscribe(&senders(&["KCB"])).await.unwrap();

        let delivered = source.deliver(RawMessage::new("", "MPESA", "hello", 42)).await;
        assert_eq!(delivered, 1);

        let received = mpesa.receiver.recv().await.unwrap();
        assert_eq!(received.id, "42");
        assert_eq!(source.message_count(), 1);
    }

    #[tokio::test]
    async fn test_closed_receiver_counts_as_unsubscribed() {
        let source = InboxMessageSource::new();
        let sub = source.subscribe(&senders(&["MPESA"])).await.unwrap();
        assert_eq!(source.active_subscriptions(), 1);
        drop(sub);
        assert_eq!(source.active_subscriptions(), 0);
    }

    #[test]
    fn test_from_json_accepts_both_shapes() {
        let bare = r#"[{"id":"1","address":"MPESA","body":"x","date":1}]"#;
        let wrapped = r#"{"messages":[{"address":"KCB","body":"y","date":2}]}"#;
        assert_eq!(InboxMessageSource::from_json(bare).unwrap().message_count(), 1);
        assert_eq!(InboxMessageSource::from_json(wrapped).unwrap().message_count(), 1);
    }
}
