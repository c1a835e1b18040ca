//! Listening controller - permission state and live subscription
//!
//! Owns the one live subscription on the message source. Permission
//! checks, start and stop are serialised against each other; backlog loads
//! are independent of them and may run while the controller starts or stops.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::pipeline::DetectionPipeline;
use crate::domain::result::{Error, Result};
use crate::domain::{PendingTransaction, RawMessage};
use crate::ports::{MessageQuery, MessageSource, PermissionStatus, SubscriptionHandle};

/// Called for every live message that produced a new pending entry
pub type TransactionCallback = Arc<dyn Fn(&PendingTransaction) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ListenerState {
    /// Permission not checked yet
    Unknown,
    PermissionDenied,
    /// Permission granted, no subscription
    Idle,
    Listening,
}

impl ListenerState {
    pub fn has_permission(&self) -> bool {
        matches!(self, ListenerState::Idle | ListenerState::Listening)
    }
}

struct LiveSubscription {
    handle: SubscriptionHandle,
    consumer: JoinHandle<()>,
}

struct Inner {
    state: ListenerState,
    live: Option<LiveSubscription>,
}

pub struct ListeningController {
    source: Arc<dyn MessageSource>,
    pipeline: Arc<DetectionPipeline>,
    senders: Vec<String>,
    inner: Mutex<Inner>,
    transitions: tokio::sync::Mutex<()>,
    on_new: Option<TransactionCallback>,
}

impl ListeningController {
    pub fn new(source: Arc<dyn MessageSource>, pipeline: Arc<DetectionPipeline>, senders: Vec<String>) -> Self {
        Self {
            source,
            pipeline,
            senders,
            inner: Mutex::new(Inner {
                state: ListenerState::Unknown,
                live: None,
            }),
            transitions: tokio::sync::Mutex::new(()),
            on_new: None,
        }
    }

    pub fn on_new_transaction(mut self, callback: TransactionCallback) -> Self {
        self.on_new = Some(callback);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> ListenerState {
        self.lock().state
    }

    pub fn is_listening(&self) -> bool {
        self.state() == ListenerState::Listening
    }

    pub fn senders(&self) -> &[String] {
        &self.senders
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Query the source for the current permission; never starts listening
    pub async fn check_permission(&self) -> Result<PermissionStatus> {
        let _guard = self.transitions.lock().await;
        let status = self.source.check_permission().await?;
        self.apply_permission(status).await;
        Ok(status)
    }

    /// Ask the user for permission
    pub async fn request_permission(&self) -> Result<PermissionStatus> {
        let _guard = self.transitions.lock().await;
        let status = self.source.request_permission().await?;
        self.apply_permission(status).await;
        Ok(status)
    }

    /// Record a permission answer; a revoked permission ends any subscription
    async fn apply_permission(&self, status: PermissionStatus) {
        let revoked = {
            let mut inner = self.lock();
            if status.is_granted() {
                if inner.state != ListenerState::Listening {
                    inner.state = ListenerState::Idle;
                }
                None
            } else {
                inner.state = ListenerState::PermissionDenied;
                inner.live.take()
            }
        };

        if let Some(live) = revoked {
            warn!(source = self.source.name(), "permission revoked while listening");
            if let Err(e) = self.release(live).await {
                warn!(error = %e, "failed to release subscription");
            }
        }
    }

    /// Fetch historical messages and run them through the pipeline
    ///
    /// Returns only the entries this call created. A source failure ingests
    /// nothing.
    pub async fn load_backlog(
        &self,
        limit: usize,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PendingTransaction>> {
        if !self.state().has_permission() {
            return Err(Error::permission("SMS permission not granted"));
        }

        let query = MessageQuery {
            senders: self.senders.clone(),
            limit,
            since,
        };
        let messages = self.source.get_messages(&query).await?;
        let added = self.pipeline.process(&messages);
        self.pipeline.stats().record_backlog_scan(Utc::now());

        info!(
            source = self.source.name(),
            fetched = messages.len(),
            added = added.len(),
            "backlog loaded"
        );
        Ok(added)
    }

    /// Subscribe to live messages, asking for permission first if needed
    ///
    /// Already listening is a no-op. Denied permission fails with
    /// `Error::Permission` and leaves the controller not listening.
    pub async fn start_listening(&self) -> Result<()> {
        let _guard = self.transitions.lock().await;
        let state = self.state();
        if state == ListenerState::Listening {
            return Ok(());
        }

        if !state.has_permission() {
            let status = self.source.request_permission().await?;
            self.apply_permission(status).await;
            if !status.is_granted() {
                warn!(source = self.source.name(), "listening refused: permission denied");
                return Err(Error::permission("SMS permission denied"));
            }
        }

        let subscription = self.source.subscribe(&self.senders).await?;
        let consumer = self.spawn_consumer(subscription.receiver);
        {
            let mut inner = self.lock();
            inner.live = Some(LiveSubscription {
                handle: subscription.handle,
                consumer,
            });
            inner.state = ListenerState::Listening;
        }

        info!(source = self.source.name(), senders = self.senders.len(), "listening for messages");
        Ok(())
    }

    /// Release the live subscription; safe when not listening
    pub async fn stop_listening(&self) -> Result<()> {
        let _guard = self.transitions.lock().await;
        let live = {
            let mut inner = self.lock();
            if inner.state == ListenerState::Listening {
                inner.state = ListenerState::Idle;
            }
            inner.live.take()
        };

        match live {
            Some(live) => {
                self.release(live).await?;
                info!(source = self.source.name(), "stopped listening");
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Stop listening once every message already delivered has been processed
    ///
    /// Unsubscribing closes the channel, so the consumer finishes the queue
    /// and exits on its own instead of being aborted.
    pub async fn drain(&self) -> Result<()> {
        let _guard = self.transitions.lock().await;
        let live = {
            let mut inner = self.lock();
            if inner.state == ListenerState::Listening {
                inner.state = ListenerState::Idle;
            }
            inner.live.take()
        };
        let Some(live) = live else {
            return Ok(());
        };

        if let Err(e) = self.source.unsubscribe(live.handle).await {
            live.consumer.abort();
            return Err(e);
        }
        live.consumer
            .await
            .map_err(|e| Error::Other(format!("live consumer failed: {}", e)))?;
        info!(source = self.source.name(), "drained and stopped listening");
        Ok(())
    }

    async fn release(&self, live: LiveSubscription) -> Result<()> {
        live.consumer.abort();
        self.source.unsubscribe(live.handle).await
    }

    fn spawn_consumer(&self, mut receiver: mpsc::Receiver<RawMessage>) -> JoinHandle<()> {
        let pipeline = Arc::clone(&self.pipeline);
        let on_new = self.on_new.clone();
        tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                if let Some(pending) = pipeline.process_one(&message) {
                    debug!(
                        id = %pending.id,
                        institution = %pending.transaction.institution_id,
                        "new live candidate"
                    );
                    if let Some(callback) = &on_new {
                        callback(&pending);
                    }
                }
            }
            debug!("live channel closed");
        })
    }
}

impl Drop for ListeningController {
    fn drop(&mut self) {
        let live = self.inner.get_mut().unwrap_or_else(|e| e.into_inner()).live.take();
        let Some(live) = live else {
            return;
        };

        // Aborting the consumer drops the receiver, which sources already
        // treat as an unsubscribe; the explicit call is best effort.
        live.consumer.abort();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let source = Arc::clone(&self.source);
            let handle = live.handle;
            runtime.spawn(async move {
                if let Err(e) = source.unsubscribe(handle).await {
                    warn!(error = %e, "failed to release subscription on teardown");
                }
            });
        }
    }
}
