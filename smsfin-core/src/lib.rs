//! smsfin core - detect financial transactions in SMS
//!
//! This crate implements the detection engine following hexagonal architecture:
//!
//! - **domain**: Core entities (Institution, RawMessage, ParsedTransaction, PendingTransaction)
//! - **ports**: Trait definitions for external collaborators (MessageSource, LedgerSink)
//! - **services**: Identification, parsing, categorisation, the pending store and the listener
//! - **adapters**: Concrete message sources (in-memory inbox, unsupported platform)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::collections::HashSet;
use std::sync::Arc;

use config::Config;
use ports::{LedgerSink, MessageSource};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult, Result};
pub use domain::{
    Candidate, Direction, Institution, InstitutionRegistry, LedgerEntryDraft, LedgerKind,
    ParsedTransaction, PendingTransaction, RawMessage, SaveRequest,
};

/// Main context for SMS detection
///
/// This is the primary entry point for all engine logic. It wires the
/// registry, parser, pending store and listening controller together for
/// one message source.
pub struct SmsContext {
    pub config: Config,
    pub registry: Arc<InstitutionRegistry>,
    pub store: Arc<PendingStore>,
    pub stats: Arc<StatsRecorder>,
    pub pipeline: Arc<DetectionPipeline>,
    pub controller: ListeningController,
}

impl SmsContext {
    pub fn new(config: Config, source: Arc<dyn MessageSource>) -> Result<Self> {
        Self::build(config, source, None)
    }

    /// Like `new`, with a callback for each new live candidate
    pub fn with_callback(
        config: Config,
        source: Arc<dyn MessageSource>,
        callback: TransactionCallback,
    ) -> Result<Self> {
        Self::build(config, source, Some(callback))
    }

    fn build(
        config: Config,
        source: Arc<dyn MessageSource>,
        callback: Option<TransactionCallback>,
    ) -> Result<Self> {
        let registry = Arc::new(InstitutionRegistry::with_custom(&config.custom_senders()));
        let suggester = CategorySuggester::builtin().map_err(|e| Error::Other(e.to_string()))?;

        let store = Arc::new(PendingStore::new(suggester));
        let stats = Arc::new(StatsRecorder::new());
        let parser = MessageParser::new(SenderIdentifier::new(Arc::clone(&registry)));
        let pipeline = Arc::new(DetectionPipeline::new(parser, Arc::clone(&store), Arc::clone(&stats)));

        let senders = sender_filter(&config.enabled_sender_ids(), &registry);
        let mut controller = ListeningController::new(source, Arc::clone(&pipeline), senders);
        if let Some(callback) = callback {
            controller = controller.on_new_transaction(callback);
        }

        Ok(Self {
            config,
            registry,
            store,
            stats,
            pipeline,
            controller,
        })
    }

    pub fn parser(&self) -> &MessageParser {
        self.pipeline.parser()
    }

    /// Parse one message without touching the store
    pub fn parse(&self, message: &RawMessage) -> Option<ParsedTransaction> {
        self.parser().parse(message)
    }

    pub fn active_list(&self) -> Vec<PendingTransaction> {
        self.store.active_list()
    }

    pub fn dismiss(&self, id: &str) -> bool {
        self.store.dismiss(id)
    }

    pub fn mark_saved(&self, id: &str) -> bool {
        self.store.mark_saved(id)
    }

    pub fn institution_name<'a>(&'a self, pending: &'a PendingTransaction) -> &'a str {
        self.registry.display_name(&pending.transaction.institution_id)
    }

    /// Below the configured review threshold
    pub fn requires_review(&self, pending: &PendingTransaction) -> bool {
        pending.requires_review(self.config.review_threshold)
    }

    /// Ledger entry a save would hand off; None for unknown or terminal ids
    pub fn draft(&self, id: &str, request: &SaveRequest) -> Option<LedgerEntryDraft> {
        let pending = self.store.get(id).filter(|p| p.is_active())?;
        let fallback = self.institution_name(&pending).to_string();
        Some(LedgerEntryDraft::build(&pending, request, &fallback))
    }

    /// Hand a candidate to the ledger and mark it saved
    ///
    /// Ok(false) when the id is unknown or already dismissed or saved. A
    /// ledger error is returned as-is and the entry stays pending.
    pub async fn save(&self, id: &str, request: &SaveRequest, sink: &dyn LedgerSink) -> Result<bool> {
        let Some(entry) = self.draft(id, request) else {
            return Ok(false);
        };
        sink.persist(&entry).await?;
        tracing::info!(id, category = %entry.category, "candidate saved");
        Ok(self.store.mark_saved(id))
    }

    pub fn stats(&self) -> DetectionStats {
        self.stats.snapshot(self.store.saved_count())
    }

    /// Release the live subscription, if any
    pub async fn shutdown(&self) -> Result<()> {
        self.controller.stop_listening().await
    }

    /// Process everything already delivered, then release the subscription
    pub async fn drain(&self) -> Result<()> {
        self.controller.drain().await
    }
}

/// Sender filter for the message source: each enabled id plus the exact
/// addresses its institution is known to send from
pub fn sender_filter(enabled_ids: &[String], registry: &InstitutionRegistry) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut filter = Vec::new();
    for id in enabled_ids {
        let mut terms = vec![id.to_uppercase()];
        if let Some(institution) = registry.get(id) {
            terms.extend(institution.sender_patterns.iter().map(|p| match p {
                domain::SenderPattern::Exact(s) | domain::SenderPattern::Contains(s) => s.clone(),
            }));
        }
        for term in terms {
            if seen.insert(term.clone()) {
                filter.push(term);
            }
        }
    }
    filter
}
