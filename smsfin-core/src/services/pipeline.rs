//! Detection pipeline - parse, suggest, ingest
//!
//! Shared by the backlog scan and the live consumer so both paths produce
//! identical candidates.

use std::sync::Arc;

use super::parser::MessageParser;
use super::pending::PendingStore;
use super::stats::StatsRecorder;
use crate::domain::{Candidate, PendingTransaction, RawMessage};

#[derive(Debug)]
pub struct DetectionPipeline {
    parser: MessageParser,
    store: Arc<PendingStore>,
    stats: Arc<StatsRecorder>,
}

impl DetectionPipeline {
    pub fn new(parser: MessageParser, store: Arc<PendingStore>, stats: Arc<StatsRecorder>) -> Self {
        Self { parser, store, stats }
    }

    pub fn parser(&self) -> &MessageParser {
        &self.parser
    }

    pub fn store(&self) -> &Arc<PendingStore> {
        &self.store
    }

    pub fn stats(&self) -> &Arc<StatsRecorder> {
        &self.stats
    }

    /// Parse a batch and ingest it as one unit; returns the new entries
    ///
    /// Unreadable messages are skipped and never stop the rest of the batch.
    /// Only entries new to the store count as detections.
    pub fn process(&self, messages: &[RawMessage]) -> Vec<PendingTransaction> {
        self.stats.record_scanned(messages.len());
        let candidates: Vec<Candidate> = messages
            .iter()
            .filter_map(|message| {
                let tx = self.parser.parse(message)?;
                Some(Candidate::from_message(message, tx))
            })
            .collect();
        let added = self.store.insert(candidates);
        for entry in &added {
            self.stats.record_detected(&entry.transaction);
        }
        added
    }

    /// Single live message; Some only if it produced a new entry
    pub fn process_one(&self, message: &RawMessage) -> Option<PendingTransaction> {
        self.process(std::slice::from_ref(message)).into_iter().next()
    }
}
