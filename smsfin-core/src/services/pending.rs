//! Pending transaction store
//!
//! Holds every candidate the engine has produced, newest first. Ids are
//! unique across the whole store, including dismissed and saved entries, so
//! a message that is re-read after review never comes back.
//!
//! All operations are total over ids: unknown or already-terminal ids are
//! no-ops reported through the return value, never errors.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use super::category::CategorySuggester;
use crate::domain::{Candidate, PendingTransaction};

#[derive(Debug)]
pub struct PendingStore {
    entries: Mutex<Vec<PendingTransaction>>,
    suggester: CategorySuggester,
}

impl PendingStore {
    pub fn new(suggester: CategorySuggester) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            suggester,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PendingTransaction>> {
        // No mutation below can leave the list half-written
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add candidates, skipping ids already present; returns how many were added
    pub fn ingest(&self, candidates: Vec<Candidate>) -> usize {
        self.insert(candidates).len()
    }

    /// Like `ingest`, but returns the entries that were actually created
    ///
    /// The new batch is placed ahead of existing entries, keeping its own
    /// order. Duplicate ids within the batch keep the first occurrence.
    pub fn insert(&self, candidates: Vec<Candidate>) -> Vec<PendingTransaction> {
        if candidates.is_empty() {
            return Vec::new();
        }

        // Categories are computed outside the lock
        let prepared: Vec<(Candidate, String)> = candidates
            .into_iter()
            .map(|c| {
                let category = self.suggester.suggest(&c.transaction);
                (c, category)
            })
            .collect();

        let mut entries = self.lock();
        let mut seen: HashSet<String> = entries.iter().map(|e| e.id.clone()).collect();
        let mut added = Vec::new();
        for (candidate, category) in prepared {
            if seen.insert(candidate.id.clone()) {
                added.push(PendingTransaction::new(candidate, category));
            }
        }

        if !added.is_empty() {
            entries.splice(0..0, added.iter().cloned());
        }
        added
    }

    /// Hide an entry from review; no-op for unknown or saved entries
    pub fn dismiss(&self, id: &str) -> bool {
        let mut entries = self.lock();
        match entries.iter_mut().find(|e| e.id == id) {
            Some(entry) if !entry.saved && !entry.dismissed => {
                entry.dismissed = true;
                true
            }
            _ => false,
        }
    }

    /// Record that the ledger accepted an entry; no-op for unknown or saved entries
    pub fn mark_saved(&self, id: &str) -> bool {
        let mut entries = self.lock();
        match entries.iter_mut().find(|e| e.id == id) {
            Some(entry) if !entry.saved => {
                entry.saved = true;
                true
            }
            _ => false,
        }
    }

    /// Entries still awaiting review, newest first
    pub fn active_list(&self) -> Vec<PendingTransaction> {
        self.lock().iter().filter(|e| e.is_active()).cloned().collect()
    }

    /// Every entry including dismissed and saved ones
    pub fn all(&self) -> Vec<PendingTransaction> {
        self.lock().clone()
    }

    pub fn get(&self, id: &str) -> Option<PendingTransaction> {
        self.lock().iter().find(|e| e.id == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.lock().iter().filter(|e| e.is_active()).count()
    }

    pub fn saved_count(&self) -> usize {
        self.lock().iter().filter(|e| e.saved).count()
    }

    /// Drop dismissed entries, saved or not; their ids become eligible for ingest again
    pub fn clear_dismissed(&self) -> usize {
        self.retain(|e| !e.dismissed)
    }

    /// Drop saved entries; their ids become eligible for ingest again
    pub fn clear_saved(&self) -> usize {
        self.retain(|e| !e.saved)
    }

    fn retain(&self, keep: impl Fn(&PendingTransaction) -> bool) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|e| keep(e));
        before - entries.len()
    }
}
