//! Detection statistics - counters for the settings/status screen

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::ParsedTransaction;

#[derive(Debug, Default)]
struct Counters {
    scanned: u64,
    detected: u64,
    confidence_sum: f64,
    by_institution: HashMap<String, u64>,
    last_scan_at: Option<DateTime<Utc>>,
}

/// Accumulates what the pipeline has seen since start-up
#[derive(Debug, Default)]
pub struct StatsRecorder {
    counters: Mutex<Counters>,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Counters) -> R) -> R {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut counters)
    }

    pub fn record_scanned(&self, count: usize) {
        self.with(|c| c.scanned += count as u64);
    }

    pub fn record_detected(&self, transaction: &ParsedTransaction) {
        self.with(|c| {
            c.detected += 1;
            c.confidence_sum += transaction.confidence;
            *c.by_institution.entry(transaction.institution_id.clone()).or_default() += 1;
        });
    }

    pub fn record_backlog_scan(&self, at: DateTime<Utc>) {
        self.with(|c| c.last_scan_at = Some(at));
    }

    /// Current figures; `saved` comes from the store
    pub fn snapshot(&self, saved: usize) -> DetectionStats {
        self.with(|c| {
            let success_rate = if c.scanned == 0 {
                0.0
            } else {
                c.detected as f64 / c.scanned as f64
            };
            let avg_confidence = if c.detected == 0 {
                0.0
            } else {
                c.confidence_sum / c.detected as f64
            };
            // Ties go to the alphabetically first id so the answer is stable
            let top_institution = c
                .by_institution
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
                .map(|(id, _)| id.clone());

            DetectionStats {
                total_scanned: c.scanned,
                transactions_detected: c.detected,
                transactions_saved: saved as u64,
                success_rate,
                avg_confidence,
                top_institution,
                last_scan_at: c.last_scan_at,
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionStats {
    pub total_scanned: u64,
    pub transactions_detected: u64,
    pub transactions_saved: u64,
    /// Detected / scanned, 0 when nothing was scanned
    pub success_rate: f64,
    pub avg_confidence: f64,
    pub top_institution: Option<String>,
    pub last_scan_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Direction;
    use rust_decimal::Decimal;

    fn tx(institution: &str, confidence: f64) -> ParsedTransaction {
        ParsedTransaction {
            direction: Direction::Expense,
            amount: Decimal::ONE,
            currency: "KES".to_string(),
            counterparty_name: None,
            reference_code: None,
            balance_after: None,
            occurred_at: Utc::now(),
            raw_message_text: String::new(),
            institution_id: institution.to_string(),
            confidence,
        }
    }

    #[test]
    fn test_empty_snapshot() {
        let stats = StatsRecorder::new().snapshot(0);
        assert_eq!(stats.total_scanned, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert!(stats.top_institution.is_none());
    }

    #[test]
    fn test_rates_and_top_institution() {
        let recorder = StatsRecorder::new();
        recorder.record_scanned(4);
        recorder.record_detected(&tx("MPESA", 0.95));
        recorder.record_detected(&tx("MPESA", 0.95));
        recorder.record_detected(&tx("KCB", 0.5));

        let stats = recorder.snapshot(1);
        assert_eq!(stats.transactions_detected, 3);
        assert_eq!(stats.transactions_saved, 1);
        assert!((stats.success_rate - 0.75).abs() < 1e-9);
        assert!((stats.avg_confidence - 0.8).abs() < 1e-9);
        assert_eq!(stats.top_institution.as_deref(), Some("MPESA"));
    }
}
