//! Concurrent pending-store access tests
//!
//! The store is shared between the live consumer, backlog loads and the
//! reviewing user. These tests hammer it from several threads at once and
//! check that dedup and the one-way flags hold.
//!
//! Run with: cargo test --test concurrent_access_test -- --nocapture

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use chrono::Utc;
use rust_decimal::Decimal;

use smsfin_core::services::{CategorySuggester, PendingStore};
use smsfin_core::{Candidate, Direction, ParsedTransaction};

/// Number of concurrent threads for stress tests
const THREAD_COUNT: usize = 8;

/// Candidate ids per thread; half of them overlap with the next thread
const IDS_PER_THREAD: usize = 50;

fn candidate(id: String) -> Candidate {
    Candidate {
        id,
        transaction: ParsedTransaction {
            direction: Direction::Expense,
            amount: Decimal::new(1500, 2),
            currency: "KES".to_string(),
            counterparty_name: None,
            reference_code: None,
            balance_after: None,
            occurred_at: Utc::now(),
            raw_message_text: "paid".to_string(),
            institution_id: "MPESA".to_string(),
            confidence: 0.95,
        },
    }
}

fn store() -> Arc<PendingStore> {
    Arc::new(PendingStore::new(CategorySuggester::builtin().unwrap()))
}

/// Overlapping batches from many threads: every id is stored exactly once
/// and the per-call counts add up to the store size.
#[test]
fn test_concurrent_ingest_dedups() {
    let store = store();
    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let added_total = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|thread_id| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            let added_total = Arc::clone(&added_total);
            thread::spawn(move || {
                let start = thread_id * IDS_PER_THREAD / 2;
                let batch: Vec<_> = (start..start + IDS_PER_THREAD)
                    .map(|n| candidate(format!("msg-{}", n)))
                    .collect();

                barrier.wait();
                // Ingest in small chunks to interleave with the other threads
                for chunk in batch.chunks(5) {
                    let added = store.ingest(chunk.to_vec());
                    added_total.fetch_add(added, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let expected_unique = (THREAD_COUNT - 1) * IDS_PER_THREAD / 2 + IDS_PER_THREAD;
    assert_eq!(store.len(), expected_unique);
    assert_eq!(added_total.load(Ordering::SeqCst), expected_unique);

    let mut ids: Vec<_> = store.all().into_iter().map(|p| p.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), expected_unique);
}

/// Dismiss and save racing on the same ids: exactly one transition wins
/// per id and flags never revert.
#[test]
fn test_concurrent_dismiss_and_save() {
    let store = store();
    let ids: Vec<String> = (0..200).map(|n| format!("id-{}", n)).collect();
    store.ingest(ids.iter().cloned().map(candidate).collect());

    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let dismiss_wins = Arc::new(AtomicUsize::new(0));
    let save_wins = Arc::new(AtomicUsize::new(0));
    let ids = Arc::new(ids);

    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|thread_id| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            let ids = Arc::clone(&ids);
            let dismiss_wins = Arc::clone(&dismiss_wins);
            let save_wins = Arc::clone(&save_wins);
            thread::spawn(move || {
                barrier.wait();
                for id in ids.iter() {
                    if thread_id % 2 == 0 {
                        if store.dismiss(id) {
                            dismiss_wins.fetch_add(1, Ordering::SeqCst);
                        }
                    } else if store.mark_saved(id) {
                        save_wins.fetch_add(1, Ordering::SeqCst);
                    }
                    // Readers run alongside the writers
                    let _ = store.active_list();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Every entry was saved exactly once; dismissals only landed before the save
    assert_eq!(save_wins.load(Ordering::SeqCst), 200);
    assert!(dismiss_wins.load(Ordering::SeqCst) <= 200);
    assert!(store.active_list().is_empty());
    assert_eq!(store.saved_count(), 200);
}

/// Ingest while another thread clears terminal entries
#[test]
fn test_ingest_during_housekeeping() {
    let store = store();
    let barrier = Arc::new(Barrier::new(2));

    let writer = {
        let store = Arc::clone(&store);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for n in 0..500 {
                let id = format!("w-{}", n);
                store.ingest(vec![candidate(id.clone())]);
                if n % 2 == 0 {
                    store.dismiss(&id);
                }
            }
        })
    };

    let cleaner = {
        let store = Arc::clone(&store);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            let mut cleared = 0;
            for _ in 0..100 {
                cleared += store.clear_dismissed();
                thread::yield_now();
            }
            cleared
        })
    };

    writer.join().unwrap();
    let cleared = cleaner.join().unwrap();
    let remaining_dismissed = store.all().iter().filter(|p| p.dismissed).count();

    assert_eq!(cleared + remaining_dismissed, 250);
    assert_eq!(store.active_count(), 250);
}
