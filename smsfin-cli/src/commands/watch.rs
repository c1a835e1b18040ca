//! Watch command - live detection over messages piped to stdin
//!
//! Each stdin line is one message in the platform JSON shape:
//! `{"id": "...", "address": "MPESA", "body": "...", "date": 1767263400000}`.
//! `id` may be omitted and `date` defaults to now.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use colored::Colorize;
use serde::Deserialize;
use smsfin_core::adapters::InboxMessageSource;
use smsfin_core::services::TransactionCallback;
use smsfin_core::{InstitutionRegistry, PendingTransaction, RawMessage, SmsContext};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{block_on, load_config, load_inbox, print_stats};
use crate::output;

/// Looser than `RawMessage`: hand-typed lines often skip id and date
#[derive(Debug, Deserialize)]
struct IncomingLine {
    #[serde(default)]
    id: String,
    address: String,
    body: String,
    #[serde(default)]
    date: Option<i64>,
}

impl From<IncomingLine> for RawMessage {
    fn from(line: IncomingLine) -> Self {
        let date = line.date.unwrap_or_else(|| Utc::now().timestamp_millis());
        RawMessage::new(line.id, line.address, line.body, date)
    }
}

pub fn run(inbox: Option<PathBuf>, json: bool) -> Result<()> {
    let source = match inbox {
        Some(path) => load_inbox(&path)?,
        None => Arc::new(InboxMessageSource::new()),
    };
    let config = load_config()?;
    let registry = InstitutionRegistry::with_custom(&config.custom_senders());
    let threshold = config.review_threshold;

    let callback: TransactionCallback = Arc::new(move |pending: &PendingTransaction| {
        if json {
            if let Ok(line) = serde_json::to_string(pending) {
                println!("{}", line);
            }
        } else {
            print_candidate(&registry, pending, threshold);
        }
    });

    block_on(async move {
        let ctx = SmsContext::with_callback(config, source.clone(), callback)?;
        ctx.controller.start_listening().await?;

        if !json {
            output::info("Listening for messages on stdin (one JSON object per line, Ctrl-D to stop)");
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<IncomingLine>(line) {
                Ok(incoming) => {
                    let message = RawMessage::from(incoming);
                    if source.deliver(message).await == 0 && !json {
                        println!("{}", "ignored (sender not monitored)".dimmed());
                    }
                }
                Err(e) => output::warning(&format!("Skipping malformed line: {}", e)),
            }
        }

        ctx.drain().await?;

        if !json {
            println!();
            print_stats(&ctx.stats());
        }
        Ok::<(), anyhow::Error>(())
    })?
}

fn print_candidate(registry: &InstitutionRegistry, pending: &PendingTransaction, threshold: f64) {
    let tx = &pending.transaction;
    let needs_review = pending.requires_review(threshold);
    println!(
        "{} {} {} {} [{}] {}",
        "+".green().bold(),
        registry.display_name(&tx.institution_id).bold(),
        output::direction_label(tx.direction),
        output::format_amount(tx.amount, &tx.currency),
        pending.suggested_category,
        output::confidence_label(tx.confidence, needs_review),
    );
    if let Some(name) = &tx.counterparty_name {
        println!("    {}", name);
    }
}
