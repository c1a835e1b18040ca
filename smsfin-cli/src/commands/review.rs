//! Review command - confirm or dismiss detected transactions
//!
//! Confirmed entries are appended to a JSON-lines ledger file, one
//! `LedgerEntryDraft` per line.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use dialoguer::{Input, Select};
use smsfin_core::ports::LedgerSink;
use smsfin_core::{Error, LedgerEntryDraft, PendingTransaction, SaveRequest, SmsContext};

use super::{block_on, get_context, load_inbox, print_stats, scan_since};
use crate::output;

const DEFAULT_ACCOUNT: &str = "Cash";

/// Ledger that appends entries to a local file
pub struct JsonLinesLedger {
    path: PathBuf,
}

impl JsonLinesLedger {
    pub fn new(path: &Path) -> Self {
        Self { path: path.to_path_buf() }
    }
}

#[async_trait]
impl LedgerSink for JsonLinesLedger {
    async fn persist(&self, entry: &LedgerEntryDraft) -> smsfin_core::Result<()> {
        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::ledger(format!("{}: {}", self.path.display(), e)))?;
        writeln!(file, "{}", line).map_err(|e| Error::ledger(e.to_string()))?;
        Ok(())
    }
}

enum Decision {
    Save,
    Dismiss,
    Skip,
    Quit,
}

pub fn run(
    inbox: &Path,
    ledger: &Path,
    account: Option<String>,
    limit: Option<usize>,
    since_days: Option<u32>,
) -> Result<()> {
    let source = load_inbox(inbox)?;
    let ctx = get_context(source)?;
    let limit = limit.unwrap_or(ctx.config.backlog_limit);
    let since = scan_since(since_days, &ctx.config)?;
    let sink = JsonLinesLedger::new(ledger);
    let account = account.unwrap_or_else(|| DEFAULT_ACCOUNT.to_string());

    block_on(async {
        ctx.controller.check_permission().await?;
        ctx.controller.load_backlog(limit, since).await?;

        let pending = ctx.active_list();
        if pending.is_empty() {
            output::info("Nothing to review");
            return Ok(());
        }
        output::info(&format!("{} transaction(s) to review", pending.len()));

        for (n, entry) in pending.iter().enumerate() {
            println!();
            println!("{}", format!("[{}/{}]", n + 1, pending.len()).dimmed());
            show(&ctx, entry);

            match prompt_decision()? {
                Decision::Save => {
                    let request = prompt_save(&ctx, entry, &account)?;
                    match ctx.save(&entry.id, &request, &sink).await {
                        Ok(true) => output::success("Saved"),
                        Ok(false) => output::warning("Already handled"),
                        Err(e) => output::error(&format!("Save failed, left pending: {}", e)),
                    }
                }
                Decision::Dismiss => {
                    ctx.dismiss(&entry.id);
                    println!("{}", "Dismissed".dimmed());
                }
                Decision::Skip => {}
                Decision::Quit => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    })??;

    println!();
    print_stats(&ctx.stats());
    Ok(())
}

fn show(ctx: &SmsContext, pending: &PendingTransaction) {
    let tx = &pending.transaction;
    let needs_review = ctx.requires_review(pending);
    println!(
        "{}  {}  {}",
        ctx.institution_name(pending).bold(),
        output::direction_label(tx.direction),
        output::format_amount(tx.amount, &tx.currency).bold()
    );
    if let Some(name) = &tx.counterparty_name {
        println!("  Counterparty: {}", name);
    }
    println!("  Date:         {}", tx.occurred_at.format("%Y-%m-%d %H:%M"));
    println!("  Confidence:   {}", output::confidence_label(tx.confidence, needs_review));
    println!("  Message:      {}", tx.raw_message_text.dimmed());
    if needs_review {
        output::warning("  Low confidence - check the amount and direction");
    }
}

fn prompt_decision() -> Result<Decision> {
    let choice = Select::new()
        .with_prompt("Action")
        .items(&["Save", "Dismiss", "Skip", "Quit"])
        .default(0)
        .interact()
        .context("Failed to read choice")?;
    Ok(match choice {
        0 => Decision::Save,
        1 => Decision::Dismiss,
        2 => Decision::Skip,
        _ => Decision::Quit,
    })
}

fn prompt_save(ctx: &SmsContext, pending: &PendingTransaction, account: &str) -> Result<SaveRequest> {
    let category: String = Input::new()
        .with_prompt("Category")
        .default(pending.suggested_category.clone())
        .interact_text()?;
    let account: String = Input::new()
        .with_prompt("Account")
        .default(account.to_string())
        .interact_text()?;
    let default_description = pending
        .default_description()
        .unwrap_or_else(|| ctx.institution_name(pending))
        .to_string();
    let description: String = Input::new()
        .with_prompt("Description")
        .default(default_description.clone())
        .interact_text()?;

    let request = SaveRequest::new(category, account);
    Ok(if description == default_description {
        request
    } else {
        request.with_description(description)
    })
}
