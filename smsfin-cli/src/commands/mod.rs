//! CLI command implementations

pub mod institutions;
pub mod parse;
pub mod review;
pub mod scan;
pub mod senders;
pub mod watch;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use smsfin_core::adapters::InboxMessageSource;
use smsfin_core::config::Config;
use smsfin_core::ports::MessageSource;
use smsfin_core::services::DetectionStats;
use smsfin_core::{Direction, PendingTransaction, SmsContext};

use crate::output;

/// Get the data directory from environment or default
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SMSFIN_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".smsfin"))
        .context("Could not find home directory (set SMSFIN_DIR)")
}

/// Load settings from the data directory
pub fn load_config() -> Result<Config> {
    let data_dir = get_data_dir()?;
    Config::load(&data_dir)
}

/// Build an engine context over the given message source
pub fn get_context(source: Arc<dyn MessageSource>) -> Result<SmsContext> {
    let config = load_config()?;
    SmsContext::new(config, source).context("Failed to initialize detection engine")
}

/// Read an exported inbox file
pub fn load_inbox(path: &Path) -> Result<Arc<InboxMessageSource>> {
    let source = InboxMessageSource::from_json_file(path)
        .with_context(|| format!("Failed to load inbox {}", path.display()))?;
    tracing::debug!(path = %path.display(), messages = source.message_count(), "inbox loaded");
    Ok(Arc::new(source))
}

/// Run a future on a fresh runtime
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    Ok(runtime.block_on(future))
}

/// Scan window start: `--since-days` wins over settings, 0 means no window
pub fn scan_since(since_days: Option<u32>, config: &Config) -> Result<Option<DateTime<Utc>>> {
    let days = since_days.unwrap_or(config.initial_scan_days);
    if days == 0 {
        return Ok(None);
    }
    let since = Duration::try_days(i64::from(days)).and_then(|window| Utc::now().checked_sub_signed(window));
    match since {
        Some(since) => Ok(Some(since)),
        None => bail!("Scan window of {} days is out of range (use 0 to read everything)", days),
    }
}

/// Flat view of a candidate for json/csv output
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRow {
    pub id: String,
    pub institution: String,
    pub direction: Direction,
    pub amount: Decimal,
    pub currency: String,
    pub counterparty: Option<String>,
    pub reference: Option<String>,
    pub balance_after: Option<Decimal>,
    pub occurred_at: String,
    pub confidence: f64,
    pub category: String,
    pub needs_review: bool,
}

impl CandidateRow {
    pub fn new(ctx: &SmsContext, pending: &PendingTransaction) -> Self {
        let tx = &pending.transaction;
        Self {
            id: pending.id.clone(),
            institution: ctx.institution_name(pending).to_string(),
            direction: tx.direction,
            amount: tx.amount,
            currency: tx.currency.clone(),
            counterparty: tx.counterparty_name.clone(),
            reference: tx.reference_code.clone(),
            balance_after: tx.balance_after,
            occurred_at: tx.occurred_at.to_rfc3339(),
            confidence: tx.confidence,
            category: pending.suggested_category.clone(),
            needs_review: ctx.requires_review(pending),
        }
    }
}

/// Print detection statistics
pub fn print_stats(stats: &DetectionStats) {
    let mut table = output::create_table();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Messages scanned".to_string(), stats.total_scanned.to_string()]);
    table.add_row(vec!["Transactions detected".to_string(), stats.transactions_detected.to_string()]);
    table.add_row(vec!["Transactions saved".to_string(), stats.transactions_saved.to_string()]);
    table.add_row(vec!["Detection rate".to_string(), format!("{:.1}%", stats.success_rate * 100.0)]);
    table.add_row(vec!["Average confidence".to_string(), format!("{:.0}%", stats.avg_confidence * 100.0)]);
    table.add_row(vec![
        "Top institution".to_string(),
        stats.top_institution.clone().unwrap_or_else(|| "-".to_string()),
    ]);
    table.add_row(vec![
        "Last scan".to_string(),
        stats
            .last_scan_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string()),
    ]);
    println!("{table}");
}
