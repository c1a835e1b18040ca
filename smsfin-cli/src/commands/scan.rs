//! Scan command - read an exported inbox and list candidate transactions

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use super::{block_on, get_context, load_inbox, print_stats, scan_since, CandidateRow};
use crate::output;

pub fn run(inbox: &Path, limit: Option<usize>, since_days: Option<u32>, format: &str, stats: bool) -> Result<()> {
    if !matches!(format, "table" | "json" | "csv") {
        bail!("Unknown format '{}'. Use table, json or csv", format);
    }

    let source = load_inbox(inbox)?;
    let ctx = get_context(source)?;
    let limit = limit.unwrap_or(ctx.config.backlog_limit);
    let since = scan_since(since_days, &ctx.config)?;

    let spinner = (format == "table").then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Scanning inbox...");
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    });

    let scanned = block_on(async {
        ctx.controller.check_permission().await?;
        ctx.controller.load_backlog(limit, since).await
    })?;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let found = scanned?;

    let rows: Vec<CandidateRow> = found.iter().map(|p| CandidateRow::new(&ctx, p)).collect();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&rows)?),
        "csv" => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            for row in &rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        _ => print_table(&rows),
    }

    if stats {
        match format {
            "table" => {
                println!();
                print_stats(&ctx.stats());
            }
            // Keep stdout machine-readable
            _ => eprintln!("{}", serde_json::to_string_pretty(&ctx.stats())?),
        }
    }

    Ok(())
}

fn print_table(rows: &[CandidateRow]) {
    if rows.is_empty() {
        output::info("No transactions found");
        return;
    }

    let mut table = output::create_table();
    table.set_header(vec!["Date", "Institution", "Direction", "Amount", "Counterparty", "Category", "Confidence"]);
    for row in rows {
        let date = row.occurred_at.get(..10).unwrap_or(&row.occurred_at).to_string();
        table.add_row(vec![
            date,
            row.institution.clone(),
            output::direction_label(row.direction).to_string(),
            output::format_amount(row.amount, &row.currency),
            row.counterparty.clone().unwrap_or_else(|| "-".to_string()),
            row.category.clone(),
            output::confidence_label(row.confidence, row.needs_review).to_string(),
        ]);
    }
    println!("{table}");

    let review = rows.iter().filter(|r| r.needs_review).count();
    println!("\n{} transaction(s) found", rows.len().to_string().bold());
    if review > 0 {
        output::warning(&format!("{} need review (low confidence)", review));
    }
}
