//! Parse command - run one message through the detection tiers

use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use colored::Colorize;
use serde_json::json;
use smsfin_core::adapters::UnsupportedMessageSource;
use smsfin_core::services::{CategorySuggester, ParseOutcome};
use smsfin_core::{OperationResult, ParsedTransaction, RawMessage};

use super::get_context;
use crate::output;

pub fn run(address: &str, body: Option<String>, timestamp: Option<i64>, json: bool) -> Result<()> {
    let body = match body {
        Some(b) => b,
        None if atty::isnt(atty::Stream::Stdin) => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read message body from stdin")?;
            buf.trim_end().to_string()
        }
        None => anyhow::bail!("No message body. Pass --body or pipe it on stdin"),
    };

    let timestamp = timestamp.unwrap_or_else(|| Utc::now().timestamp_millis());
    let message = RawMessage::new("cli", address, body, timestamp);

    let ctx = get_context(Arc::new(UnsupportedMessageSource))?;
    let outcome = ctx.parser().parse_detailed(&message);
    let suggester = CategorySuggester::builtin().context("Failed to load category rules")?;

    if json {
        let result = match &outcome {
            ParseOutcome::Parsed { transaction, tier, template } => {
                OperationResult::ok(transaction.clone())
                    .with_context("tier", json!(tier))
                    .with_context("template", json!(template))
                    .with_context("category", json!(suggester.suggest(transaction)))
                    .with_context("needsReview", json!(transaction.is_low_confidence(ctx.config.review_threshold)))
            }
            ParseOutcome::Unmatched { institution_id } => {
                OperationResult::<ParsedTransaction>::fail("No transaction found in message")
                    .with_context("institution", json!(institution_id))
            }
            ParseOutcome::NotFinancial => {
                OperationResult::<ParsedTransaction>::fail("Sender is not a monitored institution")
            }
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match outcome {
        ParseOutcome::NotFinancial => {
            output::warning(&format!("'{}' is not a known financial sender", address));
        }
        ParseOutcome::Unmatched { institution_id } => {
            output::warning(&format!(
                "Recognised {} but found no transaction in the message",
                ctx.registry.display_name(&institution_id)
            ));
        }
        ParseOutcome::Parsed { transaction, tier, template } => {
            let needs_review = transaction.is_low_confidence(ctx.config.review_threshold);
            let tx = &transaction;
            println!("{}", "Transaction detected".bold());
            println!("  Institution:  {}", ctx.registry.display_name(&tx.institution_id));
            println!("  Direction:    {}", output::direction_label(tx.direction));
            println!("  Amount:       {}", output::format_amount(tx.amount, &tx.currency));
            if let Some(name) = &tx.counterparty_name {
                println!("  Counterparty: {}", name);
            }
            if let Some(reference) = &tx.reference_code {
                println!("  Reference:    {}", reference);
            }
            if let Some(balance) = tx.balance_after {
                println!("  Balance:      {}", output::format_amount(balance, &tx.currency));
            }
            println!("  Date:         {}", tx.occurred_at.format("%Y-%m-%d %H:%M"));
            println!("  Category:     {}", suggester.suggest(tx));
            println!(
                "  Confidence:   {} ({:?} tier, {})",
                output::confidence_label(tx.confidence, needs_review),
                tier,
                template
            );
            if needs_review {
                output::warning("Low confidence - review before saving");
            }
        }
    }

    Ok(())
}
