//! Senders command - choose which institutions are monitored

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use smsfin_core::config::{Config, SENDERS_ENV};

use super::{get_data_dir, load_config};
use crate::output;

#[derive(Subcommand)]
pub enum SendersCommands {
    /// List monitored senders (default)
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start monitoring a sender
    Enable { id: String },
    /// Stop monitoring a sender
    Disable { id: String },
    /// Flip a sender between enabled and disabled
    Toggle { id: String },
    /// Add a custom sender by name (e.g. "My Sacco")
    Add { name: String },
    /// Remove a custom sender
    Remove {
        id: String,
        /// Skip confirmation
        #[arg(long, short)]
        force: bool,
    },
    /// Enable every sender
    EnableAll,
    /// Disable every sender
    DisableAll,
}

pub fn run(command: Option<SendersCommands>) -> Result<()> {
    let data_dir = get_data_dir()?;
    let mut config = load_config()?;

    match command.unwrap_or(SendersCommands::List { json: false }) {
        SendersCommands::List { json } => return list(&config, json),
        SendersCommands::Enable { id } => {
            config.set_sender_enabled(&id, true)?;
            output::success(&format!("Monitoring {}", id.to_uppercase()));
        }
        SendersCommands::Disable { id } => {
            config.set_sender_enabled(&id, false)?;
            output::success(&format!("Stopped monitoring {}", id.to_uppercase()));
        }
        SendersCommands::Toggle { id } => {
            let enabled = config.toggle_sender(&id)?;
            let state = if enabled { "enabled" } else { "disabled" };
            output::success(&format!("{} {}", id.to_uppercase(), state));
        }
        SendersCommands::Add { name } => {
            let id = config.add_custom_sender(&name)?;
            output::success(&format!("Added custom sender '{}' ({})", name.trim(), id));
        }
        SendersCommands::Remove { id, force } => {
            if !force
                && !Confirm::new()
                    .with_prompt(format!("Remove custom sender '{}'?", id.to_uppercase()))
                    .default(false)
                    .interact()?
            {
                println!("{}", "Cancelled".dimmed());
                return Ok(());
            }
            config.remove_custom_sender(&id)?;
            output::success(&format!("Removed {}", id.to_uppercase()));
        }
        SendersCommands::EnableAll => {
            config.enable_all();
            output::success("All senders enabled");
        }
        SendersCommands::DisableAll => {
            config.disable_all();
            output::warning("All senders disabled - nothing will be detected");
        }
    }

    config.save(&data_dir)?;
    if std::env::var(SENDERS_ENV).is_ok() {
        output::warning(&format!("{} is set and overrides the saved sender list", SENDERS_ENV));
    }
    Ok(())
}

fn list(config: &Config, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&config.monitored_senders)?);
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["ID", "Name", "Enabled", "Custom"]);
    for sender in &config.monitored_senders {
        table.add_row(vec![
            sender.id.clone(),
            sender.name.clone(),
            if sender.enabled { "yes".green().to_string() } else { "no".dimmed().to_string() },
            if sender.custom { "yes".to_string() } else { String::new() },
        ]);
    }
    println!("{table}");

    let enabled = config.enabled_sender_ids();
    println!("\n{} of {} senders monitored", enabled.len(), config.monitored_senders.len());
    Ok(())
}
