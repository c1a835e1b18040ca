//! smsfin CLI - find transactions in your SMS inbox

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{institutions, parse, review, scan, senders, watch};

/// smsfin - detect financial transactions in SMS messages
#[derive(Parser)]
#[command(name = "smsfin", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a single message
    Parse {
        /// Sender address (e.g. MPESA)
        #[arg(long, short)]
        address: String,
        /// Message body (read from stdin if omitted)
        #[arg(long, short)]
        body: Option<String>,
        /// Receipt time in milliseconds since the epoch (defaults to now)
        #[arg(long)]
        timestamp: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scan an exported inbox for transactions
    Scan {
        /// Inbox file (JSON array of messages or {"messages": [...]})
        inbox: PathBuf,
        /// Maximum messages to read (defaults to backlogLimit from settings)
        #[arg(long)]
        limit: Option<usize>,
        /// Only messages from the last N days; 0 reads everything
        #[arg(long)]
        since_days: Option<u32>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: String,
        /// Output as JSON (shorthand for --format json)
        #[arg(long)]
        json: bool,
        /// Print detection statistics after the scan
        #[arg(long)]
        stats: bool,
    },

    /// Listen for messages piped to stdin as JSON lines
    Watch {
        /// Seed the inbox from a file before listening
        #[arg(long)]
        inbox: Option<PathBuf>,
        /// Print new candidates as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Review detected transactions and save them to a ledger file
    Review {
        /// Inbox file to scan
        inbox: PathBuf,
        /// JSON-lines ledger file that saved entries are appended to
        #[arg(long)]
        ledger: PathBuf,
        /// Default account for saved entries
        #[arg(long)]
        account: Option<String>,
        /// Maximum messages to read
        #[arg(long)]
        limit: Option<usize>,
        /// Only messages from the last N days; 0 reads everything
        #[arg(long)]
        since_days: Option<u32>,
    },

    /// Manage monitored senders
    Senders {
        #[command(subcommand)]
        command: Option<senders::SendersCommands>,
    },

    /// List supported institutions
    Institutions {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Structured logs go to stderr, filtered by SMSFIN_LOG (default: warn)
fn init_logging() {
    let filter = EnvFilter::try_from_env("SMSFIN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Parse { address, body, timestamp, json } => parse::run(&address, body, timestamp, json),
        Commands::Scan { inbox, limit, since_days, format, json, stats } => {
            let fmt = if json { "json".to_string() } else { format };
            scan::run(&inbox, limit, since_days, &fmt, stats)
        }
        Commands::Watch { inbox, json } => watch::run(inbox, json),
        Commands::Review { inbox, ledger, account, limit, since_days } => {
            review::run(&inbox, &ledger, account, limit, since_days)
        }
        Commands::Senders { command } => senders::run(command),
        Commands::Institutions { json } => institutions::run(json),
    }
}
