//! CLI command definitions for the `duebot` binary.

pub mod remind;
pub mod tasks;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Personal task tracker with Telegram reminders.
#[derive(Parser)]
#[command(name = "duebot", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log one JSON object per event.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server and the reminder scheduler.
    Serve {
        /// Port to listen on (defaults to config).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to config).
        #[arg(long)]
        host: Option<String>,

        /// Do not run the reminder scheduler.
        #[arg(long)]
        no_reminders: bool,
    },

    /// Run the Telegram bot (long polling).
    Bot,

    /// Run one reminder sweep and print the result.
    Remind,

    /// List a user's tasks.
    Tasks {
        /// Telegram user id of the account.
        #[arg(long)]
        user: i64,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
