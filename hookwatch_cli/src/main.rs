//! Hookwatch CLI - Watch webhook requests arrive in real time
//!
//! Usage:
//!   hookwatch watch [URL]                  Open the live request viewer
//!   hookwatch watch --demo                 Watch generated sample requests
//!   hookwatch config show                  Print the effective configuration
//!   hookwatch config set-url <URL>         Set the capture server stream URL
//!   hookwatch config set-notifications <MODE>

mod commands;
mod config;
mod inspector;
mod notify;
mod stream;
mod tui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use notify::NotifyMode;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "hookwatch")]
#[command(author = "Hookwatch Team")]
#[command(version)]
#[command(about = "Watch webhook requests arrive in real time", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the live request viewer
    Watch {
        /// Event stream URL (defaults to the configured one)
        url: Option<String>,

        /// Generate sample requests instead of connecting to a server
        #[arg(long, conflicts_with = "url")]
        demo: bool,

        /// Override the notification mode for this session
        #[arg(long, value_enum)]
        notifications: Option<NotifyMode>,
    },

    /// View or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Set the capture server stream URL
    SetUrl {
        url: String,
    },

    /// Set the notification mode
    SetNotifications {
        #[arg(value_enum)]
        mode: NotifyMode,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Ensure config directories exist
    config::ensure_dirs()?;

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{},hookwatch_cli=info", log_level).into());

    match cli.command {
        Commands::Watch {
            url,
            demo,
            notifications,
        } => {
            // The TUI owns the terminal, so logs go to a file
            let log_path = config::logs_dir().join("hookwatch.log");
            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(log_file)),
                )
                .init();

            let opts = commands::watch::WatchOptions {
                url,
                demo,
                notifications,
            };
            commands::watch::run(opts).await?;
        }

        Commands::Config { action } => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().without_time())
                .init();

            match action {
                ConfigAction::Show => commands::config::show().await?,
                ConfigAction::SetUrl { url } => commands::config::set_url(&url).await?,
                ConfigAction::SetNotifications { mode } => {
                    commands::config::set_notifications(mode).await?
                }
            }
        }
    }

    Ok(())
}
