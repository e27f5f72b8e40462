//! CLI parser and config loading.

use anyhow::Result;
use clap::{Parser, Subcommand};
use rbot_rubika::RubikaConfig;

#[derive(Parser)]
#[command(name = "rbot")]
#[command(about = "Rubika Bot CLI: run the echo bot, show bot info, manage the webhook", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the echo bot with long polling (config from env; token can override RUBIKA_BOT_TOKEN).
    Run {
        #[arg(short, long)]
        token: Option<String>,
        /// Seconds between polling cycles (default RUBIKA_POLL_INTERVAL_SECS).
        #[arg(short, long)]
        interval: Option<u64>,
        /// Updates per request, 1..=100 (default RUBIKA_POLL_LIMIT).
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Print the bot's own info (getMe).
    Me {
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Webhook registration and serving.
    Webhook {
        #[command(subcommand)]
        command: WebhookCommands,
    },
}

#[derive(Subcommand)]
pub enum WebhookCommands {
    /// Point the bot's endpoints at URL (ReceiveUpdate and ReceiveInlineMessage unless --all).
    Set {
        url: String,
        /// Also register ReceiveQuery, GetSelectionItem and SearchSelectionItems.
        #[arg(long)]
        all: bool,
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Serve the echo bot behind an HTTP webhook.
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,
        #[arg(long, default_value = "/webhook")]
        path: String,
        #[arg(short, long)]
        token: Option<String>,
    },
}

/// Loads and validates RubikaConfig from the environment. If `token` is provided it overrides
/// RUBIKA_BOT_TOKEN / BOT_TOKEN.
pub fn load_config(token: Option<String>) -> Result<RubikaConfig> {
    let config = RubikaConfig::load(token)?;
    config.validate()?;
    Ok(config)
}
