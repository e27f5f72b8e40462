//! rbot CLI: run the echo bot (polling or webhook), print bot info, register the webhook.
//! Config from env (.env loaded first) and optional CLI args.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rbot_cli::{echo, load_config, Cli, Commands, WebhookCommands};
use rbot_rubika::{set_webhook, BotClient, Poller, PollingOptions, WebhookConfig, WebhookReceiver};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token, interval, limit } => handle_run(token, interval, limit).await,
        Commands::Me { token } => handle_me(token).await,
        Commands::Webhook { command } => match command {
            WebhookCommands::Set { url, all, token } => handle_webhook_set(token, &url, all).await,
            WebhookCommands::Serve { addr, path, token } => {
                handle_webhook_serve(token, &addr, &path).await
            }
        },
    }
}

/// Polls until Ctrl-C.
async fn handle_run(token: Option<String>, interval: Option<u64>, limit: Option<u32>) -> Result<()> {
    let mut config = load_config(token)?;
    if let Some(interval) = interval {
        config.poll_interval_secs = interval;
    }
    if let Some(limit) = limit {
        config.poll_limit = limit;
    }
    rbot_core::init_tracing(&config.log_file)?;

    let client = Arc::new(BotClient::from_config(&config)?);
    publish_commands(&client).await;
    let dispatcher = echo::build_dispatcher(client.clone())?;
    let poller = Poller::new(client, dispatcher);

    let stopper = poller.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping");
            stopper.stop();
        }
    });

    poller
        .run(PollingOptions::from_config(&config))
        .await
        .context("Polling failed")?;
    Ok(())
}

async fn handle_me(token: Option<String>) -> Result<()> {
    let config = load_config(token)?;
    rbot_core::init_tracing(&config.log_file)?;
    let client = BotClient::from_config(&config)?;
    let bot = client.get_me().await.context("getMe")?;

    println!("bot_id:      {}", bot.bot_id);
    println!("title:       {}", bot.bot_title);
    println!("username:    @{}", bot.username);
    println!("description: {}", bot.description);
    if !bot.share_url.is_empty() {
        println!("share_url:   {}", bot.share_url);
    }
    Ok(())
}

async fn handle_webhook_set(token: Option<String>, url: &str, all: bool) -> Result<()> {
    let config = load_config(token)?;
    rbot_core::init_tracing(&config.log_file)?;
    let client = BotClient::from_config(&config)?;
    let webhook = if all { WebhookConfig::all() } else { WebhookConfig::default() };

    let applied = set_webhook(&client, url, &webhook).await?;
    for endpoint in applied {
        println!("{endpoint} -> {url}");
    }
    Ok(())
}

/// Serves the echo bot over HTTP until Ctrl-C.
async fn handle_webhook_serve(token: Option<String>, addr: &str, path: &str) -> Result<()> {
    let config = load_config(token)?;
    rbot_core::init_tracing(&config.log_file)?;

    let client = Arc::new(BotClient::from_config(&config)?);
    publish_commands(&client).await;
    let receiver = WebhookReceiver::new(echo::build_dispatcher(client)?);

    receiver
        .serve(addr, path, async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Ctrl-C received, shutting down webhook server");
        })
        .await
        .with_context(|| format!("Webhook server on {addr}"))?;
    Ok(())
}

async fn publish_commands(client: &BotClient) {
    if let Err(err) = client.set_commands(&echo::commands()).await {
        warn!(error = %err, "setCommands failed; continuing without a command menu");
    }
}
