//! # rbot-rubika
//!
//! Rubika Bot API layer: [`HttpTransport`] (reqwest), the typed [`BotClient`], the long-polling
//! [`Poller`], the webhook [`WebhookReceiver`] (axum) and the env-based [`RubikaConfig`].
//! Update handling itself lives in rbot-dispatch; this crate only moves updates in and replies out.

mod client;
mod config;
mod poller;
mod transport;
mod webhook;

pub use client::{BotClient, SendOptions, UpdateBatch};
pub use config::{
    RubikaConfig, DEFAULT_API_URL, DEFAULT_LOG_FILE, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_POLL_LIMIT,
    DEFAULT_TIMEOUT_SECS, MAX_POLL_LIMIT,
};
pub use poller::{Poller, PollingOptions};
pub use transport::HttpTransport;
pub use webhook::{set_webhook, unwrap_delivery, WebhookConfig, WebhookReceiver};
