//! # rbot-cli
//!
//! CLI foundation: argument parsing, config loading and the echo demo bot.

pub mod cli;
pub mod echo;

pub use cli::{load_config, Cli, Commands, WebhookCommands};
pub use rbot_rubika::RubikaConfig;
