//! Minimal framework config: token, API URL, HTTP timeout, polling defaults, log path.
//! Loaded from RUBIKA_BOT_TOKEN (or BOT_TOKEN), RUBIKA_API_URL, RUBIKA_TIMEOUT_SECS,
//! RUBIKA_POLL_INTERVAL_SECS, RUBIKA_POLL_LIMIT and LOG_FILE.

use std::env;
use std::time::Duration;

use rbot_core::{BotError, Result};

pub const DEFAULT_API_URL: &str = "https://botapi.rubika.ir/v3";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_POLL_LIMIT: u32 = 100;
pub const DEFAULT_LOG_FILE: &str = "logs/rubika-bot.log";
/// Largest page the getUpdates endpoint accepts.
pub const MAX_POLL_LIMIT: u32 = 100;

#[derive(Debug, Clone)]
pub struct RubikaConfig {
    pub bot_token: String,
    pub api_url: String,
    pub timeout_secs: u64,
    pub poll_interval_secs: u64,
    pub poll_limit: u32,
    pub log_file: String,
}

impl RubikaConfig {
    /// Loads from the environment. The token is required; everything else has a default.
    /// Unparseable numbers are a config error rather than a silent default.
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Like [`RubikaConfig::from_env`], but a given `token` overrides RUBIKA_BOT_TOKEN / BOT_TOKEN.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(token) => token,
            None => env::var("RUBIKA_BOT_TOKEN")
                .or_else(|_| env::var("BOT_TOKEN"))
                .map_err(|_| BotError::Config("RUBIKA_BOT_TOKEN (or BOT_TOKEN) not set".to_string()))?,
        };
        let api_url = env::var("RUBIKA_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let timeout_secs = parse_var("RUBIKA_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let poll_interval_secs = parse_var("RUBIKA_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        let poll_limit = parse_var("RUBIKA_POLL_LIMIT", DEFAULT_POLL_LIMIT)?;
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());

        Ok(Self {
            bot_token,
            api_url,
            timeout_secs,
            poll_interval_secs,
            poll_limit,
            log_file,
        })
    }

    /// Builds a config with the given token and defaults for everything else.
    pub fn with_token(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            poll_limit: DEFAULT_POLL_LIMIT,
            log_file: DEFAULT_LOG_FILE.to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            return Err(BotError::Config("bot token is empty".to_string()));
        }
        if reqwest::Url::parse(&self.api_url).is_err() {
            return Err(BotError::Config(format!(
                "RUBIKA_API_URL is set but not a valid URL: {}",
                self.api_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(BotError::Config("RUBIKA_TIMEOUT_SECS must be positive".to_string()));
        }
        if !(1..=MAX_POLL_LIMIT).contains(&self.poll_limit) {
            return Err(BotError::Config(format!(
                "RUBIKA_POLL_LIMIT must be between 1 and {MAX_POLL_LIMIT}, got {}",
                self.poll_limit
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| BotError::Config(format!("{name} is not a valid number: {raw}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 7] = [
        "RUBIKA_BOT_TOKEN",
        "BOT_TOKEN",
        "RUBIKA_API_URL",
        "RUBIKA_TIMEOUT_SECS",
        "RUBIKA_POLL_INTERVAL_SECS",
        "RUBIKA_POLL_LIMIT",
        "LOG_FILE",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_with_token() {
        let config = RubikaConfig::with_token("test_token");
        assert_eq!(config.bot_token, "test_token");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.poll_limit, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_with_defaults() {
        clear_env();
        env::set_var("BOT_TOKEN", "fallback_token");

        let config = RubikaConfig::from_env().unwrap();

        assert_eq!(config.bot_token, "fallback_token");
        assert_eq!(config.api_url, "https://botapi.rubika.ir/v3");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.poll_limit, 100);
        assert_eq!(config.log_file, "logs/rubika-bot.log");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_with_custom_values() {
        clear_env();
        env::set_var("BOT_TOKEN", "fallback_token");
        env::set_var("RUBIKA_BOT_TOKEN", "primary_token");
        env::set_var("RUBIKA_API_URL", "http://127.0.0.1:9000");
        env::set_var("RUBIKA_TIMEOUT_SECS", "5");
        env::set_var("RUBIKA_POLL_INTERVAL_SECS", "1");
        env::set_var("RUBIKA_POLL_LIMIT", "20");
        env::set_var("LOG_FILE", "/tmp/bot.log");

        let config = RubikaConfig::from_env().unwrap();

        assert_eq!(config.bot_token, "primary_token");
        assert_eq!(config.api_url, "http://127.0.0.1:9000");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.poll_interval_secs, 1);
        assert_eq!(config.poll_limit, 20);
        assert_eq!(config.log_file, "/tmp/bot.log");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_missing_token() {
        clear_env();
        assert!(matches!(RubikaConfig::from_env(), Err(BotError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_load_with_override_token() {
        clear_env();
        env::set_var("RUBIKA_BOT_TOKEN", "env_token");

        let config = RubikaConfig::load(Some("override_token".to_string())).unwrap();
        assert_eq!(config.bot_token, "override_token");

        clear_env();
        assert!(RubikaConfig::load(Some("only_cli".to_string())).is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_number() {
        clear_env();
        env::set_var("BOT_TOKEN", "t");
        env::set_var("RUBIKA_POLL_LIMIT", "many");

        assert!(RubikaConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = RubikaConfig::with_token("t");
        config.api_url = "not-a-valid-url".to_string();
        assert!(config.validate().is_err());

        let mut config = RubikaConfig::with_token("t");
        config.poll_limit = 101;
        assert!(config.validate().is_err());

        let mut config = RubikaConfig::with_token("t");
        config.poll_limit = 0;
        assert!(config.validate().is_err());

        assert!(RubikaConfig::with_token("  ").validate().is_err());
    }
}
