//! reqwest-backed [`Transport`]: `POST {api_url}/{token}/{method}` with a JSON body.
//!
//! Successful responses of shape `{"status": "OK", "data": {...}}` are unwrapped to `data`;
//! any other `status` becomes [`TransportError::Api`] carrying the platform's message.

use std::time::Duration;

use async_trait::async_trait;
use rbot_core::{Transport, TransportError};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::RubikaConfig;

const USER_AGENT: &str = concat!("rbot/", env!("CARGO_PKG_VERSION"));

pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Builds a transport for `api_url` (e.g. `https://botapi.rubika.ir/v3`) and `token`.
    pub fn new(api_url: &str, token: &str, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self {
            http,
            base_url: format!("{}/{}", api_url.trim_end_matches('/'), token),
        })
    }

    pub fn from_config(config: &RubikaConfig) -> Result<Self, TransportError> {
        Self::new(&config.api_url, &config.bot_token, config.timeout())
    }

    /// Underlying HTTP client; shared with the file uploader so both use the same timeout.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, body), fields(method = %method))]
    async fn call(&self, method: &str, body: Value) -> Result<Value, TransportError> {
        let url = format!("{}/{}", self.base_url, method);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "Bot API returned HTTP error");
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(map_reqwest_error)?;
        let payload: Value = serde_json::from_str(&text)
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;
        unwrap_envelope(payload, Some(status.as_u16()))
    }
}

/// Unwraps `{status, data}`. A body without `status` is returned unchanged.
pub(crate) fn unwrap_envelope(payload: Value, http_status: Option<u16>) -> Result<Value, TransportError> {
    let Some(status) = payload.get("status") else {
        return Ok(payload);
    };
    if status.as_str() != Some("OK") {
        let detail = payload
            .get("message")
            .or_else(|| payload.get("dev_message"))
            .and_then(Value::as_str)
            .unwrap_or_else(|| status.as_str().unwrap_or("Unknown error"))
            .to_string();
        return Err(TransportError::Api {
            message: format!("API Error: {detail}"),
            status: http_status,
            response: payload,
        });
    }
    match payload {
        Value::Object(mut object) => Ok(object.remove("data").unwrap_or(Value::Object(object))),
        other => Ok(other),
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_decode() {
        TransportError::MalformedResponse(err.to_string())
    } else if let Some(status) = err.status() {
        TransportError::HttpStatus {
            status: status.as_u16(),
        }
    } else {
        TransportError::Connection(err.to_string())
    }
}
