//! Webhook update source: endpoint registration and the HTTP receiver.
//!
//! Each POSTed update is normalized and dispatched on its own; there is no cursor. Concurrent
//! deliveries are dispatched concurrently.

use std::future::Future;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use rbot_core::{BotError, Result, UpdateEndpointType, UpdateKind};
use rbot_dispatch::Dispatcher;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::client::BotClient;

/// Which endpoint categories [`set_webhook`] points at the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebhookConfig {
    pub receive_update: bool,
    pub receive_inline_message: bool,
    pub receive_query: bool,
    pub get_selection_item: bool,
    pub search_selection_items: bool,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            receive_update: true,
            receive_inline_message: true,
            receive_query: false,
            get_selection_item: false,
            search_selection_items: false,
        }
    }
}

impl WebhookConfig {
    /// Every endpoint category enabled.
    pub fn all() -> Self {
        Self {
            receive_update: true,
            receive_inline_message: true,
            receive_query: true,
            get_selection_item: true,
            search_selection_items: true,
        }
    }

    /// Enabled categories in registration order.
    pub fn endpoints(&self) -> Vec<UpdateEndpointType> {
        [
            (self.receive_update, UpdateEndpointType::ReceiveUpdate),
            (self.receive_inline_message, UpdateEndpointType::ReceiveInlineMessage),
            (self.receive_query, UpdateEndpointType::ReceiveQuery),
            (self.get_selection_item, UpdateEndpointType::GetSelectionItem),
            (self.search_selection_items, UpdateEndpointType::SearchSelectionItems),
        ]
        .into_iter()
        .filter_map(|(enabled, endpoint)| enabled.then_some(endpoint))
        .collect()
    }
}

/// Registers `url` for every enabled endpoint category, one `updateBotEndpoints` call each.
///
/// Every call is attempted. If any fails, [`BotError::Webhook`] lists what was applied and what
/// failed; applied endpoints are not rolled back. An invalid URL fails before any call.
#[instrument(skip(client, config))]
pub async fn set_webhook(
    client: &BotClient,
    url: &str,
    config: &WebhookConfig,
) -> Result<Vec<UpdateEndpointType>> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(BotError::validation(format!("Invalid URL: {url:?}")));
    }
    let mut applied = Vec::new();
    let mut failed = Vec::new();
    for endpoint in config.endpoints() {
        match client.update_bot_endpoints(url, endpoint).await {
            Ok(()) => {
                debug!(endpoint = %endpoint, "Webhook endpoint updated");
                applied.push(endpoint);
            }
            Err(err) => {
                warn!(endpoint = %endpoint, error = %err, "Webhook endpoint update failed");
                failed.push((endpoint, err.to_string()));
            }
        }
    }
    if failed.is_empty() {
        info!(endpoints = applied.len(), "Webhook set");
        Ok(applied)
    } else {
        Err(BotError::Webhook { applied, failed })
    }
}

/// Feeds webhook deliveries into a [`Dispatcher`]. Cheap to clone.
#[derive(Clone)]
pub struct WebhookReceiver {
    dispatcher: Dispatcher,
}

impl WebhookReceiver {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Normalizes and dispatches exactly one update. Returns the dispatched kind, if any.
    pub async fn receive(&self, raw: &Value) -> Option<UpdateKind> {
        self.dispatcher.process_update(raw).await
    }

    /// axum router: `POST {path}` receives updates, `GET /healthz` answers `ok`.
    pub fn router(self, path: &str) -> Router {
        Router::new()
            .route(path, post(handle_update))
            .route("/healthz", get(handle_health))
            .with_state(self)
    }

    /// Serves [`WebhookReceiver::router`] on `addr` until `shutdown` resolves.
    pub async fn serve<S>(self, addr: &str, path: &str, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(addr = %addr, path = %path, "Webhook server listening");
        axum::serve(listener, self.router(path))
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

/// Accepts both a bare update and the `{"update": {...}}` / `{"inline_message": {...}}` wrappers
/// the platform posts to the two endpoint categories.
pub fn unwrap_delivery(body: Value) -> Value {
    let Value::Object(mut object) = body else {
        return body;
    };
    if let Some(Value::Object(update)) = object.remove("update") {
        return Value::Object(update);
    }
    if !object.contains_key("type") && object.get("inline_message").is_some_and(Value::is_object) {
        object.insert("type".to_string(), json!(UpdateKind::InlineMessage.as_str()));
    }
    Value::Object(object)
}

async fn handle_update(
    State(receiver): State<WebhookReceiver>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !body.is_object() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"status": "ERROR", "message": "update must be a JSON object"})),
        );
    }
    let update = unwrap_delivery(body);
    let kind = receiver.receive(&update).await;
    debug!(update_kind = ?kind, "Webhook delivery handled");
    (StatusCode::OK, Json(json!({"status": "OK"})))
}

async fn handle_health() -> &'static str {
    "ok"
}
