//! Handler traits invoked by the dispatcher, and the error hook that receives suppressed failures.
//!
//! Handlers return `anyhow::Result<()>`; an `Err` never stops dispatch, it is reported to the
//! [`ErrorHook`] and dropped.

use std::future::Future;

use async_trait::async_trait;
use serde_json::Value;
use tracing::error;

use crate::error::BotError;
use crate::types::{InlineMessage, Message, UpdateEvent};

pub type HandlerResult = anyhow::Result<()>;

/// Receives new chat messages (generic message handlers and command handlers).
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &Message) -> HandlerResult;
}

/// Receives inline button clicks.
#[async_trait]
pub trait InlineHandler: Send + Sync {
    async fn handle(&self, inline: &InlineMessage) -> HandlerResult;
}

/// Receives whole events: "any update" observers and per-kind handlers.
#[async_trait]
pub trait UpdateHandler: Send + Sync {
    async fn handle(&self, event: &UpdateEvent) -> HandlerResult;
}

/// Adapts an async closure taking an owned payload into a handler.
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(Message) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn handle(&self, message: &Message) -> HandlerResult {
        (self.0)(message.clone()).await
    }
}

#[async_trait]
impl<F, Fut> InlineHandler for FnHandler<F>
where
    F: Fn(InlineMessage) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn handle(&self, inline: &InlineMessage) -> HandlerResult {
        (self.0)(inline.clone()).await
    }
}

#[async_trait]
impl<F, Fut> UpdateHandler for FnHandler<F>
where
    F: Fn(UpdateEvent) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn handle(&self, event: &UpdateEvent) -> HandlerResult {
        (self.0)(event.clone()).await
    }
}

/// Where a suppressed failure came from.
#[derive(Debug, Clone, Copy)]
pub enum FailureContext<'a> {
    /// A handler failed while processing this event.
    Event(&'a UpdateEvent),
    /// This raw update could not be normalized and was dropped.
    RawUpdate(&'a Value),
    /// A polling cycle failed (fetch or bot-info lookup).
    Polling,
}

/// Single sink for handler, normalization and polling failures.
pub trait ErrorHook: Send + Sync {
    fn on_error(&self, error: &BotError, context: FailureContext<'_>);
}

impl<F> ErrorHook for F
where
    F: Fn(&BotError, FailureContext<'_>) + Send + Sync,
{
    fn on_error(&self, error: &BotError, context: FailureContext<'_>) {
        self(error, context)
    }
}

/// Default hook: logs every failure at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorHook;

impl ErrorHook for TracingErrorHook {
    fn on_error(&self, err: &BotError, context: FailureContext<'_>) {
        match context {
            FailureContext::Event(event) => error!(
                error = %err,
                update_kind = %event.kind(),
                chat_id = %event.chat_id(),
                "Handler failed"
            ),
            FailureContext::RawUpdate(raw) => error!(
                error = %err,
                update_type = ?raw.get("type"),
                "Dropped update that could not be normalized"
            ),
            FailureContext::Polling => error!(error = %err, "Polling cycle failed"),
        }
    }
}
