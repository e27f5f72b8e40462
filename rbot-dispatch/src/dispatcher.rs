//! Event dispatcher: fan-out of one [`UpdateEvent`] to the registered handlers.
//!
//! Order per event: every "any update" observer, then the kind-specific route (command or generic
//! message handlers, inline handlers, or per-kind handlers). A failing or panicking handler is
//! reported to the [`ErrorHook`] and dispatch moves on to the next handler.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use rbot_core::{
    BotError, ErrorHook, FailureContext, FnHandler, HandlerResult, InlineHandler, InlineMessage,
    Message, MessageHandler, Result, TracingErrorHook, UpdateEvent, UpdateHandler, UpdateKind,
};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::command::{self, Route};
use crate::normalize::normalize;
use crate::registry::HandlerRegistry;

/// Shared, cheaply clonable dispatcher. Clones share registries and the error hook.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    error_hook: Arc<dyn ErrorHook>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Empty registries; failures are logged by [`TracingErrorHook`].
    pub fn new() -> Self {
        Self {
            registry: Arc::new(HandlerRegistry::default()),
            error_hook: Arc::new(TracingErrorHook),
        }
    }

    /// Replaces the error hook. Call during setup, before the dispatcher is shared.
    pub fn with_error_hook(mut self, hook: impl ErrorHook + 'static) -> Self {
        self.error_hook = Arc::new(hook);
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn error_hook(&self) -> &dyn ErrorHook {
        self.error_hook.as_ref()
    }

    /// Observer for every update, run before kind-specific handlers.
    pub fn on_update<F, Fut>(&self, f: F)
    where
        F: Fn(UpdateEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.registry.add_update_handler(Arc::new(FnHandler(f)));
    }

    /// Generic handler for new messages that are not recognized commands.
    pub fn on_message<F, Fut>(&self, f: F)
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.registry.add_message_handler(Arc::new(FnHandler(f)));
    }

    pub fn on_inline<F, Fut>(&self, f: F)
    where
        F: Fn(InlineMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.registry.add_inline_handler(Arc::new(FnHandler(f)));
    }

    /// Handler for `/command` (case-insensitive). Replaces an earlier handler for the same command.
    pub fn on_command<F, Fut>(&self, command: &str, f: F) -> Result<()>
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.registry.add_command(command, Arc::new(FnHandler(f)))
    }

    /// Handler for UpdatedMessage, RemovedMessage, StartedBot or StoppedBot.
    pub fn on_kind<F, Fut>(&self, kind: UpdateKind, f: F) -> Result<()>
    where
        F: Fn(UpdateEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.registry.add_kind_handler(kind, Arc::new(FnHandler(f)))
    }

    /// Normalizes and dispatches one raw update.
    ///
    /// Returns the dispatched kind, or `None` when the update was skipped (unknown type) or dropped
    /// (normalization failure, reported to the error hook).
    pub async fn process_update(&self, raw: &Value) -> Option<UpdateKind> {
        match normalize(raw) {
            Ok(Some(event)) => {
                self.dispatch(&event).await;
                Some(event.kind())
            }
            Ok(None) => {
                debug!(update_type = ?raw.get("type"), "Skipping update of unknown type");
                None
            }
            Err(err) => {
                self.error_hook
                    .on_error(&BotError::from(err), FailureContext::RawUpdate(raw));
                None
            }
        }
    }

    /// Processes a batch in order. Returns how many updates were dispatched.
    pub async fn process_updates(&self, updates: &[Value]) -> usize {
        let mut dispatched = 0;
        for raw in updates {
            if self.process_update(raw).await.is_some() {
                dispatched += 1;
            }
        }
        if !updates.is_empty() {
            info!(received = updates.len(), dispatched, "Processed update batch");
        }
        dispatched
    }

    /// Dispatches one event to every matching handler.
    #[instrument(skip(self, event), fields(update_kind = %event.kind(), chat_id = %event.chat_id()))]
    pub async fn dispatch(&self, event: &UpdateEvent) {
        for handler in self.registry.update_handlers() {
            self.guard(handler.handle(event), event).await;
        }

        match event {
            UpdateEvent::NewMessage { message, .. } => self.dispatch_message(event, message).await,
            UpdateEvent::InlineMessage(inline) => {
                for handler in self.registry.inline_handlers() {
                    self.guard(handler.handle(inline), event).await;
                }
            }
            UpdateEvent::UpdatedMessage { .. }
            | UpdateEvent::RemovedMessage { .. }
            | UpdateEvent::StartedBot { .. }
            | UpdateEvent::StoppedBot { .. } => {
                for handler in self.registry.kind_handlers(event.kind()) {
                    self.guard(handler.handle(event), event).await;
                }
            }
        }
    }

    async fn dispatch_message(&self, event: &UpdateEvent, message: &Message) {
        match command::route(&self.registry, message) {
            Route::Command { name, handler } => {
                debug!(command = %name, message_id = %message.message_id, "step: command handler");
                self.guard(handler.handle(message), event).await;
            }
            Route::Fallthrough(handlers) => {
                for handler in handlers {
                    self.guard(handler.handle(message), event).await;
                }
            }
        }
    }

    /// Awaits one handler, turning an `Err` or a panic into an error-hook report.
    async fn guard<Fut>(&self, fut: Fut, event: &UpdateEvent)
    where
        Fut: Future<Output = HandlerResult>,
    {
        let outcome = match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(anyhow::anyhow!("handler panicked: {}", panic_message(panic.as_ref()))),
        };
        if let Err(err) = outcome {
            self.error_hook
                .on_error(&BotError::Handler(err), FailureContext::Event(event));
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
