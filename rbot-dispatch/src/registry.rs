//! Handler registries: append-only lists per event kind plus the command table.
//!
//! Registration takes a write lock for one push/insert; dispatch takes a read lock only long enough
//! to clone the `Arc`s it needs, so no lock is held across a handler `.await`.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rbot_core::{BotError, InlineHandler, MessageHandler, Result, UpdateHandler, UpdateKind};
use tracing::{debug, warn};

use crate::command::command_key;

#[derive(Default)]
pub struct HandlerRegistry {
    update_handlers: RwLock<Vec<Arc<dyn UpdateHandler>>>,
    message_handlers: RwLock<Vec<Arc<dyn MessageHandler>>>,
    inline_handlers: RwLock<Vec<Arc<dyn InlineHandler>>>,
    command_handlers: RwLock<HashMap<String, Arc<dyn MessageHandler>>>,
    kind_handlers: RwLock<HashMap<UpdateKind, Vec<Arc<dyn UpdateHandler>>>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl HandlerRegistry {
    /// Appends an observer that sees every update before kind-specific routing.
    pub fn add_update_handler(&self, handler: Arc<dyn UpdateHandler>) {
        write(&self.update_handlers).push(handler);
    }

    /// Appends a generic handler for new messages that are not recognized commands.
    pub fn add_message_handler(&self, handler: Arc<dyn MessageHandler>) {
        write(&self.message_handlers).push(handler);
    }

    pub fn add_inline_handler(&self, handler: Arc<dyn InlineHandler>) {
        write(&self.inline_handlers).push(handler);
    }

    /// Registers the handler for `command` (case-insensitive, leading `/` optional).
    /// A later registration for the same command replaces the earlier one.
    pub fn add_command(&self, command: &str, handler: Arc<dyn MessageHandler>) -> Result<()> {
        let key = command_key(command);
        if key.is_empty() || key.contains(char::is_whitespace) || key.contains('@') {
            return Err(BotError::validation(format!("Invalid command name: {command:?}")));
        }
        if write(&self.command_handlers).insert(key.clone(), handler).is_some() {
            warn!(command = %key, "Command handler replaced");
        } else {
            debug!(command = %key, "Command handler registered");
        }
        Ok(())
    }

    /// Appends a handler for one of the kinds without a dedicated registry
    /// (UpdatedMessage, RemovedMessage, StartedBot, StoppedBot).
    pub fn add_kind_handler(&self, kind: UpdateKind, handler: Arc<dyn UpdateHandler>) -> Result<()> {
        if matches!(kind, UpdateKind::NewMessage | UpdateKind::InlineMessage) {
            return Err(BotError::validation(format!(
                "{kind} has a dedicated registry; use the message/inline handlers"
            )));
        }
        write(&self.kind_handlers).entry(kind).or_default().push(handler);
        Ok(())
    }

    pub fn update_handlers(&self) -> Vec<Arc<dyn UpdateHandler>> {
        read(&self.update_handlers).clone()
    }

    pub fn message_handlers(&self) -> Vec<Arc<dyn MessageHandler>> {
        read(&self.message_handlers).clone()
    }

    pub fn inline_handlers(&self) -> Vec<Arc<dyn InlineHandler>> {
        read(&self.inline_handlers).clone()
    }

    /// Exact lookup of an already-normalized command name.
    pub fn command(&self, name: &str) -> Option<Arc<dyn MessageHandler>> {
        read(&self.command_handlers).get(name).cloned()
    }

    pub fn kind_handlers(&self, kind: UpdateKind) -> Vec<Arc<dyn UpdateHandler>> {
        read(&self.kind_handlers)
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    /// Registered command names, sorted.
    pub fn commands(&self) -> Vec<String> {
        let mut names: Vec<String> = read(&self.command_handlers).keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rbot_core::{HandlerResult, Message, UpdateEvent};

    struct Noop;

    #[async_trait]
    impl MessageHandler for Noop {
        async fn handle(&self, _message: &Message) -> HandlerResult {
            Ok(())
        }
    }

    #[async_trait]
    impl UpdateHandler for Noop {
        async fn handle(&self, _event: &UpdateEvent) -> HandlerResult {
            Ok(())
        }
    }

    #[test]
    fn test_commands_are_case_insensitive() {
        let registry = HandlerRegistry::default();
        registry.add_command("/Start", Arc::new(Noop)).unwrap();
        registry.add_command("HELP", Arc::new(Noop)).unwrap();

        assert!(registry.command("start").is_some());
        assert!(registry.command("help").is_some());
        assert!(registry.command("Start").is_none());
        assert_eq!(registry.commands(), vec!["help", "start"]);
    }

    #[test]
    fn test_invalid_command_names_rejected() {
        let registry = HandlerRegistry::default();
        assert!(registry.add_command("/", Arc::new(Noop)).is_err());
        assert!(registry.add_command("two words", Arc::new(Noop)).is_err());
        assert!(registry.add_command("start@bot", Arc::new(Noop)).is_err());
        assert!(registry.commands().is_empty());
    }

    #[test]
    fn test_kind_handlers_reject_dedicated_kinds() {
        let registry = HandlerRegistry::default();
        assert!(registry.add_kind_handler(UpdateKind::NewMessage, Arc::new(Noop)).is_err());
        assert!(registry.add_kind_handler(UpdateKind::InlineMessage, Arc::new(Noop)).is_err());
        registry.add_kind_handler(UpdateKind::StartedBot, Arc::new(Noop)).unwrap();
        registry.add_kind_handler(UpdateKind::StartedBot, Arc::new(Noop)).unwrap();

        assert_eq!(registry.kind_handlers(UpdateKind::StartedBot).len(), 2);
        assert!(registry.kind_handlers(UpdateKind::StoppedBot).is_empty());
    }

    #[test]
    fn test_snapshots_are_independent_of_later_registration() {
        let registry = HandlerRegistry::default();
        registry.add_message_handler(Arc::new(Noop));
        let snapshot = registry.message_handlers();
        registry.add_message_handler(Arc::new(Noop));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.message_handlers().len(), 2);
    }
}
