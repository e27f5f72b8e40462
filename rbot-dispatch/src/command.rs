//! Command router: `/name@bot args` → lookup of `name` in the command registry.

use std::sync::Arc;

use rbot_core::{Message, MessageHandler};

use crate::registry::HandlerRegistry;

/// Extracts the command name from message text.
///
/// The first whitespace-separated token must start with `/`; the slash is stripped, the name is
/// lower-cased and any `@botname` suffix is dropped. Empty names (`/`, `/@bot`) yield `None`.
pub fn parse_command(text: &str) -> Option<String> {
    if !text.starts_with('/') {
        return None;
    }
    let token = text.split_whitespace().next()?;
    let name = token
        .strip_prefix('/')?
        .split('@')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    (!name.is_empty()).then_some(name)
}

/// Everything after the command token, trimmed. Empty when there is no command or no arguments.
pub fn command_arguments(text: &str) -> &str {
    if parse_command(text).is_none() {
        return "";
    }
    let trimmed = text.trim_start();
    match trimmed.find(char::is_whitespace) {
        Some(idx) => trimmed[idx..].trim(),
        None => "",
    }
}

/// Registry key for a command given at registration time: `"/Start"` → `"start"`.
pub fn command_key(command: &str) -> String {
    let trimmed = command.trim();
    trimmed
        .strip_prefix('/')
        .unwrap_or(trimmed)
        .to_lowercase()
}

/// Where a new message goes.
pub enum Route {
    /// A registered command matched; only this handler runs.
    Command {
        name: String,
        handler: Arc<dyn MessageHandler>,
    },
    /// No command matched; every generic message handler runs in registration order.
    Fallthrough(Vec<Arc<dyn MessageHandler>>),
}

/// Resolves the route for `message` against `registry` (exact match only, no prefixes).
pub fn route(registry: &HandlerRegistry, message: &Message) -> Route {
    if let Some(name) = parse_command(&message.text) {
        if let Some(handler) = registry.command(&name) {
            return Route::Command { name, handler };
        }
    }
    Route::Fallthrough(registry.message_handlers())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rbot_core::HandlerResult;

    struct Noop;

    #[async_trait]
    impl MessageHandler for Noop {
        async fn handle(&self, _message: &Message) -> HandlerResult {
            Ok(())
        }
    }

    fn text_message(text: &str) -> Message {
        Message {
            text: text.to_string(),
            ..Message::default()
        }
    }

    #[test]
    fn test_parse_command_variants() {
        assert_eq!(parse_command("/start"), Some("start".to_string()));
        assert_eq!(parse_command("/Start now"), Some("start".to_string()));
        assert_eq!(parse_command("/help@my_bot"), Some("help".to_string()));
        assert_eq!(parse_command("/HELP@My_Bot please"), Some("help".to_string()));
        assert_eq!(parse_command("/start\tnow"), Some("start".to_string()));
    }

    #[test]
    fn test_parse_command_rejects_non_commands() {
        assert_eq!(parse_command("start"), None);
        assert_eq!(parse_command(" /start"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("/"), None);
        assert_eq!(parse_command("/@my_bot"), None);
        assert_eq!(parse_command("/ start"), None);
    }

    #[test]
    fn test_command_arguments() {
        assert_eq!(command_arguments("/echo hello world"), "hello world");
        assert_eq!(command_arguments("/echo@bot   spaced  "), "spaced");
        assert_eq!(command_arguments("/echo"), "");
        assert_eq!(command_arguments("plain text"), "");
    }

    #[test]
    fn test_command_key_normalizes() {
        assert_eq!(command_key("/Start"), "start");
        assert_eq!(command_key(" HELP "), "help");
    }

    #[test]
    fn test_route_exact_match_only() {
        let registry = HandlerRegistry::default();
        registry.add_command("start", Arc::new(Noop)).unwrap();
        registry.add_message_handler(Arc::new(Noop));

        assert!(matches!(
            route(&registry, &text_message("/start@bot")),
            Route::Command { ref name, .. } if name == "start"
        ));
        match route(&registry, &text_message("/starting")) {
            Route::Fallthrough(handlers) => assert_eq!(handlers.len(), 1),
            Route::Command { .. } => panic!("prefix must not match"),
        }
        assert!(matches!(route(&registry, &text_message("/")), Route::Fallthrough(_)));
    }
}
