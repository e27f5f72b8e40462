//! Echo demo bot: `/start` with an inline keypad, `/help`, `/echo <text>`, echo of plain messages
//! and replies to button clicks.

use std::sync::Arc;

use rbot_core::{BotCommand, HandlerResult, InlineMessage, Message, UpdateEvent, UpdateKind};
use rbot_dispatch::{command_arguments, Dispatcher};
use rbot_rubika::{BotClient, SendOptions};
use tracing::{debug, info};

pub const WELCOME_TEXT: &str = "Welcome! Send me anything and I will echo it back.";
pub const HELP_TEXT: &str = "Commands:\n/start - welcome message\n/help - this help\n/echo <text> - repeat text";
pub const ABOUT_TEXT: &str = "rbot echo demo, built on the Rubika Bot API.";

/// Commands published with `setCommands`.
pub fn commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Welcome message"),
        BotCommand::new("help", "List commands"),
        BotCommand::new("echo", "Repeat the given text"),
    ]
}

/// Builds a dispatcher wired to reply through `client`.
pub fn build_dispatcher(client: Arc<BotClient>) -> anyhow::Result<Dispatcher> {
    let dispatcher = Dispatcher::new();

    dispatcher.on_update(log_update);

    let c = client.clone();
    dispatcher.on_command("start", move |message| on_start(c.clone(), message))?;
    let c = client.clone();
    dispatcher.on_command("help", move |message| on_help(c.clone(), message))?;
    let c = client.clone();
    dispatcher.on_command("echo", move |message| on_echo(c.clone(), message))?;
    let c = client.clone();
    dispatcher.on_message(move |message| on_message(c.clone(), message));
    dispatcher.on_inline(move |inline| on_inline(client.clone(), inline));

    dispatcher.on_kind(UpdateKind::StartedBot, |event: UpdateEvent| async move {
        info!(chat_id = %event.chat_id(), "Bot started by user");
        Ok(())
    })?;
    dispatcher.on_kind(UpdateKind::StoppedBot, |event: UpdateEvent| async move {
        info!(chat_id = %event.chat_id(), "Bot stopped by user");
        Ok(())
    })?;

    Ok(dispatcher)
}

async fn log_update(event: UpdateEvent) -> HandlerResult {
    debug!(update_kind = %event.kind(), chat_id = %event.chat_id(), "Update received");
    Ok(())
}

async fn on_start(client: Arc<BotClient>, message: Message) -> HandlerResult {
    client
        .send_message_with_buttons(
            &message.chat_id,
            WELCOME_TEXT,
            vec![vec![("help", "Help"), ("about", "About")]],
            &SendOptions::default().reply_to(message.message_id.clone()),
        )
        .await?;
    Ok(())
}

async fn on_help(client: Arc<BotClient>, message: Message) -> HandlerResult {
    client
        .send_message(&message.chat_id, HELP_TEXT, &SendOptions::default())
        .await?;
    Ok(())
}

async fn on_echo(client: Arc<BotClient>, message: Message) -> HandlerResult {
    let text = command_arguments(&message.text);
    let reply = if text.is_empty() { "Usage: /echo <text>" } else { text };
    client
        .send_message(&message.chat_id, reply, &SendOptions::default())
        .await?;
    Ok(())
}

async fn on_message(client: Arc<BotClient>, message: Message) -> HandlerResult {
    let Some(reply) = echo_reply(&message) else {
        return Ok(());
    };
    client
        .send_message(
            &message.chat_id,
            &reply,
            &SendOptions::default().reply_to(message.message_id.clone()),
        )
        .await?;
    Ok(())
}

async fn on_inline(client: Arc<BotClient>, inline: InlineMessage) -> HandlerResult {
    let Some(button_id) = inline.button_id.as_deref() else {
        return Ok(());
    };
    let reply = match button_id {
        "help" => HELP_TEXT.to_string(),
        "about" => ABOUT_TEXT.to_string(),
        other => format!("You pressed {other}"),
    };
    client
        .send_message(&inline.chat_id, &reply, &SendOptions::default())
        .await?;
    Ok(())
}

/// Reply for a non-command message, or `None` when there is nothing to echo.
pub fn echo_reply(message: &Message) -> Option<String> {
    if !message.text.is_empty() {
        return Some(format!("You said: {}", message.text));
    }
    if let Some(file) = &message.file {
        return Some(format!("Got your file {}", file.file_name));
    }
    if let Some(location) = &message.location {
        return Some(format!(
            "You are at {}, {}",
            location.latitude, location.longitude
        ));
    }
    if let Some(poll) = &message.poll {
        return Some(format!("Nice poll: {}", poll.question));
    }
    None
}
