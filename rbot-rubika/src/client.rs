//! Typed Bot API client over a [`Transport`].
//!
//! Every method validates its inputs before any network call (empty chat ids, empty text, poll
//! option counts, endpoint URLs) and maps transport faults into [`BotError`].

use std::path::Path;
use std::sync::Arc;

use rbot_core::wire::lenient_opt_string;
use rbot_core::{
    BotCommand, BotError, BotInfo, Chat, ChatKeypadType, FileType, Keypad, Result, Transport,
    TransportError, UpdateEndpointType,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::config::{RubikaConfig, MAX_POLL_LIMIT};
use crate::transport::{map_reqwest_error, HttpTransport};

/// Optional parts shared by the send* methods.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub inline_keypad: Option<Keypad>,
    pub chat_keypad: Option<Keypad>,
    pub chat_keypad_type: Option<ChatKeypadType>,
    pub reply_to_message_id: Option<String>,
    pub disable_notification: bool,
}

impl SendOptions {
    pub fn inline_keypad(mut self, keypad: Keypad) -> Self {
        self.inline_keypad = Some(keypad);
        self
    }

    /// Sets the chat keypad and its type (`New` shows it, `Remove` hides it).
    pub fn chat_keypad(mut self, keypad: Keypad, keypad_type: ChatKeypadType) -> Self {
        self.chat_keypad = Some(keypad);
        self.chat_keypad_type = Some(keypad_type);
        self
    }

    pub fn reply_to(mut self, message_id: impl Into<String>) -> Self {
        self.reply_to_message_id = Some(message_id.into());
        self
    }

    pub fn silent(mut self) -> Self {
        self.disable_notification = true;
        self
    }

    fn apply(&self, body: &mut Map<String, Value>) -> Result<()> {
        body.insert(
            "disable_notification".to_string(),
            Value::Bool(self.disable_notification),
        );
        if let Some(keypad) = self.inline_keypad.as_ref().filter(|k| !k.is_empty()) {
            body.insert("inline_keypad".to_string(), to_value(keypad)?);
        }
        if let Some(keypad) = self.chat_keypad.as_ref().filter(|k| !k.is_empty()) {
            body.insert("chat_keypad".to_string(), to_value(keypad)?);
        }
        if let Some(keypad_type) = self.chat_keypad_type {
            body.insert("chat_keypad_type".to_string(), to_value(&keypad_type)?);
        }
        if let Some(reply_to) = self.reply_to_message_id.as_deref().filter(|id| !id.is_empty()) {
            body.insert("reply_to_message_id".to_string(), Value::String(reply_to.to_string()));
        }
        Ok(())
    }
}

/// One page of `getUpdates`. `next_offset_id` is passed back verbatim on the next request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBatch {
    #[serde(default)]
    pub updates: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub next_offset_id: Option<String>,
}

pub struct BotClient {
    transport: Arc<dyn Transport>,
    http: reqwest::Client,
    bot_info: RwLock<Option<BotInfo>>,
}

impl BotClient {
    /// Client over any transport. File uploads use a default `reqwest::Client`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            http: reqwest::Client::new(),
            bot_info: RwLock::new(None),
        }
    }

    /// Client over [`HttpTransport`]; uploads share its HTTP client.
    pub fn from_config(config: &RubikaConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(config)?;
        let http = transport.http_client().clone();
        Ok(Self {
            transport: Arc::new(transport),
            http,
            bot_info: RwLock::new(None),
        })
    }

    /// Replaces the HTTP client used for multipart uploads.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    async fn request(&self, method: &str, body: Value) -> Result<Value> {
        debug!(method, "Bot API request");
        Ok(self.transport.call(method, body).await?)
    }

    pub async fn get_me(&self) -> Result<BotInfo> {
        let data = self.request("getMe", json!({})).await?;
        match data.get("bot") {
            Some(bot) if !bot.is_null() => decode(bot.clone()),
            _ => Ok(BotInfo::default()),
        }
    }

    /// Cached bot info; fetched with `getMe` on first use only.
    pub async fn bot_info(&self) -> Result<BotInfo> {
        if let Some(info) = self.bot_info.read().await.as_ref() {
            return Ok(info.clone());
        }
        self.refresh_bot_info().await
    }

    /// Re-fetches bot info and replaces the cached value.
    pub async fn refresh_bot_info(&self) -> Result<BotInfo> {
        let info = self.get_me().await?;
        *self.bot_info.write().await = Some(info.clone());
        Ok(info)
    }

    /// Sends a text message. Returns the new message id.
    #[instrument(skip(self, text, options))]
    pub async fn send_message(&self, chat_id: &str, text: &str, options: &SendOptions) -> Result<String> {
        require_chat_id(chat_id)?;
        require_text(text)?;
        let mut body = Map::new();
        body.insert("chat_id".to_string(), json!(chat_id));
        body.insert("text".to_string(), json!(text));
        options.apply(&mut body)?;

        let data = self.request("sendMessage", Value::Object(body)).await?;
        let message_id = string_field(&data, "message_id");
        info!(message_id = %message_id, "Message sent");
        Ok(message_id)
    }

    /// Sends `text` with an inline keypad of simple buttons given as `(id, text)` rows.
    pub async fn send_message_with_buttons<R, B, S>(
        &self,
        chat_id: &str,
        text: &str,
        rows: R,
        options: &SendOptions,
    ) -> Result<String>
    where
        R: IntoIterator<Item = B>,
        B: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let options = options.clone().inline_keypad(Keypad::simple(rows));
        self.send_message(chat_id, text, &options).await
    }

    #[instrument(skip(self, question, options))]
    pub async fn send_poll<S: AsRef<str>>(&self, chat_id: &str, question: &str, options: &[S]) -> Result<String> {
        require_chat_id(chat_id)?;
        if question.is_empty() {
            return Err(BotError::validation("Poll question cannot be empty"));
        }
        if options.len() < 2 {
            return Err(BotError::validation("Poll must have at least 2 options"));
        }
        let options: Vec<&str> = options.iter().map(AsRef::as_ref).collect();
        let data = self
            .request(
                "sendPoll",
                json!({"chat_id": chat_id, "question": question, "options": options}),
            )
            .await?;
        Ok(string_field(&data, "message_id"))
    }

    pub async fn send_location(
        &self,
        chat_id: &str,
        latitude: &str,
        longitude: &str,
        options: &SendOptions,
    ) -> Result<String> {
        require_chat_id(chat_id)?;
        let mut body = Map::new();
        body.insert("chat_id".to_string(), json!(chat_id));
        body.insert("latitude".to_string(), json!(latitude));
        body.insert("longitude".to_string(), json!(longitude));
        options.apply(&mut body)?;
        let data = self.request("sendLocation", Value::Object(body)).await?;
        Ok(string_field(&data, "message_id"))
    }

    pub async fn send_contact(
        &self,
        chat_id: &str,
        first_name: &str,
        last_name: &str,
        phone_number: &str,
        options: &SendOptions,
    ) -> Result<String> {
        require_chat_id(chat_id)?;
        let mut body = Map::new();
        body.insert("chat_id".to_string(), json!(chat_id));
        body.insert("first_name".to_string(), json!(first_name));
        body.insert("last_name".to_string(), json!(last_name));
        body.insert("phone_number".to_string(), json!(phone_number));
        options.apply(&mut body)?;
        let data = self.request("sendContact", Value::Object(body)).await?;
        Ok(string_field(&data, "message_id"))
    }

    pub async fn get_chat(&self, chat_id: &str) -> Result<Chat> {
        require_chat_id(chat_id)?;
        let data = self.request("getChat", json!({"chat_id": chat_id})).await?;
        match data.get("chat") {
            Some(chat) if !chat.is_null() => decode(chat.clone()),
            _ => Ok(Chat::default()),
        }
    }

    /// Fetches up to `limit` (1..=100) updates after `offset_id`.
    pub async fn get_updates(&self, limit: u32, offset_id: Option<&str>) -> Result<UpdateBatch> {
        validate_limit(limit)?;
        let mut body = json!({ "limit": limit });
        if let Some(offset_id) = offset_id.filter(|id| !id.is_empty()) {
            body["offset_id"] = json!(offset_id);
        }
        let data = self.request("getUpdates", body).await?;
        decode(data)
    }

    /// Forwards a message. Returns the id of the new message in `to_chat_id`.
    pub async fn forward_message(
        &self,
        from_chat_id: &str,
        message_id: &str,
        to_chat_id: &str,
        disable_notification: bool,
    ) -> Result<String> {
        require_chat_id(from_chat_id)?;
        require_chat_id(to_chat_id)?;
        let data = self
            .request(
                "forwardMessage",
                json!({
                    "from_chat_id": from_chat_id,
                    "message_id": message_id,
                    "to_chat_id": to_chat_id,
                    "disable_notification": disable_notification,
                }),
            )
            .await?;
        Ok(string_field(&data, "new_message_id"))
    }

    pub async fn edit_message_text(&self, chat_id: &str, message_id: &str, text: &str) -> Result<()> {
        require_chat_id(chat_id)?;
        require_text(text)?;
        self.request(
            "editMessageText",
            json!({"chat_id": chat_id, "message_id": message_id, "text": text}),
        )
        .await?;
        Ok(())
    }

    pub async fn edit_inline_keypad(&self, chat_id: &str, message_id: &str, keypad: &Keypad) -> Result<()> {
        require_chat_id(chat_id)?;
        self.request(
            "editInlineKeypad",
            json!({"chat_id": chat_id, "message_id": message_id, "inline_keypad": to_value(keypad)?}),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_message(&self, chat_id: &str, message_id: &str) -> Result<()> {
        require_chat_id(chat_id)?;
        self.request("deleteMessage", json!({"chat_id": chat_id, "message_id": message_id}))
            .await?;
        Ok(())
    }

    pub async fn set_commands(&self, commands: &[BotCommand]) -> Result<()> {
        if commands.is_empty() {
            return Err(BotError::validation("Commands list cannot be empty"));
        }
        self.request("setCommands", json!({ "bot_commands": commands }))
            .await?;
        Ok(())
    }

    /// Points one endpoint category at `url` (must be http:// or https://).
    pub async fn update_bot_endpoints(&self, url: &str, endpoint_type: UpdateEndpointType) -> Result<()> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(BotError::validation(format!("Invalid URL: {url:?}")));
        }
        self.request(
            "updateBotEndpoints",
            json!({"url": url, "type": endpoint_type.as_str()}),
        )
        .await?;
        Ok(())
    }

    /// Shows, replaces or removes the chat keypad. The keypad is only sent with `ChatKeypadType::New`.
    pub async fn edit_chat_keypad(
        &self,
        chat_id: &str,
        keypad_type: ChatKeypadType,
        keypad: Option<&Keypad>,
    ) -> Result<()> {
        require_chat_id(chat_id)?;
        let mut body = json!({"chat_id": chat_id, "chat_keypad_type": to_value(&keypad_type)?});
        if let (ChatKeypadType::New, Some(keypad)) = (keypad_type, keypad) {
            body["chat_keypad"] = to_value(keypad)?;
        }
        self.request("editChatKeypad", body).await?;
        Ok(())
    }

    /// Download URL of an uploaded file.
    pub async fn get_file(&self, file_id: &str) -> Result<String> {
        if file_id.is_empty() {
            return Err(BotError::validation("File ID cannot be empty"));
        }
        let data = self.request("getFile", json!({ "file_id": file_id })).await?;
        Ok(string_field(&data, "download_url"))
    }

    /// Sends an already uploaded file (`file_id` from [`BotClient::upload_file`]) with an optional caption.
    pub async fn send_file(
        &self,
        chat_id: &str,
        file_id: &str,
        text: &str,
        options: &SendOptions,
    ) -> Result<String> {
        require_chat_id(chat_id)?;
        if file_id.is_empty() {
            return Err(BotError::validation("File ID cannot be empty"));
        }
        let mut body = Map::new();
        body.insert("chat_id".to_string(), json!(chat_id));
        body.insert("file_id".to_string(), json!(file_id));
        body.insert("text".to_string(), json!(text));
        options.apply(&mut body)?;
        let data = self.request("sendFile", Value::Object(body)).await?;
        Ok(string_field(&data, "message_id"))
    }

    /// Asks for an upload URL for a file of `file_type`.
    pub async fn request_send_file(&self, file_type: FileType) -> Result<String> {
        let data = self
            .request("requestSendFile", json!({ "type": file_type.as_str() }))
            .await?;
        let upload_url = string_field(&data, "upload_url");
        if upload_url.is_empty() {
            return Err(BotError::Upload("Failed to get upload URL".to_string()));
        }
        Ok(upload_url)
    }

    /// Uploads a local file: requests an upload URL, then POSTs the bytes as multipart field `file`.
    /// The type is guessed from the extension when not given. Returns the platform file id.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn upload_file(&self, path: &Path, file_type: Option<FileType>) -> Result<String> {
        if !path.is_file() {
            return Err(BotError::Upload(format!("File not found: {}", path.display())));
        }
        let file_type = file_type.unwrap_or_else(|| FileType::from_path(path));
        let upload_url = self.request_send_file(file_type).await?;

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let size = bytes.len();
        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name));

        let response = self
            .http
            .post(&upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BotError::Upload(format!("Upload failed: {}", map_reqwest_error(e))))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BotError::Upload(format!("Upload failed: HTTP {}", status.as_u16())));
        }
        let payload: Value = response
            .json()
            .await
            .map_err(|e| BotError::Upload(format!("Upload failed: {e}")))?;
        let data = payload.get("data").unwrap_or(&payload);
        let file_id = string_field(data, "file_id");
        if file_id.is_empty() {
            return Err(BotError::Upload("Upload response has no file_id".to_string()));
        }
        info!(file_id = %file_id, size, file_type = file_type.as_str(), "File uploaded");
        Ok(file_id)
    }
}

fn require_chat_id(chat_id: &str) -> Result<()> {
    if chat_id.is_empty() {
        return Err(BotError::validation("Invalid chat_id"));
    }
    Ok(())
}

fn require_text(text: &str) -> Result<()> {
    if text.is_empty() {
        return Err(BotError::validation("Message text cannot be empty"));
    }
    Ok(())
}

pub(crate) fn validate_limit(limit: u32) -> Result<()> {
    if !(1..=MAX_POLL_LIMIT).contains(&limit) {
        return Err(BotError::validation(format!(
            "Limit must be between 1 and {MAX_POLL_LIMIT}, got {limit}"
        )));
    }
    Ok(())
}

/// String or numeric field as a string; empty when absent.
fn string_field(data: &Value, key: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| TransportError::MalformedResponse(e.to_string()).into())
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| BotError::validation(format!("Unserializable payload: {e}")))
}
