//! Core types: normalized messages, inline (button) messages, update events, and API models.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::wire::{lenient_bool, lenient_i64, lenient_opt_string, lenient_string};

/// A file reference (id plus optional display metadata).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    #[serde(default, deserialize_with = "lenient_string")]
    pub file_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub file_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub size: String,
}

impl File {
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            ..Self::default()
        }
    }
}

/// Geographic point; the API transports coordinates as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, deserialize_with = "lenient_string")]
    pub longitude: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub latitude: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone_number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sticker {
    #[serde(default, deserialize_with = "lenient_string")]
    pub sticker_id: String,
    #[serde(default)]
    pub file: File,
    #[serde(default, deserialize_with = "lenient_string")]
    pub emoji_character: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForwardedFromType {
    #[default]
    User,
    Channel,
    Bot,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardedFrom {
    #[serde(default)]
    pub type_from: ForwardedFromType,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub from_chat_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub from_sender_id: String,
}

/// Poll state. Unknown states fail deserialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollState {
    #[default]
    Open,
    Closed,
}

/// Vote status of a poll as seen by the receiving bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollStatus {
    #[serde(default)]
    pub state: PollState,
    /// Index of the option selected by the bot's user, `-1` when nothing is selected.
    #[serde(default = "no_selection", deserialize_with = "selection_index")]
    pub selection_index: i64,
    /// Vote percentage per option, in option order.
    #[serde(default)]
    pub percent_vote_options: Vec<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub total_vote: i64,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub show_total_votes: bool,
}

fn no_selection() -> i64 {
    -1
}

fn selection_index<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    match raw {
        None | Some(serde_json::Value::Null) => Ok(no_selection()),
        Some(value) => lenient_i64(value).map_err(serde::de::Error::custom),
    }
}

impl Default for PollStatus {
    fn default() -> Self {
        Self {
            state: PollState::Open,
            selection_index: no_selection(),
            percent_vote_options: Vec::new(),
            total_vote: 0,
            show_total_votes: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    #[serde(default, deserialize_with = "lenient_string")]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub poll_status: PollStatus,
}

/// Extra data attached to a message: the deep-link start id or the clicked button id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxData {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub start_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub button_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SenderType {
    #[default]
    User,
    Bot,
}

/// A normalized chat message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    pub message_id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub sender_type: SenderType,
    pub text: String,
    /// Unix seconds.
    pub time: i64,
    pub is_edited: bool,
    pub reply_to_message_id: Option<String>,
    pub aux_data: Option<AuxData>,
    pub file: Option<File>,
    pub location: Option<Location>,
    pub contact_message: Option<ContactMessage>,
    pub poll: Option<Poll>,
    pub forwarded_from: Option<ForwardedFrom>,
    pub sticker: Option<Sticker>,
}

impl Message {
    /// Id of the button that produced this message, if any.
    pub fn button_id(&self) -> Option<&str> {
        self.aux_data.as_ref()?.button_id.as_deref()
    }

    /// `time` as a UTC timestamp; `None` when the platform sent no usable time.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        if self.time <= 0 {
            return None;
        }
        Utc.timestamp_opt(self.time, 0).single()
    }

    pub fn is_command(&self) -> bool {
        self.text.starts_with('/')
    }
}

/// A click on an inline button of a previously sent message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InlineMessage {
    pub sender_id: String,
    pub chat_id: String,
    pub message_id: String,
    pub text: String,
    pub button_id: Option<String>,
    pub file: Option<File>,
    pub location: Option<Location>,
    pub aux_data: Option<AuxData>,
}

/// Discriminator of an [`UpdateEvent`]; also the key of per-kind handler registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateKind {
    NewMessage,
    UpdatedMessage,
    RemovedMessage,
    InlineMessage,
    StartedBot,
    StoppedBot,
}

impl UpdateKind {
    pub const ALL: [UpdateKind; 6] = [
        UpdateKind::NewMessage,
        UpdateKind::UpdatedMessage,
        UpdateKind::RemovedMessage,
        UpdateKind::InlineMessage,
        UpdateKind::StartedBot,
        UpdateKind::StoppedBot,
    ];

    /// Wire name used in the `type` field of raw updates.
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateKind::NewMessage => "NewMessage",
            UpdateKind::UpdatedMessage => "UpdatedMessage",
            UpdateKind::RemovedMessage => "RemovedMessage",
            UpdateKind::InlineMessage => "InlineMessage",
            UpdateKind::StartedBot => "StartedBot",
            UpdateKind::StoppedBot => "StoppedBot",
        }
    }

    /// Parses a wire `type` value; unknown values yield `None`.
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One typed update. Exactly one payload per variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum UpdateEvent {
    NewMessage { chat_id: String, message: Message },
    UpdatedMessage { chat_id: String, message: Message },
    RemovedMessage { chat_id: String, message_id: String },
    InlineMessage(InlineMessage),
    StartedBot { chat_id: String },
    StoppedBot { chat_id: String },
}

impl UpdateEvent {
    pub fn kind(&self) -> UpdateKind {
        match self {
            UpdateEvent::NewMessage { .. } => UpdateKind::NewMessage,
            UpdateEvent::UpdatedMessage { .. } => UpdateKind::UpdatedMessage,
            UpdateEvent::RemovedMessage { .. } => UpdateKind::RemovedMessage,
            UpdateEvent::InlineMessage(_) => UpdateKind::InlineMessage,
            UpdateEvent::StartedBot { .. } => UpdateKind::StartedBot,
            UpdateEvent::StoppedBot { .. } => UpdateKind::StoppedBot,
        }
    }

    /// Update-level chat id; for NewMessage / UpdatedMessage the nested message's id when the
    /// update carries none.
    pub fn chat_id(&self) -> &str {
        match self {
            UpdateEvent::NewMessage { chat_id, message }
            | UpdateEvent::UpdatedMessage { chat_id, message } => {
                if chat_id.is_empty() {
                    &message.chat_id
                } else {
                    chat_id
                }
            }
            UpdateEvent::RemovedMessage { chat_id, .. }
            | UpdateEvent::StartedBot { chat_id }
            | UpdateEvent::StoppedBot { chat_id } => chat_id,
            UpdateEvent::InlineMessage(inline) => &inline.chat_id,
        }
    }

    /// The carried message for NewMessage / UpdatedMessage.
    pub fn message(&self) -> Option<&Message> {
        match self {
            UpdateEvent::NewMessage { message, .. } | UpdateEvent::UpdatedMessage { message, .. } => {
                Some(message)
            }
            _ => None,
        }
    }
}

/// Information about the bot itself (`getMe`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub bot_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub bot_title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub username: String,
    #[serde(default)]
    pub avatar: Option<File>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_message: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub share_url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatType {
    #[default]
    User,
    Bot,
    Group,
    Channel,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    #[serde(default, deserialize_with = "lenient_string")]
    pub chat_id: String,
    #[serde(default)]
    pub chat_type: ChatType,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub username: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: String,
}

/// A command shown in the client's command menu (`setCommands`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

impl BotCommand {
    pub fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    File,
    Image,
    Voice,
    Video,
    Music,
    Gif,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::File => "File",
            FileType::Image => "Image",
            FileType::Voice => "Voice",
            FileType::Video => "Video",
            FileType::Music => "Music",
            FileType::Gif => "Gif",
        }
    }

    /// Guesses the upload type from the file extension; anything unknown is a plain `File`.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "gif" => FileType::Gif,
            "jpg" | "jpeg" | "png" | "webp" | "bmp" => FileType::Image,
            "mp4" | "avi" | "mov" | "mkv" | "webm" => FileType::Video,
            "mp3" | "wav" | "flac" | "m4a" => FileType::Music,
            "ogg" | "oga" | "opus" => FileType::Voice,
            _ => FileType::File,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatKeypadType {
    None,
    New,
    Remove,
}

/// Webhook endpoint categories accepted by `updateBotEndpoints`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateEndpointType {
    ReceiveUpdate,
    ReceiveInlineMessage,
    ReceiveQuery,
    GetSelectionItem,
    SearchSelectionItems,
}

impl UpdateEndpointType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateEndpointType::ReceiveUpdate => "ReceiveUpdate",
            UpdateEndpointType::ReceiveInlineMessage => "ReceiveInlineMessage",
            UpdateEndpointType::ReceiveQuery => "ReceiveQuery",
            UpdateEndpointType::GetSelectionItem => "GetSelectionItem",
            UpdateEndpointType::SearchSelectionItems => "SearchSelectionItems",
        }
    }
}

impl fmt::Display for UpdateEndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
