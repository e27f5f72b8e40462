//! Payload normalizer: one raw update object → one [`UpdateEvent`].
//!
//! The `type` field selects the variant. Nested sub-objects (`file`, `location`, `contact_message`,
//! `poll`, `aux_data`, ...) are decoded one at a time so that a missing branch never hides its
//! siblings; missing leaves fall back to empty values. A sub-object that is present but malformed
//! (including an unknown poll state) fails the whole update with a [`NormalizeError`].

use rbot_core::wire::{lenient_bool, lenient_i64, lenient_opt_string, lenient_string};
use rbot_core::{AuxData, InlineMessage, Message, NormalizeError, SenderType, UpdateEvent, UpdateKind};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Flat fields of `new_message` / `updated_message`; nested objects are decoded separately.
#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    #[serde(default, deserialize_with = "lenient_string")]
    message_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    chat_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    sender_id: String,
    #[serde(default)]
    sender_type: Option<SenderType>,
    #[serde(default, deserialize_with = "lenient_string")]
    text: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    time: i64,
    #[serde(default, deserialize_with = "lenient_bool")]
    is_edited: bool,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    reply_to_message_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InlineEnvelope {
    #[serde(default, deserialize_with = "lenient_string")]
    sender_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    chat_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    message_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    text: String,
}

/// Normalizes one raw update.
///
/// Returns `Ok(None)` when `type` is missing or not a known kind; callers skip such updates silently.
pub fn normalize(raw: &Value) -> Result<Option<UpdateEvent>, NormalizeError> {
    let update = raw.as_object().ok_or(NormalizeError::NotAnObject)?;

    let Some(kind) = update
        .get("type")
        .and_then(Value::as_str)
        .and_then(UpdateKind::from_wire)
    else {
        return Ok(None);
    };

    let chat_id = string_field(update, "chat_id")?.unwrap_or_default();

    let event = match kind {
        UpdateKind::NewMessage => {
            let payload = payload(update, kind, "new_message")?;
            let message = decode_message(payload, &chat_id)?;
            UpdateEvent::NewMessage { chat_id, message }
        }
        UpdateKind::UpdatedMessage => {
            let payload = payload(update, kind, "updated_message")?;
            let message = decode_message(payload, &chat_id)?;
            UpdateEvent::UpdatedMessage { chat_id, message }
        }
        UpdateKind::RemovedMessage => {
            let message_id = string_field(update, "removed_message_id")?.ok_or(
                NormalizeError::MissingPayload {
                    kind,
                    field: "removed_message_id",
                },
            )?;
            UpdateEvent::RemovedMessage {
                chat_id,
                message_id,
            }
        }
        UpdateKind::InlineMessage => {
            let payload = payload(update, kind, "inline_message")?;
            UpdateEvent::InlineMessage(decode_inline(payload, &chat_id)?)
        }
        UpdateKind::StartedBot => UpdateEvent::StartedBot { chat_id },
        UpdateKind::StoppedBot => UpdateEvent::StoppedBot { chat_id },
    };

    Ok(Some(event))
}

fn payload<'a>(
    update: &'a Map<String, Value>,
    kind: UpdateKind,
    field: &'static str,
) -> Result<&'a Value, NormalizeError> {
    update
        .get(field)
        .filter(|value| value.is_object())
        .ok_or(NormalizeError::MissingPayload { kind, field })
}

fn string_field(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, NormalizeError> {
    match object.get(field) {
        None => Ok(None),
        Some(value) => {
            lenient_opt_string(value).map_err(|source| NormalizeError::InvalidField { field, source })
        }
    }
}

/// Decodes one optional sub-object. Absent, null and `{}` all mean "not there".
fn part<T: DeserializeOwned>(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<T>, NormalizeError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(inner)) if inner.is_empty() => Ok(None),
        Some(value) => T::deserialize(value)
            .map(Some)
            .map_err(|source| NormalizeError::InvalidField { field, source }),
    }
}

fn decode_message(payload: &Value, update_chat_id: &str) -> Result<Message, NormalizeError> {
    let object = payload.as_object().ok_or(NormalizeError::NotAnObject)?;
    let envelope = MessageEnvelope::deserialize(payload)
        .map_err(|source| NormalizeError::InvalidField {
            field: "message",
            source,
        })?;

    let chat_id = if envelope.chat_id.is_empty() {
        update_chat_id.to_string()
    } else {
        envelope.chat_id
    };

    Ok(Message {
        message_id: envelope.message_id,
        chat_id,
        sender_id: envelope.sender_id,
        sender_type: envelope.sender_type.unwrap_or_default(),
        text: envelope.text,
        time: envelope.time,
        is_edited: envelope.is_edited,
        reply_to_message_id: envelope.reply_to_message_id,
        aux_data: part(object, "aux_data")?,
        file: part(object, "file")?,
        location: part(object, "location")?,
        contact_message: part(object, "contact_message")?,
        poll: part(object, "poll")?,
        forwarded_from: part(object, "forwarded_from")?,
        sticker: part(object, "sticker")?,
    })
}

fn decode_inline(payload: &Value, update_chat_id: &str) -> Result<InlineMessage, NormalizeError> {
    let object = payload.as_object().ok_or(NormalizeError::NotAnObject)?;
    let envelope = InlineEnvelope::deserialize(payload).map_err(|source| {
        NormalizeError::InvalidField {
            field: "inline_message",
            source,
        }
    })?;

    let aux_data: Option<AuxData> = part(object, "aux_data")?;
    let button_id = aux_data.as_ref().and_then(|aux| aux.button_id.clone());

    Ok(InlineMessage {
        sender_id: envelope.sender_id,
        chat_id: if envelope.chat_id.is_empty() {
            update_chat_id.to_string()
        } else {
            envelope.chat_id
        },
        message_id: envelope.message_id,
        text: envelope.text,
        button_id,
        file: part(object, "file")?,
        location: part(object, "location")?,
        aux_data,
    })
}
