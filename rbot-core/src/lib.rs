//! # rbot-core
//!
//! Core types and traits for the Rubika bot SDK: [`UpdateEvent`], [`Message`], [`InlineMessage`],
//! keypads, the [`Transport`] seam, handler traits and the [`ErrorHook`], plus tracing initialization.
//! Transport-agnostic; used by rbot-dispatch and rbot-rubika.

pub mod error;
pub mod handler;
pub mod keypad;
pub mod logger;
pub mod transport;
pub mod types;
pub mod wire;

pub use error::{BotError, NormalizeError, Result, TransportError};
pub use handler::{
    ErrorHook, FailureContext, FnHandler, HandlerResult, InlineHandler, MessageHandler,
    TracingErrorHook, UpdateHandler,
};
pub use keypad::{
    Button, ButtonCalendar, ButtonLocation, ButtonNumberPicker, ButtonSelection,
    ButtonSelectionItem, ButtonStringPicker, ButtonTextbox, ButtonType, CalendarType, Keypad,
    KeypadRow, LocationPickerType, SelectionGetType, SelectionItemType, SelectionSearchType,
    TextboxKeypadType, TextboxLineType,
};
pub use logger::{init_tracing, DEFAULT_LOG_FILTER};
pub use transport::Transport;
pub use types::{
    AuxData, BotCommand, BotInfo, Chat, ChatKeypadType, ChatType, ContactMessage, File, FileType,
    ForwardedFrom, ForwardedFromType, InlineMessage, Location, Message, Poll, PollState,
    PollStatus, SenderType, Sticker, UpdateEndpointType, UpdateEvent, UpdateKind,
};
