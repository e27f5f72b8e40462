//! # rbot-dispatch
//!
//! Update-dispatch core, independent of the HTTP transport:
//!
//! - [`normalize`]: raw platform update (JSON) → typed [`rbot_core::UpdateEvent`].
//! - [`command`]: `/name@bot args` parsing and routing to a registered command handler.
//! - [`Dispatcher`]: fan-out to "any update" observers and kind-specific handlers, with every
//!   handler failure isolated and reported to the [`rbot_core::ErrorHook`].
//!
//! Both the long-polling loop and the webhook receiver feed raw updates into
//! [`Dispatcher::process_update`].

pub mod command;
pub mod dispatcher;
pub mod normalize;
pub mod registry;

pub use command::{command_arguments, parse_command, Route};
pub use dispatcher::Dispatcher;
pub use normalize::normalize;
pub use registry::HandlerRegistry;
