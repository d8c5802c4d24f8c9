//! Command handling module.
//!
//! Classifies incoming message texts and decides the reply: a greeting for
//! `/start`, usage for `/help`, and an echo for plain text.

mod handler;
mod types;

pub use handler::{MessageHandler, Reply, ReplyKind};
pub use types::{BotCommand, Incoming};
