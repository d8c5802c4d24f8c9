//! Configuration module for the echo bot.
//!
//! Handles loading and validation of the Telegram credentials, runtime
//! settings, and the reply texts the bot sends back.

mod replies;
mod settings;

pub use replies::{ReplyConfig, ReplyConfigError, TEXT_PLACEHOLDER};
pub use settings::{BotSettings, ConfigError, TelegramConfig};

/// Maximum length of a Telegram text message, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 4096;
