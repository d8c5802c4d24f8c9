//! Application settings and Telegram configuration.

use std::path::PathBuf;

/// Telegram API configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Telegram API ID (obtain from <https://my.telegram.org>).
    pub api_id: i32,

    /// Telegram API hash (obtain from <https://my.telegram.org>).
    pub api_hash: String,

    /// Bot token issued by `@BotFather`.
    pub bot_token: String,

    /// Path to the session file.
    pub session_path: PathBuf,
}

fn default_session_path() -> PathBuf {
    PathBuf::from("bot.session")
}

impl TelegramConfig {
    /// Creates a new Telegram configuration.
    #[must_use]
    pub fn new(api_id: i32, api_hash: String, bot_token: String) -> Self {
        Self {
            api_id,
            api_hash,
            bot_token,
            session_path: default_session_path(),
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `TG_API_ID`, `TG_API_HASH` and `BOT_TOKEN` to be set.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_id: i32 = lookup("TG_API_ID")
            .ok_or(ConfigError::MissingEnvVar("TG_API_ID"))?
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidApiId)?;
        if api_id <= 0 {
            return Err(ConfigError::InvalidApiId);
        }

        let api_hash = lookup("TG_API_HASH").ok_or(ConfigError::MissingEnvVar("TG_API_HASH"))?;

        let bot_token = lookup("BOT_TOKEN").ok_or(ConfigError::MissingEnvVar("BOT_TOKEN"))?;
        let bot_token = bot_token.trim().to_owned();
        if !is_well_formed_token(&bot_token) {
            return Err(ConfigError::InvalidBotToken);
        }

        let session_path =
            lookup("TG_SESSION_PATH").map_or_else(default_session_path, PathBuf::from);

        Ok(Self {
            api_id,
            api_hash,
            bot_token,
            session_path,
        })
    }

    /// Returns the numeric bot id embedded in the token.
    #[must_use]
    pub fn bot_id(&self) -> Option<i64> {
        self.bot_token.split_once(':')?.0.parse().ok()
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_id", &self.api_id)
            .field("session_path", &self.session_path)
            .finish_non_exhaustive()
    }
}

/// Checks that a token looks like `<digits>:<secret>`.
fn is_well_formed_token(token: &str) -> bool {
    match token.split_once(':') {
        Some((id, secret)) => {
            !id.is_empty()
                && id.chars().all(|c| c.is_ascii_digit())
                && !secret.is_empty()
                && !secret.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Bot-specific settings.
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Minimum interval between outgoing replies in milliseconds.
    pub reply_interval_ms: u64,

    /// Whether to process updates that arrived while the bot was offline.
    pub catch_up: bool,

    /// Whether to publish the command menu on startup.
    pub register_commands: bool,
}

fn default_reply_interval() -> u64 {
    50 // stays under Telegram's ~30 messages/second bot limit
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            reply_interval_ms: default_reply_interval(),
            catch_up: true,
            register_commands: true,
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            reply_interval_ms: lookup("REPLY_INTERVAL_MS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or_else(default_reply_interval),
            catch_up: lookup("CATCH_UP")
                .and_then(|s| parse_flag(&s))
                .unwrap_or(true),
            register_commands: lookup("REGISTER_COMMANDS")
                .and_then(|s| parse_flag(&s))
                .unwrap_or(true),
        }
    }
}

/// Parses a boolean-ish environment value.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid API ID format (must be a positive integer)")]
    InvalidApiId,

    #[error("Invalid bot token format (expected <bot_id>:<secret>)")]
    InvalidBotToken,
}
