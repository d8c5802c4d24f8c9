//! Reply texts and their validation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::MAX_MESSAGE_LENGTH;

/// Placeholder replaced by the incoming message text in `echo_template`.
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// Errors that can occur while loading or validating reply texts.
#[derive(Debug, Error)]
pub enum ReplyConfigError {
    #[error("Reply field '{field}' is empty")]
    Empty { field: &'static str },

    #[error("Reply field '{field}' exceeds maximum length: {length} > {max_length}")]
    TooLong {
        field: &'static str,
        length: usize,
        max_length: usize,
    },

    #[error("Echo template must contain the {{text}} placeholder")]
    MissingPlaceholder,

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Texts the bot replies with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplyConfig {
    /// Sent in response to `/start`.
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Template for echoing plain text messages.
    #[serde(default = "default_echo_template")]
    pub echo_template: String,

    /// Sent in response to `/help`.
    #[serde(default = "default_help")]
    pub help: String,
}

fn default_greeting() -> String {
    "Hello! Your bot is now running 🚀".to_owned()
}

fn default_echo_template() -> String {
    format!("You said: {TEXT_PLACEHOLDER}")
}

fn default_help() -> String {
    "Send me any text and I will repeat it back.\n\n\
     /start - Show the greeting\n\
     /help - Show this message"
        .to_owned()
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            echo_template: default_echo_template(),
            help: default_help(),
        }
    }
}

impl ReplyConfig {
    /// Loads reply texts from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ReplyConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Saves reply texts to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ReplyConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates all reply texts.
    ///
    /// # Errors
    ///
    /// Returns the first validation error encountered.
    pub fn validate(&self) -> Result<(), ReplyConfigError> {
        check_text("greeting", &self.greeting)?;
        check_text("help", &self.help)?;
        check_text("echo_template", &self.echo_template)?;

        if !self.echo_template.contains(TEXT_PLACEHOLDER) {
            return Err(ReplyConfigError::MissingPlaceholder);
        }

        Ok(())
    }

    /// Renders the echo reply for an incoming message.
    ///
    /// The result never exceeds [`MAX_MESSAGE_LENGTH`] UTF-16 code units.
    #[must_use]
    pub fn render_echo(&self, text: &str) -> String {
        let rendered = self.echo_template.replacen(TEXT_PLACEHOLDER, text, 1);
        fit_message(rendered)
    }

    /// Creates an example configuration.
    #[must_use]
    pub fn example() -> Self {
        Self {
            greeting: "Hi there! Send me a message and I'll echo it back.".to_owned(),
            echo_template: format!("You said: {TEXT_PLACEHOLDER}"),
            help: default_help(),
        }
    }
}

fn check_text(field: &'static str, text: &str) -> Result<(), ReplyConfigError> {
    if text.trim().is_empty() {
        return Err(ReplyConfigError::Empty { field });
    }

    let length = utf16_len(text);
    if length > MAX_MESSAGE_LENGTH {
        return Err(ReplyConfigError::TooLong {
            field,
            length,
            max_length: MAX_MESSAGE_LENGTH,
        });
    }

    Ok(())
}

/// Message length as Telegram counts it, in UTF-16 code units.
fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Truncates a message to Telegram's length limit, marking the cut with `…`.
///
/// The cut lands on a char boundary, so surrogate pairs are never split.
fn fit_message(text: String) -> String {
    if utf16_len(&text) <= MAX_MESSAGE_LENGTH {
        return text;
    }

    let budget = MAX_MESSAGE_LENGTH - '…'.len_utf16();
    let mut used = 0;
    let mut truncated: String = text
        .chars()
        .take_while(|c| {
            used += c.len_utf16();
            used <= budget
        })
        .collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ReplyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.greeting, "Hello! Your bot is now running 🚀");
        assert!(ReplyConfig::example().validate().is_ok());
    }

    #[test]
    fn test_render_echo() {
        let config = ReplyConfig::default();
        assert_eq!(config.render_echo("hi"), "You said: hi");
        assert_eq!(config.render_echo("  spaced  "), "You said:   spaced  ");
    }

    #[test]
    fn test_render_echo_does_not_expand_placeholder_in_text() {
        let config = ReplyConfig::default();
        assert_eq!(config.render_echo("{text}"), "You said: {text}");
    }

    #[test]
    fn test_render_echo_truncates() {
        let config = ReplyConfig::default();
        let long = "я".repeat(MAX_MESSAGE_LENGTH);
        let reply = config.render_echo(&long);

        assert_eq!(reply.chars().count(), MAX_MESSAGE_LENGTH);
        assert!(reply.starts_with("You said: я"));
        assert!(reply.ends_with('…'));
    }

    #[test]
    fn test_render_echo_counts_utf16_units() {
        let config = ReplyConfig::default();
        let emoji = "😀".repeat(MAX_MESSAGE_LENGTH / 2);
        let reply = config.render_echo(&emoji);

        assert!(utf16_len(&reply) <= MAX_MESSAGE_LENGTH);
        assert!(reply.ends_with("😀…"));
        // "You said: " is 10 units, each emoji 2, the ellipsis 1.
        assert_eq!(reply.chars().filter(|c| *c == '😀').count(), 2042);
    }

    #[test]
    fn test_fixed_text_length_in_utf16_units() {
        let config = ReplyConfig {
            greeting: "😀".repeat(MAX_MESSAGE_LENGTH / 2 + 1),
            ..ReplyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ReplyConfigError::TooLong {
                field: "greeting",
                length: 4098,
                ..
            })
        ));
    }

    #[test]
    fn test_missing_placeholder() {
        let config = ReplyConfig {
            echo_template: "You said something".to_owned(),
            ..ReplyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ReplyConfigError::MissingPlaceholder)
        ));
    }

    #[test]
    fn test_empty_greeting() {
        let config = ReplyConfig {
            greeting: "   ".to_owned(),
            ..ReplyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ReplyConfigError::Empty { field: "greeting" })
        ));
    }

    #[test]
    fn test_too_long_help() {
        let config = ReplyConfig {
            help: "x".repeat(MAX_MESSAGE_LENGTH + 1),
            ..ReplyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ReplyConfigError::TooLong { field: "help", .. })
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ReplyConfig = serde_json::from_str(r#"{"greeting": "Yo"}"#).unwrap();
        assert_eq!(config.greeting, "Yo");
        assert_eq!(config.echo_template, "You said: {text}");
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("echo_bot_replies_{}.json", std::process::id()));
        let config = ReplyConfig::example();

        config.save_to_file(&path).unwrap();
        let loaded = ReplyConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }
}
