//! Command types and message classification.

use std::fmt;

/// Longest command name Telegram recognises as a bot command.
const MAX_COMMAND_LENGTH: usize = 32;

/// Available bot commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Greet the user.
    Start,

    /// Show help information.
    Help,

    /// Any other well-formed command; never answered.
    Unknown(String),
}

impl BotCommand {
    /// Maps a command name (without the leading slash) to a command.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            other => Self::Unknown(other.to_owned()),
        }
    }

    /// Returns the command name as it appears in the command menu.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Unknown(name) => name,
        }
    }

    /// Returns the commands published in the bot's command menu.
    #[must_use]
    pub fn menu() -> Vec<(&'static str, &'static str)> {
        vec![("start", "Show the greeting"), ("help", "Show usage help")]
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name())
    }
}

/// Classification of an incoming message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A bot command, optionally addressed as `/cmd@username`.
    Command {
        command: BotCommand,
        addressee: Option<String>,
    },

    /// Plain text to be echoed.
    Text(String),

    /// No usable text (media, service messages, whitespace only).
    Empty,
}

impl Incoming {
    /// Classifies a message text.
    ///
    /// A message is a command when its first token is `/name` or
    /// `/name@username`, where `name` is 1-32 characters of `[A-Za-z0-9_]`.
    /// Arguments after the first token are ignored.
    #[must_use]
    pub fn classify(text: &str) -> Self {
        if text.trim().is_empty() {
            return Self::Empty;
        }

        if let Some((name, addressee)) = parse_command_token(text) {
            return Self::Command {
                command: BotCommand::from_name(name),
                addressee: addressee.map(str::to_owned),
            };
        }

        Self::Text(text.to_owned())
    }

    /// Returns true if a command is meant for the bot with the given username.
    ///
    /// Unaddressed commands are always meant for us. Usernames compare
    /// case-insensitively.
    #[must_use]
    pub fn is_addressed_to(&self, bot_username: Option<&str>) -> bool {
        match self {
            Self::Command {
                addressee: Some(target),
                ..
            } => bot_username.is_some_and(|own| own.eq_ignore_ascii_case(target)),
            _ => true,
        }
    }
}

/// Splits `/name@username rest` into its name and optional username.
fn parse_command_token(text: &str) -> Option<(&str, Option<&str>)> {
    // Commands must start the message; leading whitespace disqualifies them.
    let rest = text.strip_prefix('/')?;
    if rest.starts_with(char::is_whitespace) {
        return None;
    }
    let body = rest.split_whitespace().next().unwrap_or_default();

    let (name, addressee) = match body.split_once('@') {
        Some((name, user)) => (name, Some(user)),
        None => (body, None),
    };

    let valid_name = !name.is_empty()
        && name.len() <= MAX_COMMAND_LENGTH
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_name {
        return None;
    }

    if let Some(user) = addressee
        && (user.is_empty() || !user.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
    {
        return None;
    }

    Some((name, addressee))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(text: &str) -> Option<BotCommand> {
        match Incoming::classify(text) {
            Incoming::Command { command, .. } => Some(command),
            _ => None,
        }
    }

    #[test]
    fn test_parse_start() {
        assert_eq!(command("/start"), Some(BotCommand::Start));
        assert_eq!(command("/START"), Some(BotCommand::Start));
        assert_eq!(command("/start deep-link-payload"), Some(BotCommand::Start));
    }

    #[test]
    fn test_parse_help() {
        assert_eq!(command("/help"), Some(BotCommand::Help));
        assert_eq!(command("/Help me"), Some(BotCommand::Help));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            command("/settings"),
            Some(BotCommand::Unknown("settings".to_owned()))
        );
    }

    #[test]
    fn test_parse_addressed_command() {
        let incoming = Incoming::classify("/start@EchoBot");
        assert_eq!(
            incoming,
            Incoming::Command {
                command: BotCommand::Start,
                addressee: Some("EchoBot".to_owned()),
            }
        );
        assert!(incoming.is_addressed_to(Some("echobot")));
        assert!(!incoming.is_addressed_to(Some("OtherBot")));
        assert!(!incoming.is_addressed_to(None));
    }

    #[test]
    fn test_unaddressed_command_is_ours() {
        let incoming = Incoming::classify("/start");
        assert!(incoming.is_addressed_to(Some("EchoBot")));
        assert!(incoming.is_addressed_to(None));
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(
            Incoming::classify("hello /start"),
            Incoming::Text("hello /start".to_owned())
        );
        assert_eq!(Incoming::classify("/"), Incoming::Text("/".to_owned()));
        assert_eq!(
            Incoming::classify(" /start"),
            Incoming::Text(" /start".to_owned())
        );
        assert_eq!(
            Incoming::classify("/привет"),
            Incoming::Text("/привет".to_owned())
        );
    }

    #[test]
    fn test_command_name_too_long() {
        let text = format!("/{}", "a".repeat(MAX_COMMAND_LENGTH + 1));
        assert_eq!(Incoming::classify(&text), Incoming::Text(text.clone()));
    }

    #[test]
    fn test_empty() {
        assert_eq!(Incoming::classify(""), Incoming::Empty);
        assert_eq!(Incoming::classify(" \n\t"), Incoming::Empty);
    }

    #[test]
    fn test_display_and_menu() {
        assert_eq!(BotCommand::Start.to_string(), "/start");
        let names: Vec<_> = BotCommand::menu().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["start", "help"]);
    }
}
