//! Message handler implementation.

use std::fmt;

use tracing::debug;

use super::types::{BotCommand, Incoming};
use crate::config::ReplyConfig;

/// What kind of reply the bot produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Greeting,
    Help,
    Echo,
}

impl fmt::Display for ReplyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Greeting => "greeting",
            Self::Help => "help",
            Self::Echo => "echo",
        };
        f.write_str(name)
    }
}

/// A reply to send back to the chat the message came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Kind of reply.
    pub kind: ReplyKind,

    /// Text to send.
    pub text: String,
}

impl Reply {
    fn new(kind: ReplyKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Decides how the bot answers incoming messages.
#[derive(Debug, Clone)]
pub struct MessageHandler {
    /// Reply texts.
    replies: ReplyConfig,

    /// The bot's own username, used to filter `/cmd@username`.
    bot_username: Option<String>,
}

impl MessageHandler {
    /// Creates a new message handler.
    #[must_use]
    pub const fn new(replies: ReplyConfig, bot_username: Option<String>) -> Self {
        Self {
            replies,
            bot_username,
        }
    }

    /// Returns the reply for a message text, or `None` if the message is ignored.
    ///
    /// Commands are never echoed. Unknown commands and commands addressed to
    /// other bots get no reply at all.
    pub fn handle(&self, text: &str) -> Option<Reply> {
        let incoming = Incoming::classify(text);

        if !incoming.is_addressed_to(self.bot_username.as_deref()) {
            debug!("Ignoring command addressed to another bot");
            return None;
        }

        match incoming {
            Incoming::Command { command, .. } => self.handle_command(&command),
            Incoming::Text(text) => Some(Reply::new(
                ReplyKind::Echo,
                self.replies.render_echo(&text),
            )),
            Incoming::Empty => None,
        }
    }

    fn handle_command(&self, command: &BotCommand) -> Option<Reply> {
        debug!("Handling command: {}", command);

        match command {
            BotCommand::Start => Some(Reply::new(ReplyKind::Greeting, &self.replies.greeting)),
            BotCommand::Help => Some(Reply::new(ReplyKind::Help, &self.replies.help)),
            BotCommand::Unknown(name) => {
                debug!("Unknown command /{}, not replying", name);
                None
            }
        }
    }
}
