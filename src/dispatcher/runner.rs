//! Update dispatcher.
//!
//! Pulls updates off the stream and handles every incoming message on its
//! own task:
//! 1. Skip anything that is not a new message, and the bot's own messages
//! 2. Ignore media; ask the [`MessageHandler`] for a reply to plain text
//! 3. Send the reply through the rate-limited client
//! 4. Record the outcome in the shared stats
//!
//! On shutdown, in-flight handlers are drained and the update state is
//! synced to the session so the next start resumes where this one left off.

use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::{DispatchStats, Outcome};
use crate::commands::{MessageHandler, Reply};
use crate::telegram::{TelegramBot, TelegramError, Update, UpdateStream};

/// Messages that can be sent to the dispatcher.
#[derive(Debug, Clone)]
pub enum DispatcherMessage {
    /// Stop the dispatcher.
    Shutdown,
}

/// Routes incoming updates to the message handler.
pub struct Dispatcher {
    /// Telegram bot client.
    bot: Arc<TelegramBot>,

    /// Reply logic.
    handler: Arc<MessageHandler>,

    /// Handling statistics.
    stats: Arc<RwLock<DispatchStats>>,
}

impl Dispatcher {
    /// Creates a new dispatcher.
    #[must_use]
    pub fn new(bot: Arc<TelegramBot>, handler: MessageHandler) -> Self {
        Self {
            bot,
            handler: Arc::new(handler),
            stats: Arc::new(RwLock::new(DispatchStats::new())),
        }
    }

    /// Runs the dispatch loop until shutdown or until the update stream fails.
    pub async fn run(&self, mut updates: UpdateStream, mut rx: mpsc::Receiver<DispatcherMessage>) {
        info!("Dispatcher started");

        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    match msg {
                        Some(DispatcherMessage::Shutdown) | None => {
                            info!("Dispatcher shutting down");
                            break;
                        }
                    }
                }
                update = updates.next() => {
                    match update {
                        Ok(update) => self.dispatch(update, &mut tasks),
                        Err(e) => {
                            error!("Update stream failed: {}", e);
                            break;
                        }
                    }
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        error!("Message handler task panicked: {}", e);
                    }
                }
            }
        }

        if !tasks.is_empty() {
            debug!("Waiting for {} in-flight handlers", tasks.len());
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("Message handler task panicked: {}", e);
            }
        }

        updates.sync_update_state().await;

        info!("Dispatcher stopped: {}", self.stats.read().await.summary());
    }

    /// Spawns a handler task for a single update.
    fn dispatch(&self, update: Update, tasks: &mut JoinSet<()>) {
        let Update::NewMessage(message) = update else {
            return;
        };

        let reply = match plan_action(
            &self.handler,
            message.outgoing(),
            message.media().is_some(),
            message.text(),
        ) {
            Action::Skip => return,
            Action::Ignore => None,
            Action::Reply(reply) => Some(reply),
        };

        let bot = Arc::clone(&self.bot);
        let stats = Arc::clone(&self.stats);

        tasks.spawn(async move {
            let message_id = message.id();

            let Some(reply) = reply else {
                debug!("Message {} needs no reply", message_id);
                stats.write().await.record(Outcome::Ignored);
                return;
            };

            debug!(
                "Replying to message {} with {}: \"{}\"",
                message_id,
                reply.kind,
                truncate(&reply.text, 30)
            );

            let message = &message;
            let text = reply.text.as_str();
            let outcome = match bot.send(move || message.reply(text)).await {
                Ok(_) => Outcome::Replied(reply.kind),
                Err(TelegramError::FloodWait(seconds)) => {
                    warn!(
                        "Dropping reply to message {}: still flood waited ({} seconds)",
                        message_id, seconds
                    );
                    Outcome::Failed
                }
                Err(e) => {
                    error!("Failed to reply to message {}: {}", message_id, e);
                    Outcome::Failed
                }
            };

            stats.write().await.record(outcome);
        });
    }
}

/// What the dispatcher does with a new message.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    /// Not counted at all (the bot's own messages).
    Skip,

    /// Counted, but needs no reply.
    Ignore,

    /// Send this reply.
    Reply(Reply),
}

/// Decides how to treat a new message.
///
/// Media messages are ignored even when their caption would read as text.
fn plan_action(handler: &MessageHandler, outgoing: bool, has_media: bool, text: &str) -> Action {
    if outgoing {
        return Action::Skip;
    }
    if has_media {
        return Action::Ignore;
    }

    handler.handle(text).map_or(Action::Ignore, Action::Reply)
}

/// Truncates a string for display.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("bot", &self.bot)
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::ReplyKind;
    use crate::config::ReplyConfig;

    fn handler() -> MessageHandler {
        MessageHandler::new(ReplyConfig::default(), Some("EchoBot".to_owned()))
    }

    #[test]
    fn test_plan_action_echoes_incoming_text() {
        match plan_action(&handler(), false, false, "hi") {
            Action::Reply(reply) => {
                assert_eq!(reply.kind, ReplyKind::Echo);
                assert_eq!(reply.text, "You said: hi");
            }
            other => panic!("expected a reply, got {other:?}"),
        }
    }

    #[test]
    fn test_plan_action_skips_own_messages() {
        assert_eq!(plan_action(&handler(), true, false, "You said: hi"), Action::Skip);
        assert_eq!(plan_action(&handler(), true, false, "/start"), Action::Skip);
        assert_eq!(plan_action(&handler(), true, true, "caption"), Action::Skip);
    }

    #[test]
    fn test_plan_action_ignores_captioned_media() {
        assert_eq!(plan_action(&handler(), false, true, "hi"), Action::Ignore);
        assert_eq!(plan_action(&handler(), false, true, "/start"), Action::Ignore);
        assert_eq!(plan_action(&handler(), false, true, ""), Action::Ignore);
    }

    #[test]
    fn test_plan_action_ignores_silent_messages() {
        assert_eq!(plan_action(&handler(), false, false, ""), Action::Ignore);
        assert_eq!(plan_action(&handler(), false, false, "/unknown"), Action::Ignore);
        assert_eq!(plan_action(&handler(), false, false, "/start@OtherBot"), Action::Ignore);
    }

    #[test]
    fn test_plan_action_greets() {
        let Action::Reply(reply) = plan_action(&handler(), false, false, "/start") else {
            panic!("expected a greeting");
        };
        assert_eq!(reply.kind, ReplyKind::Greeting);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello, World!", 5), "Hello...");
        assert_eq!(truncate("привет мир", 6), "привет...");
    }
}
