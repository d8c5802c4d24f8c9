//! Telegram client wrapper for the echo bot.

use std::future::Future;
use std::sync::Arc;

use grammers_client::client::{UpdateStream, UpdatesConfiguration};
use grammers_client::{Client, InvocationError, SenderPool, sender};
use grammers_session::storages::SqliteSession;
use grammers_tl_types as tl;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::RateLimiter;
use crate::config::{BotSettings, TelegramConfig};

/// Errors that can occur during Telegram operations.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Sign in failed: {0}")]
    SignInFailed(String),

    #[error("Flood wait required: {0} seconds")]
    FloodWait(u32),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("API invocation error: {0}")]
    Invocation(String),
}

impl From<InvocationError> for TelegramError {
    fn from(err: InvocationError) -> Self {
        if let InvocationError::Rpc(rpc) = &err
            && rpc.name == "FLOOD_WAIT"
            && let Some(seconds) = rpc.value
        {
            return Self::FloodWait(seconds);
        }

        let err_str = err.to_string();
        if let Some(seconds) = extract_flood_wait_seconds(&err_str) {
            return Self::FloodWait(seconds);
        }

        Self::Invocation(err_str)
    }
}

/// Extracts flood wait seconds from an error message.
fn extract_flood_wait_seconds(err_msg: &str) -> Option<u32> {
    let patterns = ["flood_wait_", "flood wait "];
    let lower = err_msg.to_lowercase();

    for pattern in patterns {
        if let Some(idx) = lower.find(pattern) {
            let start = idx + pattern.len();
            let num_str: String = lower[start..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            if let Ok(seconds) = num_str.parse() {
                return Some(seconds);
            }
        }
    }
    None
}

/// High-level Telegram client wrapper.
pub struct TelegramBot {
    /// The underlying grammers client.
    client: Client,

    /// Handle to the sender pool for disconnection.
    handle: sender::SenderPoolHandle,

    /// Rate limiter for outgoing messages.
    rate_limiter: RateLimiter,

    /// The bot's own username, resolved after sign-in.
    username: Option<String>,

    /// Background task running the sender pool.
    _pool_task: JoinHandle<()>,
}

impl TelegramBot {
    /// Connects to Telegram, signs in with the bot token if needed, and
    /// opens the update stream.
    ///
    /// # Errors
    ///
    /// Returns an error if connection or sign-in fails.
    pub async fn connect(
        config: &TelegramConfig,
        settings: &BotSettings,
    ) -> Result<(Self, UpdateStream), TelegramError> {
        info!("Connecting to Telegram...");

        let session = Arc::new(
            SqliteSession::open(&config.session_path)
                .await
                .map_err(|e| TelegramError::Session(e.to_string()))?,
        );

        let SenderPool {
            runner,
            updates,
            handle,
        } = SenderPool::new(Arc::clone(&session), config.api_id);

        let client = Client::new(handle.clone());

        // Spawn the sender pool runner
        let pool_task = tokio::spawn(async move {
            runner.run().await;
        });

        let is_authorized = client
            .is_authorized()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))?;

        info!("Connected to Telegram. Authorized: {}", is_authorized);

        if !is_authorized {
            info!("Signing in with bot token (bot id: {:?})...", config.bot_id());
            client
                .bot_sign_in(&config.bot_token, &config.api_hash)
                .await
                .map_err(|e| TelegramError::SignInFailed(e.to_string()))?;
            info!("Successfully signed in!");
        }

        let me = client.get_me().await?;
        let username = me.username().map(str::to_owned);
        info!("Running as @{}", username.as_deref().unwrap_or("<no username>"));

        let stream = client
            .stream_updates(
                updates,
                UpdatesConfiguration {
                    catch_up: settings.catch_up,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| TelegramError::Session(e.to_string()))?;

        let bot = Self {
            client,
            handle: handle.thin,
            rate_limiter: RateLimiter::from_millis(settings.reply_interval_ms),
            username,
            _pool_task: pool_task,
        };

        Ok((bot, stream))
    }

    /// Returns the bot's own username.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Publishes the bot's command menu.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn register_commands(
        &self,
        commands: &[(&str, &str)],
    ) -> Result<(), TelegramError> {
        debug!("Registering {} bot commands", commands.len());

        let request = tl::functions::bots::SetBotCommands {
            scope: tl::enums::BotCommandScope::Default,
            lang_code: String::new(),
            commands: commands
                .iter()
                .map(|(command, description)| {
                    tl::enums::BotCommand::Command(tl::types::BotCommand {
                        command: (*command).to_owned(),
                        description: (*description).to_owned(),
                    })
                })
                .collect(),
        };

        self.client.invoke(&request).await?;
        info!("Command menu registered");
        Ok(())
    }

    /// Runs an outgoing API call through the rate limiter.
    ///
    /// If Telegram answers with a flood wait, every sender is held back for
    /// the requested time and the call is retried once.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails, or fails again after a flood wait.
    pub async fn send<F, Fut, T>(&self, op: F) -> Result<T, TelegramError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, InvocationError>>,
    {
        send_with_retry(&self.rate_limiter, op).await
    }

    /// Disconnects from Telegram.
    pub fn disconnect(&self) {
        info!("Disconnecting from Telegram...");
        self.handle.quit();
    }
}

/// Rate-limited call with a single retry after a flood wait.
async fn send_with_retry<F, Fut, T, E>(limiter: &RateLimiter, op: F) -> Result<T, TelegramError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<TelegramError>,
{
    let waited = limiter.wait_and_acquire().await;
    if !waited.is_zero() {
        debug!("Waited {:?} for rate limit", waited);
    }

    let err: TelegramError = match op().await {
        Ok(value) => return Ok(value),
        Err(e) => e.into(),
    };
    let TelegramError::FloodWait(seconds) = err else {
        return Err(err);
    };

    warn!("Flood wait triggered: {} seconds, retrying once", seconds);
    limiter.handle_flood_wait(seconds).await;
    debug!(
        "Sends held back for {:?}",
        limiter.time_until_allowed().await
    );
    limiter.wait_and_acquire().await;
    op().await.map_err(Into::into)
}

impl std::fmt::Debug for TelegramBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramBot")
            .field("username", &self.username)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}
