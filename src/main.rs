//! Echo Bot - Main Entry Point
//!
//! A Telegram bot that greets on `/start` and echoes text messages back.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use echo_bot::commands::{BotCommand, MessageHandler};
use echo_bot::config::{BotSettings, ReplyConfig, TelegramConfig};
use echo_bot::dispatcher::{Dispatcher, DispatcherMessage};
use echo_bot::telegram::TelegramBot;

/// Telegram bot that echoes text messages.
#[derive(Parser, Debug)]
#[command(name = "echo_bot")]
#[command(about = "Greet on /start and echo every text message back")]
#[command(version)]
struct Args {
    /// Path to a JSON file with custom reply texts.
    #[arg(short, long)]
    replies: Option<String>,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Generate an example reply configuration file and exit.
    #[arg(long)]
    generate_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Handle example config generation
    if args.generate_config {
        return generate_example_config();
    }

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    // Load configurations
    let tg_config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;

    let bot_settings = BotSettings::from_env_with_defaults();

    let replies = match &args.replies {
        Some(path) => ReplyConfig::load_from_file(path)
            .with_context(|| format!("Failed to load reply configuration from {path}"))?,
        None => ReplyConfig::default(),
    };
    replies
        .validate()
        .context("Reply configuration validation failed")?;

    // Connect to Telegram
    let (bot, updates) = TelegramBot::connect(&tg_config, &bot_settings)
        .await
        .context("Failed to connect to Telegram")?;

    if bot_settings.register_commands
        && let Err(e) = bot.register_commands(&BotCommand::menu()).await
    {
        warn!("Failed to register command menu: {}", e);
    }

    let handler = MessageHandler::new(replies, bot.username().map(str::to_owned));
    let bot = Arc::new(bot);

    // Create dispatcher channel
    let (dispatcher_tx, dispatcher_rx) = mpsc::channel::<DispatcherMessage>(8);

    let dispatcher = Dispatcher::new(Arc::clone(&bot), handler);

    info!("Bot started...");
    info!(
        "Reply interval: {}ms, catch up: {}",
        bot_settings.reply_interval_ms, bot_settings.catch_up
    );

    let mut dispatcher_handle = tokio::spawn(async move {
        dispatcher.run(updates, dispatcher_rx).await;
    });

    info!("Bot is running. Use Ctrl+C to stop.");

    // Wait for Ctrl+C or for the dispatcher to stop on its own
    let dispatcher_stopped = tokio::select! {
        _ = tokio::signal::ctrl_c() => false,
        _ = &mut dispatcher_handle => true,
    };

    if dispatcher_stopped {
        warn!("Dispatcher stopped unexpectedly");
    } else {
        info!("Received Ctrl+C, shutting down...");
        let _ = dispatcher_tx.send(DispatcherMessage::Shutdown).await;
        let _ = dispatcher_handle.await;
    }

    // Cleanup
    info!("Shutting down...");
    bot.disconnect();

    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Generates an example reply configuration file.
fn generate_example_config() -> Result<()> {
    let example = ReplyConfig::example();
    example.save_to_file("replies.example.json")?;

    println!("✓ Example configuration written to: replies.example.json");
    println!("\nTo use this bot:");
    println!("1. Copy replies.example.json to replies.json and edit the texts");
    println!("2. Create a .env file with TG_API_ID, TG_API_HASH and BOT_TOKEN");
    println!("3. Run: echo_bot --replies replies.json");

    Ok(())
}
