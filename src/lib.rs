//! Echo Bot Library
//!
//! A Telegram bot that greets users on `/start` and echoes their text
//! messages back.
//!
//! This crate provides the core functionality for:
//! - Loading Telegram credentials, settings, and reply texts
//! - Classifying incoming messages and choosing replies
//! - Connecting to Telegram via `MTProto` as a bot
//! - Dispatching updates with rate-limited replies

pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod telegram;
