//! Interactive chat against the seedchat backend.
//!
//! This module provides the controller that turns user actions into backend calls and
//! renders their results.  It supports:
//!
//! - Chat messages with an optional character persona
//! - Seeded image generation that uses the conversation as context
//! - Seed rotation and history clearing
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`controller`]: the request/response cycle behind every user action
//! - [`state`]: the per-session character and seed
//! - [`commands`]: slash command parsing
//! - [`interrupt`]: cancelling an in-flight action on Ctrl+C

mod commands;
mod config;
mod controller;
mod interrupt;
mod state;

pub use crate::view::{CharacterOptions, InputField, TerminalView, View};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use controller::{
    CHAT_FAILURE_MESSAGE, CLEAR_CONFIRMATION, ChatController, EMPTY_PROMPT_ALERT,
    HISTORY_CLEARED_MESSAGE, IMAGE_FAILURE_MESSAGE,
};
pub use interrupt::interruptible;
pub use state::SessionState;
