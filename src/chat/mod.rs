//! Interactive chat application module.
//!
//! This module provides the REPL chat interface built on top of the
//! conversation store and exchange controller. It supports:
//!
//! - One request/response exchange per question
//! - ANSI-styled output with language badges and source citations
//! - Slash commands for session control
//! - Configurable endpoint and request timeout
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Session ownership of the store and controller
//! - [`commands`]: Slash command parsing and handling

mod commands;
mod config;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use session::{ChatSession, SessionStats};
