//! Core relay engine for the courier feedback bot.
//!
//! End users write to the bot in private; each inquiry is duplicated into
//! the admin's chat, and the admin answers via reply-to, explicit command,
//! or a sticky active target. This crate is transport-agnostic: Telegram
//! lives behind the messaging port implemented in the adapter crate.

pub mod classify;
pub mod config;
pub mod correlation;
pub mod domain;
pub mod errors;
pub mod extract;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod relay;
pub mod target;

pub use errors::{Error, Result};
