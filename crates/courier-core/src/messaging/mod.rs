//! Cross-messenger abstractions (Telegram today; other transports later).

pub mod port;
pub mod types;
