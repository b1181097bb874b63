use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    Result,
};

/// Hexagonal port for the outbound side of the transport.
///
/// Telegram is the only implementation today; the surface is the minimum
/// the relay engine needs, so another chat transport can slot in behind it.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Send an HTML-formatted message, returning the transport-assigned id.
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    /// Duplicate an existing message verbatim into another chat, returning
    /// the id assigned to the duplicate.
    async fn copy_message(&self, to: ChatId, from: MessageRef) -> Result<MessageRef>;
}
