/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

impl UserId {
    /// A private conversation shares its numeric id with its user.
    pub fn as_chat(self) -> ChatId {
        ChatId(self.0)
    }
}

/// An external party writing to the bot. Materialized from each inbound
/// message; used purely for addressing and header rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndUser {
    pub id: UserId,
    pub display_name: String,
    pub handle: Option<String>,
}
