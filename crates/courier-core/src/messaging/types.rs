use crate::domain::{ChatId, EndUser, MessageId, MessageRef};

/// Cross-messenger inbound message model.
///
/// Telegram-specific fields live in the Telegram adapter.
#[derive(Clone, Debug, PartialEq)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub sender: EndUser,
    /// Present when the message is a reply to an earlier message.
    pub reply_to: Option<ReplyTarget>,
    pub payload: Payload,
    /// The message itself, for verbatim duplication.
    pub origin: MessageRef,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
}

/// Message content as far as the relay cares: text is re-rendered with
/// markers, anything else is duplicated verbatim through the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Media { caption: Option<String> },
}

/// The message an admin reply points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyTarget {
    pub message_id: MessageId,
    /// Visible text or caption of the referenced message, when the
    /// transport retains it. Feeds the fallback extraction rules.
    pub text: Option<String>,
}
