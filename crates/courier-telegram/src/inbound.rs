//! Mapping from teloxide updates to the transport-neutral inbound model.

use teloxide::types::Message;

use courier_core::{
    domain::{ChatId, EndUser, MessageId, MessageRef, UserId},
    messaging::types::{ChatKind, InboundMessage, Payload, ReplyTarget},
};

/// Build the core inbound model from a Telegram message. Returns `None`
/// for updates without a sender or without relayable content (service
/// messages, polls, pins).
pub fn map_message(msg: &Message) -> Option<InboundMessage> {
    let from = msg.from()?;
    if from.is_bot {
        return None;
    }
    if !has_relayable_content(msg) {
        return None;
    }

    let sender = EndUser {
        id: UserId(from.id.0 as i64),
        display_name: from.full_name(),
        handle: from.username.clone(),
    };

    let payload = match msg.text() {
        Some(text) => Payload::Text(text.to_string()),
        None => Payload::Media {
            caption: msg.caption().map(str::to_string),
        },
    };

    let reply_to = msg.reply_to_message().map(|r| ReplyTarget {
        message_id: MessageId(r.id.0),
        text: r.text().or_else(|| r.caption()).map(str::to_string),
    });

    let chat_id = ChatId(msg.chat.id.0);
    Some(InboundMessage {
        chat_id,
        chat_kind: if msg.chat.is_private() {
            ChatKind::Private
        } else {
            ChatKind::Group
        },
        sender,
        reply_to,
        payload,
        origin: MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        },
    })
}

fn has_relayable_content(msg: &Message) -> bool {
    msg.text().is_some()
        || msg.photo().is_some()
        || msg.document().is_some()
        || msg.voice().is_some()
        || msg.video().is_some()
        || msg.audio().is_some()
        || msg.sticker().is_some()
        || msg.animation().is_some()
        || msg.video_note().is_some()
        || msg.contact().is_some()
        || msg.location().is_some()
}
