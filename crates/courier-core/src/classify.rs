//! Inbound message classification.
//!
//! Every inbound message resolves to exactly one route. Classification is
//! pure: session state comes in as a flag and nothing is mutated here.

use crate::{
    domain::{MessageRef, UserId},
    messaging::types::{ChatKind, InboundMessage, Payload, ReplyTarget},
};

/// Parsed admin command (`/to`, `/r`, `/target`, `/cancel`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdminAction {
    /// `/to <user_id> <text>` or `/r <user_id> <text>`: send directly,
    /// bypassing the correlation table.
    DirectSend { user: UserId, text: String },
    /// `/target <user_id>`: make `user` the sticky target for the next
    /// free-form message.
    SetTarget { user: UserId },
    /// `/cancel`: drop the sticky target.
    CancelTarget,
}

/// The single handling path chosen for an inbound message.
#[derive(Clone, Debug, PartialEq)]
pub enum Route {
    /// Admin replied to a message in the admin channel.
    AdminReply {
        target: ReplyTarget,
        payload: Payload,
        origin: MessageRef,
    },
    AdminCommand(AdminAction),
    /// Free-form admin message routed to the active target.
    AdminActiveSend { payload: Payload, origin: MessageRef },
    /// A private message from anyone but the admin.
    EndUserInquiry(InboundMessage),
    Ignore,
}

/// Select exactly one route, in priority order: a reply-to outranks
/// commands, commands outrank the active session, and only non-admin
/// private messages become inquiries.
pub fn classify(msg: InboundMessage, is_admin: bool, has_active_target: bool) -> Route {
    if is_admin {
        if let Some(target) = msg.reply_to {
            return Route::AdminReply {
                target,
                payload: msg.payload,
                origin: msg.origin,
            };
        }
        if let Payload::Text(text) = &msg.payload {
            if text.trim_start().starts_with('/') {
                // Command-shaped text never falls through to the active
                // target, even when it fails the grammar.
                return match parse_admin_command(text) {
                    Some(action) => Route::AdminCommand(action),
                    None => Route::Ignore,
                };
            }
        }
        if has_active_target {
            return Route::AdminActiveSend {
                payload: msg.payload,
                origin: msg.origin,
            };
        }
        return Route::Ignore;
    }

    if msg.chat_kind == ChatKind::Private {
        return Route::EndUserInquiry(msg);
    }

    Route::Ignore
}

/// Parse the admin command grammar. Telegram may send `/cmd@botname arg ...`.
pub fn parse_admin_command(text: &str) -> Option<AdminAction> {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim();

    let cmd = first
        .strip_prefix('/')?
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    match cmd.as_str() {
        "to" | "r" => {
            let mut args = rest.splitn(2, char::is_whitespace);
            let user = parse_user_id(args.next().unwrap_or(""))?;
            let text = args.next().unwrap_or("").trim();
            if text.is_empty() {
                return None;
            }
            Some(AdminAction::DirectSend {
                user,
                text: text.to_string(),
            })
        }
        "target" => Some(AdminAction::SetTarget {
            user: parse_user_id(rest)?,
        }),
        "cancel" => Some(AdminAction::CancelTarget),
        _ => None,
    }
}

fn parse_user_id(s: &str) -> Option<UserId> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<i64>().ok().map(UserId)
}
