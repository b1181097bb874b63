//! HTML formatting for admin-channel and user-facing messages.

use crate::domain::{EndUser, UserId};

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render the inquiry Header sent into the admin channel.
///
/// The `UID: <digits>` line is machine-readable: the reply resolver parses
/// it back out of retained messages once the in-memory correlation table
/// is gone (restart, eviction).
pub fn render_header(sender: &EndUser) -> String {
    let mut from = escape_html(&sender.display_name);
    if let Some(handle) = &sender.handle {
        from.push_str(" (@");
        from.push_str(&escape_html(handle));
        from.push(')');
    }
    format!(
        "\u{1F4E8} <b>New message</b>\nFrom: {from}\nUID: {}",
        sender.id.0
    )
}

/// Wrap admin text with the reply marker end users see.
pub fn wrap_admin_reply(text: &str) -> String {
    format!("\u{1F4AC} <b>Reply from admin:</b>\n{}", escape_html(text))
}

// Fixed notices, in one place so handlers and tests agree on wording.

pub const NOT_CONFIGURED_NOTICE: &str =
    "\u{26A0} This bot has no operator configured yet. Please try again later.";

pub const DELIVERED_NOTICE: &str = "\u{2705} Your message has been passed on.";

pub const FORWARD_FAILED_NOTICE: &str =
    "\u{26A0} Your message could not be delivered. Please try again later.";

pub const UNRESOLVED_NOTICE: &str = "\u{26A0} Recipient not found. Reply to a forwarded \
     message or use /to &lt;user_id&gt; &lt;text&gt;.";

pub const TARGET_CLEARED_NOTICE: &str = "\u{2705} Active target cleared.";

pub fn target_set_notice(user: UserId) -> String {
    format!(
        "\u{1F3AF} Active target set to UID: {}. Your next message will be relayed; /cancel to clear.",
        user.0
    )
}

pub fn delivered_echo(user: UserId) -> String {
    format!("\u{2705} Delivered to UID: {}.", user.0)
}

pub fn delivery_failed_echo(user: UserId, reason: &str) -> String {
    format!(
        "\u{26A0} Could not deliver to UID: {}: {}",
        user.0,
        escape_html(reason)
    )
}
