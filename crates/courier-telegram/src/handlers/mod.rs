//! Telegram update handlers.
//!
//! The endpoint maps each update into the core inbound model, classifies
//! it, and hands the chosen route to the relay service. Every route is
//! fault-isolated: a failing relay is logged and the dispatcher moves on
//! to the next update.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::warn;

use courier_core::classify::{classify, Route};

use crate::inbound::map_message;
use crate::router::AppState;

mod commands;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(event) = map_message(&msg) else {
        return Ok(());
    };

    // Service commands (welcome, help, diagnostics) answer anyone and are
    // not part of the relay surface.
    if let Some(cmd) = msg.text().and_then(commands::parse_service_command) {
        return commands::handle_service_command(bot, msg, state, cmd).await;
    }

    let sender = event.sender.id;
    let is_admin = state.relay.is_admin(sender);
    let has_target = is_admin && state.relay.has_active_target(sender).await;

    match classify(event, is_admin, has_target) {
        Route::AdminReply {
            target,
            payload,
            origin,
        } => {
            if let Err(e) = state
                .relay
                .deliver_reply(sender, &target, &payload, origin)
                .await
            {
                warn!("admin reply not relayed: {e}");
            }
        }
        Route::AdminCommand(action) => {
            if let Err(e) = state.relay.handle_command(sender, action).await {
                warn!("admin command failed: {e}");
            }
        }
        Route::AdminActiveSend { payload, origin } => {
            if let Err(e) = state.relay.send_to_target(sender, &payload, origin).await {
                warn!("active-target send failed: {e}");
            }
        }
        Route::EndUserInquiry(inquiry) => {
            if let Err(e) = state.relay.forward_inquiry(&inquiry).await {
                warn!(user = inquiry.sender.id.0, "inquiry not relayed: {e}");
            }
        }
        Route::Ignore => {
            // An admin slash command that failed the grammar gets a hint
            // instead of silence.
            if is_admin && msg.text().map_or(false, |t| t.starts_with('/')) {
                let _ = bot
                    .send_message(msg.chat.id, "Unrecognized command. See /help.")
                    .await;
            }
        }
    }

    Ok(())
}
