//! Adapter-level service commands: `/start`, `/help`, and the `/id`
//! diagnostic. These answer anyone and never touch relay state.

use std::sync::Arc;

use teloxide::{prelude::*, types::ParseMode};

use courier_core::domain::UserId;

use crate::router::AppState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceCommand {
    Start,
    Help,
    Id,
}

/// Telegram may send `/cmd@botname`; match on the bare name.
pub fn parse_service_command(text: &str) -> Option<ServiceCommand> {
    let first = text.trim().split_whitespace().next()?;
    let cmd = first.strip_prefix('/')?.split('@').next().unwrap_or("");
    match cmd.to_lowercase().as_str() {
        "start" => Some(ServiceCommand::Start),
        "help" => Some(ServiceCommand::Help),
        "id" => Some(ServiceCommand::Id),
        _ => None,
    }
}

pub async fn handle_service_command(
    bot: Bot,
    msg: Message,
    state: Arc<AppState>,
    cmd: ServiceCommand,
) -> ResponseResult<()> {
    let is_admin = msg
        .from()
        .map(|u| state.relay.is_admin(UserId(u.id.0 as i64)))
        .unwrap_or(false);

    let text = match cmd {
        ServiceCommand::Start if is_admin => ADMIN_START.to_string(),
        ServiceCommand::Start => USER_START.to_string(),
        ServiceCommand::Help if is_admin => ADMIN_HELP.to_string(),
        ServiceCommand::Help => USER_START.to_string(),
        ServiceCommand::Id => {
            let user_id = msg.from().map(|u| u.id.0 as i64).unwrap_or_default();
            format!(
                "chat_id = <code>{}</code>\nuser_id = <code>{}</code>",
                msg.chat.id.0, user_id
            )
        }
    };

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

const USER_START: &str = "\u{1F44B} Hi! Write me anything and I will pass it on to the admin. \
You will get the reply right here.";

const ADMIN_START: &str = "\u{1F44B} Admin mode. Reply to any forwarded message to answer, \
or see /help for commands.";

const ADMIN_HELP: &str = "<b>Commands</b>\n\
/to &lt;user_id&gt; &lt;text&gt; — send directly\n\
/r &lt;user_id&gt; &lt;text&gt; — same as /to\n\
/target &lt;user_id&gt; — relay your next message to this user\n\
/cancel — clear the active target\n\
/id — show chat and user ids\n\n\
Replying to a forwarded message always wins over the active target.";
