use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tracing::{info, warn};

use courier_core::{
    config::Config, domain::UserId, messaging::port::MessagingPort, relay::RelayService,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<RelayService>,
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    if let Ok(me) = bot.get_me().await {
        info!("courier started: @{}", me.username());
    }
    match cfg.admin_id {
        Some(id) => info!("admin configured: {id}"),
        None => warn!("TELEGRAM_ADMIN_ID is not set; inquiries get a configuration notice"),
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let relay = Arc::new(RelayService::new(
        cfg.admin_id.map(UserId),
        messenger,
        cfg.correlation_capacity,
    ));

    let state = Arc::new(AppState { relay });

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
