use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{debug, info};

use relaybot_core::{
    channel::{
        throttled::{ThrottleConfig, ThrottledChannel},
        Channel,
    },
    config::Config,
    engine::RelayEngine,
};

use crate::{inbound, TelegramChannel};

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let me = bot
        .get_me()
        .await
        .context("failed to reach Telegram (check BOT_TOKEN)")?;
    info!(bot = me.username(), operators = cfg.operator_ids.len(), "relay starting");

    if cfg.drop_pending_updates {
        bot.delete_webhook()
            .drop_pending_updates(true)
            .await
            .context("failed to drop pending updates")?;
    }

    let raw_channel: Arc<dyn Channel> = Arc::new(TelegramChannel::new(bot.clone()));
    let channel: Arc<dyn Channel> = if cfg.throttle_enabled {
        Arc::new(ThrottledChannel::new(
            raw_channel,
            ThrottleConfig {
                global_min_interval: cfg.global_min_interval,
                per_chat_min_interval: cfg.per_chat_min_interval,
            },
        ))
    } else {
        raw_channel
    };

    let engine = Arc::new(RelayEngine::from_config(&cfg, channel));

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![engine])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("relay stopped");
    Ok(())
}

async fn handle_message(msg: Message, engine: Arc<RelayEngine>) -> ResponseResult<()> {
    let Some(inbound) = inbound::to_inbound(&msg) else {
        debug!(chat_id = msg.chat.id.0, "ignoring message without sender");
        return Ok(());
    };

    let routed = engine.handle(inbound, Local::now().fixed_offset()).await;
    debug!(chat_id = msg.chat.id.0, ?routed, "message routed");
    Ok(())
}
