use std::sync::Arc;

use relaybot_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), relaybot_core::Error> {
    relaybot_core::logging::init("relaybot")?;

    let cfg = Arc::new(Config::load()?);

    relaybot_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| relaybot_core::Error::External(format!("telegram bot failed: {e:#}")))?;

    Ok(())
}
