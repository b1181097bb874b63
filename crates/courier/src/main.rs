use std::sync::Arc;

use courier_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), courier_core::Error> {
    courier_core::logging::init("courier")?;

    let cfg = Arc::new(Config::load()?);

    courier_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| courier_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
