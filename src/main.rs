use std::sync::Arc;

use anyhow::{Context, anyhow};
use tokio::sync::watch;
use tracing::{error, info};
use zenpost::core::config::AppConfig;
use zenpost::telegram::run_update_loop;
use zenpost::worker::{PublishSettings, Publisher, run_scheduler};
use zenpost::{ArtClient, LlmClient, TelegramClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the real environment may already be set.
    let _ = dotenvy::dotenv();
    zenpost::setup_logging();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        anyhow!(e)
    })?;

    let telegram = Arc::new(TelegramClient::new(config.telegram_token.clone()));
    let publisher = Arc::new(Publisher::new(
        Arc::new(LlmClient::new(
            config.text_api_key.clone(),
            config.text_api_base.clone(),
            config.text_model.clone(),
        )),
        Arc::new(ArtClient::new(
            config.yandex_folder_id.clone(),
            config.yandex_api_key.clone(),
            config.image_dir.clone(),
        )),
        telegram.clone(),
        PublishSettings::from_config(&config),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = tokio::spawn(run_scheduler(
        publisher,
        config.publish_interval,
        shutdown_rx.clone(),
    ));

    let updates = {
        let telegram = telegram.clone();
        tokio::spawn(async move { run_update_loop(&telegram, shutdown_rx).await })
    };

    info!(
        "Bot running for chat {} (Ctrl-C to stop)",
        config.telegram_chat_id
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);

    let (scheduler_result, updates_result) = futures::future::join(scheduler, updates).await;
    let attempts = scheduler_result.context("scheduler task panicked")?;
    updates_result.context("update loop task panicked")?;

    info!("Stopped after {} publish attempts", attempts);
    Ok(())
}
