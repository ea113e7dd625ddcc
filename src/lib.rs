/// zenpost - A Telegram channel bot that publishes an AI-written, AI-illustrated
/// post on a fixed schedule.
///
/// Every cycle the bot asks a chat model for a short HTML post containing a
/// `[ФОТО: ...]` directive, renders that description with an image model, and
/// publishes the result to one channel. When the image cannot be produced the
/// post goes out as text only; when the text cannot be produced nothing is
/// posted that cycle.
///
/// # Architecture
///
/// The system uses:
/// - an OpenAI-compatible chat-completions API (OpenRouter) for the post text
/// - Yandex ART for the illustration
/// - the Telegram Bot API for publishing and for the inbound update loop
/// - Tokio for the two long-running tasks (scheduler and update loop)
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use zenpost::core::config::AppConfig;
/// use zenpost::worker::{PublishSettings, Publisher};
/// use zenpost::{ArtClient, LlmClient, TelegramClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     zenpost::setup_logging();
///
///     let config = AppConfig::from_env()?;
///     let publisher = Publisher::new(
///         Arc::new(LlmClient::new(
///             config.text_api_key.clone(),
///             config.text_api_base.clone(),
///             config.text_model.clone(),
///         )),
///         Arc::new(ArtClient::new(
///             config.yandex_folder_id.clone(),
///             config.yandex_api_key.clone(),
///             config.image_dir.clone(),
///         )),
///         Arc::new(TelegramClient::new(config.telegram_token.clone())),
///         PublishSettings::from_config(&config),
///     );
///
///     let outcome = publisher.run_attempt().await;
///     println!("Attempt finished: {:?}", outcome);
///     Ok(())
/// }
/// ```
// Module declarations
pub mod ai;
pub mod content;
pub mod core;
pub mod errors;
pub mod prompt;
pub mod telegram;
pub mod worker;

pub use ai::{ArtClient, LlmClient, estimate_tokens};
pub use errors::PostError;
pub use telegram::TelegramClient;
pub use worker::{Publisher, run_scheduler};

/// Configure structured logging with JSON output.
///
/// The level defaults to `info` and can be overridden through `RUST_LOG`.
/// Calling this more than once is harmless; later calls are ignored.
///
/// # Example
///
/// ```
/// zenpost::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
