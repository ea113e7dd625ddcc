//! One publish attempt: generate, extract, illustrate, sanitize, post.
//!
//! ```text
//! generate text ──✗──► Aborted
//!      │
//!  extract directive ── none ──► text-only post
//!      │
//!  generate image ──✗──► text-only post (directive removed)
//!      │
//!  caption (first two lines) ──► photo post, image file removed afterwards
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::content::{TELEGRAM_TEXT_LIMIT, extract_photo_directive, sanitize_html, truncate_text};
use crate::core::config::AppConfig;
use crate::core::models::{AbortStage, GeneratedImage, ParseMode, PublishOutcome, TextOnlyReason};
use crate::core::{ImageGenerator, TextGenerator, Transport};
use crate::errors::PostError;
use crate::prompt::POST_PROMPT;

/// Read-only settings shared by every attempt.
#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub chat_id: String,
    pub prompt: String,
    pub text_timeout: Duration,
    pub image_timeout: Duration,
}

impl PublishSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            chat_id: config.telegram_chat_id.clone(),
            prompt: POST_PROMPT.to_string(),
            text_timeout: config.text_timeout,
            image_timeout: config.image_timeout,
        }
    }
}

/// Body of a standalone post: sanitized, then capped at Telegram's limit.
#[must_use]
pub fn prepare_message(cleaned: &str) -> String {
    truncate_text(&sanitize_html(cleaned), TELEGRAM_TEXT_LIMIT)
}

/// Photo caption built from at most the first two lines of the post.
#[must_use]
pub fn compose_caption(cleaned: &str) -> String {
    let lines: Vec<&str> = cleaned.trim().split('\n').collect();
    let caption_raw = if lines.len() > 1 {
        lines[..2].join("\n")
    } else {
        lines.first().copied().unwrap_or_default().to_string()
    };
    truncate_text(&sanitize_html(caption_raw.trim()), TELEGRAM_TEXT_LIMIT)
}

async fn bounded<T, F>(limit: Duration, what: &str, fut: F) -> Result<T, PostError>
where
    F: Future<Output = Result<T, PostError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| PostError::TimeoutError(format!("{} after {}s", what, limit.as_secs())))?
}

/// Composes the three capabilities into publish attempts.
pub struct Publisher {
    text: Arc<dyn TextGenerator>,
    image: Arc<dyn ImageGenerator>,
    transport: Arc<dyn Transport>,
    settings: PublishSettings,
}

impl Publisher {
    #[must_use]
    pub fn new(
        text: Arc<dyn TextGenerator>,
        image: Arc<dyn ImageGenerator>,
        transport: Arc<dyn Transport>,
        settings: PublishSettings,
    ) -> Self {
        Self {
            text,
            image,
            transport,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &PublishSettings {
        &self.settings
    }

    /// Runs one attempt end to end. Every failure is logged and reported in
    /// the returned outcome; nothing is propagated to the caller.
    pub async fn run_attempt(&self) -> PublishOutcome {
        let corr_id = Uuid::new_v4();
        info!("Starting publish attempt (corr_id={})", corr_id);

        let document = match self.generate_text().await {
            Ok(document) => document,
            Err(e) => {
                error!(
                    "Text generation failed, skipping this cycle: {} (corr_id={})",
                    e, corr_id
                );
                return PublishOutcome::Aborted {
                    stage: AbortStage::GenerateText,
                    error: e.to_string(),
                };
            }
        };

        let extraction = extract_photo_directive(&document);
        let Some(description) = extraction.image_description() else {
            warn!(
                "No photo description found, posting text only (corr_id={})",
                corr_id
            );
            return self
                .finish_text_only(&extraction.cleaned, TextOnlyReason::NoDirective, corr_id)
                .await;
        };

        let image = match self.generate_image(description).await {
            Ok(image) => image,
            Err(e) => {
                warn!(
                    "Image generation failed, posting text only: {} (corr_id={})",
                    e, corr_id
                );
                return self
                    .finish_text_only(&extraction.cleaned, TextOnlyReason::ImageFailed, corr_id)
                    .await;
            }
        };

        let caption = compose_caption(&extraction.cleaned);
        match self.publish_with_image(image, &caption).await {
            Ok(()) => {
                info!("Post published with photo (corr_id={})", corr_id);
                PublishOutcome::WithImage
            }
            Err(e) => {
                error!("Failed to publish photo post: {} (corr_id={})", e, corr_id);
                PublishOutcome::Aborted {
                    stage: AbortStage::PublishWithImage,
                    error: e.to_string(),
                }
            }
        }
    }

    async fn generate_text(&self) -> Result<String, PostError> {
        let document = bounded(
            self.settings.text_timeout,
            "text generation",
            self.text.generate(&self.settings.prompt),
        )
        .await?;

        if document.trim().is_empty() {
            return Err(PostError::TextGenerationError(
                "generated document is empty".to_string(),
            ));
        }
        Ok(document)
    }

    async fn generate_image(&self, description: &str) -> Result<GeneratedImage, PostError> {
        bounded(
            self.settings.image_timeout,
            "image generation",
            self.image.generate(description),
        )
        .await
    }

    async fn finish_text_only(
        &self,
        cleaned: &str,
        reason: TextOnlyReason,
        corr_id: Uuid,
    ) -> PublishOutcome {
        let message = prepare_message(cleaned);
        match self
            .transport
            .send_message(&self.settings.chat_id, &message, ParseMode::Html)
            .await
        {
            Ok(()) => {
                info!("Post published as text only (corr_id={})", corr_id);
                PublishOutcome::TextOnly(reason)
            }
            Err(e) => {
                error!("Failed to publish text post: {} (corr_id={})", e, corr_id);
                PublishOutcome::Aborted {
                    stage: AbortStage::PublishTextOnly,
                    error: e.to_string(),
                }
            }
        }
    }

    // The image file is removed whether or not the upload succeeded.
    async fn publish_with_image(
        &self,
        image: GeneratedImage,
        caption: &str,
    ) -> Result<(), PostError> {
        let result = async {
            let bytes = image.read().await?;
            self.transport
                .send_photo(
                    &self.settings.chat_id,
                    bytes,
                    &image.file_name(),
                    caption,
                    ParseMode::Html,
                )
                .await
        }
        .await;

        image.discard().await;
        result
    }
}
