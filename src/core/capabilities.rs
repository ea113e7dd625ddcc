//! The three external services a publish attempt depends on.
//!
//! The orchestrator only ever talks to these traits; the HTTP adapters live in
//! [`crate::ai`] and [`crate::telegram`].

use async_trait::async_trait;

use super::models::{GeneratedImage, ParseMode};
use crate::errors::PostError;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produces a document for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String, PostError>;
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Renders `description` into a freshly written, uniquely named file.
    async fn generate(&self, description: &str) -> Result<GeneratedImage, PostError>;
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: ParseMode,
    ) -> Result<(), PostError>;

    async fn send_photo(
        &self,
        chat_id: &str,
        photo: Vec<u8>,
        file_name: &str,
        caption: &str,
        parse_mode: ParseMode,
    ) -> Result<(), PostError>;
}
