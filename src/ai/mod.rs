//! Text and image generation clients

pub mod client;
pub mod image;

// Re-export main types for convenience
pub use client::{LlmClient, estimate_tokens};
pub use image::ArtClient;
