//! All Telegram-specific functionality

pub mod client;
pub mod updates;

// Re-export main types for convenience
pub use client::{ApiResponse, TelegramClient, Update};
pub use updates::run_update_loop;
