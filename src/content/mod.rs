//! Turning a generated document into a Telegram-safe post

pub mod directive;
pub mod markup;
pub mod truncate;

pub use directive::{PHOTO_MARKER, extract_photo_directive};
pub use markup::sanitize_html;
pub use truncate::{ELLIPSIS, TELEGRAM_TEXT_LIMIT, truncate_text};
