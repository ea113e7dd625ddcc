/// Telegram's limit for photo captions, also applied to standalone posts.
pub const TELEGRAM_TEXT_LIMIT: usize = 1024;

pub const ELLIPSIS: &str = "...";

/// Cuts `text` down to at most `limit` characters, ending in [`ELLIPSIS`]
/// when anything was removed.
///
/// Length is counted in `char`s. The cut is purely positional and can land
/// inside an HTML tag.
#[must_use]
pub fn truncate_text(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let ellipsis_len = ELLIPSIS.chars().count();
    if limit <= ellipsis_len {
        return ELLIPSIS.chars().take(limit).collect();
    }

    let mut out: String = text.chars().take(limit - ellipsis_len).collect();
    out.push_str(ELLIPSIS);
    out
}
