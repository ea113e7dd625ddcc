use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::models::{Extraction, PhotoDirective};

/// Literal that opens a photo directive, as in `[ФОТО: a red fox]`.
pub const PHOTO_MARKER: &str = "ФОТО";

static DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?s)\[{}:(.*?)\]", regex::escape(PHOTO_MARKER)))
        .expect("static regex compile")
});

/// Splits a generated document into its photo directive (if any) and the
/// narrative body.
///
/// Only the first directive is consulted and only its span is removed; any
/// later directives stay in the cleaned text. The description may span
/// several lines and is returned trimmed. A document without a directive is
/// returned as-is apart from trimming.
#[must_use]
pub fn extract_photo_directive(document: &str) -> Extraction {
    let Some(caps) = DIRECTIVE_RE.captures(document) else {
        return Extraction {
            directive: None,
            cleaned: document.trim().to_string(),
        };
    };

    let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
        return Extraction {
            directive: None,
            cleaned: document.trim().to_string(),
        };
    };

    let mut remaining = String::with_capacity(document.len() - whole.len());
    remaining.push_str(&document[..whole.start()]);
    remaining.push_str(&document[whole.end()..]);

    Extraction {
        directive: Some(PhotoDirective {
            description: inner.as_str().trim().to_string(),
            span: whole.range(),
        }),
        cleaned: remaining.trim().to_string(),
    }
}
