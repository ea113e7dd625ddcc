//! Rewrites generated HTML into the subset Telegram's `HTML` parse mode
//! accepts.
//!
//! This is plain pattern rewriting, not a parser: the model is asked for a
//! handful of tags and these rules cover the ones Telegram rejects.
//! Literal `&`, `<` and `>` in text are left untouched.

use once_cell::sync::Lazy;
use regex::Regex;

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(/?)h[1-6](?:\s[^>]*)?>").expect("static regex compile"));

static LINE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("static regex compile"));

static BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</?(?:div|span|p)(?:\s[^>]*)?>").expect("static regex compile")
});

/// Applies the three rewrites:
/// - `<h1>`..`<h6>` (and their closing tags) become `<b>` / `</b>`
/// - `<br>`, `<br/>`, `<br />` become a newline
/// - `<div>`, `<span>`, `<p>` (opening or closing) are dropped
#[must_use]
pub fn sanitize_html(text: &str) -> String {
    let text = HEADING_RE.replace_all(text, "<${1}b>");
    let text = LINE_BREAK_RE.replace_all(&text, "\n");
    let text = BLOCK_RE.replace_all(&text, "");
    text.into_owned()
}
