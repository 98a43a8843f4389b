//! Screening for script injection in user text and upstream replies.

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("script block pattern is valid")
});

static SCRIPT_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<\s*/?\s*script\b[^>]*>?").expect("script tag pattern is valid"));

static JAVASCRIPT_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)javascript\s*:").expect("javascript url pattern is valid"));

static TAG_EVENT_HANDLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<[a-z][^<>]*\son[a-z]+\s*=[^<>]*>")
        .expect("tag event handler pattern is valid")
});

static EVENT_HANDLER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bon\w+\s*=").expect("event handler pattern is valid"));

/// True when the text carries a script tag, a `javascript:` URL, or an
/// inline event handler inside a tag.
pub fn contains_active_content(text: &str) -> bool {
    SCRIPT_TAG.is_match(text) || JAVASCRIPT_URL.is_match(text) || TAG_EVENT_HANDLER.is_match(text)
}

/// Remove script blocks, stray script tags, `javascript:` schemes and
/// `on...=` handlers.
pub fn strip_active_content(text: &str) -> String {
    let without_blocks = SCRIPT_BLOCK.replace_all(text, "");
    let without_tags = SCRIPT_TAG.replace_all(&without_blocks, "");
    let without_urls = JAVASCRIPT_URL.replace_all(&without_tags, "");
    EVENT_HANDLER.replace_all(&without_urls, "").trim().to_string()
}
