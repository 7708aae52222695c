//! Utility functions and helpers.

pub mod extract;
pub mod html;
pub mod http;

use sha2::{Digest, Sha256};
use unicode_segmentation::UnicodeSegmentation;
use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Collapse all whitespace runs into single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Make a string safe to use as a file stem.
///
/// Keeps ASCII alphanumerics, `-`, `_` and `.`; everything else becomes `-`.
/// Leading dots are dropped so keys can never address parent directories.
pub fn sanitize_key(key: &str) -> String {
    let cleaned: String = key
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        short_hash(key)
    } else {
        cleaned.to_string()
    }
}

/// First 16 hex chars of the SHA-256 of `input`.
pub fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Length as Telegram and other UTF-16 based APIs count it.
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Truncate to at most `max` UTF-16 units, cutting only between grapheme
/// clusters and appending `…` when cut.
pub fn truncate_utf16(text: &str, max: usize) -> String {
    if utf16_len(text) <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    // `…` is a single UTF-16 unit
    let budget = max - 1;
    let mut used = 0;
    let mut out = String::new();
    for grapheme in text.graphemes(true) {
        let units = utf16_len(grapheme);
        if used + units > budget {
            break;
        }
        used += units;
        out.push_str(grapheme);
    }
    out.push('…');
    out
}
