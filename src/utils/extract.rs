//! Ordered extraction strategies.
//!
//! Scraped fields are read through a chain of strategies: each is tried in
//! order, the first one producing a value wins, and an exhausted chain yields
//! `None` instead of an error.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._-]+@[a-zA-Z0-9._-]+\.[a-zA-Z0-9_-]+").expect("valid email regex")
});

type Strategy<'a, T> = Box<dyn FnOnce() -> Option<T> + 'a>;

/// Lazily evaluated list of extraction strategies for one field.
pub struct Fallback<'a, T> {
    strategies: Vec<(&'static str, Strategy<'a, T>)>,
}

impl<'a, T> Fallback<'a, T> {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Append a named strategy.
    pub fn or_try(mut self, name: &'static str, strategy: impl FnOnce() -> Option<T> + 'a) -> Self {
        self.strategies.push((name, Box::new(strategy)));
        self
    }

    /// Run strategies in order, stopping at the first success.
    pub fn resolve(self) -> Option<T> {
        for (name, strategy) in self.strategies {
            if let Some(value) = strategy() {
                log::trace!("extraction strategy '{name}' succeeded");
                return Some(value);
            }
        }
        None
    }
}

impl<T> Default for Fallback<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// `Some(s)` unless `s` is blank.
pub fn non_empty(s: impl Into<String>) -> Option<String> {
    let s = s.into();
    if s.trim().is_empty() { None } else { Some(s) }
}

/// First email-looking token in `text`.
pub fn find_email(text: &str) -> Option<String> {
    EMAIL.find(text).map(|m| m.as_str().to_string())
}

/// Leading integer of a string such as `"1,234 Jobs found"`.
pub fn leading_number(text: &str) -> Option<usize> {
    let token = text.split_whitespace().next()?;
    let digits: String = token.chars().filter(|c| *c != ',').collect();
    digits.parse().ok()
}

/// Turn a table label like `"Job Location:"` into `"jobLocation"`.
pub fn camel_key(label: &str) -> String {
    let cleaned = label.replace(':', "");
    let mut out = String::with_capacity(cleaned.len());
    let mut upper_next = false;
    for ch in cleaned.trim().chars() {
        if ch.is_whitespace() {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}
