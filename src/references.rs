//! Issue-key extraction from commit messages, and key ordering.
//!
//! A commit credits an issue only when its message starts with
//! `<PROJECT>-<digits>`. References elsewhere in the message are ignored,
//! and an all-zero number (`ABC-000`) marks a commit with no ticket.

use std::collections::HashSet;

use regex::Regex;

/// Matches issue references for one project key.
#[derive(Debug, Clone)]
pub struct ReferenceMatcher {
    pattern: Regex,
}

impl ReferenceMatcher {
    /// Builds a case-insensitive matcher anchored at the start of a message.
    ///
    /// # Errors
    ///
    /// Returns the regex error if the pattern cannot be compiled.
    pub fn new(project_key: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(r"(?i)^{}-([0-9]+)", regex::escape(project_key)))?;
        Ok(Self { pattern })
    }

    /// The upper-cased key referenced at the start of `message`, if any.
    #[must_use]
    pub fn extract(&self, message: &str) -> Option<String> {
        let captures = self.pattern.captures(message)?;
        let digits = captures.get(1)?.as_str();
        if digits.bytes().all(|b| b == b'0') {
            return None;
        }
        captures.get(0).map(|m| m.as_str().to_uppercase())
    }
}

/// One-shot form of [`ReferenceMatcher::extract`].
#[must_use]
pub fn extract_reference(message: &str, project_key: &str) -> Option<String> {
    ReferenceMatcher::new(project_key).ok()?.extract(message)
}

/// Drops repeated keys, keeping the first occurrence of each.
#[must_use]
pub fn dedupe_in_order(keys: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|key| seen.insert(key.clone())).collect()
}

/// Sorts keys by the first run of digits in each, ascending.
///
/// The sort is stable, so keys with equal numbers keep their order; keys
/// without digits sort first and numbers beyond `u64` sort last.
#[must_use]
pub fn sort_numerically(mut keys: Vec<String>) -> Vec<String> {
    keys.sort_by_key(|key| key_number(key));
    keys
}

fn key_number(key: &str) -> u64 {
    key.split(|c: char| !c.is_ascii_digit())
        .find(|run| !run.is_empty())
        .map_or(0, |run| run.parse().unwrap_or(u64::MAX))
}

/// Extracts, de-duplicates, and numerically sorts the keys credited by
/// `messages`, scanned in the given order.
#[must_use]
pub fn credited_keys<'a>(
    matcher: &ReferenceMatcher,
    messages: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let found = messages.into_iter().filter_map(|message| matcher.extract(message)).collect();
    sort_numerically(dedupe_in_order(found))
}
