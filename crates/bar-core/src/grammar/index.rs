//! Case-preserving token index with a lowercase fallback key.

use std::collections::{BTreeMap, HashMap};

/// The tokens of one vocabulary (an axis, a persona axis, or the task
/// catalog) together with their descriptions.
///
/// Tokens keep the case they were declared with; every token is also
/// reachable through its lowercase form.
#[derive(Debug, Clone, Default)]
pub(crate) struct TokenIndex {
    /// Canonical token -> description (possibly empty).
    entries: BTreeMap<String, String>,
    /// Lowercase token -> canonical token. First declaration wins.
    lower: HashMap<String, String>,
}

impl TokenIndex {
    /// Register a token. A non-empty description replaces an existing one;
    /// an empty description never erases one.
    pub(crate) fn insert(&mut self, token: &str, description: &str) {
        let canonical = token.trim();
        if canonical.is_empty() {
            return;
        }
        let description = description.trim();
        let entry = self.entries.entry(canonical.to_owned()).or_default();
        if !description.is_empty() {
            *entry = description.to_owned();
        }
        self.lower
            .entry(canonical.to_lowercase())
            .or_insert_with(|| canonical.to_owned());
    }

    /// Attach a description to a token that is already registered.
    /// Returns `false` when the token is unknown.
    pub(crate) fn describe(&mut self, token: &str, description: &str) -> bool {
        let Some(canonical) = self.resolve(token).map(str::to_owned) else {
            return false;
        };
        let description = description.trim();
        if !description.is_empty() {
            self.entries.insert(canonical, description.to_owned());
        }
        true
    }

    /// Resolve a token to its canonical spelling: exact match first, then
    /// the lowercase fallback.
    pub(crate) fn resolve(&self, token: &str) -> Option<&str> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        if let Some((canonical, _)) = self.entries.get_key_value(token) {
            return Some(canonical.as_str());
        }
        self.lower.get(&token.to_lowercase()).map(String::as_str)
    }

    /// Description for a token, or `""` when unknown or undocumented.
    pub(crate) fn description(&self, token: &str) -> &str {
        self.resolve(token)
            .and_then(|canonical| self.entries.get(canonical))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Canonical tokens in sorted order.
    pub(crate) fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
