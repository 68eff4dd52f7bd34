//! Slugs: the hyphenated, lowercase spelling users type for a token.
//!
//! `as PM` is typed as `as-pm`, `fly rog` as `fly-rog`, and
//! `audience=to product manager` as `audience=to-product-manager`.

use std::collections::HashMap;

/// Bidirectional canonical <-> slug table.
#[derive(Debug, Clone, Default)]
pub(crate) struct SlugTable {
    canonical_to_slug: HashMap<String, String>,
    /// Keyed by lowercase slug.
    slug_to_canonical: HashMap<String, String>,
}

impl SlugTable {
    /// Record an explicit assignment, replacing any previous mapping for
    /// either side.
    pub(crate) fn assign(&mut self, canonical: &str, slug: &str) {
        let canonical = canonical.trim();
        let slug = slug.trim();
        if canonical.is_empty() || slug.is_empty() {
            return;
        }
        self.canonical_to_slug
            .insert(canonical.to_owned(), slug.to_owned());
        self.slug_to_canonical
            .insert(slug.to_lowercase(), canonical.to_owned());
    }

    /// Give `canonical` its derived slug unless it already has one. Never
    /// steals a slug that already points at another token.
    pub(crate) fn ensure(&mut self, canonical: &str) {
        let canonical = canonical.trim();
        if canonical.is_empty() || self.canonical_to_slug.contains_key(canonical) {
            return;
        }
        let slug = derive_slug(canonical);
        self.slug_to_canonical
            .entry(slug.to_lowercase())
            .or_insert_with(|| canonical.to_owned());
        self.canonical_to_slug.insert(canonical.to_owned(), slug);
    }

    /// The canonical token a typed slug stands for.
    pub(crate) fn canonical_for(&self, slug: &str) -> Option<&str> {
        self.slug_to_canonical
            .get(&slug.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Whether `slug` is already claimed by a token other than `canonical`.
    pub(crate) fn is_taken(&self, slug: &str, canonical: &str) -> bool {
        self.canonical_for(slug)
            .is_some_and(|owner| owner != canonical)
    }

    /// The slug for `canonical`: the stored one, or a freshly derived one.
    pub(crate) fn slug_for(&self, canonical: &str) -> String {
        let canonical = canonical.trim();
        match self.canonical_to_slug.get(canonical) {
            Some(slug) => slug.clone(),
            None => derive_slug(canonical),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.canonical_to_slug.len()
    }
}

/// Derive the slug for a canonical token. For `key=value` forms only the
/// value is slugified, so the key stays recognisable.
pub(crate) fn derive_slug(canonical: &str) -> String {
    match canonical.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            format!("{}={}", key.trim().to_lowercase(), slugify(value))
        }
        _ => slugify(canonical),
    }
}

/// Lowercase, replace every run of characters outside `[a-z0-9_-]` with a
/// single `-`, and trim leading/trailing hyphens. Never returns an empty
/// string.
pub fn slugify(value: &str) -> String {
    let lowered = value.trim().to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        let keep = ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_';
        if keep {
            slug.push(ch);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "token".to_owned()
    } else {
        slug.to_owned()
    }
}
