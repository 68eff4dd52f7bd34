//! The default grammar compiled into the binary.

use std::sync::OnceLock;

use super::Grammar;

/// The embedded grammar document.
pub static DEFAULT_GRAMMAR_JSON: &str = include_str!("default_grammar.json");

static GRAMMAR: OnceLock<Grammar> = OnceLock::new();

/// The embedded default grammar, parsed on first use.
///
/// # Panics
///
/// Panics if the embedded JSON is malformed or contains a persona
/// collision. This is a compile-time invariant -- the document ships with
/// the crate and is covered by its tests.
pub fn grammar() -> &'static Grammar {
    GRAMMAR.get_or_init(|| {
        Grammar::from_json(DEFAULT_GRAMMAR_JSON).expect("embedded default_grammar.json is invalid")
    })
}
