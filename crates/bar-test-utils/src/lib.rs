//! Shared test utilities for bar integration tests.
//!
//! Provides a small fixture grammar with predictable vocabularies. It
//! declares a default completeness but no default task, so tests can observe
//! `missing_static` failures.

use std::path::{Path, PathBuf};

use bar_core::Grammar;

/// The fixture grammar document.
pub const FIXTURE_JSON: &str = include_str!("../fixtures/grammar.json");

/// Parse the fixture grammar.
///
/// # Panics
///
/// Panics if the fixture fails to load; it is checked in with this crate.
pub fn fixture_grammar() -> Grammar {
    Grammar::from_json(FIXTURE_JSON).expect("fixture grammar should load")
}

/// Write the fixture grammar into `dir` and return its path.
pub fn write_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("grammar.json");
    std::fs::write(&path, FIXTURE_JSON).expect("failed to write fixture grammar");
    path
}
