//! Human-readable rendering of composition failures.

use std::fmt::Write as _;

use crate::error::{CliError, ErrorKind};
use crate::fuzzy;
use crate::grammar::Grammar;

/// Edit distance used for "did you mean" suggestions.
pub const SUGGESTION_DISTANCE: usize = 2;

/// Suggestions for the error's offending token.
///
/// The pool is the slugs of the error's axis when it names one, otherwise
/// the grammar's full vocabulary.
pub fn suggestions(grammar: &Grammar, err: &CliError) -> Vec<String> {
    if err.kind != ErrorKind::UnknownToken {
        return Vec::new();
    }
    let Some(token) = err.offending_token() else {
        return Vec::new();
    };
    let pool = err
        .axis
        .as_deref()
        .and_then(|axis| grammar.tokens_for(axis))
        .map(|tokens| tokens.into_iter().map(|t| grammar.slug_for(t)).collect())
        .unwrap_or_else(|| grammar.vocabulary());
    fuzzy::suggest(token, &pool, SUGGESTION_DISTANCE)
}

/// Render an error the way the CLI prints it to stderr.
///
/// ```text
/// error: unrecognized token: meen
/// Did you mean: mean
/// Successfully recognized:
///   scope: focus
///   task: show
/// Run 'bar tokens' to list valid tokens.
/// ```
pub fn render_error(grammar: &Grammar, err: &CliError) -> String {
    let mut out = String::new();
    match err.offending_token() {
        Some(token) if !err.message.contains(token) => {
            let _ = writeln!(out, "error: {}: {token}", err.message);
        }
        _ => {
            let _ = writeln!(out, "error: {}", err.message);
        }
    }

    let suggestions = suggestions(grammar, err);
    if !suggestions.is_empty() {
        let _ = writeln!(out, "Did you mean: {}", suggestions.join(", "));
    }

    if !err.recognized.is_empty() {
        out.push_str("Successfully recognized:\n");
        for (bucket, tokens) in &err.recognized {
            let _ = writeln!(out, "  {bucket}: {}", tokens.join(", "));
        }
    }

    if err.kind == ErrorKind::UnknownToken {
        match err.axis.as_deref() {
            Some(axis) if grammar.tokens_for(axis).is_some() => {
                let _ = writeln!(out, "Run 'bar tokens {axis}' to list valid tokens.");
            }
            _ => out.push_str("Run 'bar tokens' to list valid tokens.\n"),
        }
    }
    out
}
