//! Token normalization: slug resolution and multi-word merging.
//!
//! Voice input arrives one word at a time, so `as teacher` shows up as
//! `["as", "teacher"]`. Normalization folds such runs back into the
//! grammar's multi-word tokens (longest match wins) and maps typed slugs to
//! their canonical spelling.

use serde::Serialize;

use super::Grammar;

/// A canonical token together with the raw input that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedToken {
    pub canonical: String,
    /// The raw word(s), joined with single spaces.
    pub source: String,
}

impl Grammar {
    /// Normalize raw tokens, returning canonical forms only.
    pub fn normalize<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<String> {
        self.normalize_with_source(tokens)
            .into_iter()
            .map(|token| token.canonical)
            .collect()
    }

    /// Normalize raw tokens, keeping the raw source of each result.
    ///
    /// Blank entries are skipped. A token containing `=` is never merged
    /// with its neighbours.
    pub fn normalize_with_source<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<NormalizedToken> {
        let mut normalized = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            let raw = tokens[i].as_ref().trim();
            i += 1;
            if raw.is_empty() {
                continue;
            }
            let token = self.canonical_for_input(raw).unwrap_or(raw);
            if token.contains('=') {
                normalized.push(NormalizedToken {
                    canonical: token.to_owned(),
                    source: raw.to_owned(),
                });
                continue;
            }

            let rest = &tokens[i..];
            let (combined, consumed) = self.combine_multi_word(token, rest);
            let mut source_parts = vec![raw];
            source_parts.extend(
                rest[..consumed]
                    .iter()
                    .map(|part| part.as_ref().trim())
                    .filter(|part| !part.is_empty()),
            );
            i += consumed;

            let canonical = self.canonical_for_input(combined).unwrap_or(combined);
            normalized.push(NormalizedToken {
                canonical: canonical.to_owned(),
                source: source_parts.join(" "),
            });
        }
        normalized
    }

    /// Find the longest multi-word token starting with `initial` whose
    /// remaining words match the head of `rest` case-insensitively.
    /// Returns the merged token and how many entries of `rest` it consumed.
    fn combine_multi_word<'a, S: AsRef<str>>(&'a self, initial: &'a str, rest: &[S]) -> (&'a str, usize) {
        let Some(candidates) = self.multi_word.get(&initial.to_lowercase()) else {
            return (initial, 0);
        };
        let mut best: (&str, usize) = (initial, 0);
        for candidate in candidates {
            let extra = candidate.words_lower.len() - 1;
            if extra == 0 || extra > rest.len() || extra <= best.1 {
                continue;
            }
            let matches = candidate.words_lower[1..]
                .iter()
                .zip(rest)
                .all(|(expected, word)| {
                    let word = word.as_ref().trim();
                    !word.is_empty() && word.to_lowercase() == *expected
                });
            if matches {
                best = (candidate.canonical.as_str(), extra);
            }
        }
        best
    }
}
