//! `bar tokens`: list the vocabulary users can type.

use std::fmt::Write as _;

use anyhow::{Result, anyhow};
use serde::Serialize;

use bar_core::{Axis, Grammar, OverrideKey, PersonaAxis};

use crate::output::{to_json, write_output};

#[derive(Debug, Serialize)]
pub struct TokenSection {
    pub key: String,
    pub tokens: Vec<TokenEntry>,
}

#[derive(Debug, Serialize)]
pub struct TokenEntry {
    pub token: String,
    /// What the user types.
    pub slug: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// List every category, or only `key` (`task`, `persona`, or an axis name).
pub fn run_tokens(grammar: &Grammar, key: Option<&str>, json: bool) -> Result<()> {
    let sections = collect_sections(grammar, key)?;
    let data = if json {
        to_json(&sections)?
    } else {
        render_sections(&sections)
    };
    write_output(None, &data)
}

pub fn collect_sections(grammar: &Grammar, key: Option<&str>) -> Result<Vec<TokenSection>> {
    let keys: Vec<OverrideKey> = match key {
        Some(raw) => {
            let parsed = raw.trim().to_lowercase().parse::<OverrideKey>().map_err(|_| {
                anyhow!("unknown token category {raw:?}; expected task, persona, or an axis name")
            })?;
            vec![parsed]
        }
        None => std::iter::once(OverrideKey::Task)
            .chain(Axis::ALL.into_iter().map(OverrideKey::Axis))
            .chain(PersonaAxis::ALL.into_iter().map(OverrideKey::Persona))
            .chain(std::iter::once(OverrideKey::Preset))
            .collect(),
    };
    Ok(keys.into_iter().map(|key| section(grammar, key)).collect())
}

fn section(grammar: &Grammar, key: OverrideKey) -> TokenSection {
    let entry = |token: &str, description: &str| TokenEntry {
        token: token.to_owned(),
        slug: grammar.slug_for(token),
        description: description.trim().to_owned(),
    };
    let tokens = match key {
        OverrideKey::Task => grammar
            .task_names()
            .into_iter()
            .map(|t| entry(t, grammar.task_description(t)))
            .collect(),
        OverrideKey::Axis(axis) => grammar
            .axis_tokens(axis)
            .into_iter()
            .map(|t| entry(t, grammar.axis_description(axis, t)))
            .collect(),
        OverrideKey::Persona(axis) => grammar
            .persona_tokens(axis)
            .into_iter()
            .map(|t| entry(t, grammar.persona_description(axis, t)))
            .collect(),
        // Presets are typed as `persona=<key>` or by their spoken alias.
        OverrideKey::Preset => grammar
            .preset_keys()
            .into_iter()
            .map(|k| {
                let label = grammar.preset(k).map(|p| p.label.as_str()).unwrap_or("");
                TokenEntry {
                    token: k.to_owned(),
                    slug: grammar.slug_for(&format!("{}={k}", OverrideKey::PRESET)),
                    description: label.trim().to_owned(),
                }
            })
            .collect(),
    };
    TokenSection {
        key: key.to_string(),
        tokens,
    }
}

pub fn render_sections(sections: &[TokenSection]) -> String {
    let mut out = String::new();
    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{}:", section.key);
        if section.tokens.is_empty() {
            out.push_str("  (none)\n");
            continue;
        }
        for entry in &section.tokens {
            let display = if entry.slug == entry.token {
                entry.token.clone()
            } else {
                format!("{} (canonical: {})", entry.slug, entry.token)
            };
            if entry.description.is_empty() {
                let _ = writeln!(out, "  - {display}");
            } else {
                let _ = writeln!(out, "  - {display}: {}", entry.description);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use bar_test_utils::fixture_grammar;

    use super::*;

    #[test]
    fn all_categories_in_fixed_order() {
        let sections = collect_sections(&fixture_grammar(), None).unwrap();
        let keys: Vec<&str> = sections.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "task",
                "completeness",
                "scope",
                "method",
                "form",
                "channel",
                "directional",
                "voice",
                "audience",
                "tone",
                "intent",
                "persona"
            ]
        );
    }

    #[test]
    fn single_axis_shows_slugs_for_multi_word_tokens() {
        let sections = collect_sections(&fixture_grammar(), Some("Directional")).unwrap();
        assert_eq!(
            render_sections(&sections),
            "directional:\n\
             \x20 - fly-rog (canonical: fly rog): Zoom out, then reflect.\n\
             \x20 - fog: Generalise from the specifics.\n\
             \x20 - rog: Reflect on structure.\n"
        );
    }

    #[test]
    fn presets_show_spoken_slug_and_label() {
        let sections = collect_sections(&fixture_grammar(), Some("persona")).unwrap();
        let text = render_sections(&sections);
        assert!(text.contains("  - coach (canonical: coach_junior): Coach junior engineer\n"), "{text}");
        assert!(text.contains("  - persona=team_update (canonical: team_update): Team update\n"), "{text}");
    }

    #[test]
    fn unknown_category_is_an_error() {
        let err = collect_sections(&fixture_grammar(), Some("colour")).unwrap_err();
        assert!(err.to_string().contains("unknown token category"));
    }
}
