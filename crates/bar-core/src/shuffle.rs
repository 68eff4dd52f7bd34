//! Random prompt generation.
//!
//! Walks the stages in a fixed order, picks one token per selected stage and
//! runs the resulting token list through [`build`]. The same seed over the
//! same grammar always yields the same tokens.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::axis::{Axis, OverrideKey, PersonaAxis};
use crate::build::{BuildResult, build};
use crate::error::CliError;
use crate::grammar::Grammar;

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// A token category shuffle can draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    PersonaPreset,
    Intent,
    Voice,
    Audience,
    Tone,
    Task,
    Completeness,
    Scope,
    Method,
    Form,
    Channel,
    Directional,
}

impl Stage {
    /// Every stage, in the order shuffle visits them. The preset comes
    /// first so choosing one can skip the individual persona axes.
    pub const ALL: [Stage; 12] = [
        Stage::PersonaPreset,
        Stage::Intent,
        Stage::Voice,
        Stage::Audience,
        Stage::Tone,
        Stage::Task,
        Stage::Completeness,
        Stage::Scope,
        Stage::Method,
        Stage::Form,
        Stage::Channel,
        Stage::Directional,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PersonaPreset => "persona_preset",
            Self::Intent => "intent",
            Self::Voice => "voice",
            Self::Audience => "audience",
            Self::Tone => "tone",
            Self::Task => "task",
            Self::Completeness => "completeness",
            Self::Scope => "scope",
            Self::Method => "method",
            Self::Form => "form",
            Self::Channel => "channel",
            Self::Directional => "directional",
        }
    }

    /// Stages a persona preset already covers.
    fn bundled_by_preset(self) -> bool {
        matches!(self, Self::Intent | Self::Voice | Self::Audience | Self::Tone)
    }

    /// Candidate tokens for this stage, sorted.
    fn tokens(self, grammar: &Grammar) -> Vec<&str> {
        match self {
            Self::PersonaPreset => grammar.preset_keys(),
            Self::Task => grammar.task_names(),
            Self::Intent => grammar.persona_tokens(PersonaAxis::Intent),
            Self::Voice => grammar.persona_tokens(PersonaAxis::Voice),
            Self::Audience => grammar.persona_tokens(PersonaAxis::Audience),
            Self::Tone => grammar.persona_tokens(PersonaAxis::Tone),
            Self::Completeness => grammar.axis_tokens(Axis::Completeness),
            Self::Scope => grammar.axis_tokens(Axis::Scope),
            Self::Method => grammar.axis_tokens(Axis::Method),
            Self::Form => grammar.axis_tokens(Axis::Form),
            Self::Channel => grammar.axis_tokens(Axis::Channel),
            Self::Directional => grammar.axis_tokens(Axis::Directional),
        }
    }

    /// The token list entry for `token` drawn from this stage.
    ///
    /// The preset is emitted as `persona=<key>` and every other stage as a
    /// slugged `key=value` override, so the list is accepted by [`build`]
    /// regardless of how tokens would classify in shorthand.
    fn emit(self, grammar: &Grammar, token: &str) -> String {
        match self {
            Self::PersonaPreset => format!("{}={token}", OverrideKey::PRESET),
            stage => grammar.slug_for(&format!("{stage}={token}")),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = StageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == key)
            .ok_or_else(|| StageParseError(s.to_owned()))
    }
}

/// Error returned when parsing an invalid [`Stage`] string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid shuffle stage: {0:?}")]
pub struct StageParseError(pub String);

// ---------------------------------------------------------------------------
// Shuffle
// ---------------------------------------------------------------------------

/// Options for [`shuffle`].
#[derive(Debug, Clone)]
pub struct ShuffleOptions {
    /// Fixed seed for reproducible output. `None` draws a fresh one.
    pub seed: Option<u64>,
    /// Stages that are always drawn from (unless excluded).
    pub include: Vec<Stage>,
    /// Stages that are never drawn from.
    pub exclude: Vec<Stage>,
    /// Probability in `[0, 1]` of drawing from an optional stage. Values
    /// outside the range are clamped; `NaN` draws no optional stage.
    pub fill: f64,
    pub subject: Option<String>,
    pub addendum: Option<String>,
}

impl Default for ShuffleOptions {
    fn default() -> Self {
        Self {
            seed: None,
            include: Vec::new(),
            exclude: Vec::new(),
            fill: 0.5,
            subject: None,
            addendum: None,
        }
    }
}

/// Generate a random prompt recipe.
///
/// The task stage is always drawn unless excluded. The generated token
/// list is recorded on the result.
pub fn shuffle(grammar: &Grammar, options: &ShuffleOptions) -> Result<BuildResult, CliError> {
    let seed = options.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let tokens = draw_tokens(grammar, options, &mut rng);
    debug!(seed, tokens = ?tokens, "shuffled tokens");

    let mut result = build(grammar, &tokens)?;
    result.subject = options.subject.clone();
    result.addendum = options.addendum.clone();
    result.tokens = Some(tokens);
    Ok(result)
}

fn draw_tokens(grammar: &Grammar, options: &ShuffleOptions, rng: &mut StdRng) -> Vec<String> {
    let include: BTreeSet<Stage> = options.include.iter().copied().collect();
    let exclude: BTreeSet<Stage> = options.exclude.iter().copied().collect();

    let fill = effective_fill(options.fill);

    let mut tokens = Vec::new();
    let mut preset_chosen = false;
    for stage in Stage::ALL {
        if exclude.contains(&stage) || (preset_chosen && stage.bundled_by_preset()) {
            continue;
        }
        let required = stage == Stage::Task || include.contains(&stage);
        if !required && rng.random::<f64>() >= fill {
            continue;
        }
        let Some(token) = stage.tokens(grammar).choose(rng).copied() else {
            continue;
        };
        tokens.push(stage.emit(grammar, token));
        if stage == Stage::PersonaPreset {
            preset_chosen = true;
        }
    }
    tokens
}

fn effective_fill(fill: f64) -> f64 {
    if fill.is_nan() {
        0.0
    } else {
        fill.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAMMAR: &str = r#"{
        "axes": {"definitions": {
            "completeness": {"full": "", "gist": ""},
            "scope": {"focus": "", "system": ""},
            "method": {"steps": ""},
            "form": {"table": ""},
            "channel": {"slack": ""},
            "directional": {"fog": "", "fly rog": ""}
        }},
        "tasks": {"descriptions": {"show": "", "make": ""}},
        "persona": {
            "axes": {"voice": ["as teacher"], "audience": ["to team"], "tone": ["gently"]},
            "presets": {"coach_junior": {"key": "coach_junior", "label": "Coach", "spoken": "coach",
                                         "voice": "as teacher", "tone": "gently"}},
            "intent": {"axis_tokens": {"intent": ["coach", "inform"]}}
        }
    }"#;

    fn grammar() -> Grammar {
        Grammar::from_json(GRAMMAR).expect("test grammar should load")
    }

    fn options(seed: u64, fill: f64) -> ShuffleOptions {
        ShuffleOptions {
            seed: Some(seed),
            fill,
            ..ShuffleOptions::default()
        }
    }

    #[test]
    fn same_seed_same_result() {
        let g = grammar();
        let a = shuffle(&g, &options(7, 0.5)).unwrap();
        let b = shuffle(&g, &options(7, 0.5)).unwrap();
        assert_eq!(a.tokens, b.tokens);
        assert_eq!(a.axes, b.axes);
    }

    #[test]
    fn zero_fill_draws_only_the_task() {
        let g = grammar();
        for seed in 0..20 {
            let result = shuffle(&g, &options(seed, 0.0)).unwrap();
            let tokens = result.tokens.unwrap();
            assert_eq!(tokens.len(), 1, "seed {seed}: {tokens:?}");
            assert!(tokens[0].starts_with("task="));
        }
    }

    #[test]
    fn full_fill_with_preset_excluded_draws_every_stage() {
        let g = grammar();
        let opts = ShuffleOptions {
            exclude: vec![Stage::PersonaPreset],
            ..options(3, 1.0)
        };
        let result = shuffle(&g, &opts).unwrap();
        assert_eq!(result.tokens.as_ref().map(Vec::len), Some(11));
        assert!(result.persona.preset.is_none());
        assert_eq!(result.persona.voice.as_deref(), Some("as teacher"));
        assert!(result.axes.directional.is_some());
    }

    #[test]
    fn preset_skips_individual_persona_axes() {
        let g = grammar();
        let result = shuffle(&g, &options(1, 1.0)).unwrap();
        let tokens = result.tokens.unwrap();
        assert_eq!(tokens[0], "persona=coach_junior");
        assert!(tokens.iter().all(|t| !t.starts_with("voice=") && !t.starts_with("intent=")));
        assert_eq!(result.persona.preset.as_deref(), Some("coach_junior"));
    }

    #[test]
    fn include_forces_stage_and_exclude_wins() {
        let g = grammar();
        let opts = ShuffleOptions {
            include: vec![Stage::Form, Stage::Scope],
            exclude: vec![Stage::Scope],
            ..options(11, 0.0)
        };
        let result = shuffle(&g, &opts).unwrap();
        assert_eq!(result.axes.form.as_deref(), Some("table"));
        assert!(result.axes.scope.is_empty());
    }

    #[test]
    fn multi_word_tokens_are_emitted_as_slugs() {
        let g = grammar();
        let opts = ShuffleOptions {
            include: vec![Stage::Voice],
            exclude: vec![Stage::PersonaPreset],
            ..options(5, 0.0)
        };
        let result = shuffle(&g, &opts).unwrap();
        let tokens = result.tokens.unwrap();
        assert!(tokens.contains(&"voice=as-teacher".to_owned()), "{tokens:?}");
        assert_eq!(result.persona.voice.as_deref(), Some("as teacher"));
    }

    #[test]
    fn subject_is_carried() {
        let opts = ShuffleOptions {
            subject: Some("the diff".into()),
            ..options(2, 0.0)
        };
        let result = shuffle(&grammar(), &opts).unwrap();
        assert_eq!(result.subject.as_deref(), Some("the diff"));
    }

    #[test]
    fn out_of_range_fill_is_clamped() {
        let g = grammar();
        for fill in [f64::NAN, -1.0, f64::NEG_INFINITY] {
            let result = shuffle(&g, &options(4, fill)).unwrap();
            assert_eq!(result.tokens.map(|t| t.len()), Some(1), "fill {fill}");
        }

        let over = ShuffleOptions {
            exclude: vec![Stage::PersonaPreset],
            ..options(4, 7.5)
        };
        let full = ShuffleOptions {
            exclude: vec![Stage::PersonaPreset],
            ..options(4, 1.0)
        };
        assert_eq!(shuffle(&g, &over).unwrap().tokens, shuffle(&g, &full).unwrap().tokens);
    }

    #[test]
    fn addendum_is_carried() {
        let opts = ShuffleOptions {
            addendum: Some("Keep it short.".into()),
            ..options(2, 0.0)
        };
        let result = shuffle(&grammar(), &opts).unwrap();
        assert_eq!(result.addendum.as_deref(), Some("Keep it short."));
    }

    #[test]
    fn stage_parsing() {
        assert_eq!("persona_preset".parse::<Stage>().unwrap(), Stage::PersonaPreset);
        assert_eq!(" Scope ".parse::<Stage>().unwrap(), Stage::Scope);
        assert!("persona".parse::<Stage>().is_err());
    }
}
