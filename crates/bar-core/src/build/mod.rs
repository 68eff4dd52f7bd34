//! The build state machine: turns a token list into a [`BuildResult`].
//!
//! Tokens are consumed left to right. Bare tokens are classified in
//! *shorthand* mode; the first `key=value` token (other than
//! `persona=<preset>`) switches permanently to *override* mode, where every
//! remaining token must be a `key=value` override. The first failure aborts
//! the build with a [`CliError`] carrying everything recognized so far.

mod overrides;
mod result;

use std::collections::BTreeMap;

use tracing::debug;

use crate::axis::{Axis, OverrideKey, PersonaAxis};
use crate::error::{CliError, ErrorKind};
use crate::grammar::Grammar;

pub use overrides::{OverrideTarget, apply_override};
pub use result::{AxesResult, BuildResult, HydratedPromptlet, PersonaResult};

/// Recognized-token bucket and hydrated axis name for the persona preset.
pub const PRESET_BUCKET: &str = "persona_preset";

/// Compose a prompt recipe from raw tokens.
pub fn build<S: AsRef<str>>(grammar: &Grammar, tokens: &[S]) -> Result<BuildResult, CliError> {
    let normalized = grammar.normalize_with_source(tokens);
    let mut state = BuildState::new(grammar);

    for entry in &normalized {
        let token = entry.canonical.trim();
        if token.is_empty() {
            continue;
        }
        state.require_slug_input(token, &entry.source)?;

        if !state.override_mode {
            if let Some(preset) = preset_value(token) {
                if preset.is_empty() {
                    return Err(state.error(ErrorKind::Format, "persona preset requires a value"));
                }
                state.apply_preset(preset)?;
                continue;
            }
            if !token.contains('=') {
                state.apply_shorthand(token)?;
                continue;
            }
            debug!(token, "switching to override mode");
            state.override_mode = true;
        }
        apply_override(&mut state, token)?;
    }

    state.finalise()?;
    let result = state.into_result();
    debug!(
        task = %result.axes.task,
        constraints = result.constraints.len(),
        persona = result.hydrated_persona.len(),
        "build complete"
    );
    Ok(result)
}

/// The value of a `persona=<preset>` token.
fn preset_value(token: &str) -> Option<&str> {
    token
        .strip_prefix(OverrideKey::PRESET)
        .and_then(|rest| rest.strip_prefix('='))
        .map(str::trim)
}

/// Per-call accumulator. Never shared between builds.
struct BuildState<'g> {
    grammar: &'g Grammar,

    task: Option<String>,
    task_explicit: bool,
    completeness_explicit: bool,
    /// Contract-axis values; single-valued axes hold at most one entry.
    axes: BTreeMap<Axis, Vec<String>>,

    /// Preset key and label.
    preset: Option<(String, String)>,
    persona: BTreeMap<PersonaAxis, String>,

    override_mode: bool,
    recognized: BTreeMap<String, Vec<String>>,
    unrecognized: Vec<String>,
}

impl<'g> BuildState<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        let mut axes = BTreeMap::new();
        if let Some(completeness) = grammar.default_completeness() {
            axes.insert(Axis::Completeness, vec![completeness.to_owned()]);
        }
        Self {
            grammar,
            task: grammar.default_task().map(str::to_owned),
            task_explicit: false,
            completeness_explicit: false,
            axes,
            preset: None,
            persona: BTreeMap::new(),
            override_mode: false,
            recognized: BTreeMap::new(),
            unrecognized: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Errors and bookkeeping
    // -----------------------------------------------------------------------

    fn error(&mut self, kind: ErrorKind, message: impl Into<String>) -> CliError {
        self.fail(CliError::new(kind, message))
    }

    fn conflict(&mut self, axis: &str, message: String) -> CliError {
        self.fail(CliError::new(ErrorKind::Conflict, message).with_axis(axis))
    }

    /// Each bucket sorted, for stable error output.
    fn recognized_snapshot(&self) -> BTreeMap<String, Vec<String>> {
        self.recognized
            .iter()
            .map(|(bucket, tokens)| {
                let mut tokens = tokens.clone();
                tokens.sort();
                (bucket.clone(), tokens)
            })
            .collect()
    }

    /// Reject a token typed in its canonical spelling when the grammar
    /// registers a different slug for it.
    fn require_slug_input(&mut self, canonical: &str, source: &str) -> Result<(), CliError> {
        let canonical = canonical.trim();
        let source = source.trim();
        if canonical.is_empty() || source.is_empty() {
            return Ok(());
        }
        let is_override = match canonical.split_once('=') {
            Some((_, value)) if value.trim().is_empty() => return Ok(()),
            Some(_) => true,
            None => false,
        };

        let slug = self.grammar.slug_for(canonical);
        let slug_lower = slug.trim().to_lowercase();
        let source_lower = source.to_lowercase();
        let canonical_lower = canonical.to_lowercase();

        if is_override && source_lower == canonical_lower {
            return Ok(());
        }
        if !slug_lower.is_empty() && (source_lower == slug_lower || canonical_lower == slug_lower) {
            return Ok(());
        }
        if source_lower == canonical_lower {
            self.unrecognized.push(source.to_owned());
            return Err(self.error(
                ErrorKind::UnknownToken,
                format!("token {source:?} must use slug {slug:?}"),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Shorthand mode
    // -----------------------------------------------------------------------

    fn apply_shorthand(&mut self, token: &str) -> Result<(), CliError> {
        let grammar = self.grammar;

        if let Some(task) = grammar.resolve_task(token) {
            if self.task_explicit {
                return Err(self.conflict(OverrideKey::TASK, "multiple task tokens provided".into()));
            }
            self.set_task(task.to_owned());
            self.add_recognized(OverrideKey::TASK, &[task.to_owned()]);
            return Ok(());
        }

        for axis in grammar.axis_probe_order() {
            if let Some(canonical) = grammar.resolve_axis_token(axis, token) {
                return self.apply_shorthand_axis(axis, canonical.to_owned());
            }
        }

        for axis in PersonaAxis::ALL {
            if let Some(canonical) = grammar.resolve_persona_token(axis, token) {
                return self.apply_persona_axis(axis, canonical, false);
            }
        }

        if grammar.resolve_preset(token).is_some() {
            return self.apply_preset(token);
        }

        self.unrecognized.push(token.to_owned());
        Err(self.error(ErrorKind::UnknownToken, "unrecognized token"))
    }

    fn apply_shorthand_axis(&mut self, axis: Axis, token: String) -> Result<(), CliError> {
        match axis {
            Axis::Completeness => {
                if self.completeness_explicit {
                    return Err(self.conflict(
                        axis.as_str(),
                        "multiple completeness tokens provided".into(),
                    ));
                }
                self.completeness_explicit = true;
                self.axes.insert(axis, vec![token.clone()]);
            }
            Axis::Scope | Axis::Method => {
                let current = self.axes.get(&axis).map(Vec::as_slice).unwrap_or(&[]);
                if current.contains(&token) {
                    return Ok(());
                }
                if let Some(cap) = self.grammar.axis_soft_cap(axis) {
                    if current.len() >= cap {
                        return Err(self.conflict(
                            axis.as_str(),
                            format!("{axis} supports at most {cap} tokens"),
                        ));
                    }
                }
                self.axes.entry(axis).or_default().push(token.clone());
            }
            Axis::Form | Axis::Channel | Axis::Directional => {
                if self.axes.get(&axis).is_some_and(|values| !values.is_empty()) {
                    return Err(self.conflict(axis.as_str(), format!("{axis} accepts a single token")));
                }
                self.axes.insert(axis, vec![token.clone()]);
            }
        }
        self.add_recognized(axis.as_str(), &[token]);
        Ok(())
    }

    fn apply_preset(&mut self, value: &str) -> Result<(), CliError> {
        if self.preset.is_some() {
            return Err(self.fail(
                CliError::new(ErrorKind::PresetConflict, "multiple persona presets supplied")
                    .with_axis(OverrideKey::PRESET),
            ));
        }
        let grammar = self.grammar;
        let Some((key, preset)) = grammar.resolve_preset(value) else {
            return Err(self.unknown_value(OverrideKey::PRESET, value));
        };

        self.preset = Some((key.to_owned(), preset.label.trim().to_owned()));
        let slots = [
            (PersonaAxis::Voice, preset.voice.as_deref()),
            (PersonaAxis::Audience, preset.audience.as_deref()),
            (PersonaAxis::Tone, preset.tone.as_deref()),
        ];
        for (axis, value) in slots {
            let value = value.map(str::trim).unwrap_or("");
            if value.is_empty() {
                continue;
            }
            self.persona.insert(axis, value.to_owned());
            self.add_recognized(axis.as_str(), &[value.to_owned()]);
        }
        self.add_recognized(PRESET_BUCKET, &[key.to_owned()]);
        debug!(preset = key, "persona preset applied");
        Ok(())
    }

    /// Set a persona axis. Shorthand may not set an axis twice; overrides
    /// may replace.
    fn apply_persona_axis(&mut self, axis: PersonaAxis, value: &str, replace: bool) -> Result<(), CliError> {
        let Some(canonical) = self.grammar.resolve_persona_token(axis, value) else {
            return Err(self.unknown_value(axis.as_str(), value));
        };
        if self.persona.contains_key(&axis) && !replace {
            return Err(self.conflict(
                axis.as_str(),
                format!("{axis} provided multiple times in shorthand"),
            ));
        }
        self.persona.insert(axis, canonical.to_owned());
        self.add_recognized(axis.as_str(), &[canonical.to_owned()]);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Finalisation
    // -----------------------------------------------------------------------

    fn finalise(&mut self) -> Result<(), CliError> {
        if self.task.is_none() {
            return Err(self.error(ErrorKind::MissingStatic, "no task token provided"));
        }
        for axis in [Axis::Scope, Axis::Method] {
            if let Some(values) = self.axes.get_mut(&axis) {
                dedupe_in_order(values);
            }
        }
        Ok(())
    }

    fn hydrated_constraints(&self) -> Vec<HydratedPromptlet> {
        // BTreeMap order over `Axis` is the hydration order.
        self.axes
            .iter()
            .flat_map(|(axis, tokens)| {
                tokens.iter().map(move |token| HydratedPromptlet {
                    axis: axis.as_str().to_owned(),
                    token: token.clone(),
                    description: self.grammar.axis_description(*axis, token).to_owned(),
                })
            })
            .collect()
    }

    fn hydrated_persona(&self) -> Vec<HydratedPromptlet> {
        let mut entries = Vec::with_capacity(5);
        if let Some((key, label)) = &self.preset {
            entries.push(HydratedPromptlet {
                axis: PRESET_BUCKET.to_owned(),
                token: key.clone(),
                description: label.clone(),
            });
        }
        for (axis, token) in &self.persona {
            entries.push(HydratedPromptlet {
                axis: axis.as_str().to_owned(),
                token: token.clone(),
                description: self.grammar.persona_description(*axis, token).to_owned(),
            });
        }
        entries
    }

    fn into_result(self) -> BuildResult {
        let hydrated_constraints = self.hydrated_constraints();
        let hydrated_persona = self.hydrated_persona();
        let task = self.task.unwrap_or_default();

        let description = match self.grammar.task_description(&task) {
            "" => task.as_str(),
            description => description,
        };
        let task_text = format!("Task:\n  {description}");

        let single = |axis: Axis| self.axes.get(&axis).and_then(|values| values.first()).cloned();
        let list = |axis: Axis| self.axes.get(&axis).cloned().unwrap_or_default();
        let axes = AxesResult {
            task: task.clone(),
            completeness: single(Axis::Completeness),
            scope: list(Axis::Scope),
            method: list(Axis::Method),
            form: single(Axis::Form),
            channel: single(Axis::Channel),
            directional: single(Axis::Directional),
        };

        let (preset, preset_label) = match &self.preset {
            Some((key, label)) => (
                Some(key.clone()),
                (!label.is_empty()).then(|| label.clone()),
            ),
            None => (None, None),
        };
        let persona = PersonaResult {
            preset,
            preset_label,
            voice: self.persona.get(&PersonaAxis::Voice).cloned(),
            audience: self.persona.get(&PersonaAxis::Audience).cloned(),
            tone: self.persona.get(&PersonaAxis::Tone).cloned(),
            intent: self.persona.get(&PersonaAxis::Intent).cloned(),
        };

        BuildResult {
            schema_version: self.grammar.schema_version().to_owned(),
            subject: None,
            addendum: None,
            task: task_text,
            constraints: hydrated_constraints.iter().map(HydratedPromptlet::format).collect(),
            hydrated_constraints,
            axes,
            persona,
            hydrated_persona,
            reference_key: self.grammar.reference_key().to_owned(),
            tokens: None,
        }
    }
}

impl OverrideTarget for BuildState<'_> {
    fn resolve_task(&self, value: &str) -> Option<String> {
        self.grammar.resolve_task(value).map(str::to_owned)
    }

    fn resolve_axis_token(&self, axis: Axis, value: &str) -> Option<String> {
        self.grammar.resolve_axis_token(axis, value).map(str::to_owned)
    }

    fn axis_cap(&self, axis: Axis) -> Option<usize> {
        self.grammar.axis_soft_cap(axis)
    }

    /// Comma-separated when a comma is present, whitespace-separated
    /// otherwise. Each piece is normalized, so multi-word tokens and slugs
    /// survive the split.
    fn split_list(&self, value: &str) -> Vec<String> {
        let collect = |segment: &str| {
            let words: Vec<&str> = segment.split_whitespace().collect();
            self.grammar.normalize(&words)
        };
        if value.contains(',') {
            value
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .flat_map(collect)
                .collect()
        } else {
            collect(value)
        }
    }

    fn set_task(&mut self, task: String) {
        self.task = Some(task);
        self.task_explicit = true;
    }

    fn set_axis(&mut self, axis: Axis, values: Vec<String>) {
        if axis == Axis::Completeness {
            self.completeness_explicit = true;
        }
        self.axes.insert(axis, values);
    }

    fn apply_persona(&mut self, axis: PersonaAxis, value: &str) -> Result<(), CliError> {
        self.apply_persona_axis(axis, value, true)
    }

    fn add_recognized(&mut self, bucket: &str, values: &[String]) {
        if bucket.is_empty() {
            return;
        }
        let existing = self.recognized.entry(bucket.to_owned()).or_default();
        for value in values {
            if !value.is_empty() && !existing.contains(value) {
                existing.push(value.clone());
            }
        }
    }

    fn fail(&mut self, mut err: CliError) -> CliError {
        if err.recognized.is_empty() {
            err.recognized = self.recognized_snapshot();
        }
        if err.unrecognized.is_empty() {
            err.unrecognized = self.unrecognized.clone();
        }
        err
    }

    fn unknown_value(&mut self, key: &str, value: &str) -> CliError {
        self.unrecognized.push(value.to_owned());
        let message = if key.is_empty() {
            "unrecognized token".to_owned()
        } else {
            format!("unrecognized token for {key}")
        };
        let mut err = CliError::new(ErrorKind::UnknownToken, message);
        if !key.is_empty() {
            err = err.with_axis(key);
        }
        self.fail(err)
    }
}

fn dedupe_in_order(values: &mut Vec<String>) {
    let mut seen = Vec::with_capacity(values.len());
    values.retain(|value| {
        if seen.contains(value) {
            false
        } else {
            seen.push(value.clone());
            true
        }
    });
}
