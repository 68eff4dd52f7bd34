//! `key=value` override handling.
//!
//! The algorithm only depends on the [`OverrideTarget`] trait, so it can be
//! exercised without a grammar or a build state.

use crate::axis::{Axis, OverrideKey, PersonaAxis};
use crate::error::{CliError, ErrorKind};

/// The host state an override is applied to.
pub trait OverrideTarget {
    /// Canonical task name for `value`, if it is a task.
    fn resolve_task(&self, value: &str) -> Option<String>;

    /// Canonical token for `value` on `axis`, if valid.
    fn resolve_axis_token(&self, axis: Axis, value: &str) -> Option<String>;

    /// Soft cap for a list axis; `None` means unlimited.
    fn axis_cap(&self, axis: Axis) -> Option<usize>;

    /// Split a list value (`a,b` or `a b`) into normalized tokens.
    fn split_list(&self, value: &str) -> Vec<String>;

    fn set_task(&mut self, task: String);

    /// Replace every value held for `axis`.
    fn set_axis(&mut self, axis: Axis, values: Vec<String>);

    /// Set a persona axis, replacing any earlier value.
    fn apply_persona(&mut self, axis: PersonaAxis, value: &str) -> Result<(), CliError>;

    fn add_recognized(&mut self, bucket: &str, values: &[String]);

    /// Attach the recognized/unrecognized snapshot to an error.
    fn fail(&mut self, err: CliError) -> CliError;

    /// Record `value` as unrecognized for `key` and build the error.
    fn unknown_value(&mut self, key: &str, value: &str) -> CliError;
}

/// Apply one `key=value` token to `target`.
pub fn apply_override<T: OverrideTarget + ?Sized>(target: &mut T, token: &str) -> Result<(), CliError> {
    let (key, value) = match token.find('=') {
        Some(idx) if idx > 0 && idx + 1 < token.len() => (&token[..idx], &token[idx + 1..]),
        _ => {
            return Err(target.fail(CliError::new(
                ErrorKind::Format,
                "key=value override expected",
            )));
        }
    };
    let key = key.trim();
    let value = value.trim();
    if value.is_empty() {
        return Err(target.fail(
            CliError::new(ErrorKind::Format, format!("override for {key} missing value")).with_axis(key),
        ));
    }

    let Ok(parsed) = key.parse::<OverrideKey>() else {
        return Err(target.fail(CliError::new(
            ErrorKind::UnknownToken,
            format!("unknown override key {key}"),
        )));
    };

    match parsed {
        OverrideKey::Preset => Err(target.fail(
            CliError::new(
                ErrorKind::PresetConflict,
                "persona presets must appear before overrides",
            )
            .with_axis(key),
        )),
        OverrideKey::Task => {
            let Some(task) = target.resolve_task(value) else {
                return Err(target.unknown_value(key, value));
            };
            target.add_recognized(OverrideKey::TASK, std::slice::from_ref(&task));
            target.set_task(task);
            Ok(())
        }
        OverrideKey::Axis(axis) if axis.is_list() => apply_list(target, axis, value),
        OverrideKey::Axis(axis @ (Axis::Form | Axis::Channel)) => {
            let items = target.split_list(value);
            let item = match items.as_slice() {
                [] => {
                    return Err(target.fail(
                        CliError::new(ErrorKind::Format, format!("{axis} override requires a value"))
                            .with_axis(key),
                    ));
                }
                [item] => item,
                _ => {
                    return Err(target.fail(
                        CliError::new(ErrorKind::Conflict, format!("{axis} accepts a single token"))
                            .with_axis(key),
                    ));
                }
            };
            apply_single(target, axis, item)
        }
        OverrideKey::Axis(axis) => apply_single(target, axis, value),
        OverrideKey::Persona(axis) => target.apply_persona(axis, value),
    }
}

fn apply_single<T: OverrideTarget + ?Sized>(target: &mut T, axis: Axis, value: &str) -> Result<(), CliError> {
    let Some(token) = target.resolve_axis_token(axis, value) else {
        return Err(target.unknown_value(axis.as_str(), value));
    };
    let values = vec![token];
    target.add_recognized(axis.as_str(), &values);
    target.set_axis(axis, values);
    Ok(())
}

fn apply_list<T: OverrideTarget + ?Sized>(target: &mut T, axis: Axis, value: &str) -> Result<(), CliError> {
    let items = target.split_list(value);
    if items.is_empty() {
        return Err(target.fail(
            CliError::new(
                ErrorKind::Format,
                format!("{axis} override requires at least one token"),
            )
            .with_axis(axis.as_str()),
        ));
    }

    let mut processed: Vec<String> = Vec::with_capacity(items.len());
    for item in &items {
        let Some(token) = target.resolve_axis_token(axis, item) else {
            return Err(target.unknown_value(axis.as_str(), item));
        };
        if !processed.contains(&token) {
            processed.push(token);
        }
    }

    if let Some(cap) = target.axis_cap(axis) {
        if processed.len() > cap {
            return Err(target.fail(
                CliError::new(
                    ErrorKind::Conflict,
                    format!("{axis} supports at most {cap} tokens"),
                )
                .with_axis(axis.as_str()),
            ));
        }
    }

    target.add_recognized(axis.as_str(), &processed);
    target.set_axis(axis, processed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    /// In-memory target with a tiny fixed vocabulary.
    #[derive(Default)]
    struct MockTarget {
        task: Option<String>,
        axes: BTreeMap<Axis, Vec<String>>,
        persona: BTreeMap<PersonaAxis, String>,
        recognized: BTreeMap<String, Vec<String>>,
        unrecognized: Vec<String>,
    }

    impl OverrideTarget for MockTarget {
        fn resolve_task(&self, value: &str) -> Option<String> {
            ["show", "make"].contains(&value).then(|| value.to_owned())
        }

        fn resolve_axis_token(&self, axis: Axis, value: &str) -> Option<String> {
            let known: &[&str] = match axis {
                Axis::Scope => &["focus", "system", "edges"],
                Axis::Method => &["steps", "analysis"],
                Axis::Form => &["table", "bullets"],
                Axis::Channel => &["slack"],
                Axis::Directional => &["fog", "fly rog"],
                Axis::Completeness => &["full", "gist"],
            };
            known.contains(&value).then(|| value.to_owned())
        }

        fn axis_cap(&self, axis: Axis) -> Option<usize> {
            (axis == Axis::Scope).then_some(2)
        }

        fn split_list(&self, value: &str) -> Vec<String> {
            if value.contains(',') {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect()
            } else {
                value.split_whitespace().map(str::to_owned).collect()
            }
        }

        fn set_task(&mut self, task: String) {
            self.task = Some(task);
        }

        fn set_axis(&mut self, axis: Axis, values: Vec<String>) {
            self.axes.insert(axis, values);
        }

        fn apply_persona(&mut self, axis: PersonaAxis, value: &str) -> Result<(), CliError> {
            if value == "nobody" {
                return Err(self.unknown_value(axis.as_str(), value));
            }
            self.persona.insert(axis, value.to_owned());
            Ok(())
        }

        fn add_recognized(&mut self, bucket: &str, values: &[String]) {
            self.recognized
                .entry(bucket.to_owned())
                .or_default()
                .extend(values.iter().cloned());
        }

        fn fail(&mut self, mut err: CliError) -> CliError {
            err.recognized = self.recognized.clone();
            err.unrecognized = self.unrecognized.clone();
            err
        }

        fn unknown_value(&mut self, key: &str, value: &str) -> CliError {
            self.unrecognized.push(value.to_owned());
            let err = CliError::new(ErrorKind::UnknownToken, format!("unrecognized token for {key}"))
                .with_axis(key);
            self.fail(err)
        }
    }

    fn apply(target: &mut MockTarget, token: &str) -> Result<(), CliError> {
        apply_override(target, token)
    }

    #[test]
    fn malformed_tokens_are_format_errors() {
        for token in ["scope", "=focus", "scope="] {
            let err = apply(&mut MockTarget::default(), token).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Format, "token {token:?}");
            assert_eq!(err.message, "key=value override expected");
        }
        let err = apply(&mut MockTarget::default(), "scope=   ").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Format);
        assert_eq!(err.message, "override for scope missing value");
    }

    #[test]
    fn unknown_key_is_unknown_token() {
        let err = apply(&mut MockTarget::default(), "colour=red").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownToken);
        assert_eq!(err.message, "unknown override key colour");
    }

    #[test]
    fn persona_key_is_always_a_preset_conflict() {
        let err = apply(&mut MockTarget::default(), "persona=coach_junior").unwrap_err();
        assert_eq!(err.kind, ErrorKind::PresetConflict);
    }

    #[test]
    fn task_override_sets_and_records() {
        let mut target = MockTarget::default();
        apply(&mut target, "task=show").unwrap();
        assert_eq!(target.task.as_deref(), Some("show"));
        assert_eq!(target.recognized["task"], vec!["show"]);

        let err = apply(&mut target, "task=dance").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownToken);
        assert_eq!(err.message, "unrecognized token for task");
        assert_eq!(err.unrecognized, vec!["dance"]);
        assert_eq!(err.recognized["task"], vec!["show"]);
    }

    #[test]
    fn list_override_dedupes_and_replaces() {
        let mut target = MockTarget::default();
        target.axes.insert(Axis::Scope, vec!["edges".into()]);
        apply(&mut target, "scope=focus, system ,focus").unwrap();
        assert_eq!(target.axes[&Axis::Scope], vec!["focus", "system"]);

        apply(&mut target, "scope=edges").unwrap();
        assert_eq!(target.axes[&Axis::Scope], vec!["edges"]);
    }

    #[test]
    fn list_override_accepts_whitespace_separated_values() {
        let mut target = MockTarget::default();
        apply(&mut target, "method=steps analysis").unwrap();
        assert_eq!(target.axes[&Axis::Method], vec!["steps", "analysis"]);
    }

    #[test]
    fn list_override_enforces_cap() {
        let mut target = MockTarget::default();
        let err = apply(&mut target, "scope=focus,system,edges").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.message, "scope supports at most 2 tokens");
        assert!(!target.axes.contains_key(&Axis::Scope));
    }

    #[test]
    fn list_override_rejects_empty_and_unknown_items() {
        let err = apply(&mut MockTarget::default(), "scope=,,").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Format);
        assert_eq!(err.message, "scope override requires at least one token");

        let err = apply(&mut MockTarget::default(), "scope=focus,meen").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownToken);
        assert_eq!(err.offending_token(), Some("meen"));
        assert_eq!(err.axis.as_deref(), Some("scope"));
    }

    #[test]
    fn single_axis_override_accepts_exactly_one_value() {
        let mut target = MockTarget::default();
        apply(&mut target, "form=table").unwrap();
        assert_eq!(target.axes[&Axis::Form], vec!["table"]);

        let err = apply(&mut target, "form=table,bullets").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.message, "form accepts a single token");

        let err = apply(&mut target, "channel=,").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Format);
        assert_eq!(err.message, "channel override requires a value");
    }

    #[test]
    fn directional_value_is_not_split() {
        let mut target = MockTarget::default();
        apply(&mut target, "directional=fly rog").unwrap();
        assert_eq!(target.axes[&Axis::Directional], vec!["fly rog"]);
    }

    #[test]
    fn persona_overrides_delegate_to_target() {
        let mut target = MockTarget::default();
        apply(&mut target, "voice=as teacher").unwrap();
        apply(&mut target, "voice=as PM").unwrap();
        assert_eq!(target.persona[&PersonaAxis::Voice], "as PM");

        let err = apply(&mut target, "audience=nobody").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownToken);
    }
}
