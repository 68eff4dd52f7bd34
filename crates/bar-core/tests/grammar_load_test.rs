//! Grammar loading from files, the environment and the embedded default.

use std::borrow::Cow;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use bar_core::grammar::{GRAMMAR_PATH_ENV, embedded};
use bar_core::{Axis, Grammar, GrammarError};
use bar_test_utils::{FIXTURE_JSON, write_fixture};

/// Serializes tests that touch process environment variables.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn lock_env() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

#[test]
fn explicit_path_wins_over_env() {
    let _lock = lock_env();
    let tmp = tempfile::TempDir::new().unwrap();
    let path = write_fixture(tmp.path());
    unsafe { std::env::set_var(GRAMMAR_PATH_ENV, tmp.path().join("missing.json")) };

    let result = Grammar::load(Some(&path));

    unsafe { std::env::remove_var(GRAMMAR_PATH_ENV) };
    let grammar = result.unwrap();
    assert_eq!(grammar.reference_key(), "Fixture reference key.");
}

#[test]
fn env_var_wins_over_embedded() {
    let _lock = lock_env();
    let tmp = tempfile::TempDir::new().unwrap();
    let path = write_fixture(tmp.path());
    unsafe { std::env::set_var(GRAMMAR_PATH_ENV, &path) };

    let result = Grammar::load(None);

    unsafe { std::env::remove_var(GRAMMAR_PATH_ENV) };
    let grammar = result.unwrap();
    assert_eq!(grammar.task_names(), vec!["fix", "make", "show", "todo"]);
}

#[test]
fn falls_back_to_embedded_grammar() {
    let _lock = lock_env();
    unsafe { std::env::remove_var(GRAMMAR_PATH_ENV) };

    let grammar = Grammar::load(None).unwrap();
    assert_eq!(
        grammar.task_names(),
        embedded::grammar().task_names(),
    );
    assert!(grammar.default_task().is_some());
}

#[test]
fn embedded_fallback_reuses_the_shared_instance() {
    let _lock = lock_env();
    unsafe { std::env::remove_var(GRAMMAR_PATH_ENV) };

    let first = Grammar::load(None).unwrap();
    let second = Grammar::load(Some(Path::new(""))).unwrap();

    assert!(matches!(first, Cow::Borrowed(_)));
    assert!(std::ptr::eq(&*first, embedded::grammar()));
    assert!(std::ptr::eq(&*second, embedded::grammar()));
}

#[test]
fn file_grammar_is_owned() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = write_fixture(tmp.path());

    let grammar = Grammar::load(Some(&path)).unwrap();

    assert!(matches!(grammar, Cow::Owned(_)));
    assert!(!std::ptr::eq(&*grammar, embedded::grammar()));
}

#[test]
fn missing_file_is_io_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("nope.json");
    let err = Grammar::load(Some(&path)).unwrap_err();
    assert!(matches!(err, GrammarError::Io { .. }), "got {err:?}");
    assert!(err.to_string().contains("nope.json"));
}

#[test]
fn malformed_json_is_parse_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = Grammar::from_file(&path).unwrap_err();
    assert!(matches!(err, GrammarError::Parse(_)), "got {err:?}");
}

#[test]
fn persona_token_colliding_with_axis_token_is_rejected() {
    let json = FIXTURE_JSON.replace("\"gently\", \"directly\"", "\"gently\", \"focus\"");
    let err = Grammar::from_json(&json).unwrap_err();
    match err {
        GrammarError::PersonaCollision(messages) => {
            assert_eq!(messages, vec!["persona tone token \"focus\" collides with scope token"]);
        }
        other => panic!("expected collision, got {other:?}"),
    }
}

#[test]
fn fixture_queries() {
    let grammar = Grammar::from_json(FIXTURE_JSON).unwrap();
    assert_eq!(grammar.axis_tokens(Axis::Method), vec!["analysis", "contrast", "steps", "walk through"]);
    assert_eq!(grammar.axis_soft_cap(Axis::Scope), Some(2));
    assert_eq!(grammar.axis_soft_cap(Axis::Form), None);
    assert_eq!(grammar.incompatibilities(Axis::Completeness, "skim"), ["walk through"]);
    assert_eq!(grammar.preset_keys(), vec!["coach_junior", "team_update"]);
    assert_eq!(grammar.slug_for("to junior engineer"), "to-junior-engineer");
    assert_eq!(grammar.tokens_for("tone"), Some(vec!["directly", "gently"]));
    assert!(grammar.tokens_for("colour").is_none());
}
