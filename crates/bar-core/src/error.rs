//! Error types for grammar loading and token composition.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading a grammar document.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("open grammar {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse grammar JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(
        "persona token collision(s) detected; positional persona syntax requires unique names: {}",
        .0.join("; ")
    )]
    PersonaCollision(Vec<String>),
}

/// Classification of a composition failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Token matches nothing, or was typed in a form other than its slug.
    UnknownToken,
    /// Soft cap exceeded or a single-valued axis was given twice.
    Conflict,
    /// Persona preset repeated or supplied after overrides began.
    PresetConflict,
    /// Malformed `key=value`, or a bare token after overrides began.
    Format,
    /// No task was selected by the end of input.
    MissingStatic,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownToken => "unknown_token",
            Self::Conflict => "conflict",
            Self::PresetConflict => "preset_conflict",
            Self::Format => "format",
            Self::MissingStatic => "missing_static",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed composition failure.
///
/// Carries enough state for a caller to explain partial progress: the
/// offending token(s) and every token recognized before the failure,
/// bucketed by axis (`task`, `scope`, `voice`, `persona_preset`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct CliError {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    /// Axis or override key the failure relates to, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unrecognized: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub recognized: BTreeMap<String, Vec<String>>,
}

impl CliError {
    /// Create an error with no token context attached.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            axis: None,
            unrecognized: Vec::new(),
            recognized: BTreeMap::new(),
        }
    }

    /// Attach the axis the failure relates to.
    pub fn with_axis(mut self, axis: impl Into<String>) -> Self {
        self.axis = Some(axis.into());
        self
    }

    /// The most recent offending token, if any.
    pub fn offending_token(&self) -> Option<&str> {
        self.unrecognized.last().map(String::as_str)
    }
}
