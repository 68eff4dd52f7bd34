//! Closed vocabularies for grammar axes and override keys.
//!
//! User-supplied keys arrive as strings; they are parsed into these enums
//! once at the edge so the build state machine can dispatch exhaustively.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Contract axes
// ---------------------------------------------------------------------------

/// One of the fixed contract axes that shape how a task is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Completeness,
    Scope,
    Method,
    Form,
    Channel,
    Directional,
}

impl Axis {
    /// Every contract axis, in hydration order.
    pub const ALL: [Axis; 6] = [
        Axis::Completeness,
        Axis::Scope,
        Axis::Method,
        Axis::Form,
        Axis::Channel,
        Axis::Directional,
    ];

    /// Return the lowercase key used in grammar documents and overrides.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completeness => "completeness",
            Self::Scope => "scope",
            Self::Method => "method",
            Self::Form => "form",
            Self::Channel => "channel",
            Self::Directional => "directional",
        }
    }

    /// Whether the axis accepts several tokens (bounded by a soft cap).
    pub fn is_list(self) -> bool {
        matches!(self, Self::Scope | Self::Method)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Axis {
    type Err = AxisParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completeness" => Ok(Self::Completeness),
            "scope" => Ok(Self::Scope),
            "method" => Ok(Self::Method),
            "form" => Ok(Self::Form),
            "channel" => Ok(Self::Channel),
            "directional" => Ok(Self::Directional),
            other => Err(AxisParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Axis`] string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid axis: {0:?}")]
pub struct AxisParseError(pub String);

// ---------------------------------------------------------------------------
// Persona axes
// ---------------------------------------------------------------------------

/// One of the persona dimensions (who speaks, to whom, how, and why).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaAxis {
    Voice,
    Audience,
    Tone,
    Intent,
}

impl PersonaAxis {
    /// Every persona axis, in hydration order.
    pub const ALL: [PersonaAxis; 4] = [
        PersonaAxis::Voice,
        PersonaAxis::Audience,
        PersonaAxis::Tone,
        PersonaAxis::Intent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Audience => "audience",
            Self::Tone => "tone",
            Self::Intent => "intent",
        }
    }
}

impl fmt::Display for PersonaAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonaAxis {
    type Err = AxisParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "voice" => Ok(Self::Voice),
            "audience" => Ok(Self::Audience),
            "tone" => Ok(Self::Tone),
            "intent" => Ok(Self::Intent),
            other => Err(AxisParseError(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Override keys
// ---------------------------------------------------------------------------

/// The left-hand side of a `key=value` override token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverrideKey {
    /// `task=<name>`: the primary task selection.
    Task,
    /// `persona=<preset>`: only legal before override mode begins.
    Preset,
    Axis(Axis),
    Persona(PersonaAxis),
}

impl OverrideKey {
    pub const TASK: &'static str = "task";
    pub const PRESET: &'static str = "persona";
}

impl fmt::Display for OverrideKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task => f.write_str(Self::TASK),
            Self::Preset => f.write_str(Self::PRESET),
            Self::Axis(axis) => axis.fmt(f),
            Self::Persona(axis) => axis.fmt(f),
        }
    }
}

impl FromStr for OverrideKey {
    type Err = AxisParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::TASK => Ok(Self::Task),
            Self::PRESET => Ok(Self::Preset),
            other => other
                .parse::<Axis>()
                .map(Self::Axis)
                .or_else(|_| other.parse::<PersonaAxis>().map(Self::Persona)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_display_round_trips_through_from_str() {
        for axis in Axis::ALL {
            assert_eq!(axis.to_string().parse::<Axis>().unwrap(), axis);
        }
        for axis in PersonaAxis::ALL {
            assert_eq!(axis.to_string().parse::<PersonaAxis>().unwrap(), axis);
        }
    }

    #[test]
    fn only_scope_and_method_are_lists() {
        let lists: Vec<Axis> = Axis::ALL.into_iter().filter(|a| a.is_list()).collect();
        assert_eq!(lists, vec![Axis::Scope, Axis::Method]);
    }

    #[test]
    fn override_key_parses_every_family() {
        assert_eq!("task".parse::<OverrideKey>().unwrap(), OverrideKey::Task);
        assert_eq!("persona".parse::<OverrideKey>().unwrap(), OverrideKey::Preset);
        assert_eq!(
            "scope".parse::<OverrideKey>().unwrap(),
            OverrideKey::Axis(Axis::Scope)
        );
        assert_eq!(
            "intent".parse::<OverrideKey>().unwrap(),
            OverrideKey::Persona(PersonaAxis::Intent)
        );
    }

    #[test]
    fn override_key_rejects_unknown_and_uppercase() {
        let err = "Scope".parse::<OverrideKey>().unwrap_err();
        assert_eq!(err.0, "Scope");
        assert!("static".parse::<OverrideKey>().is_err());
    }
}
