//! The structured output of a successful build.

use serde::{Deserialize, Serialize};

/// A resolved prompt recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResult {
    pub schema_version: String,
    /// Raw subject text supplied alongside the tokens (filled in by callers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Clarification of how to carry out the task, kept apart from the
    /// subject material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addendum: Option<String>,
    /// `"Task:\n  <description>"`.
    pub task: String,
    /// One formatted line per hydrated constraint.
    pub constraints: Vec<String>,
    pub hydrated_constraints: Vec<HydratedPromptlet>,
    pub axes: AxesResult,
    #[serde(default, skip_serializing_if = "PersonaResult::is_empty")]
    pub persona: PersonaResult,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hydrated_persona: Vec<HydratedPromptlet>,
    /// Explanatory text describing how to read the prompt sections.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reference_key: String,
    /// The tokens the result was built from, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<String>>,
}

/// Resolved contract-axis values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxesResult {
    pub task: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completeness: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scope: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub method: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directional: Option<String>,
}

/// Resolved persona values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
}

impl PersonaResult {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A token paired with its axis and description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HydratedPromptlet {
    pub axis: String,
    pub token: String,
    pub description: String,
}

impl HydratedPromptlet {
    /// Render as `"<Axis> (<token>): <description>"`, dropping whichever
    /// parts are empty.
    pub fn format(&self) -> String {
        let axis = axis_heading(&self.axis);
        let token = self.token.trim();
        let description = self.description.trim();
        match (token.is_empty(), description.is_empty()) {
            (false, false) => format!("{axis} ({token}): {description}"),
            (false, true) => format!("{axis}: {token}"),
            (true, false) => format!("{axis}: {description}"),
            (true, true) => axis,
        }
    }
}

/// `scope` -> `Scope`, `persona_preset` -> `Persona preset`.
fn axis_heading(axis: &str) -> String {
    let axis = axis.trim();
    if axis == "persona_preset" {
        return "Persona preset".to_owned();
    }
    let mut chars = axis.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
