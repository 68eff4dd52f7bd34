//! Serde types for the grammar JSON document.
//!
//! These types map directly to the on-disk format. [`super::Grammar`] builds
//! its lookup indices from them and keeps the document sections for display.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level structure of a grammar document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GrammarDocument {
    #[serde(default)]
    pub schema_version: String,
    /// Explanatory text describing how to read the rendered prompt sections.
    #[serde(default)]
    pub reference_key: String,
    #[serde(default)]
    pub axes: AxisSection,
    #[serde(default)]
    pub tasks: TaskSection,
    #[serde(default)]
    pub persona: PersonaSection,
    #[serde(default)]
    pub hierarchy: HierarchySection,
    #[serde(default)]
    pub slugs: SlugSection,
}

/// Contract axis vocabularies, keyed by axis name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AxisSection {
    /// Token -> description, per axis.
    #[serde(default)]
    pub definitions: BTreeMap<String, BTreeMap<String, String>>,
    /// Tokens accepted without a description, per axis.
    #[serde(default)]
    pub list_tokens: BTreeMap<String, Vec<String>>,
}

/// The primary task catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskSection {
    /// Task name -> description.
    #[serde(default)]
    pub descriptions: BTreeMap<String, String>,
    /// Tasks that carry structured axis defaults alongside a description.
    #[serde(default)]
    pub profiles: BTreeMap<String, TaskProfile>,
}

/// A task with suggested axis values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskProfile {
    #[serde(default)]
    pub description: String,
    /// Suggested axis values (e.g. `completeness = "gist"`); informational only.
    #[serde(default)]
    pub axes: BTreeMap<String, serde_json::Value>,
}

/// Persona vocabularies, presets and the intent axis.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PersonaSection {
    /// Tokens per persona axis (voice, audience, tone).
    #[serde(default)]
    pub axes: BTreeMap<String, Vec<String>>,
    /// Token -> description, per persona axis.
    #[serde(default)]
    pub docs: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub presets: BTreeMap<String, PersonaPreset>,
    /// Spoken alias -> preset key.
    #[serde(default)]
    pub spoken_map: BTreeMap<String, String>,
    #[serde(default)]
    pub intent: IntentSection,
}

/// A named bundle of voice, audience and tone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PersonaPreset {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spoken: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IntentSection {
    /// Only the `intent` entry is consulted.
    #[serde(default)]
    pub axis_tokens: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub docs: BTreeMap<String, String>,
}

/// Ordering, caps and defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HierarchySection {
    #[serde(default)]
    pub axis_priority: Vec<String>,
    #[serde(default)]
    pub axis_soft_caps: BTreeMap<String, usize>,
    /// axis -> token -> tokens (on any axis) it should not be combined with.
    #[serde(default)]
    pub axis_incompatibilities: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub defaults: DefaultsSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DefaultsSection {
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub completeness: String,
}

/// Explicit slug assignments. Tokens without an entry get a derived slug.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SlugSection {
    #[serde(default)]
    pub canonical_to_slug: BTreeMap<String, String>,
}
