//! The token grammar: vocabularies, descriptions, presets and hierarchy
//! rules loaded from a JSON document.
//!
//! A [`Grammar`] is built once and never mutated afterwards, so it can be
//! shared freely (`&Grammar` or `Arc<Grammar>`) between threads.

pub mod document;
pub mod embedded;
mod index;
mod normalize;
mod slug;

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::axis::{Axis, OverrideKey, PersonaAxis};
use crate::error::GrammarError;

pub use document::{GrammarDocument, PersonaPreset};
pub use normalize::NormalizedToken;
pub use slug::slugify;

use index::TokenIndex;
use slug::SlugTable;

/// Environment variable naming a grammar file to load instead of the
/// embedded default.
pub const GRAMMAR_PATH_ENV: &str = "BAR_GRAMMAR_PATH";

/// A multi-word token, indexed by its lowercase first word.
#[derive(Debug, Clone)]
struct MultiWordToken {
    words_lower: Vec<String>,
    canonical: String,
}

/// A loaded, indexed grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    schema_version: String,
    reference_key: String,
    tasks: TokenIndex,
    axes: BTreeMap<Axis, TokenIndex>,
    persona: BTreeMap<PersonaAxis, TokenIndex>,
    presets: BTreeMap<String, PersonaPreset>,
    /// Lowercase spoken alias -> preset key.
    spoken: HashMap<String, String>,
    axis_priority: Vec<Axis>,
    soft_caps: BTreeMap<Axis, usize>,
    incompatibilities: BTreeMap<Axis, BTreeMap<String, Vec<String>>>,
    default_task: Option<String>,
    default_completeness: Option<String>,
    multi_word: HashMap<String, Vec<MultiWordToken>>,
    slugs: SlugTable,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Grammar {
    /// Load a grammar with the standard precedence: the explicit `path`,
    /// then the file named by `BAR_GRAMMAR_PATH`, then the embedded default.
    ///
    /// File grammars are returned owned; the embedded default is borrowed
    /// from the process-wide [`embedded::grammar`] instance.
    pub fn load(path: Option<&Path>) -> Result<Cow<'static, Self>, GrammarError> {
        if let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) {
            return Self::from_file(path).map(Cow::Owned);
        }
        if let Ok(env_path) = std::env::var(GRAMMAR_PATH_ENV) {
            let env_path = env_path.trim();
            if !env_path.is_empty() {
                debug!(path = env_path, "loading grammar from {GRAMMAR_PATH_ENV}");
                return Self::from_file(Path::new(env_path)).map(Cow::Owned);
            }
        }
        Ok(Cow::Borrowed(embedded::grammar()))
    }

    /// Read and parse a grammar file.
    pub fn from_file(path: &Path) -> Result<Self, GrammarError> {
        let data = std::fs::read_to_string(path).map_err(|source| GrammarError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json(&data)
    }

    /// Parse a grammar from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, GrammarError> {
        let document: GrammarDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Index a parsed document.
    ///
    /// Fails when a persona token shares its name with a task or a
    /// contract-axis token.
    pub fn from_document(document: GrammarDocument) -> Result<Self, GrammarError> {
        let mut grammar = Self {
            schema_version: document.schema_version.trim().to_owned(),
            reference_key: document.reference_key.trim().to_owned(),
            tasks: TokenIndex::default(),
            axes: BTreeMap::new(),
            persona: BTreeMap::new(),
            presets: BTreeMap::new(),
            spoken: HashMap::new(),
            axis_priority: Vec::new(),
            soft_caps: BTreeMap::new(),
            incompatibilities: BTreeMap::new(),
            default_task: non_empty(&document.hierarchy.defaults.task),
            default_completeness: non_empty(&document.hierarchy.defaults.completeness),
            multi_word: HashMap::new(),
            slugs: SlugTable::default(),
        };

        grammar.index_tasks(&document);
        grammar.index_axes(&document);
        grammar.index_persona(&document);
        grammar.index_hierarchy(&document);
        grammar.validate_no_persona_collisions(&document)?;
        grammar.index_slugs(&document);

        debug!(
            schema_version = %grammar.schema_version,
            tasks = grammar.tasks.len(),
            axis_tokens = grammar.axes.values().map(TokenIndex::len).sum::<usize>(),
            persona_tokens = grammar.persona.values().map(TokenIndex::len).sum::<usize>(),
            presets = grammar.presets.len(),
            slugs = grammar.slugs.len(),
            "grammar loaded"
        );
        Ok(grammar)
    }

    fn index_tasks(&mut self, document: &GrammarDocument) {
        for (name, description) in &document.tasks.descriptions {
            self.tasks.insert(name, description);
        }
        // A non-empty profile description takes precedence.
        for (name, profile) in &document.tasks.profiles {
            self.tasks.insert(name, &profile.description);
        }
    }

    fn index_axes(&mut self, document: &GrammarDocument) {
        for (raw_axis, definitions) in &document.axes.definitions {
            let Some(axis) = parse_key::<Axis>(raw_axis, "axes.definitions") else {
                continue;
            };
            for (token, description) in definitions {
                self.axes.entry(axis).or_default().insert(token, description);
                self.register_multi_word(token);
            }
        }
        for (raw_axis, tokens) in &document.axes.list_tokens {
            let Some(axis) = parse_key::<Axis>(raw_axis, "axes.list_tokens") else {
                continue;
            };
            for token in tokens {
                self.axes.entry(axis).or_default().insert(token, "");
                self.register_multi_word(token);
            }
        }
    }

    fn index_persona(&mut self, document: &GrammarDocument) {
        let persona = &document.persona;
        for (raw_axis, tokens) in &persona.axes {
            let Some(axis) = parse_key::<PersonaAxis>(raw_axis, "persona.axes") else {
                continue;
            };
            for token in tokens {
                self.persona.entry(axis).or_default().insert(token, "");
                self.register_multi_word(token);
            }
        }
        if let Some(intents) = persona.intent.axis_tokens.get("intent") {
            for token in intents {
                self.persona
                    .entry(PersonaAxis::Intent)
                    .or_default()
                    .insert(token, "");
                self.register_multi_word(token);
            }
        }

        for (raw_axis, docs) in &persona.docs {
            let Some(axis) = parse_key::<PersonaAxis>(raw_axis, "persona.docs") else {
                continue;
            };
            self.describe_persona(axis, docs);
        }
        self.describe_persona(PersonaAxis::Intent, &persona.intent.docs);

        for (key, preset) in &persona.presets {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            let mut preset = preset.clone();
            if preset.key.trim().is_empty() {
                preset.key = key.to_owned();
            }
            self.presets.insert(key.to_owned(), preset);
        }
        for (alias, key) in &persona.spoken_map {
            self.spoken
                .insert(alias.trim().to_lowercase(), key.trim().to_owned());
        }
        for (key, preset) in &self.presets {
            if let Some(spoken) = preset.spoken.as_deref().and_then(non_empty) {
                self.spoken
                    .entry(spoken.to_lowercase())
                    .or_insert_with(|| key.clone());
            }
        }
    }

    fn describe_persona(&mut self, axis: PersonaAxis, docs: &BTreeMap<String, String>) {
        let Some(index) = self.persona.get_mut(&axis) else {
            return;
        };
        for (token, description) in docs {
            if !index.describe(token, description) {
                debug!(axis = %axis, token = token.as_str(), "description for undeclared persona token");
            }
        }
    }

    fn index_hierarchy(&mut self, document: &GrammarDocument) {
        let hierarchy = &document.hierarchy;
        for raw_axis in &hierarchy.axis_priority {
            if let Some(axis) = parse_key::<Axis>(raw_axis, "hierarchy.axis_priority") {
                if !self.axis_priority.contains(&axis) {
                    self.axis_priority.push(axis);
                }
            }
        }
        for (raw_axis, cap) in &hierarchy.axis_soft_caps {
            if let Some(axis) = parse_key::<Axis>(raw_axis, "hierarchy.axis_soft_caps") {
                if *cap > 0 {
                    self.soft_caps.insert(axis, *cap);
                }
            }
        }
        for (raw_axis, rules) in &hierarchy.axis_incompatibilities {
            if let Some(axis) = parse_key::<Axis>(raw_axis, "hierarchy.axis_incompatibilities") {
                let entry = self.incompatibilities.entry(axis).or_default();
                for (token, others) in rules {
                    entry.insert(token.trim().to_owned(), others.clone());
                }
            }
        }
    }

    fn register_multi_word(&mut self, token: &str) {
        let canonical = token.trim();
        let words_lower: Vec<String> = canonical
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        if words_lower.len() <= 1 {
            return;
        }
        let first = words_lower[0].clone();
        let candidates = self.multi_word.entry(first).or_default();
        if candidates.iter().any(|c| c.canonical == canonical) {
            return;
        }
        candidates.push(MultiWordToken {
            words_lower,
            canonical: canonical.to_owned(),
        });
    }

    /// Persona tokens must not share a name with a task or contract-axis
    /// token, or positional persona syntax would be ambiguous.
    fn validate_no_persona_collisions(&self, document: &GrammarDocument) -> Result<(), GrammarError> {
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for (axis, index) in &self.axes {
            for token in index.tokens() {
                owners.insert(token, axis.as_str());
            }
        }
        for task in self.tasks.tokens() {
            owners.insert(task, OverrideKey::TASK);
        }

        let mut collisions = BTreeSet::new();
        let mut check = |axis: &str, token: &str| {
            let canonical = token.trim();
            if let Some(owner) = owners.get(canonical) {
                collisions.insert(format!(
                    "persona {axis} token {canonical:?} collides with {owner} token"
                ));
            }
        };
        for (axis, tokens) in &document.persona.axes {
            for token in tokens {
                check(axis.trim(), token);
            }
        }
        if let Some(intents) = document.persona.intent.axis_tokens.get("intent") {
            for token in intents {
                check("intent", token);
            }
        }

        if collisions.is_empty() {
            Ok(())
        } else {
            Err(GrammarError::PersonaCollision(collisions.into_iter().collect()))
        }
    }

    /// Build the canonical <-> slug table. Order matters: explicit entries
    /// first, then tasks, axes and persona tokens, then preset spoken
    /// aliases (which may take over a bare word), then intent tokens.
    fn index_slugs(&mut self, document: &GrammarDocument) {
        let mut slugs = SlugTable::default();
        for (canonical, slug) in &document.slugs.canonical_to_slug {
            slugs.assign(canonical, slug);
        }

        for task in self.tasks.tokens() {
            slugs.ensure(task);
            slugs.ensure(&format!("{}={task}", OverrideKey::TASK));
        }
        for (axis, index) in &self.axes {
            for token in index.tokens() {
                slugs.ensure(token);
                slugs.ensure(&format!("{axis}={token}"));
            }
        }
        for (axis, index) in &self.persona {
            if *axis == PersonaAxis::Intent {
                continue;
            }
            for token in index.tokens() {
                slugs.ensure(token);
                slugs.ensure(&format!("{axis}={token}"));
            }
        }
        for key in self.presets.keys() {
            slugs.ensure(&format!("{}={key}", OverrideKey::PRESET));
        }

        for (key, preset) in &self.presets {
            let Some(spoken) = preset.spoken.as_deref().and_then(non_empty) else {
                continue;
            };
            let canonical = format!("{}={key}", OverrideKey::PRESET);
            let mut slug = slugify(&spoken);
            if slugs.is_taken(&slug, &canonical) {
                slug = format!("persona-{slug}");
                if slugs.is_taken(&slug, &canonical) {
                    slug = slug::derive_slug(&canonical);
                }
            }
            slugs.assign(&canonical, &slug);
        }

        if let Some(intents) = self.persona.get(&PersonaAxis::Intent) {
            for token in intents.tokens() {
                slugs.ensure(token);
                slugs.ensure(&format!("{}={token}", PersonaAxis::Intent));
            }
        }
        self.slugs = slugs;
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl Grammar {
    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    /// Grammar-supplied reference key text; empty when the document has none.
    pub fn reference_key(&self) -> &str {
        &self.reference_key
    }

    /// Canonical spelling of a task name, if it is in the catalog.
    pub fn resolve_task(&self, token: &str) -> Option<&str> {
        self.tasks.resolve(token)
    }

    /// Canonical spelling of `token` on a contract axis.
    pub fn resolve_axis_token(&self, axis: Axis, token: &str) -> Option<&str> {
        self.axes.get(&axis).and_then(|index| index.resolve(token))
    }

    /// Canonical spelling of `token` on a persona axis.
    pub fn resolve_persona_token(&self, axis: PersonaAxis, token: &str) -> Option<&str> {
        self.persona.get(&axis).and_then(|index| index.resolve(token))
    }

    /// Resolve a preset by its key or (case-insensitively) by its spoken
    /// alias.
    pub fn resolve_preset(&self, token: &str) -> Option<(&str, &PersonaPreset)> {
        let token = token.trim();
        if let Some((key, preset)) = self.presets.get_key_value(token) {
            return Some((key.as_str(), preset));
        }
        let key = self.spoken.get(&token.to_lowercase())?;
        self.presets
            .get_key_value(key)
            .map(|(key, preset)| (key.as_str(), preset))
    }

    /// Task names, sorted.
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.tokens().collect()
    }

    /// Tokens on a contract axis, sorted.
    pub fn axis_tokens(&self, axis: Axis) -> Vec<&str> {
        self.axes
            .get(&axis)
            .map(|index| index.tokens().collect())
            .unwrap_or_default()
    }

    /// Tokens on a persona axis, sorted.
    pub fn persona_tokens(&self, axis: PersonaAxis) -> Vec<&str> {
        self.persona
            .get(&axis)
            .map(|index| index.tokens().collect())
            .unwrap_or_default()
    }

    /// Every contract-axis token, sorted and deduplicated.
    pub fn all_axis_tokens(&self) -> Vec<&str> {
        let all: BTreeSet<&str> = self.axes.values().flat_map(TokenIndex::tokens).collect();
        all.into_iter().collect()
    }

    /// Preset keys, sorted.
    pub fn preset_keys(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }

    pub fn preset(&self, key: &str) -> Option<&PersonaPreset> {
        self.presets.get(key.trim())
    }

    /// Tokens for a user-facing key: `task`, `persona` (preset keys), a
    /// contract axis or a persona axis. `None` for an unknown key.
    pub fn tokens_for(&self, key: &str) -> Option<Vec<&str>> {
        let key = key.trim().to_lowercase();
        match key.parse::<OverrideKey>().ok()? {
            OverrideKey::Task => Some(self.task_names()),
            OverrideKey::Preset => Some(self.preset_keys()),
            OverrideKey::Axis(axis) => Some(self.axis_tokens(axis)),
            OverrideKey::Persona(axis) => Some(self.persona_tokens(axis)),
        }
    }

    /// The full suggestion pool: the slug of every task, axis token,
    /// persona token and preset key, sorted and deduplicated.
    pub fn vocabulary(&self) -> Vec<String> {
        let mut pool = BTreeSet::new();
        for token in self
            .tasks
            .tokens()
            .chain(self.axes.values().flat_map(TokenIndex::tokens))
            .chain(self.persona.values().flat_map(TokenIndex::tokens))
            .chain(self.presets.keys().map(String::as_str))
        {
            pool.insert(self.slug_for(token));
        }
        pool.into_iter().collect()
    }

    /// Axes in classification order: the declared priority first, then any
    /// remaining axis in name order.
    pub fn axis_probe_order(&self) -> Vec<Axis> {
        let mut order = self.axis_priority.clone();
        let mut rest: Vec<Axis> = Axis::ALL
            .into_iter()
            .filter(|axis| !order.contains(axis))
            .collect();
        rest.sort_by_key(|axis| axis.as_str());
        order.extend(rest);
        order
    }

    /// Maximum number of tokens a list axis accepts. `None` means unlimited.
    pub fn axis_soft_cap(&self, axis: Axis) -> Option<usize> {
        self.soft_caps.get(&axis).copied()
    }

    /// Tokens declared incompatible with `token` on `axis`. Informational;
    /// composition does not enforce them.
    pub fn incompatibilities(&self, axis: Axis, token: &str) -> &[String] {
        self.incompatibilities
            .get(&axis)
            .and_then(|rules| rules.get(token.trim()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn default_task(&self) -> Option<&str> {
        self.default_task.as_deref()
    }

    pub fn default_completeness(&self) -> Option<&str> {
        self.default_completeness.as_deref()
    }

    /// Description of a task, or `""`.
    pub fn task_description(&self, name: &str) -> &str {
        self.tasks.description(name)
    }

    /// Description of a contract-axis token, or `""`.
    pub fn axis_description(&self, axis: Axis, token: &str) -> &str {
        self.axes
            .get(&axis)
            .map(|index| index.description(token))
            .unwrap_or("")
    }

    /// Description of a persona token, or `""`.
    pub fn persona_description(&self, axis: PersonaAxis, token: &str) -> &str {
        self.persona
            .get(&axis)
            .map(|index| index.description(token))
            .unwrap_or("")
    }

    /// The slug users type for `token`. Computed on the fly for tokens the
    /// grammar never registered.
    pub fn slug_for(&self, token: &str) -> String {
        self.slugs.slug_for(token)
    }

    /// The canonical token a typed slug maps to, if any.
    pub fn canonical_for_input(&self, token: &str) -> Option<&str> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        self.slugs.canonical_for(token)
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Parse a document key (trimmed, lowercased), warning about and skipping
/// keys outside the closed vocabulary.
fn parse_key<T: FromStr>(raw: &str, section: &str) -> Option<T> {
    let key = raw.trim().to_lowercase();
    if key.is_empty() {
        return None;
    }
    match key.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(section, key = %key, "ignoring unknown axis in grammar");
            None
        }
    }
}
