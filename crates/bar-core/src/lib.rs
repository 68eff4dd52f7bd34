//! Core library for `bar`: a voice-friendly token grammar that composes
//! structured prompts for language models.
//!
//! Load a [`Grammar`], feed tokens to [`build`], and render the resulting
//! [`BuildResult`] with [`render_plain_text`] or serialize it as JSON.

pub mod axis;
pub mod build;
pub mod diagnostics;
pub mod error;
pub mod fuzzy;
pub mod grammar;
pub mod render;
pub mod shuffle;

pub use axis::{Axis, OverrideKey, PersonaAxis};
pub use build::{BuildResult, HydratedPromptlet, build};
pub use diagnostics::render_error;
pub use error::{CliError, ErrorKind, GrammarError};
pub use fuzzy::suggest;
pub use grammar::Grammar;
pub use render::render_plain_text;
pub use shuffle::{ShuffleOptions, Stage, shuffle};
