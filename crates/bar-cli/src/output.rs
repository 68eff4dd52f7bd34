//! Subject input, result output and error reporting shared by commands.

use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use bar_core::{CliError, Grammar, render_error};

/// Where the SUBJECT text comes from, plus an optional task clarification.
/// Without `--prompt` or `--input`, piped stdin is read.
#[derive(Debug, Default, Args)]
pub struct SubjectArgs {
    /// Subject text to embed in the prompt
    #[arg(long, conflicts_with = "input")]
    pub prompt: Option<String>,
    /// Read the subject from a file
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Clarify how to carry out the task (rendered as the ADDENDUM section)
    #[arg(long)]
    pub addendum: Option<String>,
}

impl SubjectArgs {
    /// Resolve the subject, trimming trailing newlines. `None` when no
    /// source supplied any text.
    pub fn read(&self) -> Result<Option<String>> {
        let text = if let Some(prompt) = &self.prompt {
            prompt.clone()
        } else if let Some(path) = &self.input {
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read subject from {}", path.display()))?
        } else if !std::io::stdin().is_terminal() {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read subject from stdin")?;
            buf
        } else {
            return Ok(None);
        };
        let text = text.trim_end_matches(['\r', '\n']);
        Ok((!text.is_empty()).then(|| text.to_owned()))
    }

    /// The trimmed addendum, or `None` when absent or blank.
    pub fn addendum(&self) -> Option<String> {
        self.addendum
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_owned)
    }
}

/// Write `data` to `path`, or to stdout when no path is given.
pub fn write_output(path: Option<&Path>, data: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, data)
            .with_context(|| format!("cannot write output file: {}", path.display())),
        None => {
            print!("{data}");
            Ok(())
        }
    }
}

/// Serialize a value as pretty JSON followed by a newline.
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    let mut payload = serde_json::to_string_pretty(value).context("failed to serialize JSON")?;
    payload.push('\n');
    Ok(payload)
}

#[derive(serde::Serialize)]
struct ErrorEnvelope<'a> {
    error: &'a CliError,
}

/// Report a composition failure: `{"error": ...}` on stdout in JSON mode,
/// the human-readable diagnostic on stderr otherwise.
pub fn emit_cli_error(grammar: &Grammar, err: &CliError, json: bool) -> Result<()> {
    if json {
        let payload = to_json(&ErrorEnvelope { error: err })?;
        print!("{payload}");
    } else {
        eprint!("{}", render_error(grammar, err));
    }
    Ok(())
}
