use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use tracing::debug;

use bar_core::{BuildResult, Grammar, build, render_plain_text};

use crate::output::{emit_cli_error, to_json, write_output};

/// How a composed result is written.
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions<'a> {
    pub json: bool,
    pub path: Option<&'a Path>,
}

/// Compose `tokens` into a prompt and write it out.
pub fn run_build(
    grammar: &Grammar,
    tokens: &[String],
    subject: Option<String>,
    addendum: Option<String>,
    out: OutputOptions<'_>,
) -> Result<ExitCode> {
    debug!(count = tokens.len(), "building prompt");
    match build(grammar, tokens) {
        Ok(mut result) => {
            result.subject = subject;
            result.addendum = addendum;
            write_result(&result, out)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            emit_cli_error(grammar, &err, out.json)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Write a result as JSON or rendered prompt text.
pub fn write_result(result: &BuildResult, out: OutputOptions<'_>) -> Result<()> {
    let data = if out.json {
        to_json(result)?
    } else {
        render_plain_text(result)
    };
    write_output(out.path, &data)
}
