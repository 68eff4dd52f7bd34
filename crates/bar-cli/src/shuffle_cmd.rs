use std::process::ExitCode;

use anyhow::{Result, bail};

use bar_core::Grammar;
use bar_core::shuffle::{ShuffleOptions, Stage, shuffle};

use crate::build_cmd::{OutputOptions, write_result};
use crate::output::emit_cli_error;

/// Parse a stage name for `--include`/`--exclude`.
pub fn parse_stage(value: &str) -> Result<Stage, String> {
    value.parse::<Stage>().map_err(|_| {
        let valid: Vec<&str> = Stage::ALL.iter().map(|s| s.as_str()).collect();
        format!("unknown stage {value:?}; expected one of: {}", valid.join(", "))
    })
}

/// Generate a random prompt and write it out.
pub fn run_shuffle(grammar: &Grammar, options: &ShuffleOptions, out: OutputOptions<'_>) -> Result<ExitCode> {
    if !(0.0..=1.0).contains(&options.fill) {
        bail!("--fill must be between 0.0 and 1.0, got {}", options.fill);
    }
    match shuffle(grammar, options) {
        Ok(result) => {
            write_result(&result, out)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            emit_cli_error(grammar, &err, out.json)?;
            Ok(ExitCode::FAILURE)
        }
    }
}
