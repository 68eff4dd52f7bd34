mod build_cmd;
mod config;
mod output;
mod shuffle_cmd;
mod tokens_cmd;

#[cfg(test)]
mod test_util;

use std::borrow::Cow;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use bar_core::Grammar;
use bar_core::shuffle::{ShuffleOptions, Stage};

use build_cmd::OutputOptions;
use config::BarConfig;
use output::SubjectArgs;

#[derive(Parser)]
#[command(name = "bar", about = "Compose structured LLM prompts from short spoken tokens")]
struct Cli {
    /// Grammar JSON file (overrides BAR_GRAMMAR_PATH env var)
    #[arg(long, global = true)]
    grammar: Option<PathBuf>,

    /// Emit JSON instead of plain text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose a prompt from tokens
    Build {
        /// Tokens in shorthand order, optionally followed by key=value overrides
        tokens: Vec<String>,
        #[command(flatten)]
        subject: SubjectArgs,
        /// Output file path (defaults to stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Compose a prompt from randomly chosen tokens
    Shuffle {
        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
        /// Stages that are always drawn (comma-separated)
        #[arg(long, value_delimiter = ',', value_parser = shuffle_cmd::parse_stage)]
        include: Vec<Stage>,
        /// Stages that are never drawn (comma-separated)
        #[arg(long, value_delimiter = ',', value_parser = shuffle_cmd::parse_stage)]
        exclude: Vec<Stage>,
        /// Probability of drawing from each optional stage
        #[arg(long, default_value_t = 0.5)]
        fill: f64,
        #[command(flatten)]
        subject: SubjectArgs,
        /// Output file path (defaults to stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// List valid tokens, optionally for a single axis
    Tokens {
        /// `task`, `persona`, or an axis name
        axis: Option<String>,
    },
    /// Write a bar config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the `bar init` command: write config file.
fn cmd_init(grammar: Option<PathBuf>, json: bool, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        grammar: config::GrammarSection { path: grammar },
        output: config::OutputSection { json },
    };
    config::save_config(&path, &cfg)?;

    println!("Config written to {}", path.display());
    match &cfg.grammar.path {
        Some(grammar) => println!("  grammar.path = {}", grammar.display()),
        None => println!("  grammar.path = (embedded default)"),
    }
    println!("  output.json = {json}");

    Ok(())
}

/// Load the resolved grammar. Without a path this is the shared embedded
/// instance, so repeated calls do not reparse it.
fn load_grammar(resolved: &BarConfig) -> anyhow::Result<Cow<'static, Grammar>> {
    let grammar = Grammar::load(resolved.grammar_path.as_deref());
    match &resolved.grammar_path {
        Some(path) => grammar.with_context(|| format!("failed to load grammar from {}", path.display())),
        None => grammar.context("failed to load embedded grammar"),
    }
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let setup = || -> anyhow::Result<(BarConfig, Cow<'static, Grammar>)> {
        let resolved = BarConfig::resolve(cli.grammar.as_deref(), cli.json)?;
        let grammar = load_grammar(&resolved)?;
        Ok((resolved, grammar))
    };

    match cli.command {
        Commands::Init { force } => {
            cmd_init(cli.grammar.clone(), cli.json, force)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Build {
            tokens,
            subject,
            output,
        } => {
            let (resolved, grammar) = setup()?;
            let addendum = subject.addendum();
            let subject = subject.read()?;
            let out = OutputOptions {
                json: resolved.json,
                path: output.as_deref(),
            };
            build_cmd::run_build(&grammar, &tokens, subject, addendum, out)
        }
        Commands::Shuffle {
            seed,
            include,
            exclude,
            fill,
            subject,
            output,
        } => {
            let (resolved, grammar) = setup()?;
            let options = ShuffleOptions {
                seed,
                include,
                exclude,
                fill,
                addendum: subject.addendum(),
                subject: subject.read()?,
            };
            let out = OutputOptions {
                json: resolved.json,
                path: output.as_deref(),
            };
            shuffle_cmd::run_shuffle(&grammar, &options, out)
        }
        Commands::Tokens { axis } => {
            let (resolved, grammar) = setup()?;
            tokens_cmd::run_tokens(&grammar, axis.as_deref(), resolved.json)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use bar_core::grammar::{GRAMMAR_PATH_ENV, embedded};
    use bar_test_utils::write_fixture;

    use super::*;

    #[test]
    fn default_grammar_is_the_shared_embedded_instance() {
        let _lock = test_util::lock_env();
        unsafe { std::env::remove_var(GRAMMAR_PATH_ENV) };
        let resolved = BarConfig {
            grammar_path: None,
            json: false,
        };

        let grammar = load_grammar(&resolved).unwrap();

        assert!(matches!(grammar, Cow::Borrowed(_)));
        assert!(std::ptr::eq(&*grammar, embedded::grammar()));
    }

    #[test]
    fn configured_grammar_file_is_loaded() {
        let tmp = tempfile::TempDir::new().unwrap();
        let resolved = BarConfig {
            grammar_path: Some(write_fixture(tmp.path())),
            json: false,
        };

        let grammar = load_grammar(&resolved).unwrap();

        assert_eq!(grammar.reference_key(), "Fixture reference key.");
    }
}
