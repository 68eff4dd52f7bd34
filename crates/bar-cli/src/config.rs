//! Configuration file management for bar.
//!
//! Provides a TOML-based config file at `~/.config/bar/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use bar_core::grammar::GRAMMAR_PATH_ENV;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub grammar: GrammarSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct GrammarSection {
    /// Grammar JSON to load instead of the embedded default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct OutputSection {
    /// Emit JSON instead of plain text by default.
    #[serde(default)]
    pub json: bool,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the bar config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/bar` or `~/.config/bar`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("bar");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("bar")
}

/// Return the path to the bar config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse a config file. Returns an error if it does not exist.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Serialize and write a config file, creating parent dirs as needed.
pub fn save_config(path: &Path, config: &ConfigFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }
    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;
    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug, PartialEq)]
pub struct BarConfig {
    /// `None` means the embedded grammar.
    pub grammar_path: Option<PathBuf>,
    pub json: bool,
}

impl BarConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Grammar: `cli_grammar` > `BAR_GRAMMAR_PATH` env > `grammar.path` > embedded
    /// - JSON output: `--json` > `output.json` > off
    ///
    /// A missing config file is not an error; a malformed one is.
    pub fn resolve(cli_grammar: Option<&Path>, cli_json: bool) -> Result<Self> {
        let path = config_path();
        let file_config = if path.exists() {
            Some(load_config(&path)?)
        } else {
            None
        };

        let grammar_path = if let Some(path) = cli_grammar {
            Some(path.to_path_buf())
        } else if let Some(path) = std::env::var_os(GRAMMAR_PATH_ENV).filter(|p| !p.is_empty()) {
            Some(PathBuf::from(path))
        } else {
            file_config.as_ref().and_then(|cfg| cfg.grammar.path.clone())
        };

        let json = cli_json || file_config.as_ref().is_some_and(|cfg| cfg.output.json);

        Ok(Self { grammar_path, json })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    /// Point `XDG_CONFIG_HOME` at a fresh temp dir for the duration of `f`.
    fn with_config_home<T>(f: impl FnOnce(&Path) -> T) -> T {
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var_os("XDG_CONFIG_HOME");
        let orig_grammar = std::env::var_os(GRAMMAR_PATH_ENV);
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };
        unsafe { std::env::remove_var(GRAMMAR_PATH_ENV) };

        let result = f(tmp.path());

        match orig_xdg {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }
        match orig_grammar {
            Some(g) => unsafe { std::env::set_var(GRAMMAR_PATH_ENV, g) },
            None => unsafe { std::env::remove_var(GRAMMAR_PATH_ENV) },
        }
        result
    }

    fn write_config(config: &ConfigFile) {
        save_config(&config_path(), config).unwrap();
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("bar").join("config.toml");
        let original = ConfigFile {
            grammar: GrammarSection {
                path: Some(PathBuf::from("/opt/bar/grammar.json")),
            },
            output: OutputSection { json: true },
        };

        save_config(&path, &original).unwrap();
        assert_eq!(load_config(&path).unwrap(), original);
    }

    #[test]
    fn empty_config_file_uses_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "").unwrap();
        assert_eq!(load_config(&path).unwrap(), ConfigFile::default());
    }

    #[test]
    fn malformed_config_names_the_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[grammar\npath = 1").unwrap();
        let msg = format!("{:#}", load_config(&path).unwrap_err());
        assert!(msg.contains("failed to parse config file"), "unexpected error: {msg}");
    }

    #[test]
    fn resolve_defaults_when_nothing_set() {
        let _lock = lock_env();
        let config = with_config_home(|_| BarConfig::resolve(None, false).unwrap());
        assert_eq!(
            config,
            BarConfig {
                grammar_path: None,
                json: false
            }
        );
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();
        let config = with_config_home(|_| {
            write_config(&ConfigFile {
                grammar: GrammarSection {
                    path: Some(PathBuf::from("/from/config.json")),
                },
                output: OutputSection::default(),
            });
            unsafe { std::env::set_var(GRAMMAR_PATH_ENV, "/from/env.json") };
            BarConfig::resolve(Some(Path::new("/from/cli.json")), false).unwrap()
        });
        assert_eq!(config.grammar_path, Some(PathBuf::from("/from/cli.json")));
    }

    #[test]
    fn resolve_with_env_var_overrides_config_file() {
        let _lock = lock_env();
        let config = with_config_home(|_| {
            write_config(&ConfigFile {
                grammar: GrammarSection {
                    path: Some(PathBuf::from("/from/config.json")),
                },
                output: OutputSection::default(),
            });
            unsafe { std::env::set_var(GRAMMAR_PATH_ENV, "/from/env.json") };
            BarConfig::resolve(None, false).unwrap()
        });
        assert_eq!(config.grammar_path, Some(PathBuf::from("/from/env.json")));
    }

    #[test]
    fn resolve_reads_config_file() {
        let _lock = lock_env();
        let config = with_config_home(|_| {
            write_config(&ConfigFile {
                grammar: GrammarSection {
                    path: Some(PathBuf::from("/from/config.json")),
                },
                output: OutputSection { json: true },
            });
            BarConfig::resolve(None, false).unwrap()
        });
        assert_eq!(config.grammar_path, Some(PathBuf::from("/from/config.json")));
        assert!(config.json);
    }

    #[test]
    fn config_path_follows_xdg_config_home() {
        let _lock = lock_env();
        let path = with_config_home(|home| {
            assert_eq!(config_path(), home.join("bar").join("config.toml"));
            config_path()
        });
        assert!(
            path.ends_with("bar/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
