// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Command-line configuration for git-when
//!
//! A run is a query (date range, author, message, path, output shape),
//! optionally seeded from a named preset, or one of the preset management
//! actions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::render::OutputFormat;

/// Directory under the home directory holding git-when state
pub const CONFIG_DIR: &str = ".config/git-when";

/// Presets file name inside [`CONFIG_DIR`]
pub const PRESETS_FILE: &str = "presets.json";

/// git when - query git history by date, author, message and path
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "git-when")]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Config {
    /// Subcommand to run (defaults to running a query)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Named preset to use as the base for this query
    ///
    /// Flags given on the command line override the preset's values.
    #[arg(value_name = "PRESET")]
    pub preset: Option<String>,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Save the current flags as a named preset instead of running them
    #[arg(short, long, value_name = "NAME")]
    pub save: Option<String>,

    /// Replace an existing preset when saving
    #[arg(short, long, default_value = "false", requires = "save")]
    pub overwrite: bool,

    /// List saved presets
    #[arg(long, default_value = "false", conflicts_with_all = ["save", "delete_preset"])]
    pub list_presets: bool,

    /// Delete a preset by name
    #[arg(long, value_name = "NAME", conflicts_with = "save")]
    pub delete_preset: Option<String>,

    /// Repository to query
    ///
    /// Defaults to the current working directory.
    #[arg(short = 'C', long, global = true, env = "GIT_WHEN_REPO")]
    pub repo: Option<PathBuf>,

    /// Presets file
    ///
    /// Defaults to ~/.config/git-when/presets.json.
    #[arg(long, global = true, value_name = "FILE", env = "GIT_WHEN_PRESETS")]
    pub presets: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    ///
    /// Logs are written to stderr so they never mix with rendered output.
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Edit an existing preset
    ///
    /// Only the flags given are changed; the rest of the preset is kept.
    ///
    /// Example:
    ///   git when edit weekly --limit 20 --format md
    Edit {
        /// Name of the preset to edit
        name: String,

        /// Accepted for symmetry with `--save`; edit always replaces the preset
        #[arg(short, long, default_value = "false")]
        overwrite: bool,

        #[command(flatten)]
        query: QueryArgs,
    },
}

/// Query flags shared by runs, `--save` and `edit`
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct QueryArgs {
    /// Date range (e.g. '2024-01..2024-03', '2024-05-01', 'last-week')
    #[arg(short, long, value_name = "RANGE")]
    pub when: Option<String>,

    /// Author name (fuzzy)
    #[arg(short = 'a', long, value_name = "AUTHOR")]
    pub who: Option<String>,

    /// Commit message keyword (fuzzy)
    #[arg(short = 'k', long, value_name = "KEYWORD")]
    pub what: Option<String>,

    /// File path glob or substring (e.g. 'src/**/*.rs', 'docs')
    #[arg(short, long, value_name = "GLOB")]
    pub path: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Limit the number of commits
    #[arg(short = 'n', long, value_parser = parse_positive)]
    pub limit: Option<usize>,

    /// Render table, csv and md output in batches of N commits
    #[arg(long, value_name = "N", value_parser = parse_positive)]
    pub batch_size: Option<usize>,

    /// Fuzzy match threshold (0.0 exact .. 1.0 very loose)
    #[arg(long, value_name = "T", value_parser = parse_threshold)]
    pub fuzzy_threshold: Option<f64>,
}

/// Parse a strictly positive integer flag value
fn parse_positive(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("must be a positive integer, got '{value}'")),
    }
}

/// Parse a fuzzy threshold within 0.0..=1.0
fn parse_threshold(value: &str) -> Result<f64, String> {
    match value.parse::<f64>() {
        Ok(t) if (0.0..=1.0).contains(&t) => Ok(t),
        _ => Err(format!("must be a number between 0 and 1, got '{value}'")),
    }
}

impl Config {
    /// Get the presets file path, using the default if not specified
    #[must_use]
    pub fn presets_path(&self) -> PathBuf {
        self.presets.clone().unwrap_or_else(default_presets_path)
    }

    /// Get the repository directory, using the current directory as default
    #[must_use]
    pub fn repo_path(&self) -> Option<PathBuf> {
        self.repo.clone().or_else(|| std::env::current_dir().ok())
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the repository path is given but is not an
    /// existing directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref repo) = self.repo {
            if !repo.exists() {
                return Err(ConfigError::RepoNotFound(repo.clone()));
            }
            if !repo.is_dir() {
                return Err(ConfigError::RepoNotDirectory(repo.clone()));
            }
        }
        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// Default presets location: `~/.config/git-when/presets.json`
#[must_use]
pub fn default_presets_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(PRESETS_FILE)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Repository path not found
    #[error("Repository path not found: {0}")]
    RepoNotFound(PathBuf),

    /// Repository path is not a directory
    #[error("Repository path is not a directory: {0}")]
    RepoNotDirectory(PathBuf),
}
