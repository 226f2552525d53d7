// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Query orchestration
//!
//! [`run`] dispatches a parsed [`Config`]: preset management actions print a
//! short confirmation, everything else resolves a [`QueryOptions`] and hands
//! it to [`execute`].

use std::path::Path;

use git_when_log::{
    DateRange, FilterEngine, FilterOptions, LogError, LogQuery, fetch_commits, stream_commits,
};
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::config::{Command, Config};
use crate::presets::{Preset, PresetError, PresetStore};
use crate::render::{OutputFormat, render_batches};

/// Errors surfaced to the user by a run
#[derive(Debug, Error)]
pub enum RunError {
    /// git refused to run because the directory is not a repository
    #[error("current directory is not a Git repository")]
    NotARepository,

    /// Log query or stream failure
    #[error(transparent)]
    Log(LogError),

    /// Preset lookup, validation or storage failure
    #[error(transparent)]
    Preset(#[from] PresetError),

    /// Writing output failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Rendering JSON output failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<LogError> for RunError {
    fn from(err: LogError) -> Self {
        match err {
            e if e.is_not_a_repository() => Self::NotARepository,
            LogError::Io(e) => Self::Io(e),
            e => Self::Log(e),
        }
    }
}

impl RunError {
    /// Check whether the output side was closed (e.g. piped into `head`)
    #[must_use]
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::BrokenPipe)
    }
}

/// Fully resolved, validated query parameters
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// Date range expression
    pub when: Option<String>,
    /// Filters applied to fetched commits
    pub filters: FilterOptions,
    /// Output format
    pub format: OutputFormat,
    /// Maximum number of commits shown
    pub limit: Option<usize>,
    /// Chunk size for table, csv and md output
    pub batch_size: Option<usize>,
}

impl QueryOptions {
    /// Validate a preset and resolve it into query options
    ///
    /// # Errors
    ///
    /// Returns the first invalid field of the preset.
    pub fn from_preset(preset: &Preset) -> Result<Self, PresetError> {
        preset.validate()?;
        let mut filters = FilterOptions {
            author: preset.who.clone(),
            message: preset.what.clone(),
            path: preset.path.clone(),
            ..FilterOptions::default()
        };
        if let Some(threshold) = preset.fuzzy_threshold {
            filters.threshold = threshold;
        }
        Ok(Self {
            when: preset.when.clone(),
            filters,
            format: preset.output_format()?,
            limit: preset.limit()?,
            batch_size: preset.batch_size()?,
        })
    }
}

async fn write_line<W>(out: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await
}

/// Dispatch a parsed configuration, writing user-facing output to `out`
///
/// # Errors
///
/// Returns a `RunError` describing why the action or query failed.
pub async fn run<W>(config: &Config, out: &mut W) -> Result<(), RunError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut store = PresetStore::load(config.presets_path());

    if config.list_presets {
        let names = store.list();
        if names.is_empty() {
            write_line(out, "No presets saved.").await?;
        } else {
            write_line(out, "Saved presets:").await?;
            for name in names {
                write_line(out, &format!("  {name}")).await?;
            }
        }
        out.flush().await?;
        return Ok(());
    }

    if let Some(name) = &config.delete_preset {
        if !store.delete(name)? {
            debug!(name, "no preset to delete");
        }
        write_line(out, &format!("Deleted preset '{name}'.")).await?;
        out.flush().await?;
        return Ok(());
    }

    if let Some(Command::Edit { name, query, .. }) = &config.command {
        let preset = store.get(name)?.overlay(query);
        preset.validate()?;
        store.save(name, &preset, true)?;
        info!(name, "updated preset");
        write_line(out, &format!("Updated preset '{name}'.")).await?;
        out.flush().await?;
        return Ok(());
    }

    let base = match &config.preset {
        Some(name) => store.get(name)?,
        None => Preset::default(),
    };
    let preset = base.overlay(&config.query);

    if let Some(name) = &config.save {
        preset.validate()?;
        store.save(name, &preset, config.overwrite)?;
        info!(name, "saved preset");
        write_line(out, &format!("Saved preset '{name}'.")).await?;
        out.flush().await?;
        return Ok(());
    }

    let options = QueryOptions::from_preset(&preset)?;
    let repo = config.repo_path();
    execute(&options, repo.as_deref(), out).await?;
    Ok(())
}

/// Run a query against the repository in `repo` and render the result
///
/// Returns the number of commits written.
///
/// # Errors
///
/// Returns `RunError::Log` for a bad date range (before git is started) or
/// a failed git process, `RunError::NotARepository` when `repo` is not a
/// repository, and `RunError::Io` when writing fails.
pub async fn execute<W>(
    options: &QueryOptions,
    repo: Option<&Path>,
    out: &mut W,
) -> Result<usize, RunError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let range = DateRange::parse(options.when.as_deref().unwrap_or(""))?;

    // Local filters decide what counts toward the limit, so git may only cap
    // the output when there are none.
    let local_filters = !options.filters.is_empty();
    let upstream_limit = if local_filters { None } else { options.limit };

    let mut query = LogQuery::new(&range, upstream_limit);
    if let Some(dir) = repo {
        query = query.in_dir(dir);
    }
    let process = query.spawn()?;

    if options.format == OutputFormat::Ndjson {
        let mut stream = stream_commits(process, options.limit)?;
        if local_filters || !range.is_unbounded() {
            let engine = FilterEngine::new();
            let filters = options.filters.clone();
            stream = stream.with_filter(move |c| range.admits(c) && engine.matches(c, &filters));
        }
        let written = stream.write_ndjson(out).await?;
        debug!(written, "streamed commits");
        return Ok(written);
    }

    let mut process = process;
    let commits = fetch_commits(&mut process, upstream_limit).await?;
    let fetched = commits.len();
    let commits = range.apply(commits);
    let mut commits = FilterEngine::new().apply(commits, &options.filters);
    if let Some(limit) = options.limit {
        commits.truncate(limit);
    }
    debug!(fetched, shown = commits.len(), "filtered commits");

    for chunk in render_batches(&commits, options.format, options.batch_size)? {
        write_line(out, &chunk).await?;
    }
    out.flush().await?;
    Ok(commits.len())
}
