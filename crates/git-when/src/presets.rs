// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Named query presets
//!
//! Presets live in a single JSON object keyed by name. Entries are kept as
//! raw JSON and only decoded on use, so one bad entry does not hide the rest,
//! and an unreadable or corrupt file behaves as an empty one.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use git_when_log::{DateRange, LogError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::QueryArgs;
use crate::render::OutputFormat;

/// Errors raised while loading, validating or storing presets
#[derive(Debug, Error)]
pub enum PresetError {
    /// The preset's date range does not parse
    #[error(transparent)]
    DateRange(#[from] LogError),

    /// Limit is not a positive integer
    #[error("Invalid limit: {0} (must be a positive integer)")]
    InvalidLimit(i64),

    /// Batch size is not a positive integer
    #[error("Invalid batch size: {0} (must be a positive integer)")]
    InvalidBatchSize(i64),

    /// Unknown output format
    #[error("Invalid format: {0} (expected table, json, csv, md, markdown or ndjson)")]
    InvalidFormat(String),

    /// Fuzzy threshold outside 0.0..=1.0
    #[error("Invalid fuzzy threshold: {0} (must be between 0 and 1)")]
    InvalidFuzzyThreshold(f64),

    /// A stored entry does not decode as a preset
    #[error("Preset '{name}' is malformed: {source}")]
    Malformed {
        /// Preset name
        name: String,
        /// Decoding error
        source: serde_json::Error,
    },

    /// No preset with this name
    #[error("preset '{0}' not found")]
    NotFound(String),

    /// Saving would replace an existing preset
    #[error("Preset '{0}' already exists. Use --overwrite to overwrite.")]
    AlreadyExists(String),

    /// Failed to write the presets file
    #[error("Failed to write presets file {path}: {source}")]
    Write {
        /// Presets file
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Failed to serialize presets
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Saved query parameters; every field is optional
///
/// Stored with camelCase keys (`batchSize`, `fuzzyThreshold`). Numeric fields
/// are signed so out-of-range values survive loading and are reported by
/// [`Preset::validate`] instead of failing to decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    /// Date range expression
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    /// Author query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub who: Option<String>,
    /// Message query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub what: Option<String>,
    /// Path glob or substring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Output format name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Maximum number of commits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// Chunk size for table, csv and md output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<i64>,
    /// Fuzzy match threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzzy_threshold: Option<f64>,
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl Preset {
    /// Overlay command-line flags; flags that were given win
    #[must_use]
    pub fn overlay(mut self, args: &QueryArgs) -> Self {
        if let Some(when) = &args.when {
            self.when = Some(when.clone());
        }
        if let Some(who) = &args.who {
            self.who = Some(who.clone());
        }
        if let Some(what) = &args.what {
            self.what = Some(what.clone());
        }
        if let Some(path) = &args.path {
            self.path = Some(path.clone());
        }
        if let Some(format) = args.format {
            self.format = Some(format.as_str().to_string());
        }
        if let Some(limit) = args.limit {
            self.limit = Some(to_i64(limit));
        }
        if let Some(batch_size) = args.batch_size {
            self.batch_size = Some(to_i64(batch_size));
        }
        if let Some(threshold) = args.fuzzy_threshold {
            self.fuzzy_threshold = Some(threshold);
        }
        self
    }

    /// Resolved output format (table when unset)
    ///
    /// # Errors
    ///
    /// Returns `PresetError::InvalidFormat` for an unknown name.
    pub fn output_format(&self) -> Result<OutputFormat, PresetError> {
        match &self.format {
            None => Ok(OutputFormat::default()),
            Some(name) => name
                .parse()
                .map_err(|_| PresetError::InvalidFormat(name.clone())),
        }
    }

    /// Resolved limit
    ///
    /// # Errors
    ///
    /// Returns `PresetError::InvalidLimit` unless the limit is positive.
    pub fn limit(&self) -> Result<Option<usize>, PresetError> {
        positive(self.limit).map_err(PresetError::InvalidLimit)
    }

    /// Resolved batch size
    ///
    /// # Errors
    ///
    /// Returns `PresetError::InvalidBatchSize` unless the size is positive.
    pub fn batch_size(&self) -> Result<Option<usize>, PresetError> {
        positive(self.batch_size).map_err(PresetError::InvalidBatchSize)
    }

    /// Check every field
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), PresetError> {
        if let Some(when) = &self.when {
            DateRange::parse(when)?;
        }
        self.limit()?;
        self.batch_size()?;
        self.output_format()?;
        if let Some(t) = self.fuzzy_threshold {
            if !(0.0..=1.0).contains(&t) {
                return Err(PresetError::InvalidFuzzyThreshold(t));
            }
        }
        Ok(())
    }
}

fn positive(value: Option<i64>) -> Result<Option<usize>, i64> {
    match value {
        None => Ok(None),
        Some(n) if n > 0 => usize::try_from(n).map(Some).map_err(|_| n),
        Some(n) => Err(n),
    }
}

/// File-backed preset collection
#[derive(Debug, Clone)]
pub struct PresetStore {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl PresetStore {
    /// Load presets from `path`, creating an empty file if it is missing
    ///
    /// A file that cannot be read or parsed yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !path.exists() {
            if let Err(e) = write_entries(&path, &BTreeMap::new()) {
                warn!(path = %path.display(), error = %e, "could not create presets file");
            }
        }

        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, Value>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring malformed presets file");
                    BTreeMap::new()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read presets file");
                BTreeMap::new()
            }
        };

        debug!(path = %path.display(), count = entries.len(), "loaded presets");
        Self { path, entries }
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Preset names, sorted
    #[must_use]
    pub fn list(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Check whether a preset exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Decode a preset by name
    ///
    /// # Errors
    ///
    /// Returns `PresetError::NotFound` or `PresetError::Malformed`.
    pub fn get(&self, name: &str) -> Result<Preset, PresetError> {
        let value = self
            .entries
            .get(name)
            .ok_or_else(|| PresetError::NotFound(name.to_string()))?;
        Preset::deserialize(value).map_err(|source| PresetError::Malformed {
            name: name.to_string(),
            source,
        })
    }

    /// Store a preset and write the file
    ///
    /// # Errors
    ///
    /// Returns `PresetError::AlreadyExists` if the name is taken and
    /// `overwrite` is false, or an error if the file cannot be written.
    pub fn save(&mut self, name: &str, preset: &Preset, overwrite: bool) -> Result<(), PresetError> {
        if !overwrite && self.contains(name) {
            return Err(PresetError::AlreadyExists(name.to_string()));
        }
        self.entries
            .insert(name.to_string(), serde_json::to_value(preset)?);
        self.persist()
    }

    /// Remove a preset; a missing name is not an error
    ///
    /// Returns whether a preset was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn delete(&mut self, name: &str) -> Result<bool, PresetError> {
        if self.entries.remove(name).is_none() {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    fn persist(&self) -> Result<(), PresetError> {
        write_entries(&self.path, &self.entries).map_err(|source| PresetError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn write_entries(path: &Path, entries: &BTreeMap<String, Value>) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(entries).map_err(io::Error::other)?;
    fs::write(path, json)
}
