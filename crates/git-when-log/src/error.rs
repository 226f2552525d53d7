// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for git-when-log

use thiserror::Error;

/// Errors that can occur while resolving a query or reading the log stream
#[derive(Debug, Error)]
pub enum LogError {
    /// A date or date range expression could not be resolved
    #[error("Invalid date range: {fragment}")]
    InvalidDateRange {
        /// The fragment of the expression that failed to parse
        fragment: String,
    },

    /// The upstream log process could not be spawned or exited unsuccessfully
    #[error("{}", source_failure_message(*status, diagnostics))]
    SourceFailure {
        /// Exit status code, if the process ran and reported one
        status: Option<i32>,
        /// Text captured from the process's error channel
        diagnostics: String,
    },

    /// I/O error while reading the log stream or writing output
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error serializing a commit record
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LogError {
    /// Build an `InvalidDateRange` error for the given fragment
    pub fn invalid_date(fragment: impl Into<String>) -> Self {
        Self::InvalidDateRange {
            fragment: fragment.into(),
        }
    }

    /// Check whether the upstream diagnostics say we are outside a repository
    #[must_use]
    pub fn is_not_a_repository(&self) -> bool {
        match self {
            Self::SourceFailure { diagnostics, .. } => diagnostics
                .to_ascii_lowercase()
                .contains("not a git repository"),
            _ => false,
        }
    }
}

fn source_failure_message(status: Option<i32>, diagnostics: &str) -> String {
    let diagnostics = diagnostics.trim();
    match (status, diagnostics.is_empty()) {
        (Some(code), true) => format!("Log source exited with status {code}"),
        (Some(code), false) => format!("Log source exited with status {code}: {diagnostics}"),
        (None, true) => "Log source failed".to_string(),
        (None, false) => format!("Log source failed: {diagnostics}"),
    }
}

/// Errors raised inside the filter engine
///
/// These never escape [`crate::filter::FilterEngine::apply`]; a malformed
/// glob is converted to "no match" for the record being tested.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The path pattern is not a well-formed glob
    #[error("Malformed glob pattern: {pattern}")]
    MalformedGlob {
        /// The offending pattern
        pattern: String,
    },
}
