// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Output formats
//!
//! Every renderer returns the complete text for a set of commits without a
//! trailing newline; the caller decides how chunks are separated.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use git_when_log::CommitRecord;

const TABLE_HEADER: [&str; 4] = ["Hash", "Author", "Date", "Message"];
const CSV_HEADER: [&str; 4] = ["hash", "author", "date", "message"];

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// ASCII grid
    #[default]
    Table,
    /// Pretty-printed JSON array, including touched files
    Json,
    /// Comma-separated values with every field quoted
    Csv,
    /// Markdown pipe table
    #[value(alias = "markdown")]
    Md,
    /// One JSON record per line, written as commits arrive
    Ndjson,
}

impl OutputFormat {
    /// Name used on the command line and in presets
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Md => "md",
            Self::Ndjson => "ndjson",
        }
    }

    /// Whether `--batch-size` splits this format into chunks
    #[must_use]
    pub fn supports_batches(&self) -> bool {
        matches!(self, Self::Table | Self::Csv | Self::Md)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, false)
    }
}

fn cells(commit: &CommitRecord) -> [&str; 4] {
    [&commit.hash, &commit.author, &commit.date, &commit.message]
}

/// Render commits as an ASCII grid
#[must_use]
pub fn render_table(commits: &[CommitRecord]) -> String {
    let mut widths = TABLE_HEADER.map(|h| h.chars().count());
    for commit in commits {
        for (width, cell) in widths.iter_mut().zip(cells(commit)) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let separator = {
        let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
        format!("+{}+", dashes.join("+"))
    };
    let row = |values: [&str; 4]| {
        let padded: Vec<String> = values
            .iter()
            .zip(widths)
            .map(|(value, width)| format!("{value:<width$}"))
            .collect();
        format!("| {} |", padded.join(" | "))
    };

    let mut lines = vec![separator.clone(), row(TABLE_HEADER), separator.clone()];
    lines.extend(commits.iter().map(|c| row(cells(c))));
    lines.push(separator);
    lines.join("\n")
}

/// Render commits as a pretty-printed JSON array
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(commits: &[CommitRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(commits)
}

fn csv_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Render commits as CSV with a `hash,author,date,message` header
#[must_use]
pub fn render_csv(commits: &[CommitRecord]) -> String {
    let mut lines = vec![CSV_HEADER.join(",")];
    for commit in commits {
        let quoted: Vec<String> = cells(commit).iter().map(|v| csv_quote(v)).collect();
        lines.push(quoted.join(","));
    }
    lines.join("\n")
}

fn markdown_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

/// Render commits as a Markdown pipe table
#[must_use]
pub fn render_markdown(commits: &[CommitRecord]) -> String {
    let mut lines = vec![
        format!("| {} |", TABLE_HEADER.join(" | ")),
        format!("| {} |", ["---"; 4].join(" | ")),
    ];
    for commit in commits {
        let escaped: Vec<String> = cells(commit).iter().map(|v| markdown_cell(v)).collect();
        lines.push(format!("| {} |", escaped.join(" | ")));
    }
    lines.join("\n")
}

/// Render commits in the given format
///
/// Queries stream ndjson straight from the log; here it is one compact JSON
/// object per line.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(commits: &[CommitRecord], format: OutputFormat) -> Result<String, serde_json::Error> {
    Ok(match format {
        OutputFormat::Table => render_table(commits),
        OutputFormat::Json => render_json(commits)?,
        OutputFormat::Csv => render_csv(commits),
        OutputFormat::Md => render_markdown(commits),
        OutputFormat::Ndjson => commits
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?
            .join("\n"),
    })
}

/// Render commits, split into chunks of `batch_size` where the format allows
///
/// Each chunk is a complete document (its own header and borders). An empty
/// commit list still yields one chunk so headers are printed.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_batches(
    commits: &[CommitRecord],
    format: OutputFormat,
    batch_size: Option<usize>,
) -> Result<Vec<String>, serde_json::Error> {
    match batch_size {
        Some(size) if size > 0 && format.supports_batches() && !commits.is_empty() => commits
            .chunks(size)
            .map(|chunk| render(chunk, format))
            .collect(),
        _ => Ok(vec![render(commits, format)?]),
    }
}
