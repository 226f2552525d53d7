// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Commit record type and header-line recognition
//!
//! The upstream log is requested with `--pretty=format:%H|%an|%aI|%s --name-only`,
//! which produces blocks shaped like:
//!
//! ```text
//! <hash>|<author>|<date>|<subject>
//! path/one
//! path/two
//!
//! <hash>|<author>|<date>|<subject>
//! ```
//!
//! A header is recognised by its shape rather than by position. A file path
//! that itself looks like `a|b|c|d` is indistinguishable from a header; the
//! wire format has no escaping, so this is a known limitation.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Field separator used in the header line
pub const FIELD_SEPARATOR: char = '|';

/// A single commit parsed from the log stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Commit identifier (full SHA from `%H`)
    pub hash: String,
    /// Author display name (may be empty)
    pub author: String,
    /// Author date as emitted upstream (strict ISO 8601 from `%aI`)
    pub date: String,
    /// Commit subject; may itself contain the field separator
    pub message: String,
    /// Paths touched by the commit, in upstream order
    #[serde(default)]
    pub files: Vec<String>,
}

/// Check whether a line has the shape of a header: `hash|author|date|message`
///
/// The hash and date fields must be non-empty; the author may be empty.
/// Everything after the third separator belongs to the message.
#[must_use]
pub fn is_header(line: &str) -> bool {
    let mut fields = line.splitn(4, FIELD_SEPARATOR);
    let (Some(hash), Some(_author), Some(date), Some(_message)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return false;
    };
    !hash.trim().is_empty() && !date.trim().is_empty()
}

impl CommitRecord {
    /// Build a record from a header line and the lines that followed it
    ///
    /// Blank lines in the file block are dropped. Returns `None` if
    /// `header` is not a header line.
    #[must_use]
    pub fn from_block<S: AsRef<str>>(header: &str, file_lines: &[S]) -> Option<Self> {
        if !is_header(header) {
            return None;
        }

        let mut fields = header.splitn(4, FIELD_SEPARATOR);
        let hash = fields.next().unwrap_or_default().trim().to_string();
        let author = fields.next().unwrap_or_default().to_string();
        let date = fields.next().unwrap_or_default().trim().to_string();
        let message = fields.next().unwrap_or_default().to_string();

        let files = file_lines
            .iter()
            .map(AsRef::as_ref)
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();

        Some(Self {
            hash,
            author,
            date,
            message,
            files,
        })
    }

    /// A record is valid when it carries a non-empty hash
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.hash.is_empty()
    }

    /// Get the short hash (first 7 characters)
    #[must_use]
    pub fn short_hash(&self) -> &str {
        let end = self
            .hash
            .char_indices()
            .nth(7)
            .map_or(self.hash.len(), |(idx, _)| idx);
        &self.hash[..end]
    }

    /// Get the first line of the message
    #[must_use]
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Parse the `date` field into an instant
    ///
    /// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (read as
    /// midnight UTC). Returns `None` for anything else.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        let date = self.date.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(date) {
            return Some(ts);
        }
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
        let midnight = day.and_hms_opt(0, 0, 0)?;
        Some(Utc.from_utc_datetime(&midnight).fixed_offset())
    }

    /// Check whether the commit touched no files
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn sample_record() -> CommitRecord {
        CommitRecord {
            hash: "1945ab9c752534e733c38ba0109dc3b741f0a6eb".to_string(),
            author: "Alice".to_string(),
            date: "2026-01-17T02:33:06+01:00".to_string(),
            message: "feat(log): stream commits".to_string(),
            files: vec!["src/lib.rs".to_string()],
        }
    }

    #[test]
    fn test_is_header_basic() {
        assert!(is_header("abc123|Alice|2023-01-01T00:00:00Z|Init"));
    }

    #[test]
    fn test_is_header_empty_message() {
        assert!(is_header("abc123|Alice|2023-01-01|"));
    }

    #[test]
    fn test_is_header_empty_author() {
        assert!(is_header("abc123||2023-01-01|Init"));
    }

    #[test]
    fn test_is_header_rejects_paths() {
        assert!(!is_header("src/lib.rs"));
        assert!(!is_header(""));
        assert!(!is_header("a|b|c"));
        assert!(!is_header("|Alice|2023-01-01|Init"));
        assert!(!is_header("abc|Alice||Init"));
    }

    #[test]
    fn test_from_block_message_keeps_separators() {
        let record =
            CommitRecord::from_block("h1|Alice|2023-01-01|part1|part2", &[] as &[&str])
                .expect("header");
        assert_eq!(record.message, "part1|part2");
        assert_eq!(record.hash, "h1");
        assert_eq!(record.author, "Alice");
        assert_eq!(record.date, "2023-01-01");
    }

    #[test]
    fn test_from_block_drops_blank_lines() {
        let record = CommitRecord::from_block(
            "h1|Alice|2023-01-01|Init",
            &["file1.js", "", "   ", "file2.js", ""],
        )
        .expect("header");
        assert_eq!(record.files, vec!["file1.js", "file2.js"]);
    }

    #[test]
    fn test_from_block_zero_files() {
        let record =
            CommitRecord::from_block("h1|Alice|2023-01-01|Merge", &[""]).expect("header");
        assert!(record.is_empty());
        assert!(record.is_valid());
    }

    #[test]
    fn test_from_block_rejects_non_header() {
        assert!(CommitRecord::from_block("README.md", &["x"]).is_none());
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(sample_record().short_hash(), "1945ab9");
        let mut record = sample_record();
        record.hash = "abc".to_string();
        assert_eq!(record.short_hash(), "abc");
    }

    #[test]
    fn test_subject_multiline() {
        let mut record = sample_record();
        record.message = "first\nsecond".to_string();
        assert_eq!(record.subject(), "first");
    }

    #[test]
    fn test_timestamp_rfc3339() {
        let ts = sample_record().timestamp().expect("parse");
        assert_eq!(ts.with_timezone(&Utc).to_rfc3339(), "2026-01-17T01:33:06+00:00");
    }

    #[test]
    fn test_timestamp_bare_date() {
        let mut record = sample_record();
        record.date = "2023-01-02".to_string();
        let ts = record.timestamp().expect("parse");
        assert_eq!(ts.with_timezone(&Utc).to_rfc3339(), "2023-01-02T00:00:00+00:00");
    }

    #[test]
    fn test_timestamp_garbage() {
        let mut record = sample_record();
        record.date = "yesterday-ish".to_string();
        assert!(record.timestamp().is_none());
    }

    #[test]
    fn test_record_json_field_names() {
        let json = serde_json::to_string(&sample_record()).expect("serialize");
        for field in ["\"hash\":", "\"author\":", "\"date\":", "\"message\":", "\"files\":"] {
            assert!(json.contains(field), "missing {field} in {json}");
        }
    }
}
