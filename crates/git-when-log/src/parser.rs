// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Incremental git log parsing
//!
//! [`LogParser`] turns raw `git log --name-only` output into
//! [`CommitRecord`]s. It accepts input in arbitrary byte chunks, so the same
//! state machine serves both the batch reader and the streaming reader in
//! [`crate::fetch`].
//!
//! # Example
//!
//! ```
//! use git_when_log::parser::parse_log;
//!
//! let output = "h1|Alice|2023-01-01|Init\nfile1.js\n\nh2|Bob|2023-01-02|Add\nmain.py\n";
//! let commits = parse_log(output, None);
//! assert_eq!(commits.len(), 2);
//! assert_eq!(commits[0].files, vec!["file1.js"]);
//! ```

use tracing::debug;

use crate::commit::{CommitRecord, is_header};

/// Incremental parser state for one log stream
///
/// Holds the unterminated tail of the last chunk, the lines of the block
/// being assembled, and how many records have been emitted so far. Each
/// query owns its own parser.
#[derive(Debug, Default)]
pub struct LogParser {
    remainder: Vec<u8>,
    pending: Vec<String>,
    emitted: usize,
    limit: Option<usize>,
}

impl LogParser {
    /// Create a parser that stops after `limit` records (if given)
    #[must_use]
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Number of records emitted so far
    #[must_use]
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// The record limit, if any
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Whether the limit has been reached; further input is ignored
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.limit.is_some_and(|limit| self.emitted >= limit)
    }

    /// Feed a chunk of raw bytes, returning every record it completed
    ///
    /// Bytes after the last newline are held until the next chunk (or
    /// [`finish`](Self::finish)), so multi-byte characters split across
    /// chunks are decoded intact.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<CommitRecord> {
        let mut completed = Vec::new();
        if self.is_satisfied() {
            return completed;
        }

        self.remainder.extend_from_slice(chunk);
        let Some(last_newline) = self.remainder.iter().rposition(|&b| b == b'\n') else {
            return completed;
        };

        let tail = self.remainder.split_off(last_newline + 1);
        let mut complete = std::mem::replace(&mut self.remainder, tail);
        complete.pop();

        for raw in complete.split(|&b| b == b'\n') {
            let line = decode_line(raw);
            if let Some(record) = self.feed_line(&line) {
                completed.push(record);
            }
            if self.is_satisfied() {
                self.remainder.clear();
                break;
            }
        }

        completed
    }

    /// Feed a single line (without its terminator)
    ///
    /// Returns the previous block's record when `line` starts a new block.
    pub fn feed_line(&mut self, line: &str) -> Option<CommitRecord> {
        if self.is_satisfied() {
            return None;
        }

        if is_header(line) {
            let finished = self.take_block();
            self.pending.push(line.to_string());
            finished
        } else {
            if self.pending.is_empty() {
                // Output before the first header carries no commit
                if !line.trim().is_empty() {
                    debug!(line, "ignoring line before first commit header");
                }
                return None;
            }
            self.pending.push(line.to_string());
            None
        }
    }

    /// Flush the trailing partial line and the last pending block
    ///
    /// Returns every record this completed; the parser is left empty.
    pub fn finish(&mut self) -> Vec<CommitRecord> {
        let mut completed = Vec::new();
        if !self.remainder.is_empty() {
            let raw = std::mem::take(&mut self.remainder);
            let line = decode_line(&raw);
            if let Some(record) = self.feed_line(&line) {
                completed.push(record);
            }
        }
        if let Some(record) = self.take_block() {
            completed.push(record);
        }
        completed
    }

    /// Turn the pending lines into a record, honouring the limit
    fn take_block(&mut self) -> Option<CommitRecord> {
        if self.pending.is_empty() {
            return None;
        }
        let lines = std::mem::take(&mut self.pending);
        if self.is_satisfied() {
            return None;
        }
        let (header, files) = lines.split_first()?;
        let record = CommitRecord::from_block(header, files)?;
        self.emitted += 1;
        Some(record)
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Parse a complete log in one go
#[must_use]
pub fn parse_log(output: &str, limit: Option<usize>) -> Vec<CommitRecord> {
    let mut parser = LogParser::new(limit);
    let mut commits = parser.feed(output.as_bytes());
    commits.extend(parser.finish());
    commits
}
