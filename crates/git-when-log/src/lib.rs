// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! git-when-log: Git log stream parsing and commit filtering for git-when
//!
//! This library crate turns the output of `git log --name-only` into
//! commit records, either all at once or as a backpressured stream, and
//! narrows them with date bounds, fuzzy author/message matching, and glob or
//! substring path matching.
//!
//! # Example
//!
//! ```no_run
//! use git_when_log::{DateRange, FilterEngine, FilterOptions, LogQuery, fetch_commits};
//!
//! # async fn run() -> Result<(), git_when_log::LogError> {
//! let range = DateRange::parse("last-week")?;
//! let mut process = LogQuery::new(&range, Some(50)).spawn()?;
//! let commits = fetch_commits(&mut process, Some(50)).await?;
//!
//! let options = FilterOptions {
//!     author: Some("alice".to_string()),
//!     ..FilterOptions::default()
//! };
//! for c in FilterEngine::new().apply(range.apply(commits), &options) {
//!     println!("{} - {}", c.short_hash(), c.subject());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod commit;
pub mod date_range;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod parser;
pub mod source;

pub use commit::{CommitRecord, is_header};
pub use date_range::DateRange;
pub use error::{FilterError, LogError};
pub use fetch::{
    Completion, CommitStream, RecordFilter, fetch_commits, read_commits, stream_commits,
};
pub use filter::{FilterEngine, FilterOptions, FuzzyScorer, GlobMatcher, PathMatcher, Scorer};
pub use parser::{LogParser, parse_log};
pub use source::{ExitReport, GitProcess, LogProcess, LogQuery};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::commit::CommitRecord;
    pub use crate::date_range::DateRange;
    pub use crate::error::LogError;
    pub use crate::fetch::{CommitStream, fetch_commits, stream_commits};
    pub use crate::filter::{FilterEngine, FilterOptions};
    pub use crate::source::{GitProcess, LogProcess, LogQuery};
}
