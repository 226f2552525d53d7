// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzzy and path filtering over parsed commits
//!
//! [`FilterEngine::apply`] runs up to three stages in a fixed order: author,
//! message, path. Each stage sees only what the previous one kept. The fuzzy
//! stages re-rank their output by match quality; the path stage preserves
//! order.
//!
//! Scoring and glob matching sit behind the [`Scorer`] and [`PathMatcher`]
//! traits so either can be replaced without touching the composition.

use tracing::{debug, warn};

use crate::commit::CommitRecord;
use crate::error::FilterError;

/// Default inclusion threshold for fuzzy stages (0.0 exact, 1.0 anything)
pub const DEFAULT_THRESHOLD: f64 = 0.4;

/// Default distance over which a late match start costs a full point
pub const DEFAULT_DISTANCE: usize = 100;

/// Characters that turn a path query into a glob
pub const GLOB_META: [char; 5] = ['*', '?', '[', ']', '!'];

/// Similarity measure used by the fuzzy stages
pub trait Scorer {
    /// Score `candidate` against `query`: 0.0 is a perfect match, 1.0 none
    fn score(&self, query: &str, candidate: &str) -> f64;
}

/// Pattern test used by the path stage when the query is a glob
pub trait PathMatcher {
    /// Check whether `path` matches `pattern`
    ///
    /// # Errors
    ///
    /// Returns `FilterError::MalformedGlob` if `pattern` is not a valid glob.
    fn matches(&self, pattern: &str, path: &str) -> Result<bool, FilterError>;
}

/// Approximate substring scorer
///
/// Finds the substring of the candidate with the fewest edits (insertions,
/// deletions, substitutions) against the query, case-insensitively. The
/// score is `edits / query_len + start / distance`, clamped to 1.0, so a
/// typo costs in proportion to the query length and a match found late in
/// the candidate costs a little more than one found at the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzyScorer {
    /// Characters of offset that add a full point to the score
    pub distance: usize,
}

impl Default for FuzzyScorer {
    fn default() -> Self {
        Self {
            distance: DEFAULT_DISTANCE,
        }
    }
}

impl FuzzyScorer {
    fn proximity(&self, start: usize) -> f64 {
        if self.distance == 0 {
            return if start == 0 { 0.0 } else { 1.0 };
        }
        start as f64 / self.distance as f64
    }
}

/// Cost and start offset of the best alignment ending at a text position
#[derive(Debug, Clone, Copy)]
struct Cell {
    cost: usize,
    start: usize,
}

impl Cell {
    fn min(self, other: Self) -> Self {
        if (other.cost, other.start) < (self.cost, self.start) {
            other
        } else {
            self
        }
    }
}

impl Scorer for FuzzyScorer {
    fn score(&self, query: &str, candidate: &str) -> f64 {
        let query: Vec<char> = query.to_lowercase().chars().collect();
        let text: Vec<char> = candidate.to_lowercase().chars().collect();
        if query.is_empty() {
            return 0.0;
        }
        let len = query.len() as f64;

        // Column j holds the best alignment of each query prefix ending at
        // text position j; row 0 is free so a match may start anywhere.
        let mut prev: Vec<Cell> = (0..=query.len())
            .map(|i| Cell { cost: i, start: 0 })
            .collect();
        let mut best = 1.0_f64;

        for (j, &tc) in text.iter().enumerate() {
            let mut col = Vec::with_capacity(query.len() + 1);
            col.push(Cell {
                cost: 0,
                start: j + 1,
            });
            for (i, &qc) in query.iter().enumerate() {
                let diagonal = Cell {
                    cost: prev[i].cost + usize::from(qc != tc),
                    start: if i == 0 { j } else { prev[i].start },
                };
                let skip_query = Cell {
                    cost: col[i].cost + 1,
                    start: col[i].start,
                };
                let skip_text = Cell {
                    cost: prev[i + 1].cost + 1,
                    start: prev[i + 1].start,
                };
                col.push(diagonal.min(skip_query).min(skip_text));
            }

            let end = col[query.len()];
            let score = end.cost as f64 / len + self.proximity(end.start);
            best = best.min(score);
            if best == 0.0 {
                break;
            }
            prev = col;
        }

        best.min(1.0)
    }
}

/// Case-insensitive glob matcher backed by `glob-match`
///
/// A leading `!` negates the rest of the pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobMatcher;

impl GlobMatcher {
    /// Reject patterns with unbalanced character classes or brace groups
    fn validate(pattern: &str) -> Result<(), FilterError> {
        let malformed = || FilterError::MalformedGlob {
            pattern: pattern.to_string(),
        };

        let mut chars = pattern.chars().peekable();
        let mut in_class = false;
        let mut class_len = 0usize;
        let mut braces = 0usize;

        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                    class_len += 1;
                }
                '[' if !in_class => {
                    in_class = true;
                    class_len = 0;
                    if chars.peek() == Some(&'!') || chars.peek() == Some(&'^') {
                        chars.next();
                    }
                }
                ']' if in_class => {
                    if class_len == 0 {
                        return Err(malformed());
                    }
                    in_class = false;
                }
                ']' => return Err(malformed()),
                '{' if !in_class => braces += 1,
                '}' if !in_class => braces = braces.checked_sub(1).ok_or_else(malformed)?,
                _ => class_len += 1,
            }
        }

        if in_class || braces != 0 {
            return Err(malformed());
        }
        Ok(())
    }
}

impl PathMatcher for GlobMatcher {
    fn matches(&self, pattern: &str, path: &str) -> Result<bool, FilterError> {
        let (negated, body) = match pattern.strip_prefix('!') {
            Some(rest) if !rest.starts_with('(') => (true, rest),
            _ => (false, pattern),
        };
        Self::validate(body)?;
        let matched = glob_match::glob_match(&body.to_lowercase(), &path.to_lowercase());
        Ok(matched != negated)
    }
}

/// Check whether a path query should be treated as a glob
#[must_use]
pub fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(GLOB_META)
}

/// Queries for one filtering pass; empty or absent queries skip their stage
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOptions {
    /// Fuzzy query against the author name
    pub author: Option<String>,
    /// Fuzzy query against the commit message
    pub message: Option<String>,
    /// Glob or substring query against the touched paths
    pub path: Option<String>,
    /// Inclusion threshold for the fuzzy stages
    pub threshold: f64,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            author: None,
            message: None,
            path: None,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl FilterOptions {
    /// Check whether no stage will run
    #[must_use]
    pub fn is_empty(&self) -> bool {
        active(&self.author).is_none()
            && active(&self.message).is_none()
            && active(&self.path).is_none()
    }
}

fn active(query: &Option<String>) -> Option<&str> {
    query.as_deref().filter(|q| !q.is_empty())
}

/// Composes the author, message, and path stages
#[derive(Debug, Clone, Default)]
pub struct FilterEngine<S = FuzzyScorer, M = GlobMatcher> {
    scorer: S,
    matcher: M,
}

impl FilterEngine {
    /// Engine with the default scorer and glob matcher
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: Scorer, M: PathMatcher> FilterEngine<S, M> {
    /// Engine with a custom scorer and matcher
    pub fn with_parts(scorer: S, matcher: M) -> Self {
        Self { scorer, matcher }
    }

    /// Run every active stage over `records`
    #[must_use]
    pub fn apply(&self, records: Vec<CommitRecord>, options: &FilterOptions) -> Vec<CommitRecord> {
        let mut result = records;

        if let Some(query) = active(&options.author) {
            result = self.rank(result, query, options.threshold, |c| &c.author);
            debug!(query, kept = result.len(), "author filter");
        }

        if let Some(query) = active(&options.message) {
            result = self.rank(result, query, options.threshold, |c| &c.message);
            debug!(query, kept = result.len(), "message filter");
        }

        if let Some(pattern) = active(&options.path) {
            result = self.filter_paths(result, pattern);
            debug!(pattern, kept = result.len(), "path filter");
        }

        result
    }

    /// Check a single record against every active stage
    ///
    /// Used when records are streamed and cannot be re-ranked, so upstream
    /// order is kept.
    #[must_use]
    pub fn matches(&self, record: &CommitRecord, options: &FilterOptions) -> bool {
        let within = |query: Option<&str>, field: &str| {
            query.is_none_or(|q| self.scorer.score(q, field) <= options.threshold)
        };
        within(active(&options.author), &record.author)
            && within(active(&options.message), &record.message)
            && active(&options.path).is_none_or(|pattern| self.path_matches(record, pattern))
    }

    fn path_matches(&self, record: &CommitRecord, pattern: &str) -> bool {
        if !has_glob_meta(pattern) {
            let needle = pattern.to_lowercase();
            return record
                .files
                .iter()
                .any(|f| f.to_lowercase().contains(&needle));
        }
        record
            .files
            .iter()
            .any(|f| self.matcher.matches(pattern, f).unwrap_or(false))
    }

    /// Keep records scoring within `threshold`, best first
    fn rank<F>(
        &self,
        records: Vec<CommitRecord>,
        query: &str,
        threshold: f64,
        field: F,
    ) -> Vec<CommitRecord>
    where
        F: Fn(&CommitRecord) -> &str,
    {
        let mut scored: Vec<(f64, CommitRecord)> = records
            .into_iter()
            .map(|record| (self.scorer.score(query, field(&record)), record))
            .filter(|(score, _)| *score <= threshold)
            .collect();
        // Stable: equal scores keep input order
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.into_iter().map(|(_, record)| record).collect()
    }

    fn filter_paths(&self, records: Vec<CommitRecord>, pattern: &str) -> Vec<CommitRecord> {
        if has_glob_meta(pattern) {
            if let Err(e) = self.matcher.matches(pattern, "") {
                warn!(error = %e, "path pattern matches nothing");
                return Vec::new();
            }
        }
        records
            .into_iter()
            .filter(|c| self.path_matches(c, pattern))
            .collect()
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn record_strategy() -> impl Strategy<Value = CommitRecord> {
        (
            "[0-9a-f]{8}",
            "[A-Za-z]{0,10}",
            "[a-z ]{0,20}",
            proptest::collection::vec("[a-z]{1,5}(/[a-z]{1,5}){0,2}\\.(rs|md|js)", 0..4),
        )
            .prop_map(|(hash, author, message, files)| CommitRecord {
                hash,
                author,
                date: "2024-01-01T00:00:00Z".to_string(),
                message,
                files,
            })
    }

    proptest! {
        /// Property: combined filters return a subset of each single filter
        #[test]
        fn prop_combined_is_subset(
            records in proptest::collection::vec(record_strategy(), 0..12),
            author in "[a-z]{1,4}",
            path in prop_oneof![Just("*.rs".to_string()), Just("**/*.md".to_string()), "[a-z]{1,3}"],
        ) {
            let engine = FilterEngine::new();
            let by_author = engine.apply(records.clone(), &FilterOptions {
                author: Some(author.clone()),
                ..FilterOptions::default()
            });
            let by_path = engine.apply(records.clone(), &FilterOptions {
                path: Some(path.clone()),
                ..FilterOptions::default()
            });
            let combined = engine.apply(records, &FilterOptions {
                author: Some(author),
                path: Some(path),
                ..FilterOptions::default()
            });
            for record in &combined {
                prop_assert!(by_author.contains(record));
                prop_assert!(by_path.contains(record));
            }
        }

        /// Property: scores stay within 0.0..=1.0
        #[test]
        fn prop_score_bounded(query in "\\PC{0,12}", candidate in "\\PC{0,40}") {
            let score = FuzzyScorer::default().score(&query, &candidate);
            prop_assert!((0.0..=1.0).contains(&score));
        }

        /// Property: a query contained in the candidate scores only its offset
        #[test]
        fn prop_substring_has_no_edits(prefix in "[a-z]{0,10}", query in "[a-z]{1,8}", suffix in "[a-z]{0,10}") {
            let candidate = format!("{prefix}{query}{suffix}");
            let score = FuzzyScorer::default().score(&query, &candidate);
            prop_assert!(score <= prefix.chars().count() as f64 / DEFAULT_DISTANCE as f64 + 1e-9);
        }
    }
}
