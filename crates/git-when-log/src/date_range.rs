// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Date range expressions
//!
//! Turns the `--when` text into concrete bounds:
//!
//! - `today`, `yesterday`, `last-week`, `last-month` (relative to now)
//! - `YYYY-MM-DD`, `YYYY-MM`, RFC 3339 timestamps
//! - `start..end` with any of the above on either side
//!
//! Bare dates on the end side of a range are inclusive: `2024-01-31` ends at
//! `23:59:59.999` UTC, and `2024-02` ends at the last millisecond of February.

use chrono::{
    DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc,
};
use tracing::debug;

use crate::commit::CommitRecord;
use crate::error::LogError;

/// Separator between the start and end of an explicit range
pub const RANGE_SEPARATOR: &str = "..";

/// Which side of a range a fragment is resolved for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Start,
    End,
}

/// A resolved date range
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    /// Inclusive lower bound
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound
    pub until: Option<DateTime<Utc>>,
    /// Whether the range came from a named shorthand such as `last-week`
    pub is_shorthand: bool,
    /// Raw `start..end` sides, kept so bare dates can be handed upstream verbatim
    explicit: Option<(String, String)>,
}

impl DateRange {
    /// A range with no bounds
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Parse a range expression relative to the current local time
    ///
    /// # Errors
    ///
    /// Returns `LogError::InvalidDateRange` naming the fragment that could
    /// not be resolved to a calendar date.
    pub fn parse(text: &str) -> Result<Self, LogError> {
        Self::parse_at(text, Local::now())
    }

    /// Parse a range expression relative to `now`
    ///
    /// Shorthands use the calendar of `now`'s time zone.
    ///
    /// # Errors
    ///
    /// Returns `LogError::InvalidDateRange` naming the fragment that could
    /// not be resolved to a calendar date.
    pub fn parse_at<Tz: TimeZone>(text: &str, now: DateTime<Tz>) -> Result<Self, LogError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::unbounded());
        }

        if let Some(range) = Self::shorthand(text, &now) {
            debug!(when = text, since = ?range.since, until = ?range.until, "resolved shorthand range");
            return Ok(range);
        }

        let parts: Vec<&str> = text.split(RANGE_SEPARATOR).collect();
        let range = match parts.as_slice() {
            [single] => {
                let single = single.trim();
                Self {
                    since: Some(parse_fragment(single, Side::Start)?),
                    until: Some(parse_fragment(single, Side::End)?),
                    is_shorthand: false,
                    explicit: Some((single.to_string(), single.to_string())),
                }
            }
            [start, end] => {
                let (start, end) = (start.trim(), end.trim());
                if start.is_empty() || end.is_empty() {
                    return Err(LogError::invalid_date(text));
                }
                Self {
                    since: Some(parse_fragment(start, Side::Start)?),
                    until: Some(parse_fragment(end, Side::End)?),
                    is_shorthand: false,
                    explicit: Some((start.to_string(), end.to_string())),
                }
            }
            _ => return Err(LogError::invalid_date(text)),
        };

        debug!(when = text, since = ?range.since, until = ?range.until, "resolved date range");
        Ok(range)
    }

    fn shorthand<Tz: TimeZone>(text: &str, now: &DateTime<Tz>) -> Option<Self> {
        let (since, until) = match text {
            "today" => (start_of_day(now, 0), now.with_timezone(&Utc)),
            "yesterday" => {
                let start = start_of_day(now, 1);
                (start, start + Duration::days(1) - Duration::milliseconds(1))
            }
            "last-week" => {
                let now = now.with_timezone(&Utc);
                (now - Duration::days(7), now)
            }
            "last-month" => {
                let now = now.with_timezone(&Utc);
                (now - Duration::days(30), now)
            }
            _ => return None,
        };
        Some(Self {
            since: Some(since),
            until: Some(until),
            is_shorthand: true,
            explicit: None,
        })
    }

    /// Check whether neither bound is set
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.since.is_none() && self.until.is_none()
    }

    /// The `--since` value to hand to the upstream log query
    #[must_use]
    pub fn upstream_since(&self) -> Option<String> {
        match &self.explicit {
            Some((start, _)) if is_bare_date(start) => Some(format!("{start}T00:00:00+00:00")),
            _ => self.since.map(format_upstream),
        }
    }

    /// The `--until` value to hand to the upstream log query
    #[must_use]
    pub fn upstream_until(&self) -> Option<String> {
        match &self.explicit {
            Some((_, end)) if is_bare_date(end) => Some(format!("{end}T23:59:59+00:00")),
            _ => self.until.map(format_upstream),
        }
    }

    /// Check whether an instant falls inside the range (both ends inclusive)
    #[must_use]
    pub fn contains<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> bool {
        let instant = instant.with_timezone(&Utc);
        self.since.is_none_or(|since| instant >= since)
            && self.until.is_none_or(|until| instant <= until)
    }

    /// Check whether a record's date lies inside the range
    ///
    /// A record with an unparseable date is only admitted by an unbounded
    /// range.
    #[must_use]
    pub fn admits(&self, record: &CommitRecord) -> bool {
        if self.is_unbounded() {
            return true;
        }
        match record.timestamp() {
            Some(ts) => self.contains(&ts),
            None => {
                debug!(hash = %record.hash, date = %record.date, "dropping commit with unparseable date");
                false
            }
        }
    }

    /// Keep only records whose date lies inside the range
    #[must_use]
    pub fn apply(&self, records: Vec<CommitRecord>) -> Vec<CommitRecord> {
        if self.is_unbounded() {
            return records;
        }
        let before = records.len();
        let kept: Vec<CommitRecord> = records
            .into_iter()
            .filter(|record| self.admits(record))
            .collect();
        debug!(before, after = kept.len(), "applied date bounds");
        kept
    }
}

/// Start of the local calendar day `days_back` days before `now`
fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>, days_back: i64) -> DateTime<Utc> {
    let day = now.date_naive() - Duration::days(days_back);
    let midnight = day.and_time(chrono::NaiveTime::MIN);
    match now.timezone().from_local_datetime(&midnight).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // Midnight skipped by a DST transition
        None => Utc.from_utc_datetime(&midnight),
    }
}

fn format_upstream(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `YYYY-MM-DD` shape check (does not validate the calendar)
fn is_bare_date(s: &str) -> bool {
    s.len() == 10
        && s.is_ascii()
        && is_digits(&s[0..4])
        && s.as_bytes()[4] == b'-'
        && is_digits(&s[5..7])
        && s.as_bytes()[7] == b'-'
        && is_digits(&s[8..10])
}

/// `YYYY-MM` shape check
fn is_bare_month(s: &str) -> bool {
    s.len() == 7 && s.is_ascii() && is_digits(&s[0..4]) && s.as_bytes()[4] == b'-' && is_digits(&s[5..7])
}

fn parse_year_month(fragment: &str) -> Result<(i32, u32), LogError> {
    let year: i32 = fragment[0..4]
        .parse()
        .map_err(|_| LogError::invalid_date(fragment))?;
    let month: u32 = fragment[5..7]
        .parse()
        .map_err(|_| LogError::invalid_date(fragment))?;
    if !(1..=12).contains(&month) {
        return Err(LogError::invalid_date(fragment));
    }
    Ok((year, month))
}

fn first_of_month(year: i32, month: u32, fragment: &str) -> Result<NaiveDate, LogError> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| LogError::invalid_date(fragment))
}

/// Resolve one side of a range to an instant
fn parse_fragment(fragment: &str, side: Side) -> Result<DateTime<Utc>, LogError> {
    let fragment = fragment.trim();

    if is_bare_date(fragment) {
        let (year, month) = parse_year_month(fragment)?;
        let day: u32 = fragment[8..10]
            .parse()
            .map_err(|_| LogError::invalid_date(fragment))?;
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| LogError::invalid_date(fragment))?;
        let start = Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN));
        return Ok(match side {
            Side::Start => start,
            Side::End => start + Duration::days(1) - Duration::milliseconds(1),
        });
    }

    if is_bare_month(fragment) {
        let (year, month) = parse_year_month(fragment)?;
        let first = first_of_month(year, month, fragment)?;
        let start = Utc.from_utc_datetime(&first.and_time(chrono::NaiveTime::MIN));
        return Ok(match side {
            Side::Start => start,
            Side::End => {
                let next = if first.month() == 12 {
                    first_of_month(year + 1, 1, fragment)?
                } else {
                    first_of_month(year, month + 1, fragment)?
                };
                Utc.from_utc_datetime(&next.and_time(chrono::NaiveTime::MIN))
                    - Duration::milliseconds(1)
            }
        });
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(fragment) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(fragment, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(LogError::invalid_date(fragment))
}
