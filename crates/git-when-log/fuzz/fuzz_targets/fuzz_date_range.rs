// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

#![no_main]

use chrono::{TimeZone, Utc};
use git_when_log::DateRange;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
    if let Ok(range) = DateRange::parse_at(text, now) {
        let _ = range.upstream_since();
        let _ = range.upstream_until();
    }
});
