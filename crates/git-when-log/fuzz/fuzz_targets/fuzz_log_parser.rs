// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

#![no_main]

use git_when_log::LogParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte picks the chunk size so splits land everywhere
    let Some((&size, rest)) = data.split_first() else {
        return;
    };
    let size = usize::from(size).max(1);

    let mut parser = LogParser::new(None);
    let mut commits = Vec::new();
    for chunk in rest.chunks(size) {
        commits.extend(parser.feed(chunk));
    }
    commits.extend(parser.finish());

    for commit in &commits {
        assert!(commit.is_valid());
        assert!(commit.files.iter().all(|f| !f.trim().is_empty()));
    }
});
