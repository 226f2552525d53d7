// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! End-to-end tests for `git_when::run`
//!
//! Each test parses a real command line, runs it against a seeded scratch
//! repository and inspects what would have been printed.

use std::ffi::OsString;
use std::path::Path;

use clap::Parser;
use git_when::config::Config;
use git_when::presets::PresetError;
use git_when::run::{RunError, run};
use git_when_log::CommitRecord;
use similar_asserts::assert_eq;

use test_utils::{TempTestDir, TestGitRepo, assert_text_eq, output_text};

/// Parse `args` with the repository and presets file appended as globals
fn config(repo: &Path, presets: &Path, args: &[&str]) -> Config {
    let mut argv: Vec<OsString> = vec!["git-when".into()];
    argv.extend(args.iter().map(OsString::from));
    argv.extend([
        OsString::from("-C"),
        OsString::from(repo),
        OsString::from("--presets"),
        OsString::from(presets),
    ]);
    Config::try_parse_from(argv).expect("command line should parse")
}

struct Fixture {
    repo: TestGitRepo,
    state: TempTestDir,
}

impl Fixture {
    fn new(test_name: &str) -> Self {
        Self {
            repo: TestGitRepo::seeded(test_name),
            state: TempTestDir::new(&format!("{test_name}-state")),
        }
    }

    fn presets(&self) -> std::path::PathBuf {
        self.state.join("presets.json")
    }

    async fn try_run(&self, args: &[&str]) -> Result<String, RunError> {
        let config = config(self.repo.path(), &self.presets(), args);
        let mut out = Vec::new();
        run(&config, &mut out).await?;
        Ok(output_text(out))
    }

    async fn run(&self, args: &[&str]) -> String {
        self.try_run(args).await.expect("run should succeed")
    }
}

fn ndjson(output: &str) -> Vec<CommitRecord> {
    output
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid ndjson line"))
        .collect()
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_markdown_month_range() {
    let fx = Fixture::new("md_month");
    let bob = fx.repo.rev_sha("HEAD~2");
    let alice = fx.repo.rev_sha("HEAD~3");

    let output = fx.run(&["-w", "2024-01", "-f", "md"]).await;

    let expected = format!(
        "| Hash | Author | Date | Message |\n\
         | --- | --- | --- | --- |\n\
         | {bob} | Bob | 2024-01-15T12:00:00+00:00 | Add search feature |\n\
         | {alice} | Alice | 2024-01-10T09:00:00+00:00 | Fix login bug |\n"
    );
    assert_text_eq(&output, &expected);
}

#[tokio::test]
async fn test_markdown_escapes_pipes_in_messages() {
    let fx = Fixture::new("md_pipe");
    let output = fx.run(&["--format", "markdown", "--what", "docs"]).await;
    assert!(
        output.contains("| Update docs \\| with pipe |"),
        "unexpected output:\n{output}"
    );
    assert_eq!(output.lines().count(), 3);
}

#[tokio::test]
async fn test_table_is_default_format() {
    let fx = Fixture::new("table_default");
    let output = fx.run(&["-n", "1"]).await;
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("+-"));
    assert!(lines[1].starts_with("| Hash "));
    assert!(lines[3].contains("Empty release"));
}

#[tokio::test]
async fn test_author_filter_csv() {
    let fx = Fixture::new("author_csv");
    let output = fx.run(&["-a", "alice", "-f", "csv"]).await;
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[0], "hash,author,date,message");
    assert_eq!(lines.len(), 2);
    assert!(lines[1].ends_with(r#","Alice","2024-01-10T09:00:00+00:00","Fix login bug""#));
}

#[tokio::test]
async fn test_path_glob_json_keeps_files() {
    let fx = Fixture::new("path_json");
    let output = fx.run(&["-p", "src/**", "-f", "json"]).await;
    let commits: Vec<CommitRecord> = serde_json::from_str(&output).expect("json array");
    let authors: Vec<&str> = commits.iter().map(|c| c.author.as_str()).collect();
    assert_eq!(authors, vec!["Bob", "Alice"]);
    assert_eq!(
        commits[0].files,
        vec!["README.md".to_string(), "src/feature/new.js".to_string()]
    );
}

#[tokio::test]
async fn test_limit_applies_after_local_filters() {
    let fx = Fixture::new("limit_after_filter");
    let output = fx.run(&["-p", "src", "-n", "1", "-f", "ndjson"]).await;
    let commits = ndjson(&output);
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].author, "Bob");

    let output = fx.run(&["-p", "src", "-n", "1", "-f", "csv"]).await;
    assert_eq!(output.lines().count(), 2);
    assert!(output.contains("\"Bob\""));
}

#[tokio::test]
async fn test_ndjson_limit_without_filters() {
    let fx = Fixture::new("ndjson_limit");
    let commits = ndjson(&fx.run(&["-f", "ndjson", "-n", "2"]).await);
    let authors: Vec<&str> = commits.iter().map(|c| c.author.as_str()).collect();
    assert_eq!(authors, vec!["Dave", "Carol"]);
}

#[tokio::test]
async fn test_ndjson_respects_date_range() {
    let fx = Fixture::new("ndjson_range");
    let commits = ndjson(&fx.run(&["-f", "ndjson", "-w", "2024-01-12..2024-02-01"]).await);
    let authors: Vec<&str> = commits.iter().map(|c| c.author.as_str()).collect();
    assert_eq!(authors, vec!["Carol", "Bob"]);
}

#[tokio::test]
async fn test_batches_repeat_headers() {
    let fx = Fixture::new("batches");
    let output = fx.run(&["-f", "csv", "--batch-size", "3"]).await;
    let headers = output
        .lines()
        .filter(|l| *l == "hash,author,date,message")
        .count();
    assert_eq!(headers, 2);
    assert_eq!(output.lines().count(), 6);
}

#[tokio::test]
async fn test_empty_result_still_prints_headers() {
    let fx = Fixture::new("empty_result");
    let output = fx.run(&["-w", "2023-06", "-f", "md"]).await;
    assert_text_eq(&output, "| Hash | Author | Date | Message |\n| --- | --- | --- | --- |\n");
}

#[tokio::test]
async fn test_invalid_range_is_reported() {
    let fx = Fixture::new("invalid_range");
    let err = fx.try_run(&["-w", "2024-01.."]).await.expect_err("bad range");
    assert!(
        matches!(err, RunError::Preset(PresetError::DateRange(_))),
        "got {err:?}"
    );
    assert!(err.to_string().starts_with("Invalid date range"));
}

#[tokio::test]
async fn test_not_a_repository() {
    let outside = TempTestDir::new("outside_repo");
    let presets = TempTestDir::new("outside_repo_state");
    let config = config(outside.path(), &presets.join("presets.json"), &[]);
    let mut out = Vec::new();
    match run(&config, &mut out).await {
        Err(err) => {
            assert!(matches!(err, RunError::NotARepository), "got {err:?}");
            assert_eq!(err.to_string(), "current directory is not a Git repository");
        }
        // The temp directory itself lives inside a repository on this machine
        Ok(()) => {}
    }
}

// ============================================================================
// Presets
// ============================================================================

#[tokio::test]
async fn test_preset_lifecycle() {
    let fx = Fixture::new("preset_lifecycle");

    assert_eq!(fx.run(&["--list-presets"]).await, "No presets saved.\n");

    let saved = fx.run(&["-w", "2024-01", "-f", "csv", "--save", "january"]).await;
    assert_eq!(saved, "Saved preset 'january'.\n");

    let output = fx.run(&["january"]).await;
    assert_eq!(output.lines().next(), Some("hash,author,date,message"));
    assert_eq!(output.lines().count(), 3);

    // Flags override the preset for this run only
    let output = fx.run(&["january", "-f", "md", "-a", "bob"]).await;
    assert_eq!(output.lines().count(), 3);
    assert!(output.contains("| Bob |"));

    let edited = fx.run(&["edit", "january", "-n", "1"]).await;
    assert_eq!(edited, "Updated preset 'january'.\n");
    let output = fx.run(&["january"]).await;
    assert_eq!(output.lines().count(), 2);
    assert!(output.contains("\"Bob\""));

    let edited = fx.run(&["edit", "january", "-o", "-f", "csv"]).await;
    assert_eq!(edited, "Updated preset 'january'.\n");
    let output = fx.run(&["january"]).await;
    assert_eq!(output.lines().count(), 2);
    assert_eq!(output.lines().next(), Some("hash,author,date,message"));

    fx.run(&["-a", "dave", "-s", "dave"]).await;
    assert_eq!(
        fx.run(&["--list-presets"]).await,
        "Saved presets:\n  dave\n  january\n"
    );

    assert_eq!(
        fx.run(&["--delete-preset", "january"]).await,
        "Deleted preset 'january'.\n"
    );
    assert_eq!(fx.run(&["--list-presets"]).await, "Saved presets:\n  dave\n");
}

#[tokio::test]
async fn test_save_requires_overwrite() {
    let fx = Fixture::new("preset_overwrite");
    fx.run(&["-n", "1", "-s", "latest"]).await;

    let err = fx
        .try_run(&["-n", "2", "-s", "latest"])
        .await
        .expect_err("duplicate save");
    assert!(matches!(err, RunError::Preset(PresetError::AlreadyExists(_))));
    assert_eq!(
        err.to_string(),
        "Preset 'latest' already exists. Use --overwrite to overwrite."
    );

    fx.run(&["-n", "2", "-s", "latest", "-o"]).await;
    let commits = ndjson(&fx.run(&["latest", "-f", "ndjson"]).await);
    assert_eq!(commits.len(), 2);
}

#[tokio::test]
async fn test_unknown_preset() {
    let fx = Fixture::new("preset_unknown");
    let err = fx.try_run(&["nope"]).await.expect_err("unknown preset");
    assert_eq!(err.to_string(), "preset 'nope' not found");

    let err = fx
        .try_run(&["edit", "nope", "-n", "1"])
        .await
        .expect_err("edit unknown preset");
    assert!(matches!(err, RunError::Preset(PresetError::NotFound(_))));
}

#[tokio::test]
async fn test_malformed_preset_only_breaks_itself() {
    let fx = Fixture::new("preset_malformed");
    fx.state.create_file(
        "presets.json",
        r#"{"broken": {"limit": "lots"}, "good": {"who": "carol", "format": "csv"}}"#,
    );

    let err = fx.try_run(&["broken"]).await.expect_err("malformed preset");
    assert!(matches!(
        err,
        RunError::Preset(PresetError::Malformed { .. })
    ));

    let output = fx.run(&["good"]).await;
    assert_eq!(output.lines().count(), 2);
    assert!(output.contains("\"Carol\""));
}

#[tokio::test]
async fn test_saving_invalid_preset_is_rejected() {
    let fx = Fixture::new("preset_invalid");
    fx.state.create_file("presets.json", r#"{"bad": {"format": "yaml"}}"#);

    let err = fx.try_run(&["bad"]).await.expect_err("invalid format");
    assert!(matches!(
        err,
        RunError::Preset(PresetError::InvalidFormat(_))
    ));

    let err = fx
        .try_run(&["bad", "-s", "copy"])
        .await
        .expect_err("invalid preset is not saved");
    assert!(matches!(
        err,
        RunError::Preset(PresetError::InvalidFormat(_))
    ));
    assert_eq!(fx.run(&["--list-presets"]).await, "Saved presets:\n  bad\n");
}
