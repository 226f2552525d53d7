// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Upstream log process
//!
//! The log is produced by an external `git log` process. [`LogProcess`]
//! abstracts the three signals the readers need from it (an ordered stdout
//! stream, a diagnostic stream, and an exit status) plus the ability to stop
//! it early. [`GitProcess`] is the real implementation.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};
use tracing::debug;

use crate::date_range::DateRange;
use crate::error::LogError;

/// Executable used for the upstream query
pub const GIT_COMMAND: &str = "git";

/// Pretty format producing `hash|author|date|subject` header lines
pub const LOG_FORMAT: &str = "--pretty=format:%H|%an|%aI|%s";

/// Boxed byte stream handed out by a [`LogProcess`]
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// How the upstream process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    /// Exit code; `None` when the process was ended by a signal
    pub code: Option<i32>,
    /// Whether the process reported success
    pub success: bool,
}

impl ExitReport {
    /// A successful exit
    #[must_use]
    pub fn ok() -> Self {
        Self {
            code: Some(0),
            success: true,
        }
    }

    /// An unsuccessful exit with the given code
    #[must_use]
    pub fn failed(code: i32) -> Self {
        Self {
            code: Some(code),
            success: false,
        }
    }
}

impl From<std::process::ExitStatus> for ExitReport {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
            success: status.success(),
        }
    }
}

/// A running process that produces log output
#[async_trait]
pub trait LogProcess: Send {
    /// Take the standard output stream (only the first call returns it)
    fn take_stdout(&mut self) -> Option<ByteStream>;

    /// Take the diagnostic stream (only the first call returns it)
    fn take_stderr(&mut self) -> Option<ByteStream>;

    /// Wait for the process to exit
    async fn wait(&mut self) -> std::io::Result<ExitReport>;

    /// Stop the process early and reap it
    async fn terminate(&mut self) -> std::io::Result<()>;
}

/// Parameters handed to the upstream `git log`
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    /// Lower date bound, in a form git understands
    pub since: Option<String>,
    /// Upper date bound, in a form git understands
    pub until: Option<String>,
    /// Maximum number of commits
    pub limit: Option<usize>,
    /// Repository directory (defaults to the current directory)
    pub repo_dir: Option<PathBuf>,
}

impl LogQuery {
    /// Build a query from a resolved date range and limit
    #[must_use]
    pub fn new(range: &DateRange, limit: Option<usize>) -> Self {
        Self {
            since: range.upstream_since(),
            until: range.upstream_until(),
            limit,
            repo_dir: None,
        }
    }

    /// Run the query in a specific repository directory
    #[must_use]
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.repo_dir = Some(dir.into());
        self
    }

    /// Arguments passed to `git`
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "log".to_string(),
            LOG_FORMAT.to_string(),
            "--name-only".to_string(),
        ];
        if let Some(since) = &self.since {
            args.push(format!("--since={since}"));
        }
        if let Some(until) = &self.until {
            args.push(format!("--until={until}"));
        }
        if let Some(limit) = self.limit {
            args.push(format!("--max-count={limit}"));
        }
        args
    }

    /// Spawn `git log` for this query
    ///
    /// # Errors
    ///
    /// Returns `LogError::SourceFailure` if the process cannot be started.
    pub fn spawn(&self) -> Result<GitProcess, LogError> {
        GitProcess::spawn(self)
    }
}

/// A `git log` child process
#[derive(Debug)]
pub struct GitProcess {
    child: Child,
}

impl GitProcess {
    /// Spawn `git` with the query's arguments, piping stdout and stderr
    ///
    /// # Errors
    ///
    /// Returns `LogError::SourceFailure` if the process cannot be started.
    pub fn spawn(query: &LogQuery) -> Result<Self, LogError> {
        let args = query.args();
        debug!(command = GIT_COMMAND, ?args, "spawning log source");

        let mut command = Command::new(GIT_COMMAND);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &query.repo_dir {
            if !dir.is_dir() {
                return Err(LogError::SourceFailure {
                    status: None,
                    diagnostics: format!("directory not found: {}", dir.display()),
                });
            }
            command.current_dir(dir);
        }

        let child = command.spawn().map_err(|e| LogError::SourceFailure {
            status: None,
            diagnostics: if e.kind() == std::io::ErrorKind::NotFound {
                format!("{GIT_COMMAND} executable not found")
            } else {
                format!("failed to spawn {GIT_COMMAND}: {e}")
            },
        })?;

        Ok(Self { child })
    }
}

#[async_trait]
impl LogProcess for GitProcess {
    fn take_stdout(&mut self) -> Option<ByteStream> {
        self.child
            .stdout
            .take()
            .map(|stdout| Box::new(stdout) as ByteStream)
    }

    fn take_stderr(&mut self) -> Option<ByteStream> {
        self.child
            .stderr
            .take()
            .map(|stderr| Box::new(stderr) as ByteStream)
    }

    async fn wait(&mut self) -> std::io::Result<ExitReport> {
        let status = self.child.wait().await?;
        debug!(code = ?status.code(), "log source exited");
        Ok(status.into())
    }

    async fn terminate(&mut self) -> std::io::Result<()> {
        debug!("terminating log source");
        // kill() also reaps the child
        match self.child.kill().await {
            Ok(()) => Ok(()),
            // Already exited
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(e),
        }
    }
}
