// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Batch and streaming readers over a [`LogProcess`]
//!
//! Both readers drive the same [`LogParser`]. The batch reader collects every
//! record and only resolves once the output stream has ended *and* the
//! process has exited; the two can arrive in either order, which
//! [`Completion`] tracks. The streaming reader is pull-based: it reads more
//! output only after the caller has taken the records already parsed.
//!
//! Reaching the record limit terminates the process in both modes.

use std::collections::VecDeque;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::commit::CommitRecord;
use crate::error::LogError;
use crate::parser::LogParser;
use crate::source::{ByteStream, ExitReport, LogProcess};

/// Bytes requested from the output stream per read
pub const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Join of the two end-of-run signals: output EOF and process exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Neither signal has arrived
    AwaitingBoth,
    /// Output has ended; waiting for the exit status
    AwaitingExit,
    /// The process has exited; output is still draining
    AwaitingEof(ExitReport),
    /// Both signals have arrived
    Done(ExitReport),
}

impl Completion {
    /// Record that the output stream has ended
    #[must_use]
    pub fn on_eof(self) -> Self {
        match self {
            Self::AwaitingBoth => Self::AwaitingExit,
            Self::AwaitingEof(report) => Self::Done(report),
            other => other,
        }
    }

    /// Record that the process has exited
    #[must_use]
    pub fn on_exit(self, report: ExitReport) -> Self {
        match self {
            Self::AwaitingBoth => Self::AwaitingEof(report),
            Self::AwaitingExit => Self::Done(report),
            other => other,
        }
    }

    /// Whether the output stream has ended
    #[must_use]
    pub fn eof_seen(&self) -> bool {
        matches!(self, Self::AwaitingExit | Self::Done(_))
    }

    /// Whether the process has exited
    #[must_use]
    pub fn exit_seen(&self) -> bool {
        matches!(self, Self::AwaitingEof(_) | Self::Done(_))
    }
}

enum Outcome {
    Finished(ExitReport),
    Limited,
}

fn missing_stream() -> LogError {
    LogError::SourceFailure {
        status: None,
        diagnostics: "log source has no output stream".to_string(),
    }
}

/// Read the diagnostic stream to completion on its own task
fn collect_diagnostics(stderr: Option<ByteStream>) -> JoinHandle<String> {
    tokio::spawn(async move {
        let Some(mut stderr) = stderr else {
            return String::new();
        };
        let mut bytes = Vec::new();
        if let Err(e) = stderr.read_to_end(&mut bytes).await {
            debug!(error = %e, "failed to read log source diagnostics");
        }
        String::from_utf8_lossy(&bytes).into_owned()
    })
}

async fn failure(report: ExitReport, diagnostics: Option<JoinHandle<String>>) -> LogError {
    let diagnostics = match diagnostics {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    };
    warn!(code = ?report.code, "log source exited unsuccessfully");
    LogError::SourceFailure {
        status: report.code,
        diagnostics,
    }
}

/// Run a process to completion and collect its commits
///
/// # Errors
///
/// Returns `LogError::SourceFailure` with the captured diagnostics if the
/// process exits unsuccessfully, or `LogError::Io` if reading fails. When the
/// limit is reached the process is terminated and the records collected so
/// far are returned; the resulting kill status is not an error.
pub async fn fetch_commits<P>(
    process: &mut P,
    limit: Option<usize>,
) -> Result<Vec<CommitRecord>, LogError>
where
    P: LogProcess + ?Sized,
{
    let mut stdout = process.take_stdout().ok_or_else(missing_stream)?;
    let diagnostics = collect_diagnostics(process.take_stderr());

    let mut parser = LogParser::new(limit);
    let mut commits = Vec::new();
    let mut state = Completion::AwaitingBoth;
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    let outcome = {
        let exit = process.wait();
        tokio::pin!(exit);

        loop {
            if let Completion::Done(report) = state {
                break Outcome::Finished(report);
            }

            tokio::select! {
                read = stdout.read(&mut buf), if !state.eof_seen() => {
                    let n = read?;
                    if n == 0 {
                        commits.extend(parser.finish());
                        state = state.on_eof();
                        debug!(?state, "log output ended");
                    } else {
                        commits.extend(parser.feed(&buf[..n]));
                        if parser.is_satisfied() {
                            break Outcome::Limited;
                        }
                    }
                }
                report = &mut exit, if !state.exit_seen() => {
                    state = state.on_exit(report?);
                    debug!(?state, "log source exited");
                }
            }
        }
    };

    match outcome {
        Outcome::Limited => {
            debug!(count = commits.len(), "record limit reached");
            drop(stdout);
            process.terminate().await?;
            diagnostics.abort();
            Ok(commits)
        }
        Outcome::Finished(report) if report.success => {
            debug!(count = commits.len(), "collected commits");
            Ok(commits)
        }
        Outcome::Finished(report) => Err(failure(report, Some(diagnostics)).await),
    }
}

/// Predicate applied to each parsed record before it is yielded
pub type RecordFilter = Box<dyn Fn(&CommitRecord) -> bool + Send>;

/// Pull-based stream of commits from a running process
///
/// Output is read only when no parsed record is waiting, so a slow consumer
/// holds the process back through the pipe rather than growing a buffer.
pub struct CommitStream<P: LogProcess> {
    process: P,
    stdout: Option<ByteStream>,
    diagnostics: Option<JoinHandle<String>>,
    parser: LogParser,
    filter: Option<RecordFilter>,
    limit: Option<usize>,
    accepted: usize,
    ready: VecDeque<CommitRecord>,
    failure: Option<LogError>,
    buf: Vec<u8>,
    finished: bool,
}

impl<P: LogProcess> CommitStream<P> {
    /// Wrap a running process
    ///
    /// # Errors
    ///
    /// Returns `LogError::SourceFailure` if the process has no output stream.
    pub fn new(mut process: P, limit: Option<usize>) -> Result<Self, LogError> {
        let stdout = process.take_stdout().ok_or_else(missing_stream)?;
        let diagnostics = collect_diagnostics(process.take_stderr());
        Ok(Self {
            process,
            stdout: Some(stdout),
            diagnostics: Some(diagnostics),
            parser: LogParser::new(limit),
            filter: None,
            limit,
            accepted: 0,
            ready: VecDeque::new(),
            failure: None,
            buf: vec![0u8; READ_BUFFER_SIZE],
            finished: false,
        })
    }

    /// Only yield records accepted by `filter`
    ///
    /// The limit then counts accepted records rather than parsed ones.
    #[must_use]
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&CommitRecord) -> bool + Send + 'static,
    {
        // Nothing has been read yet, so the parser can be replaced
        self.parser = LogParser::new(None);
        self.filter = Some(Box::new(filter));
        self
    }

    /// Number of records parsed so far
    #[must_use]
    pub fn emitted(&self) -> usize {
        self.parser.emitted()
    }

    /// Get the next commit
    ///
    /// Returns `None` once the stream is exhausted. An unsuccessful exit is
    /// reported as a final `Err` after every record parsed before it.
    pub async fn next(&mut self) -> Option<Result<CommitRecord, LogError>> {
        loop {
            if let Some(record) = self.ready.pop_front() {
                return Some(Ok(record));
            }
            if let Some(err) = self.failure.take() {
                self.finished = true;
                return Some(Err(err));
            }
            if self.finished {
                return None;
            }
            if let Err(err) = self.advance().await {
                self.failure = Some(err);
            }
        }
    }

    fn is_satisfied(&self) -> bool {
        self.parser.is_satisfied() || self.limit_reached()
    }

    fn limit_reached(&self) -> bool {
        self.limit.is_some_and(|limit| self.accepted >= limit)
    }

    /// Queue parsed records that pass the filter, up to the limit
    ///
    /// The parser has already counted `records` against its own limit, so
    /// only accepted records are checked here.
    fn admit(&mut self, records: Vec<CommitRecord>) {
        for record in records {
            if self.limit_reached() {
                break;
            }
            if self.filter.as_ref().is_none_or(|keep| keep(&record)) {
                self.accepted += 1;
                self.ready.push_back(record);
            }
        }
    }

    /// Read one chunk of output and parse it
    async fn advance(&mut self) -> Result<(), LogError> {
        let n = match self.stdout.as_mut() {
            Some(stdout) => stdout.read(&mut self.buf).await?,
            None => return self.wait_for_exit().await,
        };

        if n == 0 {
            self.stdout = None;
            let records = self.parser.finish();
            self.admit(records);
            return self.wait_for_exit().await;
        }

        let records = self.parser.feed(&self.buf[..n]);
        self.admit(records);
        if self.is_satisfied() {
            debug!(count = self.accepted, "record limit reached");
            self.stdout = None;
            self.finished = true;
            if let Some(diagnostics) = self.diagnostics.take() {
                diagnostics.abort();
            }
            self.process.terminate().await?;
        }
        Ok(())
    }

    async fn wait_for_exit(&mut self) -> Result<(), LogError> {
        self.finished = true;
        let report = self.process.wait().await?;
        if report.success {
            return Ok(());
        }
        Err(failure(report, self.diagnostics.take()).await)
    }

    /// Write every commit as one JSON line, flushing after each
    ///
    /// Returns the number of records written.
    ///
    /// # Errors
    ///
    /// Returns the stream's error, or `LogError::Io`/`LogError::Json` if
    /// writing fails.
    pub async fn write_ndjson<W>(&mut self, writer: &mut W) -> Result<usize, LogError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut written = 0;
        while let Some(record) = self.next().await {
            let record = record?;
            let mut line = serde_json::to_vec(&record)?;
            line.push(b'\n');
            writer.write_all(&line).await?;
            writer.flush().await?;
            written += 1;
        }
        Ok(written)
    }
}

/// Start streaming commits from a running process
///
/// # Errors
///
/// Returns `LogError::SourceFailure` if the process has no output stream.
pub fn stream_commits<P: LogProcess>(
    process: P,
    limit: Option<usize>,
) -> Result<CommitStream<P>, LogError> {
    CommitStream::new(process, limit)
}

/// Parse commits from any byte reader without a process behind it
///
/// # Errors
///
/// Returns `LogError::Io` if reading fails.
pub async fn read_commits<R>(reader: &mut R, limit: Option<usize>) -> Result<Vec<CommitRecord>, LogError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut parser = LogParser::new(limit);
    let mut commits = Vec::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            commits.extend(parser.finish());
            break;
        }
        commits.extend(parser.feed(&buf[..n]));
        if parser.is_satisfied() {
            break;
        }
    }
    Ok(commits)
}
