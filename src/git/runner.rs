//! git::runner
//!
//! Runs single git commands against a repository directory.
//!
//! # Behavior
//!
//! - The repository path is the child's working directory.
//! - stdout and stderr are captured in full on reader threads, so a chatty
//!   command cannot block on a full pipe while we wait for it.
//! - With a timeout configured, the child is polled until it exits or the
//!   deadline passes; an overdue child is killed and reported as
//!   [`GitError::CommandTimedOut`]. Draining the pipes is bounded by the
//!   same deadline, since descendants of the child may keep them open.
//! - Every finished run is recorded in a [`CommandStats`] table, and runs at
//!   or above the slow threshold are logged at warn level.
//! - Nothing is retried.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::interface::GitError;
use super::stats::CommandStats;
use crate::core::config::{Config, DEFAULT_SLOW_THRESHOLD, DEFAULT_TIMEOUT};

/// Longest pause between two checks on a running child.
const MAX_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output (lossily decoded)
    pub stdout: String,
    /// Standard error (lossily decoded)
    pub stderr: String,
    /// Exit code; `None` if the process was ended by a signal
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Check if the command exited with status 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Where run timings are recorded.
#[derive(Debug, Clone)]
enum StatsSink {
    Global,
    Shared(Arc<CommandStats>),
}

/// Runs git commands and records their timings.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use std::time::Duration;
/// use tagtrail::git::CommandRunner;
///
/// let runner = CommandRunner::new("git").with_timeout(Some(Duration::from_secs(5)));
/// let out = runner.run_checked(Path::new("."), &["rev-parse", "HEAD"])?;
/// println!("HEAD is {}", out.stdout.trim());
/// # Ok::<(), tagtrail::git::GitError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: PathBuf,
    timeout: Option<Duration>,
    slow_threshold: Duration,
    stats: StatsSink,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new("git")
    }
}

impl CommandRunner {
    /// Create a runner for `program` with default timeout and threshold,
    /// recording into the process-wide statistics table.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: Some(DEFAULT_TIMEOUT),
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
            stats: StatsSink::Global,
        }
    }

    /// Create a runner from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.git_program())
            .with_timeout(config.command_timeout())
            .with_slow_threshold(config.slow_threshold())
    }

    /// Set the per-command timeout (`None` waits forever).
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the duration at which a run is logged as slow.
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    /// Record timings into `stats` instead of the process-wide table.
    pub fn with_stats(mut self, stats: Arc<CommandStats>) -> Self {
        self.stats = StatsSink::Shared(stats);
        self
    }

    /// The statistics table this runner records into.
    pub fn stats(&self) -> &CommandStats {
        match &self.stats {
            StatsSink::Global => CommandStats::global(),
            StatsSink::Shared(stats) => stats,
        }
    }

    /// The configured timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run a command and return its output whatever the exit status.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if `repo` is not an accessible directory
    /// - [`GitError::Spawn`] if the program cannot be started
    /// - [`GitError::CommandTimedOut`] if the timeout expires
    pub fn run(&self, repo: &Path, args: &[&str]) -> Result<CommandOutput, GitError> {
        if !repo.is_dir() {
            return Err(GitError::NotARepo {
                path: repo.to_path_buf(),
            });
        }

        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let command = display_command(&self.program, &args);
        debug!("running {} in {}", command, repo.display());

        let start = Instant::now();
        let mut child = Command::new(&self.program)
            .args(&args)
            .current_dir(repo)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| GitError::Spawn {
                command: command.clone(),
                source: e,
            })?;

        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let status = self.wait(&mut child).map_err(|e| GitError::Spawn {
            command: command.clone(),
            source: e,
        })?;

        let elapsed = start.elapsed();
        self.stats()
            .record(&self.program.to_string_lossy(), &args, elapsed);
        if elapsed >= self.slow_threshold {
            warn!(
                "slow command ({:.1} ms): {}",
                elapsed.as_secs_f64() * 1000.0,
                command
            );
        }

        let timed_out = || GitError::CommandTimedOut {
            command: command.clone(),
            timeout: self.timeout.unwrap_or_default(),
        };
        let Some(status) = status else {
            return Err(timed_out());
        };

        let deadline = self.timeout.map(|t| start + t);
        let stdout = collect(stdout, deadline).ok_or_else(timed_out)?;
        let stderr = collect(stderr, deadline).ok_or_else(timed_out)?;
        Ok(CommandOutput {
            stdout,
            stderr,
            code: status.code(),
        })
    }

    /// Run a command and require a zero exit status.
    ///
    /// # Errors
    ///
    /// Everything [`run`](Self::run) returns, plus [`GitError::CommandFailed`]
    /// for a non-zero exit.
    pub fn run_checked(&self, repo: &Path, args: &[&str]) -> Result<CommandOutput, GitError> {
        let output = self.run(repo, args)?;
        if output.success() {
            return Ok(output);
        }
        Err(GitError::CommandFailed {
            command: display_command(&self.program, args),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        })
    }

    /// Wait for the child; `Ok(None)` means it was killed at the deadline.
    fn wait(&self, child: &mut Child) -> std::io::Result<Option<ExitStatus>> {
        let Some(timeout) = self.timeout else {
            return child.wait().map(Some);
        };

        let deadline = Instant::now() + timeout;
        let mut interval = Duration::from_millis(1);
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                // The child may exit between the check and the kill.
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            thread::sleep(interval);
            interval = (interval * 2).min(MAX_POLL_INTERVAL);
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(buf);
    });
    rx
}

/// Wait for a reader to drain its pipe; `None` if the deadline passes first.
fn collect(reader: Option<Receiver<Vec<u8>>>, deadline: Option<Instant>) -> Option<String> {
    let Some(reader) = reader else {
        return Some(String::new());
    };
    let received = match deadline {
        None => reader.recv().map_err(|_| RecvTimeoutError::Disconnected),
        Some(deadline) => {
            reader.recv_timeout(deadline.saturating_duration_since(Instant::now()))
        }
    };
    match received {
        Ok(buf) => Some(String::from_utf8_lossy(&buf).into_owned()),
        Err(RecvTimeoutError::Disconnected) => Some(String::new()),
        Err(RecvTimeoutError::Timeout) => None,
    }
}

fn display_command<S: AsRef<str>>(program: &Path, args: &[S]) -> String {
    let mut command = program.display().to_string();
    for arg in args {
        command.push(' ');
        command.push_str(arg.as_ref());
    }
    command
}
