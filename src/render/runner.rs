//! Running one compiler process with a timeout and cooperative cancellation.

use super::command::InvocationDescriptor;
use std::io::Read;
use std::process::{Child, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Shared flag telling in-flight and queued jobs to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates an untriggered token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Output of a process that exited 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

/// Why a job did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobFailure {
    /// The process could not be started or waited on.
    #[error("could not run {program}: {message}")]
    Spawn {
        /// Program that was started
        program: String,
        /// OS error text
        message: String,
    },

    /// The process exited unsuccessfully.
    #[error("compiler exited with {}", exit_description(*.exit_code))]
    Invocation {
        /// Exit code, or `None` when a signal ended the process
        exit_code: Option<i32>,
        /// Captured standard error
        stderr: String,
    },

    /// The process ran past its timeout and was killed.
    #[error("timed out after {}s", .after.as_secs())]
    Timeout {
        /// The timeout that elapsed
        after: Duration,
    },

    /// The run was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// The process exited 0 without writing its output file.
    #[error("compiler reported success but did not write the output file")]
    MissingOutput,
}

fn exit_description(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

impl JobFailure {
    /// Compiler diagnostics, falling back to the failure message.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Invocation { stderr, .. } if !stderr.trim().is_empty() => stderr.clone(),
            other => other.to_string(),
        }
    }

    /// Exit code of a process that exited on its own.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Invocation { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

/// Executes an invocation to completion.
///
/// Implementations must return [`JobFailure::Timeout`] once `timeout` elapses
/// and [`JobFailure::Cancelled`] soon after `cancel` fires, leaving no process
/// behind in either case.
pub trait JobRunner: Send + Sync {
    /// Runs the invocation and waits for it.
    fn run(
        &self,
        invocation: &InvocationDescriptor,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<ProcessOutput, JobFailure>;
}

/// Runs invocations as child processes.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    poll_interval: Duration,
}

impl ProcessRunner {
    /// Creates a runner polling child processes every 50ms.
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
        }
    }

    /// Sets how often the runner checks on its child.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRunner for ProcessRunner {
    fn run(
        &self,
        invocation: &InvocationDescriptor,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<ProcessOutput, JobFailure> {
        let program = invocation.program().display().to_string();
        let mut command = invocation.to_command();
        // A group of its own keeps the terminal's SIGINT away from the compiler and
        // lets a kill reach every helper process a wrapper script starts.
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut command, 0);
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| JobFailure::Spawn {
                program: program.clone(),
                message: e.to_string(),
            })?;
        debug!("Started {} (pid {})", program, child.id());

        // Drain both pipes so a chatty compiler never blocks on a full buffer.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let started = Instant::now();

        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    if !status.success() && cancel.is_cancelled() {
                        kill_group(&child);
                        return Err(JobFailure::Cancelled);
                    }
                    let stdout = collect(stdout);
                    let stderr = collect(stderr);
                    if status.success() {
                        return Ok(ProcessOutput { stdout, stderr });
                    }
                    return Err(JobFailure::Invocation {
                        exit_code: status.code(),
                        stderr,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    terminate(&mut child);
                    return Err(JobFailure::Spawn {
                        program,
                        message: e.to_string(),
                    });
                }
            }

            if cancel.is_cancelled() {
                terminate(&mut child);
                return Err(JobFailure::Cancelled);
            }
            if started.elapsed() >= timeout {
                terminate(&mut child);
                return Err(JobFailure::Timeout { after: timeout });
            }

            thread::sleep(self.poll_interval);
        }
    }
}

/// Kills the child together with its process group and reaps it.
fn terminate(child: &mut Child) {
    kill_group(child);
    let _ = child.kill();
    let _ = child.wait();
}

/// Sends SIGKILL to the process group the child leads.
#[cfg(unix)]
fn kill_group(child: &Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(pgid) = i32::try_from(child.id()) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        // ESRCH: the group has already exited
        debug!("Could not signal process group {}: {}", pgid, e);
    }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}

fn drain<R: Read + Send + 'static>(source: Option<R>) -> Option<JoinHandle<String>> {
    source.map(|mut reader| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_failure_diagnostic() {
        let failure = JobFailure::Invocation {
            exit_code: Some(1),
            stderr: "ERROR: Parser error in line 3\n".to_string(),
        };
        assert_eq!(failure.diagnostic(), "ERROR: Parser error in line 3\n");
        assert_eq!(failure.exit_code(), Some(1));

        let quiet = JobFailure::Invocation {
            exit_code: None,
            stderr: String::new(),
        };
        assert_eq!(quiet.diagnostic(), "compiler exited with a signal");

        let timeout = JobFailure::Timeout {
            after: Duration::from_secs(600),
        };
        assert_eq!(timeout.diagnostic(), "timed out after 600s");
        assert_eq!(timeout.exit_code(), None);
    }
}
