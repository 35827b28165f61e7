// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process runner abstraction.
//!
//! Every external command the control plane issues goes through an injected
//! [`ProcessRunner`], so drivers are testable without the real `xcrun`,
//! `adb`, or `emulator` binaries on the host.

mod system;

pub use system::SystemProcessRunner;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeChild, FakeProcessRunner, ProcessCall};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors from subprocess execution
#[derive(Debug, Clone, Error)]
pub enum ProcessError {
    #[error("spawn failed: {command}: {detail}")]
    SpawnFailed { command: String, detail: String },
    #[error("{command} exited with status {exit_code}: {stderr}")]
    NonZeroExit {
        command: String,
        exit_code: i32,
        stderr: String,
    },
    #[error("{command} timed out after {timeout_secs}s")]
    TimedOut { command: String, timeout_secs: u64 },
    #[error("signal delivery to pid {pid} failed: {detail}")]
    SignalFailed { pid: u32, detail: String },
}

/// Signals the orchestrator delivers to spawned children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessSignal {
    /// SIGINT: polite stop, the default for emulators and instruments.
    Interrupt,
    /// SIGKILL: last resort.
    Kill,
}

/// Output of a completed subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Handle to a spawned long-running subprocess.
#[async_trait]
pub trait ChildHandle: Send + Sync {
    fn pid(&self) -> u32;

    /// Deliver a signal. Best effort: a child that already exited is not an
    /// error.
    fn signal(&self, signal: ProcessSignal) -> Result<(), ProcessError>;

    /// Wait for the child to exit, returning its status code if one exists.
    async fn wait(&self) -> Option<i32>;
}

impl std::fmt::Debug for dyn ChildHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildHandle").field("pid", &self.pid()).finish()
    }
}

/// Executes external commands.
#[async_trait]
pub trait ProcessRunner: Clone + Send + Sync + 'static {
    /// Run a command to completion, capturing output.
    ///
    /// Fails only on spawn failure or timeout; a non-zero exit status is
    /// reported through [`RunOutput::exit_code`]. Use [`run_checked`] when a
    /// non-zero exit should be an error.
    ///
    /// [`run_checked`]: ProcessRunner::run_checked
    async fn run(
        &self,
        argv: &[String],
        env: &[(String, String)],
        timeout: Duration,
    ) -> Result<RunOutput, ProcessError>;

    /// Spawn a long-running command, returning a handle for signals and exit
    /// observation.
    async fn spawn(
        &self,
        argv: &[String],
        env: &[(String, String)],
        cwd: Option<&std::path::Path>,
    ) -> Result<Arc<dyn ChildHandle>, ProcessError>;

    /// Run a command and require a zero exit status.
    ///
    /// Stderr noise beside a zero status is logged as a warning, not a
    /// failure.
    async fn run_checked(
        &self,
        argv: &[String],
        env: &[(String, String)],
        timeout: Duration,
    ) -> Result<RunOutput, ProcessError> {
        let output = self.run(argv, env, timeout).await?;
        if !output.success() {
            return Err(ProcessError::NonZeroExit {
                command: argv.join(" "),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        if !output.stderr.is_empty() {
            tracing::warn!(
                command = %argv.join(" "),
                stderr = %output.stderr.trim(),
                "command stderr (non-fatal)"
            );
        }
        Ok(output)
    }
}

/// Format an argv for error messages and logs.
pub(crate) fn display_command(argv: &[String]) -> String {
    argv.join(" ")
}
