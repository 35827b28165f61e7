// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tokio-backed process runner.

use super::{display_command, ChildHandle, ProcessError, ProcessRunner, ProcessSignal, RunOutput};
use crate::subprocess::run_with_timeout;
use async_trait::async_trait;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

/// Production process runner using `tokio::process`.
#[derive(Clone, Default)]
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(argv: &[String], env: &[(String, String)]) -> Result<Command, ProcessError> {
        let (program, args) = argv.split_first().ok_or_else(|| ProcessError::SpawnFailed {
            command: String::new(),
            detail: "empty argv".to_string(),
        })?;
        let mut cmd = Command::new(program);
        cmd.args(args);
        for (key, value) in env {
            cmd.env(key, value);
        }
        Ok(cmd)
    }
}

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(
        &self,
        argv: &[String],
        env: &[(String, String)],
        timeout: Duration,
    ) -> Result<RunOutput, ProcessError> {
        let command = display_command(argv);
        let cmd = Self::command(argv, env)?;
        let output = run_with_timeout(cmd, timeout, &command).await.map_err(|detail| {
            if detail.contains("timed out") {
                ProcessError::TimedOut {
                    command: command.clone(),
                    timeout_secs: timeout.as_secs(),
                }
            } else {
                ProcessError::SpawnFailed {
                    command: command.clone(),
                    detail,
                }
            }
        })?;
        Ok(RunOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    async fn spawn(
        &self,
        argv: &[String],
        env: &[(String, String)],
        cwd: Option<&Path>,
    ) -> Result<Arc<dyn ChildHandle>, ProcessError> {
        let command = display_command(argv);
        let mut cmd = Self::command(argv, env)?;
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        // Children outlive a dropped handle; the orchestrator owns their
        // shutdown via signals.
        cmd.kill_on_drop(false);
        let child = cmd.spawn().map_err(|e| ProcessError::SpawnFailed {
            command: command.clone(),
            detail: e.to_string(),
        })?;
        let pid = child.id().ok_or_else(|| ProcessError::SpawnFailed {
            command,
            detail: "child exited before pid was observed".to_string(),
        })?;
        Ok(Arc::new(SystemChild {
            pid,
            child: Mutex::new(child),
        }))
    }
}

/// Handle to a child spawned by [`SystemProcessRunner`].
struct SystemChild {
    pid: u32,
    child: Mutex<Child>,
}

#[async_trait]
impl ChildHandle for SystemChild {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn signal(&self, signal: ProcessSignal) -> Result<(), ProcessError> {
        let sig = match signal {
            ProcessSignal::Interrupt => Signal::SIGINT,
            ProcessSignal::Kill => Signal::SIGKILL,
        };
        match kill(Pid::from_raw(self.pid as i32), sig) {
            Ok(()) => Ok(()),
            // Already gone: signalling a dead child is not an error.
            Err(nix::errno::Errno::ESRCH) => Ok(()),
            Err(e) => Err(ProcessError::SignalFailed {
                pid: self.pid,
                detail: e.to_string(),
            }),
        }
    }

    async fn wait(&self) -> Option<i32> {
        let mut child = self.child.lock().await;
        match child.wait().await {
            Ok(status) => status.code(),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
#[path = "system_tests.rs"]
mod tests;
