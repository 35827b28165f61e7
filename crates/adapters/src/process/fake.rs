// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake process runner for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{display_command, ChildHandle, ProcessError, ProcessRunner, ProcessSignal, RunOutput};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Recorded runner call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessCall {
    Run { argv: Vec<String> },
    Spawn { argv: Vec<String> },
}

#[derive(Default)]
struct FakeRunnerState {
    /// Scripted outputs keyed by the joined argv. Each key holds a queue so
    /// repeated invocations can observe changing results (e.g. boot polls).
    responses: HashMap<String, VecDeque<Result<RunOutput, ProcessError>>>,
    calls: Vec<ProcessCall>,
    spawned: Vec<Arc<FakeChild>>,
    next_pid: u32,
}

/// Fake process runner with scripted outputs and recorded calls.
#[derive(Clone)]
pub struct FakeProcessRunner {
    inner: Arc<Mutex<FakeRunnerState>>,
}

impl Default for FakeProcessRunner {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeRunnerState {
                next_pid: 40_000,
                ..FakeRunnerState::default()
            })),
        }
    }
}

impl FakeProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful stdout response for an exact argv.
    pub fn script_stdout(&self, argv: &[&str], stdout: &str) {
        self.script(argv, Ok(RunOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: 0,
        }));
    }

    /// Queue an arbitrary response for an exact argv.
    pub fn script(&self, argv: &[&str], response: Result<RunOutput, ProcessError>) {
        let key = argv.join(" ");
        self.inner
            .lock()
            .responses
            .entry(key)
            .or_default()
            .push_back(response);
    }

    /// All recorded calls.
    pub fn calls(&self) -> Vec<ProcessCall> {
        self.inner.lock().calls.clone()
    }

    /// Joined argvs of recorded `Run` calls, for compact assertions.
    pub fn run_commands(&self) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                ProcessCall::Run { argv } => Some(argv.join(" ")),
                ProcessCall::Spawn { .. } => None,
            })
            .collect()
    }

    /// Children handed out by `spawn`, in order.
    pub fn spawned(&self) -> Vec<Arc<FakeChild>> {
        self.inner.lock().spawned.clone()
    }
}

#[async_trait]
impl ProcessRunner for FakeProcessRunner {
    async fn run(
        &self,
        argv: &[String],
        _env: &[(String, String)],
        _timeout: Duration,
    ) -> Result<RunOutput, ProcessError> {
        let key = display_command(argv);
        let mut inner = self.inner.lock();
        inner.calls.push(ProcessCall::Run { argv: argv.to_vec() });
        match inner.responses.get_mut(&key).and_then(VecDeque::pop_front) {
            Some(response) => response,
            // Unscripted commands succeed with empty output.
            None => Ok(RunOutput::default()),
        }
    }

    async fn spawn(
        &self,
        argv: &[String],
        _env: &[(String, String)],
        _cwd: Option<&std::path::Path>,
    ) -> Result<Arc<dyn ChildHandle>, ProcessError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProcessCall::Spawn { argv: argv.to_vec() });
        inner.next_pid += 1;
        let child = Arc::new(FakeChild::new(inner.next_pid));
        inner.spawned.push(Arc::clone(&child));
        Ok(child)
    }
}

struct FakeChildState {
    signals: Vec<ProcessSignal>,
    exit_code: Option<i32>,
    exited: bool,
}

/// Controllable child handle handed out by [`FakeProcessRunner`].
pub struct FakeChild {
    pid: u32,
    state: Mutex<FakeChildState>,
    exit_notify: Notify,
}

impl FakeChild {
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            state: Mutex::new(FakeChildState {
                signals: Vec::new(),
                exit_code: None,
                exited: false,
            }),
            exit_notify: Notify::new(),
        }
    }

    /// Signals delivered to this child, in order.
    pub fn signals(&self) -> Vec<ProcessSignal> {
        self.state.lock().signals.clone()
    }

    /// Mark the child exited, waking any waiters.
    pub fn set_exit(&self, code: Option<i32>) {
        let mut state = self.state.lock();
        state.exit_code = code;
        state.exited = true;
        drop(state);
        self.exit_notify.notify_waiters();
    }

    pub fn has_exited(&self) -> bool {
        self.state.lock().exited
    }
}

#[async_trait]
impl ChildHandle for FakeChild {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn signal(&self, signal: ProcessSignal) -> Result<(), ProcessError> {
        self.state.lock().signals.push(signal);
        Ok(())
    }

    async fn wait(&self) -> Option<i32> {
        loop {
            let notified = self.exit_notify.notified();
            {
                let state = self.state.lock();
                if state.exited {
                    return state.exit_code;
                }
            }
            notified.await;
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
