//! Out-of-process execution of the firewall primitive
//!
//! [`Executor`] is the single narrow seam between the bridge and the OS
//! firewall. [`ProcessExecutor`] is the production implementation; tests
//! substitute fakes (see `core::test_helpers`).
//!
//! # Process lifetime
//!
//! - stdin is `/dev/null`; nothing is streamed to the child
//! - stdout and stderr are piped and drained concurrently until exit
//! - the child is spawned with `kill_on_drop`, so dropping the future
//!   (e.g. on an external timeout) terminates it and tokio reaps it
//! - no retries and no internal timeout
//!
//! # Concurrency
//!
//! At most `max_concurrent` invocations run at once (a tokio `Semaphore`,
//! clamped to `1..=Semaphore::MAX_PERMITS`).
//! This bounds process count only: two concurrent mutating invocations still
//! race at the OS firewall, and ordering between them is the caller's concern.

use crate::core::error::{Error, Result};
use crate::core::invocation::Invocation;
use std::future::Future;
use std::process::Stdio;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error};

/// Raw output of one primitive invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationResult {
    /// `None` when the child was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl InvocationResult {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Non-zero (or missing) exit code, or anything on stderr
    pub fn signals_failure(&self) -> bool {
        self.exit_code != Some(0) || !self.stderr.is_empty()
    }
}

/// Runs primitive invocations
pub trait Executor: Send + Sync {
    /// Runs `invocation` to completion.
    ///
    /// # Errors
    ///
    /// Returns `Error::Execution` if the primitive cannot be started, or
    /// `Error::Elevation` if elevation was requested but is unavailable.
    fn execute(
        &self,
        invocation: &Invocation,
    ) -> impl Future<Output = Result<InvocationResult>> + Send;
}

/// Spawns the primitive as a child process per invocation
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    /// Arguments placed before the invocation argv (e.g. a script path)
    prefix_args: Vec<String>,
    elevate: bool,
    permits: Arc<Semaphore>,
}

impl ProcessExecutor {
    pub fn new(prefix_args: Vec<String>, elevate: bool, max_concurrent: usize) -> Self {
        Self {
            prefix_args,
            elevate,
            permits: Arc::new(Semaphore::new(max_concurrent.clamp(1, Semaphore::MAX_PERMITS))),
        }
    }

    fn full_args(&self, invocation: &Invocation) -> Vec<String> {
        self.prefix_args
            .iter()
            .chain(&invocation.argv)
            .cloned()
            .collect()
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new(Vec::new(), false, 1)
    }
}

impl Executor for ProcessExecutor {
    async fn execute(&self, invocation: &Invocation) -> Result<InvocationResult> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| Error::Execution(format!("executor closed: {e}")))?;

        let args = self.full_args(invocation);
        debug!(program = %invocation.program, ?args, "Spawning firewall primitive");

        let child = crate::elevation::create_primitive_command(
            &invocation.program,
            &args,
            self.elevate,
        )?
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            error!("Failed to spawn {}: {e}", invocation.program);
            Error::Execution(e.to_string())
        })?;

        let output = child.wait_with_output().await?;

        debug!(
            exit_code = ?output.status.code(),
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "Firewall primitive exited"
        );

        Ok(InvocationResult {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
