//! Execution sandbox.
//!
//! Runs submitted code in a child interpreter process with piped standard
//! streams and a wall-clock timeout. The code is materialized as a uniquely
//! named temporary script that is removed on every exit path, including
//! timeout and panic (the `NamedTempFile` guard deletes it on drop).
//!
//! Every failure class is folded into the returned [`ExecutionResult`]:
//! the caller's only branch condition is whether `stderr` is empty.

use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::SandboxConfig;

/// Synthesized stderr text for a forcibly terminated child.
/// Distinct from anything the interpreter itself prints.
pub const TIMEOUT_SENTINEL: &str = "[Error] Code execution timed out.";

/// Captured streams of one execution. Both fields are always present;
/// a non-empty `stderr` is the sole signal that something went wrong.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    /// Sandbox-level failure: empty stdout, sentinel stderr embedding the cause
    fn failure(cause: impl std::fmt::Display) -> Self {
        Self {
            stdout: String::new(),
            stderr: format!("[Error] {cause}"),
        }
    }

    fn timed_out() -> Self {
        Self {
            stdout: String::new(),
            stderr: TIMEOUT_SENTINEL.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        !self.stderr.is_empty()
    }
}

/// Runs code in a child interpreter process, one ephemeral script per call.
pub struct Sandbox {
    config: SandboxConfig,
}

impl Sandbox {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    /// Executes `code` with `stdin` fed to the child's standard input.
    ///
    /// Never fails: timeout and launch errors are returned as sentinel
    /// stderr text, and the child's own errors pass through verbatim.
    /// Exactly one script file is created and deleted per call.
    pub async fn execute(&self, code: &str, stdin: &str) -> ExecutionResult {
        let script = match self.write_script(code) {
            Ok(script) => script,
            Err(e) => return ExecutionResult::failure(e),
        };

        let result = match self.run_script(script.path(), stdin).await {
            Ok(result) => result,
            Err(e) => ExecutionResult::failure(e),
        };

        // `script` dropped here — the temp file is removed on all paths above
        result
    }

    fn write_script(&self, code: &str) -> std::io::Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("pytutor-").suffix(".py");

        let mut file = match &self.config.work_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(code.as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    async fn run_script(&self, path: &Path, stdin: &str) -> anyhow::Result<ExecutionResult> {
        let mut child = Command::new(&self.config.interpreter)
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Feed stdin from a separate task: a child that never reads its
        // input must not stall the wait below, and its early exit (broken
        // pipe) is not a sandbox failure.
        if let Some(mut child_stdin) = child.stdin.take() {
            let input = stdin.to_string();
            tokio::spawn(async move {
                let _ = child_stdin.write_all(input.as_bytes()).await;
                let _ = child_stdin.shutdown().await;
            });
        }

        let stdout_task = spawn_reader(child.stdout.take());
        let stderr_task = spawn_reader(child.stderr.take());

        let timeout = Duration::from_secs(self.config.timeout_seconds);
        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => {
                let status = status?;
                let stdout = String::from_utf8_lossy(&stdout_task.await??).into_owned();
                let stderr = String::from_utf8_lossy(&stderr_task.await??).into_owned();
                debug!(
                    exit = ?status.code(),
                    stdout_bytes = stdout.len(),
                    stderr_bytes = stderr.len(),
                    "child exited"
                );
                Ok(ExecutionResult { stdout, stderr })
            }
            Err(_) => {
                warn!(
                    timeout_seconds = self.config.timeout_seconds,
                    "execution timed out, killing child"
                );
                if let Err(e) = child.kill().await {
                    warn!("failed to kill timed-out child: {e}");
                }
                stdout_task.abort();
                stderr_task.abort();
                Ok(ExecutionResult::timed_out())
            }
        }
    }
}

/// Drains one child stream fully in the background so the child cannot
/// block on a full pipe while we wait for it to exit.
fn spawn_reader<R>(pipe: Option<R>) -> JoinHandle<std::io::Result<Vec<u8>>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf).await?;
        }
        Ok(buf)
    })
}
