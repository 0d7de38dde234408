//! Process executor: run one compiled command under a wall-clock budget.
//!
//! stdout/stderr are buffered in full (backends emit bounded text reports). On timeout
//! the child's whole process group is killed and the child is reaped before returning.
//! Once the child exits, pipes held open by leftover descendants get a short grace
//! period; after that the output read so far is returned and the group is killed.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Notify;

use super::compiler::CompiledCommand;
use super::error::{DispatchError, DispatchResult};

/// How long output pipes may stay open after the backend exits (a detached
/// grandchild inheriting stdout) before the collected output is returned as-is.
const PIPE_GRACE: Duration = Duration::from_millis(500);

/// Outcome of a backend run that started and exited within budget.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// How the executor should launch a compiled command.
#[derive(Debug, Clone, Default)]
pub struct Launch<'a> {
    /// Interpreter placed before the compiled tokens (`python3 script.py ...`).
    pub interpreter: Option<&'a str>,
}

pub async fn execute(
    command: &CompiledCommand,
    launch: Launch<'_>,
    timeout: Duration,
) -> DispatchResult<ExecutionResult> {
    let mut cmd = match launch.interpreter {
        Some(interp) => {
            let mut c = Command::new(interp);
            c.args(command.tokens());
            c
        }
        None => {
            let mut c = Command::new(command.program());
            c.args(command.args());
            c
        }
    };
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let started = Instant::now();
    let mut child = cmd.spawn().map_err(|source| DispatchError::LaunchFailure {
        program: launch
            .interpreter
            .map(str::to_string)
            .unwrap_or_else(|| command.program().to_string()),
        source,
    })?;

    let pid = child.id();
    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    let exited = Notify::new();
    let wait = async {
        let status = child.wait().await;
        exited.notify_one();
        status
    };
    let reads = async {
        let drain_both = async {
            tokio::join!(drain(stdout_pipe, &mut stdout), drain(stderr_pipe, &mut stderr))
        };
        tokio::pin!(drain_both);
        tokio::select! {
            _ = &mut drain_both => false,
            _ = async {
                exited.notified().await;
                tokio::time::sleep(PIPE_GRACE).await;
            } => true,
        }
    };
    let outcome = tokio::time::timeout(timeout, async { tokio::join!(wait, reads) }).await;

    match outcome {
        Ok((status, pipes_held_open)) => {
            let status = status.map_err(|source| DispatchError::LaunchFailure {
                program: command.program().to_string(),
                source,
            })?;
            if pipes_held_open {
                log::debug!(
                    "output pipes still open {} ms after exit, killing leftovers: {}",
                    PIPE_GRACE.as_millis(),
                    command.display()
                );
                kill_group(pid);
            }
            Ok(ExecutionResult {
                exit_code: status.code(),
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
                elapsed: started.elapsed(),
            })
        }
        Err(_) => {
            log::warn!(
                "timeout after {}s, killing: {}",
                timeout.as_secs(),
                command.display()
            );
            kill_group(pid);
            if let Err(e) = child.kill().await {
                log::debug!("kill after timeout: {e}");
            }
            Err(DispatchError::ExecutionTimeout { timeout })
        }
    }
}

/// Append everything readable from `pipe` to `buf`. Cancel-safe: bytes read before
/// cancellation stay in `buf`.
async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>, buf: &mut Vec<u8>) {
    let Some(mut pipe) = pipe else {
        return;
    };
    let mut chunk = [0u8; 8192];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(e) => {
                log::debug!("backend pipe read failed: {e}");
                break;
            }
        }
    }
}

/// SIGKILL the process group led by `pid` (grandchildren included).
fn kill_group(pid: Option<u32>) {
    #[cfg(unix)]
    {
        // The child leads its own group (process_group(0)), so pgid == pid.
        if let Some(pid) = pid {
            unsafe {
                let _ = libc::killpg(pid as libc::pid_t, libc::SIGKILL);
            }
        }
    }
    #[cfg(not(unix))]
    let _ = pid;
}
