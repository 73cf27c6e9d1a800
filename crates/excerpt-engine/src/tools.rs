//! External tool execution.
//!
//! The engine never links against the downloader or the encoder; it builds a
//! [`ToolInvocation`] and hands it to a [`ToolRunner`]. Production runs use
//! [`SystemToolRunner`], tests substitute a scripted runner.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// How long output is still collected after a timed out tool is killed.
const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// A fully specified external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Executable name or path.
    pub program: String,

    /// Arguments, in order.
    pub args: Vec<String>,
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Why an invocation did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("failed to wait on {program}: {source}")]
    Wait {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} timed out after {after:?}{}", diagnostics(stderr))]
    Timeout {
        program: String,
        after: Duration,

        /// Diagnostics the tool wrote before it was killed.
        stderr: String,
    },

    #[error("{program} exited with {}{}", exit_label(*code), diagnostics(stderr))]
    NonZero {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| format!("status {c}"))
}

fn diagnostics(stderr: &str) -> String {
    match stderr.trim() {
        "" => String::new(),
        text => format!(": {text}"),
    }
}

impl ToolError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether the binary itself could not be found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.arg(path.to_string_lossy().into_owned())
    }

    /// Value following `flag`, if present.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

/// Seam between the pipeline and the processes it spawns.
#[allow(async_fn_in_trait)]
pub trait ToolRunner {
    /// Run `invocation` to completion or until `timeout` elapses.
    async fn run(
        &self,
        invocation: &ToolInvocation,
        timeout: Duration,
    ) -> Result<ToolOutput, ToolError>;
}

/// Runs invocations as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemToolRunner;

impl ToolRunner for SystemToolRunner {
    async fn run(
        &self,
        invocation: &ToolInvocation,
        timeout: Duration,
    ) -> Result<ToolOutput, ToolError> {
        tracing::debug!(program = %invocation.program, args = ?invocation.args, "Running tool");
        let started = Instant::now();

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        // Drain both pipes while waiting so a chatty tool cannot block on a full pipe.
        let stdout_buf = PipeBuffer::default();
        let stderr_buf = PipeBuffer::default();
        let stdout_task = tokio::spawn(read_pipe(child.stdout.take(), stdout_buf.clone()));
        let stderr_task = tokio::spawn(read_pipe(child.stderr.take(), stderr_buf.clone()));

        let status = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(result) => result.map_err(|source| ToolError::Wait {
                program: invocation.program.clone(),
                source,
            })?,
            Err(_) => {
                if let Err(err) = child.kill().await {
                    tracing::warn!(
                        program = %invocation.program,
                        error = %err,
                        "Failed to kill timed out tool"
                    );
                }
                // Grandchildren may still hold the pipes open after the kill.
                let drained = tokio::time::timeout(DRAIN_GRACE, async {
                    stdout_task.await.ok();
                    stderr_task.await.ok();
                })
                .await;
                if drained.is_err() {
                    tracing::debug!(
                        program = %invocation.program,
                        "Output pipes still open after kill"
                    );
                }
                return Err(ToolError::Timeout {
                    program: invocation.program.clone(),
                    after: timeout,
                    stderr: stderr_buf.take(),
                });
            }
        };

        stdout_task.await.ok();
        stderr_task.await.ok();
        let stdout = stdout_buf.take();
        let stderr = stderr_buf.take();
        let elapsed = started.elapsed();

        if !status.success() {
            return Err(ToolError::NonZero {
                program: invocation.program.clone(),
                code: status.code(),
                stderr,
            });
        }

        tracing::debug!(
            program = %invocation.program,
            elapsed_ms = elapsed.as_millis(),
            "Tool finished"
        );
        Ok(ToolOutput {
            stdout,
            stderr,
            elapsed,
        })
    }
}

/// Output collected from one pipe, readable even if the reader is cut short.
#[derive(Debug, Clone, Default)]
struct PipeBuffer(Arc<Mutex<Vec<u8>>>);

impl PipeBuffer {
    fn push(&self, bytes: &[u8]) {
        if let Ok(mut buf) = self.0.lock() {
            buf.extend_from_slice(bytes);
        }
    }

    fn take(&self) -> String {
        match self.0.lock() {
            Ok(mut buf) => String::from_utf8_lossy(&std::mem::take(&mut *buf)).into_owned(),
            Err(_) => String::new(),
        }
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>, sink: PipeBuffer) {
    let Some(mut pipe) = pipe else {
        return;
    };
    let mut chunk = [0u8; 4096];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => sink.push(&chunk[..n]),
            Err(err) => {
                sink.push(format!("<failed to read tool output: {err}>").as_bytes());
                break;
            }
        }
    }
}
