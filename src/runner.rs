//! External command execution.
//!
//! Every call to `netsh` goes through a [`CommandRunner`]. The production
//! implementation, [`Netsh`], spawns the process with a bounded timeout and
//! hides its console window on Windows. Tests substitute a mocked runner so
//! the parsers and the poll loop can be exercised without the real utility.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::WlanError;

/// Timeout for status and scan queries.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for `wlan connect`, which can take noticeably longer to return.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Upper bound on collecting output once the child has exited or been killed.
const PIPE_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Captured output of a command that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs the wireless-control utility with the given arguments.
pub trait CommandRunner {
    /// Run with `args`, failing with [`WlanError::CommandTimeout`] if the
    /// process has not exited within `timeout`.
    fn run(
        &self,
        args: &[&str],
        timeout: Duration,
    ) -> impl Future<Output = Result<CommandOutput, WlanError>> + Send;
}

/// Runs the system `netsh` utility.
#[derive(Debug, Clone)]
pub struct Netsh {
    program: String,
}

impl Default for Netsh {
    fn default() -> Self {
        Self::new()
    }
}

impl Netsh {
    pub fn new() -> Self {
        Self::with_program("netsh")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl CommandRunner for Netsh {
    async fn run(&self, args: &[&str], timeout: Duration) -> Result<CommandOutput, WlanError> {
        let command = command_line(&self.program, args);
        debug!(%command, ?timeout, "Running command");

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        let mut child = cmd.spawn().map_err(|source| WlanError::Spawn {
            command: command.clone(),
            source,
        })?;

        // Drain both pipes while waiting so a chatty child cannot block on a
        // full pipe, and so output written before a timeout is kept.
        let stdout_task = tokio::spawn(read_pipe(child.stdout.take()));
        let stderr_task = tokio::spawn(read_pipe(child.stderr.take()));

        let status = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => Some(status.map_err(|source| WlanError::Spawn {
                command: command.clone(),
                source,
            })?),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    debug!(%command, error = %e, "Failed to kill timed-out command");
                }
                None
            }
        };

        let stdout = drain(stdout_task).await;
        let stderr = drain(stderr_task).await;

        let Some(status) = status else {
            return Err(WlanError::CommandTimeout {
                command,
                timeout,
                stderr,
            });
        };

        if !status.success() {
            return Err(WlanError::CommandFailed {
                command,
                code: status.code(),
                stdout,
                stderr,
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

async fn read_pipe<P: AsyncRead + Unpin>(pipe: Option<P>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        // A read error only truncates the capture
        let _ = pipe.read_to_end(&mut buf).await;
    }
    buf
}

/// Collect a pipe reader. A grandchild that inherited the pipe can keep it
/// open after the child is gone, so the wait is bounded.
async fn drain(task: JoinHandle<Vec<u8>>) -> String {
    match tokio::time::timeout(PIPE_DRAIN_TIMEOUT, task).await {
        Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
        _ => String::new(),
    }
}

/// Render a command line for logs and error messages.
pub fn command_line(program: &str, args: &[&str]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_joins_arguments() {
        assert_eq!(
            command_line("netsh", &["wlan", "show", "interfaces"]),
            "netsh wlan show interfaces"
        );
        assert_eq!(command_line("netsh", &[]), "netsh");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout_on_success() {
        let runner = Netsh::with_program("echo");
        let output = runner.run(&["hello"], DEFAULT_TIMEOUT).await.unwrap();
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_command_failed() {
        let runner = Netsh::with_program("false");
        let err = runner.run(&[], DEFAULT_TIMEOUT).await.unwrap_err();
        match err {
            WlanError::CommandFailed { command, code, .. } => {
                assert_eq!(command, "false");
                assert_eq!(code, Some(1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_command_times_out() {
        let runner = Netsh::with_program("sleep");
        let err = runner
            .run(&["5"], Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got {err:?}");
        assert!(err.to_string().contains("sleep 5"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_keeps_stderr_written_so_far() {
        let runner = Netsh::with_program("sh");
        let err = runner
            .run(&["-c", "echo 'interface is busy' >&2; exec sleep 5"], Duration::from_millis(500))
            .await
            .unwrap_err();
        match err {
            WlanError::CommandTimeout { stderr, timeout, .. } => {
                assert_eq!(stderr.trim(), "interface is busy");
                assert_eq!(timeout, Duration::from_millis(500));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failure_keeps_stdout_diagnostic() {
        let runner = Netsh::with_program("sh");
        let err = runner
            .run(&["-c", "echo 'There is no profile assigned.'; exit 1"], DEFAULT_TIMEOUT)
            .await
            .unwrap_err();
        assert!(err.to_string().ends_with("exit code 1: There is no profile assigned."));
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let runner = Netsh::with_program("wlan-keeper-no-such-program");
        let err = runner.run(&["wlan"], DEFAULT_TIMEOUT).await.unwrap_err();
        assert!(matches!(err, WlanError::Spawn { .. }), "got {err:?}");
    }
}
