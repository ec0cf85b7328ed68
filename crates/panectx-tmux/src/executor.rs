//! TmuxCommandRunner trait and TmuxExecutor (async subprocess wrapper).
//! The trait is the injection seam: tests substitute recording mocks.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TmuxError;

const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2_000);
const DEFAULT_MAX_OUTPUT: usize = 1024 * 1024; // 1 MiB

/// Exit code and captured output of one tmux invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes tmux commands.
///
/// A non-zero exit is reported through `CommandOutput::exit_code`, not as an
/// error; `Err` is reserved for spawn failures, timeouts and oversized output.
#[async_trait]
pub trait TmuxCommandRunner: Send + Sync {
    async fn run(&self, args: &[&str]) -> Result<CommandOutput, TmuxError>;
}

#[async_trait]
impl<T: TmuxCommandRunner + ?Sized> TmuxCommandRunner for &T {
    async fn run(&self, args: &[&str]) -> Result<CommandOutput, TmuxError> {
        (**self).run(args).await
    }
}

#[async_trait]
impl<T: TmuxCommandRunner + ?Sized> TmuxCommandRunner for Arc<T> {
    async fn run(&self, args: &[&str]) -> Result<CommandOutput, TmuxError> {
        (**self).run(args).await
    }
}

/// Run a command and return stdout, mapping a non-zero exit to
/// `TmuxError::CommandFailed`.
pub async fn run_checked(
    runner: &(impl TmuxCommandRunner + ?Sized),
    args: &[&str],
) -> Result<String, TmuxError> {
    let output = runner.run(args).await?;
    if !output.success() {
        return Err(TmuxError::CommandFailed(format!(
            "exit code {}: {}",
            output.exit_code,
            output.stderr.trim()
        )));
    }
    Ok(output.stdout)
}

/// Real tmux executor using `tokio::process::Command`.
///
/// Every invocation is bounded by `timeout` and `max_output`; the child is
/// killed when the timeout fires.
#[derive(Debug, Clone)]
pub struct TmuxExecutor {
    tmux_bin: String,
    socket_path: Option<String>,
    socket_name: Option<String>,
    timeout: Duration,
    max_output: usize,
}

impl TmuxExecutor {
    pub fn new(tmux_bin: impl Into<String>) -> Self {
        Self {
            tmux_bin: tmux_bin.into(),
            socket_path: None,
            socket_name: None,
            timeout: DEFAULT_TIMEOUT,
            max_output: DEFAULT_MAX_OUTPUT,
        }
    }

    #[must_use]
    pub fn with_socket_path(mut self, path: impl Into<String>) -> Self {
        self.socket_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_socket_name(mut self, name: impl Into<String>) -> Self {
        self.socket_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_output(mut self, max_output: usize) -> Self {
        self.max_output = max_output;
        self
    }
}

impl Default for TmuxExecutor {
    fn default() -> Self {
        Self::new("tmux")
    }
}

#[async_trait]
impl TmuxCommandRunner for TmuxExecutor {
    async fn run(&self, args: &[&str]) -> Result<CommandOutput, TmuxError> {
        let mut cmd = tokio::process::Command::new(&self.tmux_bin);
        // Socket path takes precedence over socket name
        if let Some(ref path) = self.socket_path {
            cmd.args(["-S", path]);
        } else if let Some(ref name) = self.socket_name {
            cmd.args(["-L", name]);
        }
        cmd.args(args).kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::debug!(?args, "tmux command timed out");
                return Err(TmuxError::Timeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                });
            }
        };

        if output.stdout.len() > self.max_output {
            return Err(TmuxError::OutputTooLarge {
                limit: self.max_output,
            });
        }

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Mock {
        exit_code: i32,
    }

    #[async_trait]
    impl TmuxCommandRunner for Mock {
        async fn run(&self, _args: &[&str]) -> Result<CommandOutput, TmuxError> {
            Ok(CommandOutput {
                exit_code: self.exit_code,
                stdout: "ok\n".to_string(),
                stderr: "no server running".to_string(),
            })
        }
    }

    #[test]
    fn default_executor() {
        let exec = TmuxExecutor::default();
        assert_eq!(exec.tmux_bin, "tmux");
        assert!(exec.socket_path.is_none());
        assert!(exec.socket_name.is_none());
        assert_eq!(exec.timeout, DEFAULT_TIMEOUT);
        assert_eq!(exec.max_output, DEFAULT_MAX_OUTPUT);
    }

    #[test]
    fn builder_options() {
        let exec = TmuxExecutor::default()
            .with_socket_path("/tmp/my.sock")
            .with_socket_name("myname")
            .with_timeout(Duration::from_millis(500))
            .with_max_output(64);
        assert_eq!(exec.socket_path, Some("/tmp/my.sock".to_string()));
        assert_eq!(exec.socket_name, Some("myname".to_string()));
        assert_eq!(exec.timeout, Duration::from_millis(500));
        assert_eq!(exec.max_output, 64);
    }

    #[tokio::test]
    async fn blanket_ref_and_arc_impls() {
        let mock = Mock { exit_code: 0 };
        let r: &Mock = &mock;
        assert_eq!(r.run(&[]).await.expect("ok").stdout, "ok\n");

        let shared = Arc::new(Mock { exit_code: 0 });
        assert!(shared.run(&[]).await.expect("ok").success());
    }

    #[tokio::test]
    async fn run_checked_maps_non_zero_exit() {
        let out = run_checked(&Mock { exit_code: 0 }, &["list-panes"])
            .await
            .expect("success");
        assert_eq!(out, "ok\n");

        let err = run_checked(&Mock { exit_code: 1 }, &["list-panes"])
            .await
            .unwrap_err();
        match err {
            TmuxError::CommandFailed(msg) => {
                assert!(msg.contains("exit code 1"), "msg was: {msg}");
                assert!(msg.contains("no server running"), "msg was: {msg}");
            }
            other => panic!("expected CommandFailed, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_binary_is_io_error() {
        let exec = TmuxExecutor::new("/nonexistent/tmux-binary");
        let err = exec.run(&["list-sessions"]).await.unwrap_err();
        assert!(matches!(err, TmuxError::Io(_)), "got: {err:?}");
    }
}
