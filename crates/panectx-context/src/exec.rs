//! Bounded execution of external commands (git, gh).
//!
//! Every invocation carries a timeout and an output cap. The child is killed
//! when either bound is hit; no partial output escapes unless the caller
//! explicitly allows stdout on a non-zero exit.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::GitError;

/// Bounds for one external command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOptions {
    pub timeout: Duration,
    /// Maximum bytes accepted on stdout (and on stderr).
    pub max_buffer: usize,
    /// Return stdout even when the command exits non-zero.
    pub allow_stdout_on_error: bool,
}

impl ExecOptions {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2_000);
    pub const DEFAULT_MAX_BUFFER: usize = 2 * 1024 * 1024;

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
            max_buffer: Self::DEFAULT_MAX_BUFFER,
            allow_stdout_on_error: false,
        }
    }
}

/// Exit code and decoded output of a finished command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Run `program args...` and return stdout.
///
/// A non-zero exit is `GitError::NonZeroExit` unless
/// `opts.allow_stdout_on_error` is set.
pub async fn run_command(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    opts: &ExecOptions,
) -> Result<String, GitError> {
    let output = run_command_status(program, args, cwd, opts).await?;
    if output.code != 0 && !opts.allow_stdout_on_error {
        return Err(GitError::NonZeroExit {
            program: program.to_string(),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        });
    }
    Ok(output.stdout)
}

/// Run `program args...` and return the exit code with output, whatever
/// the exit code.
pub async fn run_command_status(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    opts: &ExecOptions,
) -> Result<ExecOutput, GitError> {
    let mut cmd = tokio::process::Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|source| GitError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let limit = opts.max_buffer;
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let collect = async {
        // Readers are dropped as soon as they finish, so a child that keeps
        // writing past the cap sees a closed pipe instead of blocking.
        let (out, err) = tokio::try_join!(read_capped(stdout, limit), read_capped(stderr, limit))?;
        if out.len() > limit || err.len() > limit {
            let _ = child.start_kill();
            return Ok(None);
        }
        let status = child.wait().await?;
        Ok::<_, std::io::Error>(Some((status, out, err)))
    };

    let finished = match tokio::time::timeout(opts.timeout, collect).await {
        Ok(result) => result.map_err(|source| GitError::Spawn {
            program: program.to_string(),
            source,
        })?,
        Err(_) => {
            return Err(GitError::Timeout {
                program: program.to_string(),
                timeout_ms: opts.timeout.as_millis() as u64,
            });
        }
    };

    let Some((status, out, err)) = finished else {
        return Err(GitError::OutputTooLarge {
            program: program.to_string(),
            limit,
        });
    };

    Ok(ExecOutput {
        code: status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&out).into_owned(),
        stderr: String::from_utf8_lossy(&err).into_owned(),
    })
}

async fn read_capped<R: AsyncRead + Unpin>(
    reader: Option<R>,
    limit: usize,
) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(reader) = reader {
        reader.take(limit as u64 + 1).read_to_end(&mut buf).await?;
    }
    Ok(buf)
}
