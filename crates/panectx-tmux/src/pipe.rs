//! Capture-pipe attachment via `tmux pipe-pane`.
//!
//! Each pane's raw output is appended to a per-pane log file. Ownership is
//! asserted by a pane-scoped user option (the tag, `"1"` when we attached).
//! The flow for [`PipeManager::attach_pipe`]:
//!
//! 1. A pipe exists that we did not tag → report a conflict, run nothing.
//! 2. Tagged but detached (pane restarted), or a forced reattach of our own
//!    pipe → `pipe-pane` detach, then a fresh `pipe-pane -O` attach.
//! 3. Untagged and detached → `pipe-pane -o` (open only if absent).
//! 4. After a successful attach, write the tag if it is not already `"1"`.
//!    If the tag cannot be written the pipe is closed again and the attach
//!    reported as failed.
//!
//! Nothing is remembered between calls; the caller re-reads [`PipeState`]
//! from tmux every time.

use std::path::Path;

use panectx_core::{PIPE_TAG_OWNED, PipeAttachResult, PipeState};

use crate::executor::TmuxCommandRunner;

/// Pane user option carrying the ownership tag.
pub const DEFAULT_PIPE_TAG_OPTION: &str = "@panectx_pipe";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttachOptions {
    /// Detach and re-attach a pipe we already own.
    pub force_reattach: bool,
}

/// Shell-quote a string for safe embedding in a shell command.
///
/// Returns the string unchanged if it contains only safe characters
/// (alphanumeric, `-`, `_`, `.`, `/`, `%`); otherwise wraps it in single
/// quotes with internal single quotes escaped as `'\''`.
pub fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    if s.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | '%'))
    {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}

/// Shell command that appends the pane's raw output to `log_path`.
pub fn pipe_command(log_path: &Path) -> String {
    format!("cat >> {}", shell_quote(&log_path.to_string_lossy()))
}

/// Attaches and repairs per-pane capture pipes.
pub struct PipeManager<R> {
    runner: R,
    tag_option: String,
}

impl<R: TmuxCommandRunner> PipeManager<R> {
    pub fn new(runner: R) -> Self {
        Self::with_tag_option(runner, DEFAULT_PIPE_TAG_OPTION)
    }

    pub fn with_tag_option(runner: R, tag_option: impl Into<String>) -> Self {
        Self {
            runner,
            tag_option: tag_option.into(),
        }
    }

    /// Attach (or repair) the capture pipe for `pane_id`.
    ///
    /// Never fails: command errors become `{attached: false, conflict: false}`.
    pub async fn attach_pipe(
        &self,
        pane_id: &str,
        log_path: &Path,
        state: &PipeState,
        options: AttachOptions,
    ) -> PipeAttachResult {
        if state.is_foreign() {
            tracing::debug!(pane_id, tag = ?state.pipe_tag_value, "foreign pipe attached, leaving it alone");
            return PipeAttachResult::CONFLICT;
        }

        let owned = state.has_owned_tag();
        if owned && state.pane_pipe && !options.force_reattach {
            return PipeAttachResult::ATTACHED;
        }

        let command = pipe_command(log_path);
        let attach_args: [&str; 5] = if owned {
            // Tag survived but the redirection may not have; start clean.
            self.detach(pane_id).await;
            ["pipe-pane", "-O", "-t", pane_id, &command]
        } else {
            ["pipe-pane", "-o", "-t", pane_id, &command]
        };

        match self.runner.run(&attach_args).await {
            Ok(out) if out.success() => {}
            Ok(out) => {
                tracing::debug!(
                    pane_id,
                    exit_code = out.exit_code,
                    stderr = %out.stderr.trim(),
                    "pipe-pane attach failed"
                );
                return PipeAttachResult::FAILED;
            }
            Err(e) => {
                tracing::debug!(pane_id, error = %e, "pipe-pane attach failed");
                return PipeAttachResult::FAILED;
            }
        }

        // An untagged live pipe reads as foreign next tick, so a pipe we
        // cannot tag is closed again and the attach reported as failed.
        if !owned && !self.write_tag(pane_id).await {
            self.detach(pane_id).await;
            return PipeAttachResult::FAILED;
        }
        tracing::debug!(pane_id, log_path = %log_path.display(), "capture pipe attached");
        PipeAttachResult::ATTACHED
    }

    /// `pipe-pane -t <pane>` with no command closes the current pipe.
    async fn detach(&self, pane_id: &str) {
        match self.runner.run(&["pipe-pane", "-t", pane_id]).await {
            Ok(out) if out.success() => {}
            Ok(out) => {
                tracing::debug!(pane_id, exit_code = out.exit_code, "pipe-pane detach failed");
            }
            Err(e) => tracing::debug!(pane_id, error = %e, "pipe-pane detach failed"),
        }
    }

    async fn write_tag(&self, pane_id: &str) -> bool {
        let args: [&str; 6] = ["set-option", "-p", "-t", pane_id, &self.tag_option, PIPE_TAG_OWNED];
        match self.runner.run(&args).await {
            Ok(out) if out.success() => true,
            Ok(out) => {
                tracing::warn!(pane_id, exit_code = out.exit_code, "failed to write pipe tag");
                false
            }
            Err(e) => {
                tracing::warn!(pane_id, error = %e, "failed to write pipe tag");
                false
            }
        }
    }
}
