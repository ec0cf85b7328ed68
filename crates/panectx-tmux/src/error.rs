//! Error types for the tmux boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TmuxError {
    #[error("tmux command failed: {0}")]
    CommandFailed(String),

    #[error("tmux command timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("tmux output exceeded {limit} bytes")]
    OutputTooLarge { limit: usize },

    #[error("failed to parse tmux output line {line_num}: {detail}")]
    ParseError { line_num: usize, detail: String },

    #[error("tmux io error: {0}")]
    Io(#[from] std::io::Error),
}
