//! Errors from external git/gh invocations.
//!
//! Resolvers log these and report `None`. Only the worktree-status trait
//! returns them, and the context resolver treats any error as "no snapshot".

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout_ms}ms")]
    Timeout { program: String, timeout_ms: u64 },

    #[error("{program} output exceeded {limit} bytes")]
    OutputTooLarge { program: String, limit: usize },

    #[error("{program} exited with code {code}: {stderr}")]
    NonZeroExit {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("unexpected output from {program}: {detail}")]
    Parse { program: String, detail: String },
}
