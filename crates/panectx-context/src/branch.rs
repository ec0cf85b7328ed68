//! Authoritative branch lookup, used when the worktree snapshot is not trusted.

use async_trait::async_trait;
use panectx_core::normalized_non_empty;

use crate::exec::{ExecOptions, run_command};

#[async_trait]
pub trait BranchResolver: Send + Sync {
    /// Branch checked out at `current_path`, or `None` when unknown.
    async fn branch(&self, current_path: Option<&str>) -> Option<String>;
}

/// `git -C <path> rev-parse --abbrev-ref HEAD`.
///
/// A detached HEAD reports no branch.
#[derive(Debug, Clone)]
pub struct GitBranchResolver {
    git_bin: String,
    opts: ExecOptions,
}

impl GitBranchResolver {
    pub fn new(git_bin: impl Into<String>) -> Self {
        Self {
            git_bin: git_bin.into(),
            opts: ExecOptions::default(),
        }
    }
}

impl Default for GitBranchResolver {
    fn default() -> Self {
        Self::new("git")
    }
}

#[async_trait]
impl BranchResolver for GitBranchResolver {
    async fn branch(&self, current_path: Option<&str>) -> Option<String> {
        let path = normalized_non_empty(current_path)?;
        match run_command(
            &self.git_bin,
            &["-C", path, "rev-parse", "--abbrev-ref", "HEAD"],
            None,
            &self.opts,
        )
        .await
        {
            Ok(stdout) => parse_branch(&stdout),
            Err(e) => {
                tracing::debug!(path, error = %e, "branch lookup failed");
                None
            }
        }
    }
}

fn parse_branch(stdout: &str) -> Option<String> {
    match stdout.trim() {
        "" | "HEAD" => None,
        branch => Some(branch.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_branch_variants() {
        assert_eq!(parse_branch("main\n"), Some("main".to_string()));
        assert_eq!(parse_branch("feature/x"), Some("feature/x".to_string()));
        assert_eq!(parse_branch("HEAD\n"), None);
        assert_eq!(parse_branch("  \n"), None);
    }

    #[tokio::test]
    async fn empty_path_skips_git() {
        let resolver = GitBranchResolver::new("/nonexistent/git-binary");
        assert_eq!(resolver.branch(None).await, None);
        assert_eq!(resolver.branch(Some("/")).await, None);
    }

    #[tokio::test]
    async fn missing_git_yields_none() {
        let resolver = GitBranchResolver::new("/nonexistent/git-binary");
        assert_eq!(resolver.branch(Some("/tmp")).await, None);
    }
}
