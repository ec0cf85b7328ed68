//! "Has a pull request been opened for this branch?"

use std::path::Path;

use async_trait::async_trait;
use panectx_core::normalized_non_empty;

use crate::error::GitError;
use crate::exec::{ExecOptions, run_command};

#[async_trait]
pub trait PrCreatedResolver: Send + Sync {
    async fn pr_created(&self, repo_root: Option<&str>, branch: Option<&str>) -> Option<bool>;
}

/// Asks the GitHub CLI for any PR (open, closed or merged) whose head is
/// `branch`.
#[derive(Debug, Clone)]
pub struct GhPrCreatedResolver {
    gh_bin: String,
    opts: ExecOptions,
}

impl GhPrCreatedResolver {
    pub fn new(gh_bin: impl Into<String>) -> Self {
        Self {
            gh_bin: gh_bin.into(),
            opts: ExecOptions::default().with_timeout(std::time::Duration::from_secs(5)),
        }
    }
}

impl Default for GhPrCreatedResolver {
    fn default() -> Self {
        Self::new("gh")
    }
}

#[async_trait]
impl PrCreatedResolver for GhPrCreatedResolver {
    async fn pr_created(&self, repo_root: Option<&str>, branch: Option<&str>) -> Option<bool> {
        let repo_root = normalized_non_empty(repo_root)?;
        let branch = branch.map(str::trim).filter(|b| !b.is_empty())?;
        let args = [
            "pr", "list", "--head", branch, "--state", "all", "--json", "number", "--limit", "1",
        ];
        let result = run_command(&self.gh_bin, &args, Some(Path::new(repo_root)), &self.opts)
            .await
            .and_then(|stdout| parse_pr_list(&self.gh_bin, &stdout));
        match result {
            Ok(created) => Some(created),
            Err(e) => {
                tracing::debug!(repo_root, branch, error = %e, "pr lookup failed");
                None
            }
        }
    }
}

fn parse_pr_list(program: &str, stdout: &str) -> Result<bool, GitError> {
    let prs: Vec<serde_json::Value> =
        serde_json::from_str(stdout.trim()).map_err(|e| GitError::Parse {
            program: program.to_string(),
            detail: e.to_string(),
        })?;
    Ok(!prs.is_empty())
}
