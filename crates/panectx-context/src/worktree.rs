//! Fast worktree-status lookups.
//!
//! [`GitWorktreeSnapshot`] keeps an in-memory table built from
//! `git worktree list --porcelain` plus per-worktree dirty/merged checks.
//! Lookups only read the table, so they are cheap and may be stale; the
//! context resolver validates every hit against the canonical repo root.

use std::collections::HashSet;

use async_trait::async_trait;
use panectx_core::{ResolvedWorktreeStatus, is_path_prefix, normalize_path, normalized_non_empty};
use tokio::sync::RwLock;

use crate::error::GitError;
use crate::exec::{ExecOptions, run_command, run_command_status};

#[async_trait]
pub trait WorktreeStatusResolver: Send + Sync {
    /// Snapshot for the worktree containing `current_path`, if known.
    async fn status(
        &self,
        current_path: Option<&str>,
    ) -> Result<Option<ResolvedWorktreeStatus>, GitError>;
}

/// One record of `git worktree list --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorktreeRecord {
    pub path: String,
    /// Short branch name (`refs/heads/` stripped); `None` when detached.
    pub branch: Option<String>,
    pub bare: bool,
    pub locked: bool,
    pub lock_reason: Option<String>,
}

/// Parse `git worktree list --porcelain`. Records are separated by blank
/// lines; unknown attributes are ignored.
pub fn parse_worktree_porcelain(output: &str) -> Vec<WorktreeRecord> {
    let mut records = Vec::new();
    let mut current: Option<WorktreeRecord> = None;

    for line in output.lines() {
        if line.trim().is_empty() {
            records.extend(current.take());
            continue;
        }
        if let Some(path) = line.strip_prefix("worktree ") {
            records.extend(current.take());
            current = Some(WorktreeRecord {
                path: path.to_string(),
                ..Default::default()
            });
            continue;
        }
        let Some(record) = current.as_mut() else {
            continue;
        };
        if let Some(branch) = line.strip_prefix("branch ") {
            let short = branch.strip_prefix("refs/heads/").unwrap_or(branch);
            record.branch = Some(short.to_string());
        } else if line == "bare" {
            record.bare = true;
        } else if line == "locked" {
            record.locked = true;
        } else if let Some(reason) = line.strip_prefix("locked ") {
            record.locked = true;
            let reason = reason.trim();
            if !reason.is_empty() {
                record.lock_reason = Some(reason.to_string());
            }
        }
    }
    records.extend(current);
    records
}

/// Split a lock reason of the form `owner: reason` into its parts.
///
/// The owner must be a single token; anything else is kept as a plain
/// reason with no owner.
pub fn split_lock_reason(reason: &str) -> (Option<String>, Option<String>) {
    if let Some((owner, rest)) = reason.split_once(':') {
        let owner = owner.trim();
        if !owner.is_empty() && !owner.contains(char::is_whitespace) {
            let rest = rest.trim();
            let rest = (!rest.is_empty()).then(|| rest.to_string());
            return (Some(owner.to_string()), rest);
        }
    }
    let reason = reason.trim();
    (None, (!reason.is_empty()).then(|| reason.to_string()))
}

/// In-memory worktree table refreshed from git.
pub struct GitWorktreeSnapshot {
    git_bin: String,
    opts: ExecOptions,
    entries: RwLock<Vec<ResolvedWorktreeStatus>>,
}

impl GitWorktreeSnapshot {
    pub fn new(git_bin: impl Into<String>) -> Self {
        Self {
            git_bin: git_bin.into(),
            opts: ExecOptions::default(),
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Replace the table with the given entries.
    pub async fn replace(&self, entries: Vec<ResolvedWorktreeStatus>) {
        *self.entries.write().await = entries;
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Rebuild the table from the worktrees of every repository in
    /// `repo_dirs`. Repositories that fail to list are skipped.
    ///
    /// Returns the number of worktrees now in the table.
    pub async fn refresh<'a>(&self, repo_dirs: impl IntoIterator<Item = &'a str>) -> usize {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for dir in repo_dirs {
            let Some(dir) = normalized_non_empty(Some(dir)) else {
                continue;
            };
            match self.collect_repo(dir).await {
                Ok(statuses) => {
                    for status in statuses {
                        let key = status.worktree_path.clone().unwrap_or_default();
                        if seen.insert(key) {
                            entries.push(status);
                        }
                    }
                }
                Err(e) => tracing::debug!(repo = dir, error = %e, "worktree list failed"),
            }
        }
        let count = entries.len();
        self.replace(entries).await;
        count
    }

    async fn collect_repo(&self, dir: &str) -> Result<Vec<ResolvedWorktreeStatus>, GitError> {
        let stdout = run_command(
            &self.git_bin,
            &["-C", dir, "worktree", "list", "--porcelain"],
            None,
            &self.opts,
        )
        .await?;
        let records = parse_worktree_porcelain(&stdout);

        // The first non-bare worktree is the main checkout; its branch is
        // the merge base for the others.
        let main = records.iter().find(|r| !r.bare);
        let base = main.and_then(|r| r.branch.clone());
        let main_path = main.map(|r| r.path.clone());

        let mut statuses = Vec::with_capacity(records.len());
        for record in records.iter().filter(|r| !r.bare) {
            let is_main = main_path.as_deref() == Some(record.path.as_str());
            let merged = match (&record.branch, &base, is_main) {
                (Some(branch), Some(base), false) => self.is_merged(dir, branch, base).await,
                _ => None,
            };
            let (lock_owner, lock_reason) = match record.lock_reason.as_deref() {
                Some(reason) => split_lock_reason(reason),
                None => (None, None),
            };
            let path = normalize_path(&record.path).to_string();
            statuses.push(ResolvedWorktreeStatus {
                repo_root: Some(path.clone()),
                worktree_path: Some(path),
                branch: record.branch.clone(),
                worktree_dirty: self.is_dirty(&record.path).await,
                worktree_locked: Some(record.locked),
                worktree_lock_owner: lock_owner,
                worktree_lock_reason: lock_reason,
                worktree_merged: merged,
            });
        }
        Ok(statuses)
    }

    async fn is_dirty(&self, worktree: &str) -> Option<bool> {
        match run_command(
            &self.git_bin,
            &["-C", worktree, "status", "--porcelain"],
            None,
            &self.opts,
        )
        .await
        {
            Ok(stdout) => Some(!stdout.trim().is_empty()),
            Err(e) => {
                tracing::debug!(worktree, error = %e, "git status failed");
                None
            }
        }
    }

    /// `git merge-base --is-ancestor`: exit 0 = merged, 1 = not merged.
    async fn is_merged(&self, dir: &str, branch: &str, base: &str) -> Option<bool> {
        let args = ["-C", dir, "merge-base", "--is-ancestor", branch, base];
        match run_command_status(&self.git_bin, &args, None, &self.opts).await {
            Ok(out) if out.code == 0 => Some(true),
            Ok(out) if out.code == 1 => Some(false),
            Ok(out) => {
                tracing::debug!(branch, base, code = out.code, "merge-base check inconclusive");
                None
            }
            Err(e) => {
                tracing::debug!(branch, base, error = %e, "merge-base check failed");
                None
            }
        }
    }
}

impl Default for GitWorktreeSnapshot {
    fn default() -> Self {
        Self::new("git")
    }
}

/// Entry whose worktree path is the deepest ancestor of (or equal to) `path`.
fn lookup<'a>(
    entries: &'a [ResolvedWorktreeStatus],
    path: &str,
) -> Option<&'a ResolvedWorktreeStatus> {
    entries
        .iter()
        .filter_map(|e| {
            let wt = e.worktree_path.as_deref()?;
            is_path_prefix(wt, path).then_some((normalize_path(wt).len(), e))
        })
        .max_by_key(|(len, _)| *len)
        .map(|(_, e)| e)
}

#[async_trait]
impl WorktreeStatusResolver for GitWorktreeSnapshot {
    async fn status(
        &self,
        current_path: Option<&str>,
    ) -> Result<Option<ResolvedWorktreeStatus>, GitError> {
        let Some(path) = normalized_non_empty(current_path) else {
            return Ok(None);
        };
        let entries = self.entries.read().await;
        Ok(lookup(&entries, path).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PORCELAIN: &str = "\
worktree /repo
HEAD 1111111111111111111111111111111111111111
branch refs/heads/main

worktree /repo/.worktree/feature-a
HEAD 2222222222222222222222222222222222222222
branch refs/heads/feature/a
locked agent-7: running task 12

worktree /repo/.worktree/detached
HEAD 3333333333333333333333333333333333333333
detached
locked
prunable gitdir file points to non-existent location
";

    fn status(path: &str, branch: &str) -> ResolvedWorktreeStatus {
        ResolvedWorktreeStatus {
            repo_root: Some(path.to_string()),
            worktree_path: Some(path.to_string()),
            branch: Some(branch.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn parse_porcelain_records() {
        let records = parse_worktree_porcelain(PORCELAIN);
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].path, "/repo");
        assert_eq!(records[0].branch.as_deref(), Some("main"));
        assert!(!records[0].locked);

        assert_eq!(records[1].branch.as_deref(), Some("feature/a"));
        assert!(records[1].locked);
        assert_eq!(records[1].lock_reason.as_deref(), Some("agent-7: running task 12"));

        assert_eq!(records[2].branch, None);
        assert!(records[2].locked);
        assert_eq!(records[2].lock_reason, None);
    }

    #[test]
    fn parse_porcelain_bare_and_no_trailing_blank() {
        let output = "worktree /srv/repo.git\nbare\n\nworktree /srv/wt\nbranch refs/heads/dev";
        let records = parse_worktree_porcelain(output);
        assert_eq!(records.len(), 2);
        assert!(records[0].bare);
        assert_eq!(records[1].branch.as_deref(), Some("dev"));
    }

    #[test]
    fn lock_reason_owner_split() {
        assert_eq!(
            split_lock_reason("agent-7: running task 12"),
            (Some("agent-7".into()), Some("running task 12".into()))
        );
        assert_eq!(split_lock_reason("owner:"), (Some("owner".into()), None));
        assert_eq!(
            split_lock_reason("waiting on review: later"),
            (None, Some("waiting on review: later".into()))
        );
        assert_eq!(split_lock_reason("on usb drive"), (None, Some("on usb drive".into())));
        assert_eq!(split_lock_reason("  "), (None, None));
    }

    #[test]
    fn lookup_prefers_deepest_worktree() {
        let entries = vec![
            status("/repo", "main"),
            status("/repo/.worktree/feature-a", "feature/a"),
        ];
        let hit = lookup(&entries, "/repo/.worktree/feature-a/src").expect("hit");
        assert_eq!(hit.branch.as_deref(), Some("feature/a"));

        let hit = lookup(&entries, "/repo/src").expect("hit");
        assert_eq!(hit.branch.as_deref(), Some("main"));

        assert!(lookup(&entries, "/repository").is_none());
        assert!(lookup(&entries, "/elsewhere").is_none());
    }

    #[tokio::test]
    async fn status_reads_replaced_table() {
        let snapshot = GitWorktreeSnapshot::new("/nonexistent/git-binary");
        assert!(snapshot.is_empty().await);
        snapshot.replace(vec![status("/repo", "main")]).await;
        assert_eq!(snapshot.len().await, 1);

        let hit = snapshot.status(Some("/repo/")).await.expect("ok");
        assert_eq!(hit.and_then(|s| s.branch).as_deref(), Some("main"));
        assert_eq!(snapshot.status(None).await.expect("ok"), None);
        assert_eq!(snapshot.status(Some("/tmp")).await.expect("ok"), None);
    }

    #[tokio::test]
    async fn refresh_skips_failing_repos() {
        let snapshot = GitWorktreeSnapshot::new("/nonexistent/git-binary");
        snapshot.replace(vec![status("/old", "main")]).await;
        let count = snapshot.refresh(["/repo", "", "/"]).await;
        assert_eq!(count, 0);
        assert!(snapshot.is_empty().await);
    }
}
