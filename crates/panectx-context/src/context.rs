//! Pane context resolution.
//!
//! Precedence, fixed:
//!
//! 1. Worktree snapshot and canonical repo root are fetched concurrently.
//! 2. The snapshot is trusted only if its worktree path equals the canonical
//!    root (or no canonical root is available).
//! 3. Trusted: repo root, branch and worktree fields come from the snapshot.
//! 4. Otherwise: canonical root, branch from the branch resolver, and no
//!    worktree fields at all.
//! 5. PR status is looked up only for trusted `.worktree` paths.

use panectx_core::{PaneResolvedContext, ResolvedWorktreeStatus, is_agent_worktree_path, same_path};

use crate::branch::BranchResolver;
use crate::pr::PrCreatedResolver;
use crate::repo_root::RepoRootResolver;
use crate::worktree::WorktreeStatusResolver;

/// Injected collaborators for [`resolve_pane_context`]. Only the repo-root
/// resolver is mandatory; a missing optional resolver yields `None` fields.
#[derive(Clone, Copy)]
pub struct ContextResolvers<'a> {
    pub repo_root: &'a dyn RepoRootResolver,
    pub worktree_status: Option<&'a dyn WorktreeStatusResolver>,
    pub branch: Option<&'a dyn BranchResolver>,
    pub pr_created: Option<&'a dyn PrCreatedResolver>,
}

impl<'a> ContextResolvers<'a> {
    pub fn new(repo_root: &'a dyn RepoRootResolver) -> Self {
        Self {
            repo_root,
            worktree_status: None,
            branch: None,
            pr_created: None,
        }
    }
}

pub async fn resolve_pane_context(
    current_path: Option<&str>,
    resolvers: &ContextResolvers<'_>,
) -> PaneResolvedContext {
    let (snapshot, canonical_root) = tokio::join!(
        lookup_snapshot(resolvers.worktree_status, current_path),
        resolvers.repo_root.resolve(current_path),
    );

    let trusted = snapshot.filter(|s| snapshot_matches(s, canonical_root.as_deref()));

    let mut context = match trusted {
        Some(status) => PaneResolvedContext {
            repo_root: status.repo_root.or(canonical_root),
            branch: status.branch,
            worktree_path: status.worktree_path,
            worktree_dirty: status.worktree_dirty,
            worktree_locked: status.worktree_locked,
            worktree_lock_owner: status.worktree_lock_owner,
            worktree_lock_reason: status.worktree_lock_reason,
            worktree_merged: status.worktree_merged,
            worktree_pr_created: None,
        },
        None => {
            let branch = match resolvers.branch {
                Some(resolver) => resolver.branch(current_path).await,
                None => None,
            };
            PaneResolvedContext {
                repo_root: canonical_root,
                branch,
                ..Default::default()
            }
        }
    };

    let pr_eligible = context
        .worktree_path
        .as_deref()
        .is_some_and(is_agent_worktree_path);
    if pr_eligible && let Some(resolver) = resolvers.pr_created {
        context.worktree_pr_created = resolver
            .pr_created(context.repo_root.as_deref(), context.branch.as_deref())
            .await;
    }

    context
}

async fn lookup_snapshot(
    resolver: Option<&dyn WorktreeStatusResolver>,
    current_path: Option<&str>,
) -> Option<ResolvedWorktreeStatus> {
    match resolver?.status(current_path).await {
        Ok(status) => status,
        Err(e) => {
            tracing::debug!(path = ?current_path, error = %e, "worktree status unavailable");
            None
        }
    }
}

/// Trust the snapshot when it describes the canonical root, or when there is
/// no canonical root to check it against.
fn snapshot_matches(snapshot: &ResolvedWorktreeStatus, canonical_root: Option<&str>) -> bool {
    match canonical_root {
        None => true,
        Some(root) => snapshot
            .worktree_path
            .as_deref()
            .is_some_and(|wt| same_path(wt, root)),
    }
}
