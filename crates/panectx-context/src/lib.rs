//! panectx-context: resolves where a pane is.
//!
//! Every external effect sits behind a small trait so callers inject the
//! real git/gh-backed implementations or deterministic fakes:
//!
//! - [`RepoRootSource`] / [`RepoRootResolver`]: canonical repository root,
//!   with [`RepoRootCache`] as the bounded TTL-cached resolver.
//! - [`WorktreeStatusResolver`]: fast, possibly stale worktree snapshot.
//! - [`BranchResolver`]: authoritative branch lookup.
//! - [`PrCreatedResolver`]: whether a pull request exists for a branch.
//!
//! [`resolve_pane_context`] reconciles them into a `PaneResolvedContext`.

pub mod branch;
pub mod context;
pub mod error;
pub mod exec;
pub mod pr;
pub mod repo_root;
pub mod worktree;

pub use branch::{BranchResolver, GitBranchResolver};
pub use context::{ContextResolvers, resolve_pane_context};
pub use error::GitError;
pub use exec::{ExecOptions, ExecOutput, run_command, run_command_status};
pub use pr::{GhPrCreatedResolver, PrCreatedResolver};
pub use repo_root::{
    GitRepoRootSource, RepoRootCache, RepoRootCacheConfig, RepoRootResolver, RepoRootSource,
};
pub use worktree::{GitWorktreeSnapshot, WorktreeRecord, WorktreeStatusResolver};
