//! panectx-core: value types shared by every panectx crate.
//!
//! Holds the per-pane data model (pane metadata, pipe state, resolved
//! context, observations), the trailing-separator path helpers used for
//! cache keys and worktree validation, and the pure `PaneDetail` builder.
//! No IO lives here.

pub mod detail;
pub mod path;
pub mod types;

pub use detail::{PaneDetailInput, build_pane_detail, derive_title, estimate_state};
pub use path::{
    basename, is_agent_worktree_path, is_path_prefix, normalize_path, normalized_non_empty,
    same_path,
};
pub use types::{
    AgentKind, FinalState, Pane, PaneDetail, PaneObservation, PaneResolvedContext, PaneState,
    PaneStateRecord, PipeAttachResult, PipeState, PIPE_TAG_OWNED, ResolvedWorktreeStatus,
};
