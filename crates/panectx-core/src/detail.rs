//! Merge pane metadata, observation and resolved context into a `PaneDetail`.
//!
//! Everything here is pure and total: the same input always yields an equal
//! detail, and every field has a value for every input.

use crate::path::{basename, normalized_non_empty};
use crate::types::{
    AgentKind, FinalState, Pane, PaneDetail, PaneObservation, PaneResolvedContext, PaneState,
};

/// Inputs for [`build_pane_detail`].
#[derive(Debug, Clone, Copy)]
pub struct PaneDetailInput<'a> {
    pub pane: &'a Pane,
    pub observation: &'a PaneObservation,
    pub pane_context: &'a PaneResolvedContext,
    pub custom_title: Option<&'a str>,
}

pub fn build_pane_detail(input: PaneDetailInput<'_>) -> PaneDetail {
    let PaneDetailInput {
        pane,
        observation,
        pane_context: ctx,
        custom_title,
    } = input;

    let final_state = observation
        .final_state
        .clone()
        .unwrap_or_else(|| estimate_state(pane, observation));

    let custom_title = custom_title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    let title = custom_title
        .clone()
        .unwrap_or_else(|| derive_title(pane, ctx));

    PaneDetail {
        pane_id: pane.pane_id.clone(),
        session_name: pane.session_name.clone(),
        window_index: pane.window_index,
        pane_index: pane.pane_index,
        current_command: pane.current_command.clone(),
        current_path: pane.current_path.clone(),
        pane_active: pane.pane_active,
        pane_dead: pane.pane_dead,
        pane_title: pane.pane_title.clone(),
        pane_pid: pane.pane_pid,
        title,
        custom_title,

        agent: observation.agent,
        state: final_state.state,
        state_reason: final_state.reason,
        pipe_attached: observation.pipe_attached,
        pipe_conflict: observation.pipe_conflict,
        output_at: observation.output_at,
        last_output_at: observation.pane_state.last_output_at,
        last_event_at: observation.pane_state.last_event_at,
        last_message: observation.pane_state.last_message.clone(),
        last_input_at: observation.pane_state.last_input_at,
        last_signature: observation.pane_state.last_signature.clone(),

        repo_root: ctx.repo_root.clone(),
        branch: ctx.branch.clone(),
        worktree_path: ctx.worktree_path.clone(),
        worktree_dirty: ctx.worktree_dirty,
        worktree_locked: ctx.worktree_locked,
        worktree_lock_owner: ctx.worktree_lock_owner.clone(),
        worktree_lock_reason: ctx.worktree_lock_reason.clone(),
        worktree_merged: ctx.worktree_merged,
        worktree_pr_created: ctx.worktree_pr_created,
    }
}

/// Local state estimate, used only when the observation carries no final state.
pub fn estimate_state(pane: &Pane, observation: &PaneObservation) -> FinalState {
    if pane.pane_dead {
        FinalState::new(PaneState::Unknown, "pane_dead")
    } else if observation.agent == AgentKind::None {
        FinalState::new(PaneState::Shell, "no_agent")
    } else {
        FinalState::new(PaneState::Unknown, "no_observation")
    }
}

/// Auto title: the most specific location name available, then the command,
/// then the pane id.
pub fn derive_title(pane: &Pane, ctx: &PaneResolvedContext) -> String {
    [
        ctx.worktree_path.as_deref(),
        ctx.repo_root.as_deref(),
        pane.current_path.as_deref(),
    ]
    .into_iter()
    .filter_map(|p| normalized_non_empty(p).and_then(basename))
    .next()
    .or_else(|| Some(pane.current_command.trim()).filter(|c| !c.is_empty()))
    .unwrap_or(pane.pane_id.as_str())
    .to_string()
}
