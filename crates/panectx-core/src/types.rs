use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value written to the pane-scoped tag option when this process attached
/// the capture pipe.
pub const PIPE_TAG_OWNED: &str = "1";

// ─── Pane ─────────────────────────────────────────────────────────

/// One tmux pane as listed on the current tick.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pane {
    pub pane_id: String,
    pub session_name: String,
    pub window_index: u32,
    pub pane_index: u32,
    pub current_command: String,
    pub current_path: Option<String>,
    pub pane_active: bool,
    pub pane_dead: bool,
    pub pane_title: String,
    pub pane_pid: Option<u32>,
}

// ─── Pipe ─────────────────────────────────────────────────────────

/// Capture-pipe flags as read from the pane's tmux options.
///
/// Always re-read from tmux before acting on it; the pane is the only
/// record of who owns the pipe.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipeState {
    /// `#{pane_pipe}`: some pipe is attached.
    pub pane_pipe: bool,
    /// Ownership marker written by us; `"1"` means we attached it.
    pub pipe_tag_value: Option<String>,
}

impl PipeState {
    pub fn has_owned_tag(&self) -> bool {
        self.pipe_tag_value.as_deref() == Some(PIPE_TAG_OWNED)
    }

    /// A pipe is attached that we did not tag.
    pub fn is_foreign(&self) -> bool {
        self.pane_pipe && !self.has_owned_tag()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipeAttachResult {
    pub attached: bool,
    pub conflict: bool,
}

impl PipeAttachResult {
    pub const ATTACHED: Self = Self {
        attached: true,
        conflict: false,
    };
    pub const CONFLICT: Self = Self {
        attached: false,
        conflict: true,
    };
    pub const FAILED: Self = Self {
        attached: false,
        conflict: false,
    };
}

// ─── Worktree & Context ───────────────────────────────────────────

/// Fast, possibly stale worktree snapshot for a path.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedWorktreeStatus {
    pub repo_root: Option<String>,
    pub worktree_path: Option<String>,
    pub branch: Option<String>,
    pub worktree_dirty: Option<bool>,
    pub worktree_locked: Option<bool>,
    pub worktree_lock_owner: Option<String>,
    pub worktree_lock_reason: Option<String>,
    pub worktree_merged: Option<bool>,
}

/// Where a pane is: repository, branch and worktree facts.
///
/// Rebuilt on every resolution; never patched in place.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneResolvedContext {
    pub repo_root: Option<String>,
    pub branch: Option<String>,
    pub worktree_path: Option<String>,
    pub worktree_dirty: Option<bool>,
    pub worktree_locked: Option<bool>,
    pub worktree_lock_owner: Option<String>,
    pub worktree_lock_reason: Option<String>,
    pub worktree_merged: Option<bool>,
    pub worktree_pr_created: Option<bool>,
}

// ─── Agent & State ────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Claude,
    Codex,
    Gemini,
    /// Neutral runtime (node, python, ...) that may host an agent.
    Unknown,
    /// Plain shell or ordinary program.
    #[default]
    None,
}

impl AgentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Codex => "codex",
            Self::Gemini => "gemini",
            Self::Unknown => "unknown",
            Self::None => "none",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaneState {
    Running,
    WaitingInput,
    WaitingPermission,
    Done,
    Shell,
    #[default]
    Unknown,
}

impl PaneState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::WaitingInput => "waiting_input",
            Self::WaitingPermission => "waiting_permission",
            Self::Done => "done",
            Self::Shell => "shell",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PaneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalState {
    pub state: PaneState,
    pub reason: String,
}

impl FinalState {
    pub fn new(state: PaneState, reason: impl Into<String>) -> Self {
        Self {
            state,
            reason: reason.into(),
        }
    }
}

// ─── Observation ──────────────────────────────────────────────────

/// Activity timestamps and signatures tracked for a pane.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneStateRecord {
    pub last_output_at: Option<DateTime<Utc>>,
    pub last_event_at: Option<DateTime<Utc>>,
    pub last_message: Option<String>,
    pub last_input_at: Option<DateTime<Utc>>,
    /// Fingerprint of the last captured screen, used by classifiers.
    pub last_signature: Option<String>,
}

/// Live liveness/activity data produced outside the core.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneObservation {
    pub agent: AgentKind,
    pub pipe_attached: bool,
    pub pipe_conflict: bool,
    pub pane_state: PaneStateRecord,
    pub output_at: Option<DateTime<Utc>>,
    pub final_state: Option<FinalState>,
}

// ─── Detail ───────────────────────────────────────────────────────

/// Final per-pane snapshot handed to consumers. Each tick builds a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneDetail {
    pub pane_id: String,
    pub session_name: String,
    pub window_index: u32,
    pub pane_index: u32,
    pub current_command: String,
    pub current_path: Option<String>,
    pub pane_active: bool,
    pub pane_dead: bool,
    pub pane_title: String,
    pub pane_pid: Option<u32>,
    pub title: String,
    pub custom_title: Option<String>,

    pub agent: AgentKind,
    pub state: PaneState,
    pub state_reason: String,
    pub pipe_attached: bool,
    pub pipe_conflict: bool,
    /// Capture-log activity as observed this tick.
    pub output_at: Option<DateTime<Utc>>,
    pub last_output_at: Option<DateTime<Utc>>,
    pub last_event_at: Option<DateTime<Utc>>,
    pub last_message: Option<String>,
    pub last_input_at: Option<DateTime<Utc>>,
    pub last_signature: Option<String>,

    pub repo_root: Option<String>,
    pub branch: Option<String>,
    pub worktree_path: Option<String>,
    pub worktree_dirty: Option<bool>,
    pub worktree_locked: Option<bool>,
    pub worktree_lock_owner: Option<String>,
    pub worktree_lock_reason: Option<String>,
    pub worktree_merged: Option<bool>,
    pub worktree_pr_created: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipe_state_foreign_only_when_untagged_pipe() {
        let foreign = PipeState {
            pane_pipe: true,
            pipe_tag_value: None,
        };
        assert!(foreign.is_foreign());

        let other_tag = PipeState {
            pane_pipe: true,
            pipe_tag_value: Some("0".into()),
        };
        assert!(other_tag.is_foreign());

        let ours = PipeState {
            pane_pipe: true,
            pipe_tag_value: Some("1".into()),
        };
        assert!(!ours.is_foreign());
        assert!(ours.has_owned_tag());

        let detached = PipeState::default();
        assert!(!detached.is_foreign());
        assert!(!detached.has_owned_tag());
    }

    #[test]
    fn agent_kind_serde_lowercase() {
        let json = serde_json::to_string(&AgentKind::Claude).expect("serialize");
        assert_eq!(json, "\"claude\"");
        let back: AgentKind = serde_json::from_str("\"none\"").expect("deserialize");
        assert_eq!(back, AgentKind::None);
    }

    #[test]
    fn pane_state_serde_snake_case() {
        let json = serde_json::to_string(&PaneState::WaitingPermission).expect("serialize");
        assert_eq!(json, "\"waiting_permission\"");
        assert_eq!(PaneState::WaitingInput.to_string(), "waiting_input");
    }

    #[test]
    fn context_serializes_camel_case() {
        let ctx = PaneResolvedContext {
            repo_root: Some("/tmp/project".into()),
            worktree_pr_created: Some(true),
            ..Default::default()
        };
        let value = serde_json::to_value(&ctx).expect("serialize");
        assert_eq!(value["repoRoot"], "/tmp/project");
        assert_eq!(value["worktreePrCreated"], true);
        assert!(value["branch"].is_null());
    }
}
