//! Per-pane observation: agent hint from the foreground command, capture log
//! location, and last output time from the log's mtime.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use panectx_core::{AgentKind, Pane, PaneObservation, PipeAttachResult};

/// Known interactive shells. Panes running these are plain terminals.
const SHELL_CMDS: &[&str] = &[
    "zsh", "bash", "fish", "sh", "csh", "tcsh", "ksh", "dash", "nu", "pwsh",
];

/// Runtimes that commonly host an agent without naming it.
const NEUTRAL_RUNTIMES: &[&str] = &["node", "bun", "deno", "python", "python3"];

/// Agent hint from the pane's current command.
pub fn detect_agent(current_command: &str) -> AgentKind {
    let lower = current_command.trim().to_ascii_lowercase();
    // Login shells show up as "-zsh".
    let name = lower.trim_start_matches('-');
    if lower.contains("claude") {
        AgentKind::Claude
    } else if lower.contains("codex") {
        AgentKind::Codex
    } else if lower.contains("gemini") {
        AgentKind::Gemini
    } else if SHELL_CMDS.contains(&name) {
        AgentKind::None
    } else if NEUTRAL_RUNTIMES.contains(&name) {
        AgentKind::Unknown
    } else {
        AgentKind::None
    }
}

/// Capture log for a pane: `<log_dir>/<id>.log` with tmux's `%` stripped.
pub fn log_path_for(log_dir: &Path, pane_id: &str) -> PathBuf {
    let safe_id = pane_id.replace(['%', '/', '\\'], "");
    log_dir.join(format!("{safe_id}.log"))
}

/// Last time the capture log was written, if it exists.
pub async fn output_at(log_path: &Path) -> Option<DateTime<Utc>> {
    let meta = tokio::fs::metadata(log_path).await.ok()?;
    if meta.len() == 0 {
        return None;
    }
    meta.modified().ok().map(DateTime::<Utc>::from)
}

pub fn build_observation(
    pane: &Pane,
    pipe: PipeAttachResult,
    output_at: Option<DateTime<Utc>>,
) -> PaneObservation {
    PaneObservation {
        agent: detect_agent(&pane.current_command),
        pipe_attached: pipe.attached,
        pipe_conflict: pipe.conflict,
        output_at,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_detection() {
        assert_eq!(detect_agent("claude"), AgentKind::Claude);
        assert_eq!(detect_agent("Claude"), AgentKind::Claude);
        assert_eq!(detect_agent("codex-aarch64-apple-darwin"), AgentKind::Codex);
        assert_eq!(detect_agent("gemini"), AgentKind::Gemini);
        assert_eq!(detect_agent("zsh"), AgentKind::None);
        assert_eq!(detect_agent("-bash"), AgentKind::None);
        assert_eq!(detect_agent("node"), AgentKind::Unknown);
        assert_eq!(detect_agent("python3"), AgentKind::Unknown);
        assert_eq!(detect_agent("vim"), AgentKind::None);
        assert_eq!(detect_agent(""), AgentKind::None);
    }

    #[test]
    fn log_path_strips_pane_sigil() {
        assert_eq!(
            log_path_for(Path::new("/tmp/panectx/panes"), "%12"),
            PathBuf::from("/tmp/panectx/panes/12.log")
        );
    }

    #[tokio::test]
    async fn output_at_reads_mtime() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = dir.path().join("1.log");
        assert_eq!(output_at(&log).await, None);

        std::fs::write(&log, b"").expect("write");
        assert_eq!(output_at(&log).await, None, "empty log has no output yet");

        std::fs::write(&log, b"hello\n").expect("write");
        let at = output_at(&log).await.expect("mtime");
        assert!(at <= Utc::now());
    }

    #[test]
    fn observation_carries_pipe_flags() {
        let pane = Pane {
            pane_id: "%1".into(),
            current_command: "claude".into(),
            ..Default::default()
        };
        let obs = build_observation(&pane, PipeAttachResult::CONFLICT, None);
        assert_eq!(obs.agent, AgentKind::Claude);
        assert!(!obs.pipe_attached);
        assert!(obs.pipe_conflict);
        assert!(obs.final_state.is_none());
    }
}
