//! Pane listing with pipe state, and fresh single-pane pipe-state reads.

use panectx_core::{Pane, PipeState};

use crate::error::TmuxError;
use crate::executor::{TmuxCommandRunner, run_checked};
use crate::pipe::DEFAULT_PIPE_TAG_OPTION;

/// Pane user option holding a user-assigned title.
pub const DEFAULT_TITLE_OPTION: &str = "@panectx_title";

/// Number of tab-separated fields in [`list_panes_format`].
const LIST_PANES_FIELDS: usize = 13;

/// Names of the pane user options read alongside the pane metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPanesOptions {
    pub pipe_tag_option: String,
    pub title_option: String,
}

impl Default for ListPanesOptions {
    fn default() -> Self {
        Self {
            pipe_tag_option: DEFAULT_PIPE_TAG_OPTION.to_string(),
            title_option: DEFAULT_TITLE_OPTION.to_string(),
        }
    }
}

/// One row of `list-panes`: metadata, pipe flags and custom title.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaneListing {
    pub pane: Pane,
    pub pipe_state: PipeState,
    pub custom_title: Option<String>,
}

/// Tab-delimited format for `tmux list-panes -a -F`.
///
/// Free-text fields come last. tmux escapes control characters in
/// `pane_title` but stores user options verbatim, so the custom title is the
/// final field and `splitn` keeps any tab inside it.
pub fn list_panes_format(options: &ListPanesOptions) -> String {
    [
        "#{pane_id}".to_string(),
        "#{session_name}".to_string(),
        "#{window_index}".to_string(),
        "#{pane_index}".to_string(),
        "#{pane_current_command}".to_string(),
        "#{pane_current_path}".to_string(),
        "#{pane_active}".to_string(),
        "#{pane_dead}".to_string(),
        "#{pane_pipe}".to_string(),
        format!("#{{{}}}", options.pipe_tag_option),
        "#{pane_pid}".to_string(),
        "#{pane_title}".to_string(),
        format!("#{{{}}}", options.title_option),
    ]
    .join("\t")
}

/// Execute `tmux list-panes -a` and parse the output.
pub async fn list_panes(
    runner: &(impl TmuxCommandRunner + ?Sized),
    options: &ListPanesOptions,
) -> Result<Vec<PaneListing>, TmuxError> {
    let format = list_panes_format(options);
    let output = run_checked(runner, &["list-panes", "-a", "-F", &format]).await?;
    parse_list_panes_output(&output)
}

/// Parse the raw output of `tmux list-panes -a -F <format>`.
pub fn parse_list_panes_output(output: &str) -> Result<Vec<PaneListing>, TmuxError> {
    let mut panes = Vec::new();
    for (idx, line) in output.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        panes.push(parse_line(line, idx + 1)?);
    }
    Ok(panes)
}

fn parse_line(line: &str, line_num: usize) -> Result<PaneListing, TmuxError> {
    let parts: Vec<&str> = line.splitn(LIST_PANES_FIELDS, '\t').collect();
    if parts.len() < LIST_PANES_FIELDS - 2 {
        return Err(TmuxError::ParseError {
            line_num,
            detail: format!(
                "expected at least {} tab-separated fields, got {}",
                LIST_PANES_FIELDS - 2,
                parts.len()
            ),
        });
    }
    if parts[0].is_empty() {
        return Err(TmuxError::ParseError {
            line_num,
            detail: "empty pane id".to_string(),
        });
    }

    let pane = Pane {
        pane_id: parts[0].to_string(),
        session_name: parts[1].to_string(),
        window_index: parts[2].trim().parse().unwrap_or(0),
        pane_index: parts[3].trim().parse().unwrap_or(0),
        current_command: parts[4].to_string(),
        current_path: non_empty(parts[5]),
        pane_active: parse_bool(parts[6]),
        pane_dead: parse_bool(parts[7]),
        pane_title: parts.get(11).map(|s| s.to_string()).unwrap_or_default(),
        pane_pid: parts[10].trim().parse().ok(),
    };
    let pipe_state = PipeState {
        pane_pipe: parse_bool(parts[8]),
        pipe_tag_value: non_empty(parts[9]),
    };
    let custom_title = parts.get(12).and_then(|s| non_empty(s));

    Ok(PaneListing {
        pane,
        pipe_state,
        custom_title,
    })
}

/// Read `#{pane_pipe}` and the ownership tag for one pane, fresh from tmux.
pub async fn read_pipe_state(
    runner: &(impl TmuxCommandRunner + ?Sized),
    pane_id: &str,
    pipe_tag_option: &str,
) -> Result<PipeState, TmuxError> {
    let format = format!("#{{pane_pipe}}\t#{{{pipe_tag_option}}}");
    let output = run_checked(runner, &["display-message", "-p", "-t", pane_id, &format]).await?;
    let line = output.lines().next().unwrap_or_default();
    let (pipe, tag) = line.split_once('\t').unwrap_or((line, ""));
    Ok(PipeState {
        pane_pipe: parse_bool(pipe),
        pipe_tag_value: non_empty(tag),
    })
}

fn parse_bool(s: &str) -> bool {
    matches!(s.trim(), "1" | "true")
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::CommandOutput;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockRunner {
        stdout: String,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl MockRunner {
        fn new(stdout: &str) -> Self {
            Self {
                stdout: stdout.to_string(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TmuxCommandRunner for MockRunner {
        async fn run(&self, args: &[&str]) -> Result<CommandOutput, TmuxError> {
            self.calls
                .lock()
                .expect("lock")
                .push(args.iter().map(|s| s.to_string()).collect());
            Ok(CommandOutput {
                exit_code: 0,
                stdout: self.stdout.clone(),
                stderr: String::new(),
            })
        }
    }

    #[test]
    fn format_embeds_option_names() {
        let format = list_panes_format(&ListPanesOptions::default());
        assert!(format.contains("#{@panectx_pipe}"));
        assert!(format.contains("#{@panectx_title}"));
        assert_eq!(format.split('\t').count(), LIST_PANES_FIELDS);
    }

    #[test]
    fn parse_single_line() {
        let line = "%3\tmain\t1\t0\tclaude\t/tmp/project\t1\t0\t1\t1\t4242\tclaude code\treview";
        let listing = parse_line(line, 1).expect("should parse");
        assert_eq!(listing.pane.pane_id, "%3");
        assert_eq!(listing.pane.session_name, "main");
        assert_eq!(listing.pane.window_index, 1);
        assert_eq!(listing.pane.pane_index, 0);
        assert_eq!(listing.pane.current_command, "claude");
        assert_eq!(listing.pane.current_path.as_deref(), Some("/tmp/project"));
        assert!(listing.pane.pane_active);
        assert!(!listing.pane.pane_dead);
        assert_eq!(listing.pane.pane_pid, Some(4242));
        assert_eq!(listing.pane.pane_title, "claude code");
        assert!(listing.pipe_state.pane_pipe);
        assert!(listing.pipe_state.has_owned_tag());
        assert_eq!(listing.custom_title.as_deref(), Some("review"));
    }

    #[test]
    fn unset_options_become_none() {
        let line = "%1\twork\t0\t2\tzsh\t\t0\t1\t0\t\t\t\t";
        let listing = parse_line(line, 1).expect("should parse");
        assert_eq!(listing.pane.current_path, None);
        assert!(listing.pane.pane_dead);
        assert_eq!(listing.pane.pane_pid, None);
        assert_eq!(listing.pipe_state.pipe_tag_value, None);
        assert!(!listing.pipe_state.pane_pipe);
        assert_eq!(listing.custom_title, None);
        assert_eq!(listing.pane.pane_title, "");
    }

    #[test]
    fn tab_in_custom_title_stays_out_of_pane_title() {
        let line = "%1\tw\t0\t0\tvim\t/tmp\t1\t0\t0\t\t1\tnvim\tfix\tflaky test";
        let listing = parse_line(line, 1).expect("should parse");
        assert_eq!(listing.pane.pane_title, "nvim");
        assert_eq!(listing.custom_title.as_deref(), Some("fix\tflaky test"));
    }

    #[test]
    fn parse_multiple_and_blank_lines() {
        let output = [
            "%0\tmain\t0\t0\tzsh\t/home\t1\t0\t0\t\t10\tt0\t",
            "",
            "%1\tmain\t0\t1\tcodex\t/repo\t0\t0\t1\t\t11\tt1\t",
        ]
        .join("\n");
        let panes = parse_list_panes_output(&output).expect("should parse");
        assert_eq!(panes.len(), 2);
        assert_eq!(panes[1].pane.pane_id, "%1");
        assert!(panes[1].pipe_state.is_foreign());
    }

    #[test]
    fn parse_too_few_fields_error() {
        let err = parse_line("%0\tmain\t0", 4).unwrap_err();
        match err {
            TmuxError::ParseError { line_num, .. } => assert_eq!(line_num, 4),
            other => panic!("expected ParseError, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_panes_uses_format() {
        let runner = MockRunner::new("%0\tmain\t0\t0\tclaude\t/repo\t1\t0\t0\t\t1\tt\t\n");
        let panes = list_panes(&runner, &ListPanesOptions::default())
            .await
            .expect("should list");
        assert_eq!(panes.len(), 1);
        let calls = runner.calls.lock().expect("lock");
        assert_eq!(calls[0][..3], ["list-panes", "-a", "-F"]);
        assert!(calls[0][3].contains("#{pane_pipe}"));
    }

    #[tokio::test]
    async fn read_pipe_state_parses_fields() {
        let runner = MockRunner::new("1\t1\n");
        let state = read_pipe_state(&runner, "%2", "@panectx_pipe")
            .await
            .expect("should read");
        assert!(state.pane_pipe);
        assert!(state.has_owned_tag());
        let calls = runner.calls.lock().expect("lock");
        assert_eq!(
            calls[0],
            ["display-message", "-p", "-t", "%2", "#{pane_pipe}\t#{@panectx_pipe}"]
        );

        let runner = MockRunner::new("0\t\n");
        let state = read_pipe_state(&runner, "%2", "@panectx_pipe")
            .await
            .expect("should read");
        assert_eq!(state, PipeState::default());
    }
}
