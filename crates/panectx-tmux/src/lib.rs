//! panectx-tmux: tmux IO boundary.
//! Async command execution with timeout/size bounds, pane listing with pipe
//! state, and the capture-pipe attachment manager. The pane's own tag option
//! is the only record of pipe ownership; nothing is cached here.

pub mod error;
pub mod executor;
pub mod pane_info;
pub mod pipe;

pub use error::TmuxError;
pub use executor::{CommandOutput, TmuxCommandRunner, TmuxExecutor, run_checked};
pub use pane_info::{
    ListPanesOptions, PaneListing, list_panes, list_panes_format, parse_list_panes_output,
    read_pipe_state,
};
pub use pipe::{AttachOptions, DEFAULT_PIPE_TAG_OPTION, PipeManager, pipe_command, shell_quote};
