//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "panectx", about = "tmux pane capture and repository context monitor")]
pub struct Cli {
    /// tmux binary
    #[arg(long, global = true, env = "PANECTX_TMUX_BIN", default_value = "tmux")]
    pub tmux_bin: String,

    /// tmux server socket path (tmux -S)
    #[arg(long, global = true, env = "PANECTX_TMUX_SOCKET")]
    pub tmux_socket: Option<String>,

    /// git binary
    #[arg(long, global = true, env = "PANECTX_GIT_BIN", default_value = "git")]
    pub git_bin: String,

    /// GitHub CLI binary, used for PR lookups on agent worktrees
    #[arg(long, global = true, env = "PANECTX_GH_BIN", default_value = "gh")]
    pub gh_bin: String,

    /// Directory receiving per-pane capture logs
    /// (default: $XDG_STATE_HOME/panectx/panes or /tmp/panectx-$USER/panes)
    #[arg(long, global = true, env = "PANECTX_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Pane user option marking pipes attached by panectx
    #[arg(long, global = true, default_value = panectx_tmux::DEFAULT_PIPE_TAG_OPTION)]
    pub pipe_tag: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one tick and print every pane as a JSON array
    Snapshot(SnapshotOpts),
    /// Run ticks on a fixed interval, one JSON array per line
    Watch(WatchOpts),
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct SnapshotOpts {
    /// Do not attach capture pipes; report current pipe state only
    #[arg(long)]
    pub no_attach: bool,

    /// Detach and re-attach pipes we already own
    #[arg(long)]
    pub force_reattach: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct WatchOpts {
    /// Tick interval in milliseconds
    #[arg(long, default_value = "2000")]
    pub interval_ms: u64,

    /// Do not attach capture pipes
    #[arg(long)]
    pub no_attach: bool,
}

/// Default capture-log directory, isolated per user.
pub fn default_log_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("XDG_STATE_HOME")
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir).join("panectx").join("panes");
    }
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/panectx-{user}")).join("panes")
}
