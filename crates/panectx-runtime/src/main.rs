//! panectx: tmux pane capture and repository context monitor.
//! Attaches per-pane capture pipes and reports where each pane is
//! (repository, worktree, branch) and what it is running.

use std::sync::Arc;

use clap::Parser;
use panectx_tmux::TmuxExecutor;

mod cli;
mod cmd_snapshot;
mod cmd_watch;
mod monitor;
mod observe;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // stdout carries JSON; logs go to stderr.
    let filter = std::env::var("PANECTX_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let mut executor = TmuxExecutor::new(&args.tmux_bin);
    if let Some(socket) = &args.tmux_socket {
        executor = executor.with_socket_path(socket);
    }
    let log_dir = args.log_dir.clone().unwrap_or_else(cli::default_log_dir);
    let monitor = monitor::Monitor::new(
        Arc::new(executor),
        log_dir,
        &args.pipe_tag,
        monitor::MonitorResolvers::git(&args.git_bin, &args.gh_bin),
    );
    tracing::debug!(log_dir = %monitor.log_dir().display(), "panectx starting");

    match &args.command {
        cli::Command::Snapshot(opts) => cmd_snapshot::cmd_snapshot(&monitor, opts).await?,
        cli::Command::Watch(opts) => cmd_watch::cmd_watch(&monitor, opts).await?,
    }

    Ok(())
}
