//! `panectx snapshot`: one tick, JSON array on stdout.

use panectx_core::PaneDetail;
use panectx_tmux::TmuxCommandRunner;

use crate::cli::SnapshotOpts;
use crate::monitor::{Monitor, TickOptions};

pub async fn cmd_snapshot<R: TmuxCommandRunner>(
    monitor: &Monitor<R>,
    opts: &SnapshotOpts,
) -> anyhow::Result<()> {
    let details = monitor
        .tick(TickOptions {
            attach: !opts.no_attach,
            force_reattach: opts.force_reattach,
        })
        .await?;
    println!("{}", render(&details, opts.pretty)?);
    Ok(())
}

pub fn render(details: &[PaneDetail], pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(details)
    } else {
        serde_json::to_string(details)
    }
}
