//! `panectx watch`: one JSON array per line, every `interval_ms`.

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use panectx_tmux::TmuxCommandRunner;
use tokio::time::{MissedTickBehavior, interval};

use crate::cli::WatchOpts;
use crate::cmd_snapshot::render;
use crate::monitor::{Monitor, TickOptions};

pub async fn cmd_watch<R: TmuxCommandRunner>(
    monitor: &Monitor<R>,
    opts: &WatchOpts,
) -> anyhow::Result<()> {
    let options = TickOptions {
        attach: !opts.no_attach,
        force_reattach: false,
    };
    let period = Duration::from_millis(opts.interval_ms.max(1));
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        tracing::info!("received ctrl-c, stopping watch");
    };
    watch_loop(monitor, options, period, shutdown, std::io::stdout()).await
}

/// Tick until `shutdown` resolves. The shutdown future lives across
/// iterations and also interrupts a tick in flight.
async fn watch_loop<R, W>(
    monitor: &Monitor<R>,
    options: TickOptions,
    period: Duration,
    shutdown: impl Future<Output = ()>,
    mut out: W,
) -> anyhow::Result<()>
where
    R: TmuxCommandRunner,
    W: Write,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            result = monitor.tick(options) => result,
        };

        match result {
            Ok(details) => {
                let line = render(&details, false)?;
                writeln!(out, "{line}")?;
                out.flush()?;
            }
            Err(e) => tracing::warn!("tick failed: {e}"),
        }
    }

    Ok(())
}
