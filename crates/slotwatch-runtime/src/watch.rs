//! `slotwatch watch`: poll one booking page until a shutdown signal.
//!
//! The poll loop and every discovery run are blocking, so the whole loop
//! lives on one blocking task. The async side only waits for a signal and
//! then asks the loop to stop after its current cycle.

use std::cell::Cell;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

use anyhow::Context;
use slotwatch_core::{Clock, DiscoveryConfig, Jitter, PollOptions, run_poll_loop};

use crate::browser::{BrowserHolder, discover_in_tab, open_browser};
use crate::cli::BrowserOpts;
use crate::config::WatchSettings;
use crate::notify;

/// Wall clock whose sleeps end early once a stop is requested.
struct StopClock {
    stop: Receiver<()>,
    requested: Cell<bool>,
}

impl StopClock {
    fn new(stop: Receiver<()>) -> Self {
        Self {
            stop,
            requested: Cell::new(false),
        }
    }

    /// A dropped sender counts as a stop request.
    fn stop_requested(&self) -> bool {
        if !self.requested.get() && !matches!(self.stop.try_recv(), Err(TryRecvError::Empty)) {
            self.requested.set(true);
        }
        self.requested.get()
    }
}

impl Clock for StopClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        if self.requested.get() {
            return;
        }
        match self.stop.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => self.requested.set(true),
        }
    }
}

pub async fn run(
    browser_opts: BrowserOpts,
    discovery: DiscoveryConfig,
    settings: WatchSettings,
) -> anyhow::Result<()> {
    let url = settings
        .url
        .clone()
        .context("no booking URL: pass --url, set BOOKING_URL or [watch].url in the config file")?;

    // Unreachable browser at startup is fatal. Later, a lost browser is
    // reopened on the next cycle.
    let startup_opts = browser_opts.clone();
    let browser = tokio::task::spawn_blocking(move || open_browser(&startup_opts)).await??;
    let mut holder = BrowserHolder::new(browser, move || open_browser(&browser_opts));

    let options = PollOptions {
        url,
        interval: settings.interval,
        only_on_change: settings.only_on_change,
        jitter: Jitter::new(discovery.jitter_fraction),
    };
    let notifiers = notify::channels(settings.notify_cmd.as_deref());
    tracing::info!(
        url = %options.url,
        interval_s = options.interval.as_secs(),
        only_on_change = options.only_on_change,
        "watching booking page"
    );

    let (stop_tx, stop_rx) = mpsc::channel();
    let mut poll = tokio::task::spawn_blocking(move || {
        let clock = StopClock::new(stop_rx);
        let state = run_poll_loop(
            || holder.run(&options.url, |browser| discover_in_tab(browser, &discovery, &options.url)),
            &options,
            &notifiers.as_slice(),
            &clock,
            || !clock.stop_requested(),
        );
        drop(holder);
        state
    });

    tokio::select! {
        signal = shutdown_signal() => signal?,
        joined = &mut poll => {
            joined?;
            anyhow::bail!("poll loop exited unexpectedly");
        }
    }

    tracing::info!("stopping after the current cycle");
    // The loop may already be past its last check; a closed channel is fine.
    let _ = stop_tx.send(());
    let state = poll.await?;
    tracing::info!(last_seen = ?state.last_seen, "watch stopped");
    Ok(())
}

/// Resolves on ctrl-c, or SIGTERM on unix.
async fn shutdown_signal() -> anyhow::Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .context("failed to register SIGTERM handler")?;
        tokio::select! {
            res = ctrl_c => {
                res.context("failed to listen for ctrl-c")?;
                tracing::info!("received ctrl-c, shutting down");
            }
            _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.context("failed to listen for ctrl-c")?;
        tracing::info!("received ctrl-c, shutting down");
    }

    Ok(())
}
