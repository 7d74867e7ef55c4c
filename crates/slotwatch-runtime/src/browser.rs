//! Browser acquisition and one discovery run per tab.
//!
//! Blocking; call from `spawn_blocking`.

use anyhow::Context;
use slotwatch_cdp::{Browser, LaunchOptions};
use slotwatch_core::{
    AvailabilityResult, DiscoveryConfig, DiscoveryError, SurfaceError, SystemClock,
    discover_earliest,
};

use crate::cli::BrowserOpts;

type Outcome = Result<Option<AvailabilityResult>, DiscoveryError>;

pub fn launch_options(opts: &BrowserOpts) -> LaunchOptions {
    LaunchOptions {
        bin: opts.chrome_bin.clone(),
        port: opts.debug_port,
        headless: opts.headless,
        user_data_dir: opts.user_data_dir.clone(),
        ..LaunchOptions::default()
    }
}

/// Attach to `--devtools-url` when given, otherwise launch a local browser.
pub fn open_browser(opts: &BrowserOpts) -> anyhow::Result<Browser> {
    match &opts.devtools_url {
        Some(url) => {
            Browser::connect(url).with_context(|| format!("cannot reach browser DevTools at {url}"))
        }
        None => Browser::launch(&launch_options(opts))
            .with_context(|| format!("failed to start browser `{}`", opts.chrome_bin)),
    }
}

/// Run one discovery in a fresh tab. The tab is closed when this returns.
///
/// A tab that cannot be opened counts as a failed page load for `url`.
pub fn discover_in_tab(browser: &Browser, config: &DiscoveryConfig, url: &str) -> Outcome {
    let mut tab = browser.open_tab().map_err(|e| DiscoveryError::PageLoad {
        url: url.to_string(),
        source: e.into(),
    })?;
    tracing::debug!(target_id = tab.target_id(), "opened tab");
    discover_earliest(tab.page(), &SystemClock, config, url)
}

/// Keeps one browser across poll cycles. A run that finds the browser gone
/// drops it, and the next run reopens it through `open`.
pub struct BrowserHolder<B, O> {
    open: O,
    current: Option<B>,
}

impl<B, O> BrowserHolder<B, O>
where
    O: FnMut() -> anyhow::Result<B>,
{
    pub fn new(browser: B, open: O) -> Self {
        Self {
            open,
            current: Some(browser),
        }
    }

    pub fn run(&mut self, url: &str, discover: impl FnOnce(&B) -> Outcome) -> Outcome {
        let browser = match self.current.take() {
            Some(browser) => browser,
            None => {
                tracing::info!("reacquiring browser");
                (self.open)().map_err(|e| DiscoveryError::PageLoad {
                    url: url.to_string(),
                    source: SurfaceError::Disconnected(format!("{e:#}")),
                })?
            }
        };
        let outcome = discover(&browser);
        if browser_lost(&outcome) {
            tracing::warn!("browser connection lost, reopening next cycle");
            drop(browser);
        } else {
            self.current = Some(browser);
        }
        outcome
    }

    #[cfg(test)]
    fn is_held(&self) -> bool {
        self.current.is_some()
    }
}

fn browser_lost(outcome: &Outcome) -> bool {
    matches!(
        outcome,
        Err(DiscoveryError::PageLoad {
            source: SurfaceError::Disconnected(_),
            ..
        })
    )
}
