//! Periodic re-discovery with change-based notification.
//!
//! [`PollState`] is a plain value threaded through cycles; nothing here is
//! global. The loop has no termination of its own: it runs until the
//! caller's stop condition says otherwise (signal handling lives in the
//! binary).

use std::time::Duration;

use thiserror::Error;

use crate::clock::{Clock, Jitter};
use crate::error::DiscoveryError;
use crate::types::AvailabilityResult;

pub const NOTIFICATION_TITLE: &str = "Appointment Bot";

// ─── Notifications ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn for_result(result: &AvailabilityResult, url: &str) -> Self {
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            message: format!(
                "Earliest available date: {} (source={})\nBook here: {url}",
                result.iso(),
                result.source
            ),
        }
    }
}

#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Delivery channel for availability notifications.
pub trait Notifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        (**self).notify(notification)
    }
}

/// Fans one notification out to several channels. A failing channel does
/// not stop the others.
impl Notifier for [Box<dyn Notifier + Send>] {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mut failures = Vec::new();
        for channel in self {
            if let Err(e) = channel.notify(notification) {
                failures.push(e.0);
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(NotifyError(failures.join("; ")))
        }
    }
}

// ─── State ───────────────────────────────────────────────────────

/// Last ISO date the user was notified about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollState {
    pub last_seen: Option<String>,
}

impl PollState {
    /// Decide whether `current` should be announced. Returns the state for
    /// the next cycle and the result to announce, if any.
    ///
    /// `None` never notifies and never clears `last_seen`.
    pub fn observe<'r>(
        self,
        current: Option<&'r AvailabilityResult>,
        only_on_change: bool,
    ) -> (PollState, Option<&'r AvailabilityResult>) {
        let Some(result) = current else {
            return (self, None);
        };
        let iso = result.iso();
        if only_on_change && self.last_seen.as_deref() == Some(iso.as_str()) {
            return (self, None);
        }
        (
            PollState {
                last_seen: Some(iso),
            },
            Some(result),
        )
    }
}

// ─── Loop ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PollOptions {
    pub url: String,
    pub interval: Duration,
    pub only_on_change: bool,
    pub jitter: Jitter,
}

/// Apply one cycle's outcome: log failures, notify when warranted.
pub fn poll_cycle(
    state: PollState,
    outcome: Result<Option<AvailabilityResult>, DiscoveryError>,
    options: &PollOptions,
    notifier: &dyn Notifier,
) -> PollState {
    let current = match outcome {
        Ok(current) => current,
        Err(e) => {
            tracing::warn!("discovery cycle failed: {e}");
            return state;
        }
    };
    match &current {
        Some(result) => tracing::info!(date = %result.iso(), "cycle result"),
        None => tracing::info!("cycle result: no availability"),
    }

    let (next, announce) = state.observe(current.as_ref(), options.only_on_change);
    if let Some(result) = announce {
        let notification = Notification::for_result(result, &options.url);
        if let Err(e) = notifier.notify(&notification) {
            tracing::warn!("{e}");
        }
    } else if current.is_some() {
        tracing::debug!("result unchanged, not notifying");
    }
    next
}

/// Run `discover` at a jittered `interval` for as long as `keep_going`
/// holds. The condition is checked before each cycle and before each sleep;
/// a running cycle is never interrupted. Returns the final state.
pub fn run_poll_loop<C: Clock>(
    mut discover: impl FnMut() -> Result<Option<AvailabilityResult>, DiscoveryError>,
    options: &PollOptions,
    notifier: &dyn Notifier,
    clock: &C,
    mut keep_going: impl FnMut() -> bool,
) -> PollState {
    let mut state = PollState::default();
    let mut cycle: u64 = 0;
    while keep_going() {
        cycle += 1;
        tracing::info!(cycle, url = %options.url, "poll cycle starting");
        state = poll_cycle(state, discover(), options, notifier);
        if !keep_going() {
            break;
        }
        let wait = options.jitter.apply(options.interval);
        tracing::debug!(wait_ms = wait.as_millis() as u64, "sleeping until next cycle");
        clock.sleep(wait);
    }
    tracing::info!(cycles = cycle, "poll loop stopped");
    state
}
