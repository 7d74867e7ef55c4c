//! Discovery orchestrator: find the globally earliest bookable date.
//!
//! ```text
//! jump-to-next-bookable
//! for each month step (bounded):
//!   status = nxty  → fast-forward, jump, restart step
//!   status = times → seed = earliest probed date
//!   otherwise      → step forward a few weeks looking for times
//!   seed found     → scan the seed's month; earliest in-month date wins
//!   else           → next month
//! ```
//!
//! The seed's month is scanned from the seed's week onward, so a result is
//! the earliest date the month scan saw. The first month that yields
//! anything ends the run.

use crate::clock::Clock;
use crate::config::DiscoveryConfig;
use crate::error::{DiscoveryError, SurfaceError};
use crate::session::Session;
use crate::surface::Surface;
use crate::types::{AvailabilityResult, CalendarDate, MonthKey, ResultSource, Status};

/// Load `url` and run one discovery against it.
///
/// `Ok(None)` means no availability was found within the configured bounds.
/// Errors are reserved for a page that never loads or a surface that goes
/// away mid-run.
pub fn discover_earliest<S: Surface, C: Clock>(
    surface: &mut S,
    clock: &C,
    config: &DiscoveryConfig,
    url: &str,
) -> Result<Option<AvailabilityResult>, DiscoveryError> {
    tracing::info!(url, "loading booking page");
    surface
        .navigate(url, config.page_load_timeout())
        .map_err(|source| DiscoveryError::PageLoad {
            url: url.to_string(),
            source,
        })?;

    let mut session = Session::new(surface, clock, config);
    let result = session.find_earliest()?;
    match &result {
        Some(found) => tracing::info!(date = %found.iso(), "earliest availability found"),
        None => tracing::info!("no availability within search bounds"),
    }
    Ok(result)
}

/// What a month step's status check produced.
enum StepOutcome {
    Seeds(Vec<CalendarDate>),
    /// The view was fast-forwarded; restart the month step.
    Restart,
    /// Fast-forward failed; nothing further is reachable.
    Exhausted,
}

impl<S: Surface, C: Clock> Session<'_, S, C> {
    /// Run the month-step search against an already loaded page.
    pub fn find_earliest(&mut self) -> Result<Option<AvailabilityResult>, SurfaceError> {
        let max_steps = self.config.max_month_forward;

        self.click_jump_to_next_bookable();
        self.pause_ms(self.config.jump_settle_ms);

        for step in 0..=max_steps {
            self.ensure_alive()?;
            self.dismiss_modal();
            let status = self.detect_status();
            tracing::debug!(step, %status, "month step");

            let seeds = match self.seed_dates(status) {
                StepOutcome::Seeds(seeds) => seeds,
                StepOutcome::Restart => continue,
                StepOutcome::Exhausted => {
                    self.ensure_alive()?;
                    return Ok(None);
                }
            };

            if let Some(seed) = seeds.iter().min().copied() {
                let month = MonthKey::of(seed);
                tracing::debug!(%seed, %month, "seed found, scanning month");
                let found = self.scan_month(month, seed);
                if let Some(&earliest) = found.first() {
                    return Ok(Some(AvailabilityResult::new(
                        earliest,
                        ResultSource::ModalDateMin,
                    )));
                }
            }

            self.ensure_alive()?;
            if step >= max_steps {
                break;
            }
            if !self.click_next_month() {
                tracing::debug!(step, "cannot advance month");
                break;
            }
            self.pause_ms(self.config.month_step_pause_ms);
        }

        self.ensure_alive()?;
        Ok(None)
    }

    fn seed_dates(&mut self, status: Status) -> StepOutcome {
        match status {
            Status::NoTimesNextYear => {
                if !self.skip_ahead(self.config.fast_forward_settle_ms) {
                    return StepOutcome::Exhausted;
                }
                StepOutcome::Restart
            }
            Status::Times => StepOutcome::Seeds(self.probe_slot_dates(self.config.seed_clicks())),
            Status::NoAvailability | Status::Timeout => self.probe_following_weeks(),
        }
    }

    /// Step a few weeks forward looking for any time slots.
    fn probe_following_weeks(&mut self) -> StepOutcome {
        for _ in 0..self.config.week_probe_steps {
            if !self.click_next_week() {
                break;
            }
            self.pause_ms(self.config.week_step_pause_ms);
            match self.detect_status() {
                Status::NoTimesNextYear => {
                    if !self.skip_ahead(self.config.jump_settle_ms) {
                        return StepOutcome::Exhausted;
                    }
                    return StepOutcome::Restart;
                }
                Status::Times => {
                    return StepOutcome::Seeds(self.probe_slot_dates(self.config.seed_clicks()));
                }
                Status::NoAvailability | Status::Timeout => {}
            }
        }
        StepOutcome::Seeds(Vec::new())
    }

    /// Fast-forward, then re-jump to the next bookable date, settling
    /// `settle_ms` around the jump.
    fn skip_ahead(&mut self, settle_ms: u64) -> bool {
        if !self.fast_forward_months(self.config.fast_forward_months) {
            tracing::debug!("fast-forward failed, search exhausted");
            return false;
        }
        self.pause_ms(settle_ms);
        self.click_jump_to_next_bookable();
        self.pause_ms(settle_ms);
        true
    }
}
