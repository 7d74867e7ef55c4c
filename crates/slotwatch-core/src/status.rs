//! Status detection: classify what the widget is showing.
//!
//! Priority is fixed. The "no times in the next year" notice can briefly
//! co-occur with the per-window "no availability" banner during a page
//! transition, and it must win so the caller fast-forwards.

use std::time::Duration;

use crate::clock::Clock;
use crate::session::Session;
use crate::surface::Surface;
use crate::types::Status;

impl<S: Surface, C: Clock> Session<'_, S, C> {
    /// One sample of the page, without waiting.
    pub fn sample_status(&mut self) -> Option<Status> {
        let next_year = self.config.no_times_next_year_text.clone();
        if self.page_has_text(&next_year) {
            return Some(Status::NoTimesNextYear);
        }
        let no_avail = self.config.no_availability_text.clone();
        if self.page_has_text(&no_avail) {
            return Some(Status::NoAvailability);
        }
        if !self.slot_controls().is_empty() {
            return Some(Status::Times);
        }
        None
    }

    /// Sample until a status is recognised or the (jittered) bound elapses.
    pub fn wait_for_status(&mut self, timeout: Duration) -> Status {
        let start = self.clock.now();
        let bound = self.jitter.apply(timeout);
        loop {
            if let Some(status) = self.sample_status() {
                return status;
            }
            if self.is_lost() || self.clock.now().duration_since(start) >= bound {
                return Status::Timeout;
            }
            self.pause_ms(self.config.status_poll_ms);
        }
    }

    /// [`Self::wait_for_status`] with the configured step timeout.
    pub fn detect_status(&mut self) -> Status {
        let status = self.wait_for_status(self.config.status_timeout());
        tracing::trace!(%status, "status detected");
        status
    }
}
