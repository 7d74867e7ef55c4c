//! Month scan: step week by week through one target month, collecting
//! in-month candidate dates.
//!
//! A week with no visible times does not end the scan; later weeks of the
//! month may still have availability.

use std::collections::BTreeSet;

use crate::clock::Clock;
use crate::session::Session;
use crate::surface::Surface;
use crate::types::{CalendarDate, MonthKey, Status};

impl<S: Surface, C: Clock> Session<'_, S, C> {
    /// Scan `month` starting from the currently displayed week.
    ///
    /// Returns as soon as `seed` is seen again (nothing earlier can exist
    /// once it is reconfirmed in-month). Otherwise stops when a week's
    /// earliest date leaves `month`, when navigation is stuck on the same
    /// week, when "next week" cannot be clicked, on the next-year notice,
    /// or after `max_weeks_per_month` steps.
    pub fn scan_month(&mut self, month: MonthKey, seed: CalendarDate) -> BTreeSet<CalendarDate> {
        let mut found = BTreeSet::new();
        let mut last_rep: Option<CalendarDate> = None;

        for week in 0..self.config.max_weeks_per_month {
            if self.is_lost() {
                break;
            }
            self.dismiss_modal();
            let status = self.detect_status();
            tracing::debug!(%month, week, %status, "month scan step");

            if status == Status::NoTimesNextYear {
                tracing::debug!(%month, "next-year notice during month scan");
                break;
            }

            let mut rep = None;
            if status == Status::Times {
                let week_dates = self.probe_slot_dates(self.config.max_slot_clicks_per_week);
                rep = week_dates.iter().min().copied();
                for date in week_dates {
                    if !month.contains(date) {
                        continue;
                    }
                    found.insert(date);
                    if date == seed {
                        tracing::debug!(%seed, "seed reconfirmed in month, stopping early");
                        return found;
                    }
                }
            }

            if let Some(rep) = rep {
                if !month.contains(rep) {
                    tracing::debug!(%rep, %month, "walked past end of month");
                    break;
                }
                if last_rep == Some(rep) {
                    tracing::debug!(%rep, "same week rendered twice, navigation stuck");
                    break;
                }
                last_rep = Some(rep);
            }

            if !self.click_next_week() {
                break;
            }
            self.pause_ms(self.config.week_step_pause_ms);
        }

        found
    }
}
