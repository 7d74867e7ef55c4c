//! Slot probing: open time-slot dialogs and read back their dates.
//!
//! Each click is expensive (dialog render + dismissal), so the number of
//! slots opened per view is capped by the caller.

use crate::clock::Clock;
use crate::date_parse::parse_dialog_date;
use crate::session::Session;
use crate::surface::Surface;
use crate::types::CalendarDate;

impl<S: Surface, C: Clock> Session<'_, S, C> {
    /// Open the slot at `index` and parse the date from its dialog.
    ///
    /// Returns `None` when the slot vanished, is hidden, no dialog opened,
    /// or the dialog text carried no recognisable date. Leaves no dialog
    /// open on return.
    pub fn read_slot_date(&mut self, index: usize) -> Option<CalendarDate> {
        self.dismiss_modal();

        // Re-resolve: the list can shrink between enumeration and click.
        let slot = *self.slot_controls().get(index)?;
        if !self.is_visible(slot) {
            return None;
        }
        let label = self.inner_text(slot).unwrap_or_default();
        tracing::debug!(index, label = label.trim(), "opening slot");

        if !self.click_if_visible(slot) {
            return None;
        }
        self.pause_ms(self.config.slot_settle_ms);

        let Some(dialog) = self.open_dialog() else {
            tracing::debug!(index, "slot dialog did not open");
            return None;
        };
        let text = self.inner_text(dialog).unwrap_or_default();
        let year_guess = self.infer_page_year();
        let date = parse_dialog_date(&text, year_guess);
        tracing::debug!(index, ?date, ?year_guess, "slot dialog parsed");

        self.dismiss_modal();
        date
    }

    /// Probe up to `max_clicks` visible slots. Dates come back deduplicated
    /// in first-seen order.
    pub fn probe_slot_dates(&mut self, max_clicks: u32) -> Vec<CalendarDate> {
        let available = self.slot_controls().len();
        let attempts = available.min(max_clicks as usize);

        let mut out: Vec<CalendarDate> = Vec::with_capacity(attempts);
        for index in 0..attempts {
            if let Some(date) = self.read_slot_date(index)
                && !out.contains(&date)
            {
                out.push(date);
            }
        }
        // A slow dialog can still open after the last read.
        self.dismiss_modal();

        tracing::debug!(available, attempts, parsed = ?out, "probe finished");
        out
    }
}
