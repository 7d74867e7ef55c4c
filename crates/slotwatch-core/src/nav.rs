//! Calendar navigation: week, month and multi-month fast-forward.
//!
//! A `false` return means "cannot continue in this direction". Callers end
//! the current scan on it; it is never an error.
//!
//! The widget exposes no semantic distinction between its week and month
//! "next" controls, so week navigation is a geometric heuristic kept behind
//! [`Session::click_next_week`].

use crate::clock::Clock;
use crate::session::Session;
use crate::surface::{ElementHandle, Query, Surface, TextMatch};

/// Controls within this many pixels of the month control are the month control.
const SAME_CONTROL_TOLERANCE_PX: f64 = 3.0;

impl<S: Surface, C: Clock> Session<'_, S, C> {
    fn next_month_control(&mut self) -> Option<ElementHandle> {
        self.first(&Query::attribute(
            "button",
            "aria-label",
            Some(TextMatch::contains("next month")),
        ))
    }

    pub fn click_next_month(&mut self) -> bool {
        let Some(btn) = self.next_month_control() else {
            return false;
        };
        let clicked = self.click_if_visible(btn);
        if clicked {
            tracing::debug!("clicked next month");
        }
        clicked
    }

    /// Click the rightmost visible "next"-labelled control that is not the
    /// month control.
    pub fn click_next_week(&mut self) -> bool {
        let month_box = self
            .next_month_control()
            .and_then(|btn| self.bounding_box(btn));

        let labelled = self.find(&Query::attribute("button", "aria-label", None));
        let mut candidates = Vec::new();
        for btn in labelled {
            if !self.is_visible(btn) {
                continue;
            }
            let label = self.attribute(btn, "aria-label").unwrap_or_default().to_lowercase();
            if !label.contains("next") || label.contains("month") {
                continue;
            }
            let Some(bb) = self.bounding_box(btn) else {
                continue;
            };
            if month_box.is_some_and(|mb| mb.near(&bb, SAME_CONTROL_TOLERANCE_PX)) {
                continue;
            }
            candidates.push((bb.x, label, btn));
        }

        // Stable sort: equal x keeps document order, the last one wins.
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
        let Some((x, label, btn)) = candidates.pop() else {
            return false;
        };
        tracing::debug!(label = %label, x, "clicking next week");
        self.click_if_visible(btn)
    }

    /// Click "next month" `months` times with a pause between clicks.
    /// Stops at the first failed click.
    pub fn fast_forward_months(&mut self, months: u32) -> bool {
        tracing::debug!(months, "fast-forwarding");
        for i in 0..months {
            if !self.click_next_month() {
                tracing::debug!(at = i, "fast-forward stalled");
                return false;
            }
            self.pause_ms(self.config.month_step_pause_ms);
        }
        true
    }
}
