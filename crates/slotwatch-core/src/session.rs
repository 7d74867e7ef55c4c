//! Discovery session: the surface, clock and configuration for one run,
//! plus the UI primitives shared by every higher-level step.

use std::sync::LazyLock;
use std::time::Duration;

use crate::clock::{Clock, Jitter};
use crate::config::DiscoveryConfig;
use crate::date_parse::infer_year;
use crate::error::SurfaceError;
use crate::surface::{ElementHandle, Observed, Query, Surface, TextMatch};

/// Shape of a time-slot control label: "9:30", "9:30am", "14:00 PM".
pub const TIME_SLOT_PATTERN: &str = r"^\s*\d{1,2}:\d{2}\s*(?:am|pm)?\s*$";

static TIME_SLOT: LazyLock<TextMatch> = LazyLock::new(|| {
    TextMatch::pattern(TIME_SLOT_PATTERN)
        .unwrap_or_else(|e| panic!("built-in slot pattern must compile: {e}"))
});

pub struct Session<'a, S: Surface, C: Clock> {
    pub(crate) surface: &'a mut S,
    pub(crate) clock: &'a C,
    pub(crate) config: &'a DiscoveryConfig,
    pub(crate) jitter: Jitter,
    /// Detail of the first fatal surface error; once set the run is over.
    lost: Option<String>,
}

impl<'a, S: Surface, C: Clock> Session<'a, S, C> {
    pub fn new(surface: &'a mut S, clock: &'a C, config: &'a DiscoveryConfig) -> Self {
        Self {
            surface,
            clock,
            config,
            jitter: Jitter::new(config.jitter_fraction),
            lost: None,
        }
    }

    /// Jittered blocking pause.
    pub fn pause_ms(&self, ms: u64) {
        let d = self.jitter.apply_ms(ms);
        if !d.is_zero() {
            self.clock.sleep(d);
        }
    }

    // ─── Liveness ────────────────────────────────────────────────

    fn note_error(&mut self, err: &SurfaceError) {
        match err {
            SurfaceError::Disconnected(detail) if self.lost.is_none() => {
                tracing::warn!("surface lost: {detail}");
                self.lost = Some(detail.clone());
            }
            _ => tracing::trace!("surface observation failed: {err}"),
        }
    }

    pub fn is_lost(&self) -> bool {
        self.lost.is_some()
    }

    /// Surface the fatal error (if any) so callers can abort with `?`.
    pub fn ensure_alive(&self) -> Result<(), SurfaceError> {
        match &self.lost {
            Some(detail) => Err(SurfaceError::Disconnected(detail.clone())),
            None => Ok(()),
        }
    }

    // ─── Observation wrappers ────────────────────────────────────

    pub fn find(&mut self, query: &Query) -> Vec<ElementHandle> {
        match self.surface.find(query) {
            Ok(found) => found,
            Err(e) => {
                self.note_error(&e);
                Vec::new()
            }
        }
    }

    pub fn first(&mut self, query: &Query) -> Option<ElementHandle> {
        self.find(query).into_iter().next()
    }

    fn settle<T>(&mut self, observed: Observed<T>) -> Option<T> {
        match observed {
            Observed::Found(v) => Some(v),
            Observed::Absent => None,
            Observed::Transient(e) => {
                self.note_error(&e);
                None
            }
        }
    }

    pub fn is_visible(&mut self, el: ElementHandle) -> bool {
        let observed = self.surface.is_visible(el);
        self.settle(observed).unwrap_or(false)
    }

    /// Click if currently visible. Returns whether the click happened.
    pub fn click_if_visible(&mut self, el: ElementHandle) -> bool {
        if !self.is_visible(el) {
            return false;
        }
        let timeout = Duration::from_millis(self.config.slot_click_timeout_ms);
        let observed = self.surface.click(el, timeout);
        self.settle(observed).is_some()
    }

    pub fn inner_text(&mut self, el: ElementHandle) -> Option<String> {
        let observed = self.surface.inner_text(el);
        self.settle(observed)
    }

    pub fn bounding_box(&mut self, el: ElementHandle) -> Option<crate::surface::BoundingBox> {
        let observed = self.surface.bounding_box(el);
        self.settle(observed)
    }

    pub fn attribute(&mut self, el: ElementHandle, name: &str) -> Option<String> {
        let observed = self.surface.attribute(el, name);
        self.settle(observed)
    }

    /// First match exists and is visible.
    pub fn has_visible(&mut self, query: &Query) -> bool {
        match self.first(query) {
            Some(el) => self.is_visible(el),
            None => false,
        }
    }

    pub fn page_has_text(&mut self, text: &str) -> bool {
        self.has_visible(&Query::text(TextMatch::contains(text)))
    }

    // ─── Widget primitives ───────────────────────────────────────

    pub fn open_dialog(&mut self) -> Option<ElementHandle> {
        let dialog = self.first(&Query::role("dialog"))?;
        self.is_visible(dialog).then_some(dialog)
    }

    /// Close any open dialog: its Cancel button if visible, else Escape.
    pub fn dismiss_modal(&mut self) {
        let Some(dialog) = self.open_dialog() else {
            return;
        };
        let cancel = Query::role_named("button", TextMatch::contains("cancel")).within(dialog);
        if let Some(btn) = self.first(&cancel)
            && self.click_if_visible(btn)
        {
            self.pause_ms(self.config.modal_settle_ms);
            return;
        }
        if let Err(e) = self.surface.press_key("Escape") {
            self.note_error(&e);
        }
        self.pause_ms(self.config.modal_settle_ms);
    }

    /// Buttons whose label looks like a time of day.
    pub fn slot_controls(&mut self) -> Vec<ElementHandle> {
        self.find(&Query::role_with_text("button", TIME_SLOT.clone()))
    }

    /// Click the "jump to the next bookable date" shortcut when offered.
    pub fn click_jump_to_next_bookable(&mut self) -> bool {
        let query = Query::text(TextMatch::contains(self.config.jump_text.clone()));
        let Some(jump) = self.first(&query) else {
            return false;
        };
        let clicked = self.click_if_visible(jump);
        if clicked {
            tracing::debug!("clicked jump to next bookable date");
        }
        clicked
    }

    /// Year from the first "Month YYYY" header on the page.
    pub fn infer_page_year(&mut self) -> Option<i32> {
        let observed = self.surface.body_text();
        self.settle(observed).and_then(|body| infer_year(&body))
    }
}
