//! In-memory booking widget and manual clock for engine tests.
//!
//! [`FakeWidget`] models a week-view calendar: a displayed week starting at
//! `week_start`, a set of bookable slots, and the banners, dialogs and
//! navigation controls the real page renders around them. Behaviour knobs
//! are builder methods; interaction counters are public fields.

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::{Datelike, Days, NaiveDate};

use crate::clock::Clock;
use crate::config::{
    DEFAULT_JUMP_TEXT, DEFAULT_NO_AVAILABILITY_TEXT, DEFAULT_NO_TIMES_NEXT_YEAR_TEXT,
    DiscoveryConfig,
};
use crate::date_parse::format_dialog_date;
use crate::error::SurfaceError;
use crate::surface::{BoundingBox, ElementHandle, Observed, Query, Selector, Surface};
use crate::types::CalendarDate;

pub(crate) fn d(y: i32, m: u32, day: u32) -> CalendarDate {
    NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
}

/// Defaults with jitter disabled so elapsed time is exact.
pub(crate) fn test_config() -> DiscoveryConfig {
    DiscoveryConfig {
        jitter_fraction: 0.0,
        ..DiscoveryConfig::default()
    }
}

// ─── Clock ───────────────────────────────────────────────────────

/// Clock whose `sleep` advances time instantly. Clones share the same time.
#[derive(Clone)]
pub(crate) struct FakeClock {
    base: Instant,
    offset: Rc<Cell<Duration>>,
}

impl FakeClock {
    pub(crate) fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }

    fn sleep(&self, duration: Duration) {
        self.offset.set(self.offset.get() + duration);
    }
}

// ─── Widget model ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Dialog,
    Cancel,
    MonthNext,
    WeekNext,
    MonthOverlay,
    Decoy(u64),
    Banner,
    NextYearNotice,
    Jump,
    Slot(usize),
}

impl Part {
    fn handle(self) -> ElementHandle {
        ElementHandle(match self {
            Self::Dialog => 1,
            Self::Cancel => 2,
            Self::MonthNext => 3,
            Self::WeekNext => 4,
            Self::MonthOverlay => 5,
            Self::Banner => 6,
            Self::NextYearNotice => 7,
            Self::Jump => 8,
            Self::Decoy(i) => 10 + i,
            Self::Slot(i) => 100 + i as u64,
        })
    }
}

struct Element {
    part: Part,
    role: Option<&'static str>,
    label: Option<String>,
    text: String,
    visible: bool,
    bbox: BoundingBox,
    parent: Option<Part>,
}

impl Element {
    fn new(part: Part, role: Option<&'static str>, text: impl Into<String>) -> Self {
        Self {
            part,
            role,
            label: None,
            text: text.into(),
            visible: true,
            bbox: at(0.0, 0.0),
            parent: None,
        }
    }

    fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn placed(mut self, bbox: BoundingBox) -> Self {
        self.bbox = bbox;
        self
    }

    fn shown(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    fn accessible_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.text)
    }

    fn matches(&self, query: &Query) -> bool {
        if let Some(scope) = query.within
            && self.parent.map(Part::handle) != Some(scope)
        {
            return false;
        }
        match &query.selector {
            Selector::Role { role, name } => {
                self.role == Some(*role)
                    && name.as_ref().is_none_or(|m| m.matches(self.accessible_name()))
            }
            Selector::RoleWithText { role, text } => {
                self.role == Some(*role) && text.matches(&self.text)
            }
            Selector::Text(m) => !self.text.is_empty() && m.matches(&self.text),
            Selector::Attribute {
                role,
                attribute,
                value,
            } => {
                self.role == Some(*role)
                    && *attribute == "aria-label"
                    && self
                        .label
                        .as_deref()
                        .is_some_and(|l| value.as_ref().is_none_or(|m| m.matches(l)))
            }
        }
    }
}

fn at(x: f64, y: f64) -> BoundingBox {
    BoundingBox {
        x,
        y,
        width: 24.0,
        height: 24.0,
    }
}

const MONTH_CONTROL_POS: (f64, f64) = (280.0, 20.0);
const WEEK_CONTROL_Y: f64 = 120.0;

fn first_of_next_month(date: CalendarDate) -> CalendarDate {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    d(y, m, 1)
}

fn monday_of(date: CalendarDate) -> CalendarDate {
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

pub(crate) struct FakeWidget {
    week_start: CalendarDate,
    slots: BTreeMap<CalendarDate, Vec<String>>,
    dialog: Option<CalendarDate>,

    dialog_text: HashMap<CalendarDate, String>,
    dialog_year_omitted: bool,
    garbled: HashSet<CalendarDate>,
    dialogs_suppressed: bool,
    hidden_slots: HashSet<usize>,
    cancel_button: bool,
    /// After this many slot clicks, only the first `.1` week slots remain.
    shrink_after: Option<(usize, usize)>,
    /// After this many slot clicks, the header shows the following month.
    header_rollover_after: Option<usize>,

    next_year_notice: bool,
    forced_next_year: bool,
    blank: bool,
    render_delay: Duration,
    clock: Option<FakeClock>,

    navigation_limit: Option<CalendarDate>,
    decoys: bool,
    month_overlay: Option<String>,
    week_control_x: f64,
    stuck_week: bool,
    jump_control: bool,

    failing_navigation: bool,
    disconnect_on_navigate: bool,
    disconnected: bool,

    pub(crate) slot_clicks: usize,
    pub(crate) month_clicks: usize,
    pub(crate) week_clicks: usize,
    pub(crate) decoy_clicks: usize,
    pub(crate) cancel_clicks: usize,
    pub(crate) escape_presses: usize,
    pub(crate) jump_clicks: usize,
}

impl FakeWidget {
    pub(crate) fn new(week_start: CalendarDate) -> Self {
        Self {
            week_start,
            slots: BTreeMap::new(),
            dialog: None,
            dialog_text: HashMap::new(),
            dialog_year_omitted: false,
            garbled: HashSet::new(),
            dialogs_suppressed: false,
            hidden_slots: HashSet::new(),
            cancel_button: true,
            shrink_after: None,
            header_rollover_after: None,
            next_year_notice: true,
            forced_next_year: false,
            blank: false,
            render_delay: Duration::ZERO,
            clock: None,
            navigation_limit: None,
            decoys: false,
            month_overlay: None,
            week_control_x: 600.0,
            stuck_week: false,
            jump_control: false,
            failing_navigation: false,
            disconnect_on_navigate: false,
            disconnected: false,
            slot_clicks: 0,
            month_clicks: 0,
            week_clicks: 0,
            decoy_clicks: 0,
            cancel_clicks: 0,
            escape_presses: 0,
            jump_clicks: 0,
        }
    }

    // ─── Builders ────────────────────────────────────────────────

    pub(crate) fn with_slot(mut self, date: CalendarDate, times: &[&str]) -> Self {
        self.slots
            .entry(date)
            .or_default()
            .extend(times.iter().map(|t| t.to_string()));
        self
    }

    pub(crate) fn with_dialog_text(mut self, date: CalendarDate, text: &str) -> Self {
        self.dialog_text.insert(date, text.to_string());
        self
    }

    pub(crate) fn with_dialog_year_omitted(mut self) -> Self {
        self.dialog_year_omitted = true;
        self
    }

    pub(crate) fn with_garbled_dialog_for(mut self, date: CalendarDate) -> Self {
        self.garbled.insert(date);
        self
    }

    pub(crate) fn with_dialogs_suppressed(mut self) -> Self {
        self.dialogs_suppressed = true;
        self
    }

    pub(crate) fn with_hidden_slot(mut self, index: usize) -> Self {
        self.hidden_slots.insert(index);
        self
    }

    /// Re-render that drops week slots once `clicks` dialogs were opened,
    /// keeping the first `keep`.
    pub(crate) fn with_slots_shrinking_after(mut self, clicks: usize, keep: usize) -> Self {
        self.shrink_after = Some((clicks, keep));
        self
    }

    /// Header flips to next month's "Month YYYY" once `clicks` dialogs were
    /// opened.
    pub(crate) fn with_header_rollover_after(mut self, clicks: usize) -> Self {
        self.header_rollover_after = Some(clicks);
        self
    }

    pub(crate) fn without_cancel_button(mut self) -> Self {
        self.cancel_button = false;
        self
    }

    pub(crate) fn with_forced_next_year_notice(mut self) -> Self {
        self.forced_next_year = true;
        self
    }

    pub(crate) fn without_next_year_notice(mut self) -> Self {
        self.next_year_notice = false;
        self
    }

    /// Nothing but the calendar chrome ever renders.
    pub(crate) fn blank(mut self) -> Self {
        self.blank = true;
        self
    }

    /// Content appears once the attached clock reaches `delay`.
    pub(crate) fn with_render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = delay;
        self
    }

    pub(crate) fn attach_clock(&mut self, clock: &FakeClock) {
        self.clock = Some(clock.clone());
    }

    /// Hide "next" controls whose target would lie past `limit`.
    pub(crate) fn with_navigation_limit(mut self, limit: CalendarDate) -> Self {
        self.navigation_limit = Some(limit);
        self
    }

    pub(crate) fn with_decoy_next_controls(mut self) -> Self {
        self.decoys = true;
        self
    }

    /// A second "next"-labelled control stacked on the month control.
    pub(crate) fn with_month_overlay(mut self, label: &str) -> Self {
        self.month_overlay = Some(label.to_string());
        self
    }

    pub(crate) fn with_week_control_at(mut self, x: f64) -> Self {
        self.week_control_x = x;
        self
    }

    /// The week control accepts clicks but the view never moves.
    pub(crate) fn with_stuck_week_control(mut self) -> Self {
        self.stuck_week = true;
        self
    }

    pub(crate) fn with_jump_control(mut self) -> Self {
        self.jump_control = true;
        self
    }

    pub(crate) fn with_failing_navigation(mut self) -> Self {
        self.failing_navigation = true;
        self
    }

    pub(crate) fn disconnect(&mut self) {
        self.disconnected = true;
    }

    pub(crate) fn disconnect_after_navigation(&mut self) {
        self.disconnect_on_navigate = true;
    }

    pub(crate) fn open_dialog_for_test(&mut self, date: CalendarDate) {
        self.dialog = Some(date);
    }

    // ─── Inspection ──────────────────────────────────────────────

    pub(crate) fn week_start(&self) -> CalendarDate {
        self.week_start
    }

    pub(crate) fn dialog_open(&self) -> bool {
        self.dialog.is_some()
    }

    // ─── Rendering ───────────────────────────────────────────────

    fn week_end(&self) -> CalendarDate {
        self.week_start + Days::new(7)
    }

    fn rendered(&self) -> bool {
        if self.blank {
            return false;
        }
        if self.render_delay.is_zero() {
            return true;
        }
        self.clock
            .as_ref()
            .is_some_and(|c| c.elapsed() >= self.render_delay)
    }

    fn week_slots(&self) -> Vec<(CalendarDate, &str)> {
        self.slots
            .range(self.week_start..self.week_end())
            .flat_map(|(date, times)| times.iter().map(move |t| (*date, t.as_str())))
            .collect()
    }

    fn keep_week_slots(&mut self, keep: usize) {
        let range = self.week_start..self.week_end();
        let mut kept = 0;
        for times in self.slots.range_mut(range).map(|(_, times)| times) {
            times.truncate(keep.saturating_sub(kept));
            kept += times.len();
        }
        self.slots.retain(|_, times| !times.is_empty());
    }

    fn header_date(&self) -> CalendarDate {
        match self.header_rollover_after {
            Some(clicks) if self.slot_clicks >= clicks => first_of_next_month(self.week_start),
            _ => self.week_start,
        }
    }

    fn shows_next_year_notice(&self) -> bool {
        if self.forced_next_year {
            return true;
        }
        let horizon = self.week_start + Days::new(365);
        self.next_year_notice && self.slots.range(self.week_start..horizon).next().is_none()
    }

    fn next_bookable(&self) -> Option<CalendarDate> {
        self.slots.range(self.week_start..).next().map(|(date, _)| *date)
    }

    fn within_limit(&self, target: CalendarDate) -> bool {
        self.navigation_limit.is_none_or(|limit| target <= limit)
    }

    fn dialog_body(&self, date: CalendarDate) -> String {
        if self.garbled.contains(&date) {
            return "Book an appointment\nCancel".to_string();
        }
        if let Some(text) = self.dialog_text.get(&date) {
            return text.clone();
        }
        format!(
            "Book an appointment\n{}\nCancel",
            format_dialog_date(date, !self.dialog_year_omitted)
        )
    }

    fn elements(&self) -> Vec<Element> {
        let mut out = Vec::new();

        let month_pos = at(MONTH_CONTROL_POS.0, MONTH_CONTROL_POS.1);
        out.push(
            Element::new(Part::MonthNext, Some("button"), "")
                .labelled("Next month")
                .placed(month_pos)
                .shown(self.within_limit(first_of_next_month(self.week_start))),
        );
        if let Some(label) = &self.month_overlay {
            out.push(
                Element::new(Part::MonthOverlay, Some("button"), "")
                    .labelled(label.clone())
                    .placed(at(month_pos.x + 1.0, month_pos.y + 1.0)),
            );
        }
        if self.decoys {
            for i in 0..2u64 {
                out.push(
                    Element::new(Part::Decoy(i), Some("button"), "")
                        .labelled("Next")
                        .placed(at(100.0 + 100.0 * i as f64, WEEK_CONTROL_Y)),
                );
            }
        }
        out.push(
            Element::new(Part::WeekNext, Some("button"), "")
                .labelled("Next week")
                .placed(at(self.week_control_x, WEEK_CONTROL_Y))
                .shown(self.within_limit(self.week_end())),
        );

        if self.rendered() {
            let next_year = self.shows_next_year_notice();
            let week = self.week_slots();
            if next_year {
                out.push(Element::new(
                    Part::NextYearNotice,
                    None,
                    DEFAULT_NO_TIMES_NEXT_YEAR_TEXT,
                ));
            } else if week.is_empty() {
                out.push(Element::new(Part::Banner, None, DEFAULT_NO_AVAILABILITY_TEXT));
                if self.jump_control && self.next_bookable().is_some() {
                    out.push(Element::new(Part::Jump, Some("button"), DEFAULT_JUMP_TEXT));
                }
            }
            for (i, (_, time)) in week.iter().enumerate() {
                out.push(
                    Element::new(Part::Slot(i), Some("button"), *time)
                        .placed(at(40.0 * i as f64, 300.0))
                        .shown(!self.hidden_slots.contains(&i)),
                );
            }
        }

        if let Some(date) = self.dialog {
            out.push(Element::new(Part::Dialog, Some("dialog"), self.dialog_body(date)));
            if self.cancel_button {
                let mut cancel = Element::new(Part::Cancel, Some("button"), "Cancel");
                cancel.parent = Some(Part::Dialog);
                out.push(cancel);
            }
        }
        out
    }

    fn lookup(&self, handle: ElementHandle) -> Option<Element> {
        self.elements().into_iter().find(|e| e.part.handle() == handle)
    }

    fn observe<T>(&self, handle: ElementHandle, f: impl FnOnce(&Element) -> Option<T>) -> Observed<T> {
        if self.disconnected {
            return Observed::Transient(SurfaceError::Disconnected("target closed".into()));
        }
        match self.lookup(handle) {
            Some(el) => f(&el).map_or(Observed::Absent, Observed::Found),
            None => Observed::Absent,
        }
    }

    fn activate(&mut self, part: Part) {
        match part {
            Part::Slot(i) => {
                self.slot_clicks += 1;
                if !self.dialogs_suppressed {
                    let date = self.week_slots().get(i).map(|(date, _)| *date);
                    self.dialog = date;
                }
                if let Some((clicks, keep)) = self.shrink_after
                    && self.slot_clicks == clicks
                {
                    self.keep_week_slots(keep);
                }
            }
            Part::Cancel => {
                self.cancel_clicks += 1;
                self.dialog = None;
            }
            Part::MonthNext => {
                self.month_clicks += 1;
                self.week_start = first_of_next_month(self.week_start);
            }
            Part::WeekNext => {
                self.week_clicks += 1;
                if !self.stuck_week {
                    self.week_start = self.week_end();
                }
            }
            Part::Jump => {
                self.jump_clicks += 1;
                if let Some(target) = self.next_bookable() {
                    self.week_start = monday_of(target);
                }
            }
            Part::Decoy(_) | Part::MonthOverlay => self.decoy_clicks += 1,
            Part::Dialog | Part::Banner | Part::NextYearNotice => {}
        }
    }
}

impl Surface for FakeWidget {
    fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<(), SurfaceError> {
        if self.disconnected {
            return Err(SurfaceError::Disconnected("target closed".into()));
        }
        if self.failing_navigation {
            return Err(SurfaceError::Navigation(format!("net::ERR_NAME_NOT_RESOLVED at {url}")));
        }
        if self.disconnect_on_navigate {
            self.disconnected = true;
        }
        Ok(())
    }

    fn find(&mut self, query: &Query) -> Result<Vec<ElementHandle>, SurfaceError> {
        if self.disconnected {
            return Err(SurfaceError::Disconnected("target closed".into()));
        }
        Ok(self
            .elements()
            .iter()
            .filter(|e| e.matches(query))
            .map(|e| e.part.handle())
            .collect())
    }

    fn is_visible(&mut self, element: ElementHandle) -> Observed<bool> {
        self.observe(element, |e| Some(e.visible))
    }

    fn click(&mut self, element: ElementHandle, _timeout: Duration) -> Observed<()> {
        let part = match self.observe(element, |e| e.visible.then_some(e.part)) {
            Observed::Found(part) => part,
            Observed::Absent => return Observed::Absent,
            Observed::Transient(e) => return Observed::Transient(e),
        };
        self.activate(part);
        Observed::Found(())
    }

    fn inner_text(&mut self, element: ElementHandle) -> Observed<String> {
        self.observe(element, |e| Some(e.text.clone()))
    }

    fn bounding_box(&mut self, element: ElementHandle) -> Observed<BoundingBox> {
        self.observe(element, |e| e.visible.then_some(e.bbox))
    }

    fn attribute(&mut self, element: ElementHandle, name: &str) -> Observed<String> {
        self.observe(element, |e| match name {
            "aria-label" => e.label.clone(),
            _ => None,
        })
    }

    fn body_text(&mut self) -> Observed<String> {
        if self.disconnected {
            return Observed::Transient(SurfaceError::Disconnected("target closed".into()));
        }
        let shown = self.header_date();
        let header = format!("{} {}", shown.format("%B"), shown.year());
        let mut body = vec![header];
        body.extend(
            self.elements()
                .into_iter()
                .filter(|e| e.visible && !e.text.is_empty())
                .map(|e| e.text),
        );
        Observed::Found(body.join("\n"))
    }

    fn press_key(&mut self, key: &str) -> Result<(), SurfaceError> {
        if self.disconnected {
            return Err(SurfaceError::Disconnected("target closed".into()));
        }
        if key == "Escape" {
            self.escape_presses += 1;
            self.dialog = None;
        }
        Ok(())
    }
}
