use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A bookable calendar date as recovered from a slot dialog.
pub type CalendarDate = NaiveDate;

// ─── Status ───────────────────────────────────────────────────────

/// Classification of what the booking widget is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// At least one time-slot control is rendered.
    Times,
    /// "No availability during these dates" for the displayed window.
    NoAvailability,
    /// "No available times in the next year".
    NoTimesNextYear,
    Timeout,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Times => "times",
            Self::NoAvailability => "noavail",
            Self::NoTimesNextYear => "nxty",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── MonthKey ─────────────────────────────────────────────────────

/// The (year, month) a month scan is confined to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: CalendarDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(self, date: CalendarDate) -> bool {
        Self::of(date) == self
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ─── Result ───────────────────────────────────────────────────────

/// How a result date was obtained.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// Minimum over dates read back from opened slot dialogs.
    #[default]
    ModalDateMin,
}

impl ResultSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ModalDateMin => "modal_date_min",
        }
    }
}

impl fmt::Display for ResultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final output of one discovery run. Never mutated after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AvailabilityResult {
    pub iso_date: CalendarDate,
    pub source: ResultSource,
}

impl AvailabilityResult {
    pub fn new(iso_date: CalendarDate, source: ResultSource) -> Self {
        Self { iso_date, source }
    }

    /// ISO-8601 (`YYYY-MM-DD`) rendering of the date.
    pub fn iso(&self) -> String {
        self.iso_date.format("%Y-%m-%d").to_string()
    }
}

// ─── Tests ──────────────────────────────────────────────────────
