//! Discovery tuning parameters.
//!
//! Read once at startup by the caller; the engine treats them as plain
//! parameters. Defaults are tuned for the Google Calendar appointment page.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_NO_TIMES_NEXT_YEAR_TEXT: &str = "No available times in the next year";
pub const DEFAULT_NO_AVAILABILITY_TEXT: &str = "No availability during these dates";
pub const DEFAULT_JUMP_TEXT: &str = "Jump to the next bookable date";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("jitter_fraction must be in [0, 1), got {0}")]
    JitterOutOfRange(f64),

    #[error("{0} must be at least 1")]
    ZeroBound(&'static str),

    #[error("{0} must not be empty")]
    EmptyMarker(&'static str),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    pub page_load_timeout_ms: u64,
    /// Upper bound for one status classification.
    pub status_timeout_ms: u64,
    pub status_poll_ms: u64,

    pub max_month_forward: u32,
    pub max_weeks_per_month: u32,
    pub max_slot_clicks_per_week: u32,
    /// Slot clicks used for the shallow probe that seeds the target month.
    pub seed_slot_clicks: u32,
    /// Week steps tried when a month opens without visible times.
    pub week_probe_steps: u32,
    /// Months to skip on the "no times in the next year" notice.
    pub fast_forward_months: u32,

    pub week_step_pause_ms: u64,
    pub month_step_pause_ms: u64,
    pub modal_settle_ms: u64,
    pub slot_settle_ms: u64,
    pub slot_click_timeout_ms: u64,
    pub jump_settle_ms: u64,
    pub fast_forward_settle_ms: u64,

    pub jitter_fraction: f64,

    pub no_times_next_year_text: String,
    pub no_availability_text: String,
    pub jump_text: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            page_load_timeout_ms: 60_000,
            status_timeout_ms: 8_500,
            status_poll_ms: 60,
            max_month_forward: 48,
            max_weeks_per_month: 10,
            max_slot_clicks_per_week: 3,
            seed_slot_clicks: 2,
            week_probe_steps: 3,
            fast_forward_months: 10,
            week_step_pause_ms: 130,
            month_step_pause_ms: 180,
            modal_settle_ms: 80,
            slot_settle_ms: 120,
            slot_click_timeout_ms: 2_500,
            jump_settle_ms: 220,
            fast_forward_settle_ms: 800,
            jitter_fraction: 0.10,
            no_times_next_year_text: DEFAULT_NO_TIMES_NEXT_YEAR_TEXT.to_string(),
            no_availability_text: DEFAULT_NO_AVAILABILITY_TEXT.to_string(),
            jump_text: DEFAULT_JUMP_TEXT.to_string(),
        }
    }
}

impl DiscoveryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.jitter_fraction) {
            return Err(ConfigError::JitterOutOfRange(self.jitter_fraction));
        }
        if self.max_weeks_per_month == 0 {
            return Err(ConfigError::ZeroBound("max_weeks_per_month"));
        }
        if self.max_slot_clicks_per_week == 0 {
            return Err(ConfigError::ZeroBound("max_slot_clicks_per_week"));
        }
        for (name, text) in [
            ("no_times_next_year_text", &self.no_times_next_year_text),
            ("no_availability_text", &self.no_availability_text),
            ("jump_text", &self.jump_text),
        ] {
            if text.trim().is_empty() {
                return Err(ConfigError::EmptyMarker(name));
            }
        }
        Ok(())
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.page_load_timeout_ms)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms)
    }

    /// Clicks for the seeding probe: never more than the per-week cap.
    pub fn seed_clicks(&self) -> u32 {
        self.seed_slot_clicks.min(self.max_slot_clicks_per_week)
    }
}
