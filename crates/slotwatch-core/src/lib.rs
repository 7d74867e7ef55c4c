//! slotwatch-core: earliest-availability discovery for a calendar booking widget.
//!
//! The booking widget exposes no API, so availability is inferred by driving
//! its UI through the [`Surface`] capability: reading status banners, opening
//! time-slot dialogs and parsing the date back out of free-form text.
//!
//! Layering (leaf-first): `surface` / `clock` → `status` / `date_parse` →
//! `probe` → `nav` → `scan` → `discover` → `poll`.
//! No async, no network: every IO edge is a trait supplied by the caller.

pub mod clock;
pub mod config;
pub mod date_parse;
pub mod discover;
pub mod error;
pub mod nav;
pub mod poll;
pub mod probe;
pub mod scan;
pub mod session;
pub mod status;
pub mod surface;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::{Clock, Jitter, SystemClock};
pub use config::{ConfigError, DiscoveryConfig};
pub use discover::discover_earliest;
pub use error::{DiscoveryError, SurfaceError};
pub use poll::{Notification, Notifier, NotifyError, PollOptions, PollState, poll_cycle, run_poll_loop};
pub use surface::{BoundingBox, ElementHandle, Observed, Query, Selector, Surface, TextMatch};
pub use types::{AvailabilityResult, CalendarDate, MonthKey, ResultSource, Status};
