//! Surface capability: the only way the core touches the booking page.
//!
//! Implementations wrap a browser-automation engine. "Not found" is a normal
//! outcome here: `find` returns an empty set and element operations return
//! [`Observed::Absent`] rather than an error.

use std::time::Duration;

use regex::{Regex, RegexBuilder};

use crate::error::SurfaceError;

// ─── Elements ────────────────────────────────────────────────────

/// Opaque reference to an element resolved by [`Surface::find`].
///
/// Handles may go stale when the widget re-renders; operations on a stale
/// handle report [`Observed::Absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

/// Element geometry in CSS pixels, relative to the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// True when both origins are within `tolerance` pixels of each other.
    pub fn near(&self, other: &BoundingBox, tolerance: f64) -> bool {
        (self.x - other.x).abs() < tolerance && (self.y - other.y).abs() < tolerance
    }
}

// ─── Observation result ──────────────────────────────────────────

/// Outcome of a single observation against a live, re-rendering page.
#[derive(Debug)]
pub enum Observed<T> {
    Found(T),
    Absent,
    Transient(SurfaceError),
}

impl<T> Observed<T> {
    /// Collapse to `Option`, treating transient failures as absence.
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(v) => Some(v),
            Self::Absent | Self::Transient(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Observed<U> {
        match self {
            Self::Found(v) => Observed::Found(f(v)),
            Self::Absent => Observed::Absent,
            Self::Transient(e) => Observed::Transient(e),
        }
    }
}

impl<T> From<Result<Option<T>, SurfaceError>> for Observed<T> {
    fn from(r: Result<Option<T>, SurfaceError>) -> Self {
        match r {
            Ok(Some(v)) => Self::Found(v),
            Ok(None) => Self::Absent,
            Err(e) => Self::Transient(e),
        }
    }
}

// ─── Queries ─────────────────────────────────────────────────────

/// Case-insensitive text predicate.
#[derive(Debug, Clone)]
pub enum TextMatch {
    /// Substring match after whitespace normalisation.
    Contains(String),
    /// Regular expression, compiled case-insensitively. The source is kept
    /// JS-compatible so backends can evaluate it in-page.
    Pattern(Regex),
}

impl TextMatch {
    pub fn contains(text: impl Into<String>) -> Self {
        Self::Contains(text.into())
    }

    pub fn pattern(source: &str) -> Result<Self, regex::Error> {
        RegexBuilder::new(source)
            .case_insensitive(true)
            .build()
            .map(Self::Pattern)
    }

    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::Contains(needle) => {
                normalize_ws(text)
                    .to_lowercase()
                    .contains(&normalize_ws(needle).to_lowercase())
            }
            Self::Pattern(re) => re.is_match(text),
        }
    }
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn normalize_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone)]
pub enum Selector {
    /// Elements with an explicit or implicit ARIA role, optionally filtered
    /// by accessible name (aria-label, else rendered text).
    Role {
        role: &'static str,
        name: Option<TextMatch>,
    },
    /// Elements with a role whose rendered text matches.
    RoleWithText { role: &'static str, text: TextMatch },
    /// Innermost elements whose rendered text matches.
    Text(TextMatch),
    /// Elements with a role carrying `attribute`, optionally matching a value.
    Attribute {
        role: &'static str,
        attribute: &'static str,
        value: Option<TextMatch>,
    },
}

/// A selector, optionally scoped to descendants of a previously found element.
#[derive(Debug, Clone)]
pub struct Query {
    pub selector: Selector,
    pub within: Option<ElementHandle>,
}

impl Query {
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            within: None,
        }
    }

    pub fn role(role: &'static str) -> Self {
        Self::new(Selector::Role { role, name: None })
    }

    pub fn role_named(role: &'static str, name: TextMatch) -> Self {
        Self::new(Selector::Role {
            role,
            name: Some(name),
        })
    }

    pub fn role_with_text(role: &'static str, text: TextMatch) -> Self {
        Self::new(Selector::RoleWithText { role, text })
    }

    pub fn text(text: TextMatch) -> Self {
        Self::new(Selector::Text(text))
    }

    pub fn attribute(
        role: &'static str,
        attribute: &'static str,
        value: Option<TextMatch>,
    ) -> Self {
        Self::new(Selector::Attribute {
            role,
            attribute,
            value,
        })
    }

    #[must_use]
    pub fn within(mut self, scope: ElementHandle) -> Self {
        self.within = Some(scope);
        self
    }
}

// ─── Capability ──────────────────────────────────────────────────

/// Browser-page capability consumed by the discovery engine.
///
/// Calls are synchronous and may block. Waiting between calls is the
/// caller's job (see [`crate::clock::Clock`]).
pub trait Surface {
    /// Load `url` and wait for it to settle, bounded by `timeout`.
    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), SurfaceError>;

    /// Resolve all elements matching `query`, in document order.
    fn find(&mut self, query: &Query) -> Result<Vec<ElementHandle>, SurfaceError>;

    fn is_visible(&mut self, element: ElementHandle) -> Observed<bool>;

    fn click(&mut self, element: ElementHandle, timeout: Duration) -> Observed<()>;

    fn inner_text(&mut self, element: ElementHandle) -> Observed<String>;

    fn bounding_box(&mut self, element: ElementHandle) -> Observed<BoundingBox>;

    fn attribute(&mut self, element: ElementHandle, name: &str) -> Observed<String>;

    /// Rendered text of the whole document body.
    fn body_text(&mut self) -> Observed<String>;

    fn press_key(&mut self, key: &str) -> Result<(), SurfaceError>;
}

impl<T: Surface + ?Sized> Surface for &mut T {
    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), SurfaceError> {
        (**self).navigate(url, timeout)
    }

    fn find(&mut self, query: &Query) -> Result<Vec<ElementHandle>, SurfaceError> {
        (**self).find(query)
    }

    fn is_visible(&mut self, element: ElementHandle) -> Observed<bool> {
        (**self).is_visible(element)
    }

    fn click(&mut self, element: ElementHandle, timeout: Duration) -> Observed<()> {
        (**self).click(element, timeout)
    }

    fn inner_text(&mut self, element: ElementHandle) -> Observed<String> {
        (**self).inner_text(element)
    }

    fn bounding_box(&mut self, element: ElementHandle) -> Observed<BoundingBox> {
        (**self).bounding_box(element)
    }

    fn attribute(&mut self, element: ElementHandle, name: &str) -> Observed<String> {
        (**self).attribute(element, name)
    }

    fn body_text(&mut self) -> Observed<String> {
        (**self).body_text()
    }

    fn press_key(&mut self, key: &str) -> Result<(), SurfaceError> {
        (**self).press_key(key)
    }
}
