//! Error types for surface observation and discovery runs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The DOM was momentarily unavailable (re-render, detached node, eval race).
    #[error("transient surface error: {0}")]
    Transient(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The underlying page/browser is gone; nothing further will succeed.
    #[error("surface disconnected: {0}")]
    Disconnected(String),
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to load booking page {url}: {source}")]
    PageLoad {
        url: String,
        #[source]
        source: SurfaceError,
    },

    #[error("booking surface lost during discovery: {0}")]
    Surface(#[from] SurfaceError),
}
