use std::time::Duration;

use slotwatch_core::SurfaceError;

#[derive(Debug, thiserror::Error)]
pub enum CdpError {
    #[error("DevTools HTTP request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    /// Nothing answered at the DevTools address (browser gone or restarting).
    #[error("DevTools endpoint {url} unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("failed to connect to DevTools websocket {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("CDP protocol error: {0}")]
    Protocol(String),

    /// The browser answered with a JSON-RPC error object.
    #[error("CDP command {method} failed ({code}): {message}")]
    Command {
        method: String,
        code: i64,
        message: String,
    },

    #[error("CDP command {method} timed out after {duration:?}")]
    Timeout { method: String, duration: Duration },

    #[error("JavaScript exception: {0}")]
    JsException(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("DevTools connection closed")]
    Closed,

    #[error("failed to launch browser {bin}: {source}")]
    Launch {
        bin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CdpError {
    /// True when the page or browser is gone and retrying is pointless.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Self::Closed
                | Self::Connect { .. }
                | Self::Unreachable { .. }
                | Self::Io(_)
                | Self::Launch { .. }
        )
    }
}

impl From<CdpError> for SurfaceError {
    fn from(err: CdpError) -> Self {
        match err {
            CdpError::Navigation(reason) => SurfaceError::Navigation(reason),
            e if e.is_disconnect() => SurfaceError::Disconnected(e.to_string()),
            e => SurfaceError::Transient(e.to_string()),
        }
    }
}
