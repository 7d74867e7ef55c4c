//! slotwatch-cdp: the booking-page surface over the Chrome DevTools Protocol.
//!
//! Everything here is blocking. Callers running inside an async runtime
//! should drive it from a blocking task.

pub mod browser;
pub mod devtools;
pub mod error;
pub mod launcher;
pub mod page;
pub mod protocol;
pub mod script;
pub mod transport;

pub use browser::{Browser, Tab};
pub use devtools::DevTools;
pub use error::CdpError;
pub use launcher::{ChromeProcess, LaunchOptions};
pub use page::CdpPage;
pub use transport::{CdpTransport, WsTransport};
