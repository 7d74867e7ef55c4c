//! Browser handle: an attached or launched Chromium that hands out tabs.

use crate::devtools::DevTools;
use crate::error::CdpError;
use crate::launcher::{ChromeProcess, LaunchOptions};
use crate::page::CdpPage;
use crate::transport::WsTransport;

pub struct Browser {
    devtools: DevTools,
    /// Present when we started the browser ourselves; killed with it.
    _process: Option<ChromeProcess>,
}

impl Browser {
    /// Attach to an already running browser's DevTools endpoint.
    pub fn connect(devtools_url: &str) -> Result<Self, CdpError> {
        let devtools = DevTools::new(devtools_url);
        let version = devtools.version()?;
        tracing::info!(browser = %version.browser, endpoint = devtools.base(), "attached to browser");
        Ok(Self {
            devtools,
            _process: None,
        })
    }

    pub fn launch(options: &LaunchOptions) -> Result<Self, CdpError> {
        let process = ChromeProcess::launch(options)?;
        Ok(Self {
            devtools: process.devtools().clone(),
            _process: Some(process),
        })
    }

    /// Open a fresh tab with its own websocket connection.
    pub fn open_tab(&self) -> Result<Tab, CdpError> {
        let target = self.devtools.open_tab()?;
        let attached = WsTransport::connect(&target.websocket_url).and_then(CdpPage::attach);
        match attached {
            Ok(page) => Ok(Tab {
                page,
                devtools: self.devtools.clone(),
                target_id: target.id,
            }),
            Err(e) => {
                if let Err(close_err) = self.devtools.close_tab(&target.id) {
                    tracing::debug!("failed to close half-opened tab: {close_err}");
                }
                Err(e)
            }
        }
    }
}

/// One page target. Closed when dropped.
pub struct Tab {
    page: CdpPage<WsTransport>,
    devtools: DevTools,
    target_id: String,
}

impl Tab {
    pub fn page(&mut self) -> &mut CdpPage<WsTransport> {
        &mut self.page
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }
}

impl Drop for Tab {
    fn drop(&mut self) {
        if let Err(e) = self.devtools.close_tab(&self.target_id) {
            tracing::warn!(target_id = %self.target_id, "failed to close tab: {e}");
        }
    }
}
