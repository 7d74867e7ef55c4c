//! DevTools HTTP endpoint: browser probe and tab lifecycle.
//!
//! Chromium started with `--remote-debugging-port` serves `/json/*` routes
//! next to the websocket endpoints. Each discovery run opens its own tab
//! here and closes it afterwards.

use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::error::CdpError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BrowserVersion {
    #[serde(rename = "Browser")]
    pub browser: String,
    #[serde(rename = "webSocketDebuggerUrl", default)]
    pub websocket_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TargetInfo {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub websocket_url: String,
}

/// Handle on a DevTools HTTP endpoint such as `http://127.0.0.1:9222`.
#[derive(Debug, Clone)]
pub struct DevTools {
    base: String,
    agent: ureq::Agent,
}

impl DevTools {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(20))
            .timeout_write(Duration::from_secs(20))
            .build();
        Self { base, agent }
    }

    pub fn local(port: u16) -> Self {
        Self::new(format!("http://127.0.0.1:{port}"))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}/json/{route}", self.base)
    }

    fn request(&self, verb: &str, route: &str) -> Result<String, CdpError> {
        let url = self.endpoint(route);
        let resp = self
            .agent
            .request(verb, &url)
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(..) => CdpError::Http {
                    url: url.clone(),
                    reason: e.to_string(),
                },
                ureq::Error::Transport(t) => CdpError::Unreachable {
                    url: url.clone(),
                    reason: t.to_string(),
                },
            })?;
        resp.into_string().map_err(|e| CdpError::Http {
            url: url.clone(),
            reason: e.to_string(),
        })
    }

    pub fn version(&self) -> Result<BrowserVersion, CdpError> {
        parse_json(&self.request("GET", "version")?)
    }

    /// Poll `/json/version` until the browser answers or `timeout` passes.
    pub fn wait_ready(&self, timeout: Duration) -> Result<BrowserVersion, CdpError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.version() {
                Ok(version) => return Ok(version),
                Err(e) if Instant::now() >= deadline => return Err(e),
                Err(e) => {
                    tracing::trace!("DevTools not ready yet: {e}");
                    std::thread::sleep(Duration::from_millis(200));
                }
            }
        }
    }

    /// Open a blank tab. Recent Chromium only accepts PUT here.
    pub fn open_tab(&self) -> Result<TargetInfo, CdpError> {
        let target: TargetInfo = parse_json(&self.request("PUT", "new?about:blank")?)?;
        tracing::debug!(id = %target.id, "opened tab");
        Ok(target)
    }

    pub fn close_tab(&self, id: &str) -> Result<(), CdpError> {
        self.request("GET", &format!("close/{id}"))?;
        tracing::debug!(id, "closed tab");
        Ok(())
    }
}

fn parse_json<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, CdpError> {
    serde_json::from_str(body).map_err(|e| CdpError::Protocol(format!("unexpected DevTools reply: {e}")))
}
