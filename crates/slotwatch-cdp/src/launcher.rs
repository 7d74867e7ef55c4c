//! Local Chromium process with a remote-debugging port.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use crate::devtools::DevTools;
use crate::error::CdpError;

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub bin: String,
    pub port: u16,
    pub headless: bool,
    /// Profile directory; a per-port directory under the temp dir when unset.
    pub user_data_dir: Option<PathBuf>,
    pub startup_timeout: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            bin: "chromium".to_string(),
            port: 9222,
            headless: true,
            user_data_dir: None,
            startup_timeout: Duration::from_secs(20),
        }
    }
}

impl LaunchOptions {
    fn profile_dir(&self) -> PathBuf {
        self.user_data_dir.clone().unwrap_or_else(|| {
            std::env::temp_dir().join(format!("slotwatch-profile-{}", self.port))
        })
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.port),
            format!("--user-data-dir={}", self.profile_dir().display()),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-background-networking".to_string(),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        args.push("about:blank".to_string());
        args
    }
}

/// A browser we started. Killed on drop.
pub struct ChromeProcess {
    child: Child,
    devtools: DevTools,
}

impl ChromeProcess {
    pub fn launch(options: &LaunchOptions) -> Result<Self, CdpError> {
        tracing::info!(bin = %options.bin, port = options.port, headless = options.headless, "launching browser");
        let child = Command::new(&options.bin)
            .args(options.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| CdpError::Launch {
                bin: options.bin.clone(),
                source,
            })?;
        let mut process = Self {
            child,
            devtools: DevTools::local(options.port),
        };
        match process.devtools.wait_ready(options.startup_timeout) {
            Ok(version) => {
                tracing::info!(browser = %version.browser, "browser ready");
                Ok(process)
            }
            Err(e) => {
                process.shutdown();
                Err(e)
            }
        }
    }

    pub fn devtools(&self) -> &DevTools {
        &self.devtools
    }

    fn shutdown(&mut self) {
        if let Err(e) = self.child.kill() {
            tracing::debug!("browser already exited: {e}");
        }
        let _ = self.child.wait();
    }
}

impl Drop for ChromeProcess {
    fn drop(&mut self) {
        self.shutdown();
    }
}
