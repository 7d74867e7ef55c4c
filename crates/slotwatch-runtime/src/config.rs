//! Startup configuration: optional TOML file layered under CLI flags and
//! environment variables.
//!
//! ```toml
//! [discovery]
//! max_month_forward = 24
//! jitter_fraction = 0.05
//!
//! [watch]
//! url = "https://calendar.example/appointments"
//! poll_seconds = 300
//! notify_every = false
//! notify_cmd = "notify-send"
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use slotwatch_core::DiscoveryConfig;

use crate::cli::{TuningOpts, WatchOpts};

pub const DEFAULT_POLL_SECONDS: u64 = 120;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub watch: WatchFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchFile {
    pub url: Option<String>,
    pub poll_seconds: Option<u64>,
    pub notify_every: Option<bool>,
    pub notify_cmd: Option<String>,
}

/// Fully resolved `watch` settings.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchSettings {
    pub url: Option<String>,
    pub interval: Duration,
    pub only_on_change: bool,
    pub notify_cmd: Option<String>,
}

/// Read `path` when given; no file means all defaults.
pub fn load_file(path: Option<&Path>) -> anyhow::Result<FileConfig> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
}

/// Apply per-flag overrides on top of the file values, then validate.
pub fn resolve_discovery(
    mut discovery: DiscoveryConfig,
    tuning: &TuningOpts,
) -> anyhow::Result<DiscoveryConfig> {
    if let Some(ms) = tuning.timeout_ms {
        discovery.page_load_timeout_ms = ms;
    }
    if let Some(n) = tuning.max_month_forward {
        discovery.max_month_forward = n;
    }
    if let Some(n) = tuning.max_weeks_per_month {
        discovery.max_weeks_per_month = n;
    }
    if let Some(n) = tuning.max_slot_clicks {
        discovery.max_slot_clicks_per_week = n;
    }
    if let Some(f) = tuning.jitter {
        discovery.jitter_fraction = f;
    }
    discovery.validate().context("invalid discovery settings")?;
    Ok(discovery)
}

pub fn resolve_watch(file: WatchFile, cli: &WatchOpts) -> anyhow::Result<WatchSettings> {
    let poll_seconds = cli
        .poll_seconds
        .or(file.poll_seconds)
        .unwrap_or(DEFAULT_POLL_SECONDS);
    if poll_seconds == 0 {
        anyhow::bail!("poll interval must be at least 1 second");
    }
    let notify_every = cli.notify_every || file.notify_every.unwrap_or(false);
    Ok(WatchSettings {
        url: cli.url.clone().or(file.url),
        interval: Duration::from_secs(poll_seconds),
        only_on_change: !notify_every,
        notify_cmd: cli.notify_cmd.clone().or(file.notify_cmd),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(body.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn missing_path_gives_defaults() {
        let cfg = load_file(None).expect("defaults");
        assert_eq!(cfg.discovery, DiscoveryConfig::default());
        assert!(cfg.watch.url.is_none());
    }

    #[test]
    fn file_values_are_read() {
        let file = write_config(
            r#"
[discovery]
max_month_forward = 12
jump_text = "Go to next available"

[watch]
url = "https://calendar.example/book"
poll_seconds = 300
"#,
        );
        let cfg = load_file(Some(file.path())).expect("loads");
        assert_eq!(cfg.discovery.max_month_forward, 12);
        assert_eq!(cfg.discovery.jump_text, "Go to next available");
        // untouched keys keep their defaults
        assert_eq!(cfg.discovery.max_weeks_per_month, 10);
        assert_eq!(cfg.watch.poll_seconds, Some(300));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = write_config("[discovery]\nmax_months = 3\n");
        let err = load_file(Some(file.path())).expect_err("unknown key");
        assert!(format!("{err:#}").contains("max_months"), "{err:#}");
    }

    #[test]
    fn unreadable_file_names_the_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("absent.toml");
        let err = load_file(Some(&path)).expect_err("missing file");
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn flags_override_file() {
        let base = DiscoveryConfig {
            max_month_forward: 12,
            page_load_timeout_ms: 5_000,
            ..Default::default()
        };
        let tuning = TuningOpts {
            max_month_forward: Some(3),
            jitter: Some(0.0),
            ..Default::default()
        };
        let cfg = resolve_discovery(base, &tuning).expect("valid");
        assert_eq!(cfg.max_month_forward, 3);
        assert_eq!(cfg.jitter_fraction, 0.0);
        assert_eq!(cfg.page_load_timeout_ms, 5_000);
    }

    #[test]
    fn override_is_validated() {
        let tuning = TuningOpts {
            max_weeks_per_month: Some(0),
            ..Default::default()
        };
        let err = resolve_discovery(DiscoveryConfig::default(), &tuning).expect_err("invalid");
        assert!(format!("{err:#}").contains("max_weeks_per_month"), "{err:#}");
    }

    #[test]
    fn watch_defaults() {
        let settings = resolve_watch(WatchFile::default(), &WatchOpts::default()).expect("valid");
        assert_eq!(settings.interval, Duration::from_secs(DEFAULT_POLL_SECONDS));
        assert!(settings.only_on_change);
        assert!(settings.url.is_none());
    }

    #[test]
    fn watch_cli_wins_over_file() {
        let file = WatchFile {
            url: Some("https://file.example".into()),
            poll_seconds: Some(600),
            notify_every: None,
            notify_cmd: Some("notify-send".into()),
        };
        let cli = WatchOpts {
            url: Some("https://cli.example".into()),
            notify_every: true,
            ..Default::default()
        };
        let settings = resolve_watch(file, &cli).expect("valid");
        assert_eq!(settings.url.as_deref(), Some("https://cli.example"));
        assert_eq!(settings.interval, Duration::from_secs(600));
        assert!(!settings.only_on_change);
        assert_eq!(settings.notify_cmd.as_deref(), Some("notify-send"));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let cli = WatchOpts {
            poll_seconds: Some(0),
            ..Default::default()
        };
        assert!(resolve_watch(WatchFile::default(), &cli).is_err());
    }
}
