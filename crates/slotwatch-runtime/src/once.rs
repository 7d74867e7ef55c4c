//! `slotwatch once`: one discovery per URL, results on stdout.

use serde::Serialize;
use slotwatch_core::{AvailabilityResult, DiscoveryConfig, DiscoveryError};

use crate::browser::{discover_in_tab, open_browser};
use crate::cli::{BrowserOpts, OnceOpts};

#[derive(Debug, Serialize)]
struct Report<'a> {
    url: &'a str,
    iso_date: Option<String>,
    source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn render(
    url: &str,
    outcome: &Result<Option<AvailabilityResult>, DiscoveryError>,
    json: bool,
) -> anyhow::Result<String> {
    if json {
        let report = match outcome {
            Ok(found) => Report {
                url,
                iso_date: found.as_ref().map(AvailabilityResult::iso),
                source: found.as_ref().map(|r| r.source.to_string()),
                error: None,
            },
            Err(e) => Report {
                url,
                iso_date: None,
                source: None,
                error: Some(e.to_string()),
            },
        };
        return Ok(serde_json::to_string(&report)?);
    }
    Ok(match outcome {
        Ok(Some(result)) => format!("{url}: {} (source={})", result.iso(), result.source),
        Ok(None) => format!("{url}: no availability"),
        Err(e) => format!("{url}: error: {e}"),
    })
}

/// Runs the URLs in order against one browser. Returns how many failed.
pub fn run(
    browser_opts: &BrowserOpts,
    discovery: &DiscoveryConfig,
    opts: &OnceOpts,
) -> anyhow::Result<usize> {
    let browser = open_browser(browser_opts)?;
    let mut failures = 0;
    for url in &opts.urls {
        let outcome = discover_in_tab(&browser, discovery, url);
        if let Err(e) = &outcome {
            tracing::warn!(url = %url, "discovery failed: {e}");
            failures += 1;
        }
        println!("{}", render(url, &outcome, opts.json)?);
    }
    Ok(failures)
}
