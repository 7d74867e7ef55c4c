//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "slotwatch",
    about = "Watch a booking calendar for the earliest bookable date"
)]
pub struct Cli {
    /// TOML file with [discovery] and [watch] tables
    #[arg(long, global = true, env = "SLOTWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Default log level to debug (SLOTWATCH_LOG / RUST_LOG still win)
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(flatten)]
    pub browser: BrowserOpts,

    #[command(flatten)]
    pub tuning: TuningOpts,

    #[command(flatten)]
    pub watch: WatchOpts,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Poll the booking page forever and notify on new earliest dates (default)
    Watch,
    /// Run discovery once per URL and print the results
    Once(OnceOpts),
}

#[derive(Args, Default, Clone)]
pub struct WatchOpts {
    /// Booking page URL
    #[arg(long, global = true, env = "BOOKING_URL")]
    pub url: Option<String>,

    /// Seconds between discovery runs
    #[arg(long, global = true, env = "SLOTWATCH_POLL_SECONDS")]
    pub poll_seconds: Option<u64>,

    /// Notify on every successful run, not only when the date changes
    #[arg(long, global = true, env = "SLOTWATCH_NOTIFY_EVERY")]
    pub notify_every: bool,

    /// External command run as `<cmd> <title> <message>` per notification
    #[arg(long, global = true, env = "SLOTWATCH_NOTIFY_CMD")]
    pub notify_cmd: Option<String>,
}

#[derive(Args, Clone)]
pub struct OnceOpts {
    /// Booking page URLs, searched one after another
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Print one JSON object per URL
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct BrowserOpts {
    /// Attach to a running browser's DevTools endpoint instead of launching one
    #[arg(long, global = true, env = "SLOTWATCH_DEVTOOLS_URL")]
    pub devtools_url: Option<String>,

    /// Chromium binary to launch
    #[arg(long, global = true, env = "SLOTWATCH_CHROME_BIN", default_value = "chromium")]
    pub chrome_bin: String,

    /// Remote-debugging port for a launched browser
    #[arg(long, global = true, env = "SLOTWATCH_DEBUG_PORT", default_value_t = 9222)]
    pub debug_port: u16,

    /// Run a launched browser headless
    #[arg(
        long,
        global = true,
        env = "HEADLESS",
        default_value_t = true,
        value_parser = BoolishValueParser::new(),
        action = clap::ArgAction::Set
    )]
    pub headless: bool,

    /// Profile directory for a launched browser
    #[arg(long, global = true, env = "SLOTWATCH_USER_DATA_DIR")]
    pub user_data_dir: Option<PathBuf>,
}

/// Per-flag overrides of the discovery tuning file.
#[derive(Args, Default, Clone)]
pub struct TuningOpts {
    /// Page load timeout in milliseconds
    #[arg(long, global = true, env = "SLOTWATCH_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Months to advance before giving up
    #[arg(long, global = true, env = "SLOTWATCH_MAX_MONTH_FORWARD")]
    pub max_month_forward: Option<u32>,

    /// Week steps per scanned month
    #[arg(long, global = true, env = "SLOTWATCH_MAX_WEEKS_PER_MONTH")]
    pub max_weeks_per_month: Option<u32>,

    /// Slot dialogs opened per week
    #[arg(long, global = true, env = "SLOTWATCH_MAX_SLOT_CLICKS")]
    pub max_slot_clicks: Option<u32>,

    /// Random variation applied to waits, as a fraction
    #[arg(long, global = true, env = "SLOTWATCH_JITTER")]
    pub jitter: Option<f64>,
}
