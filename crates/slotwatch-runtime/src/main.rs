//! slotwatch: watches a booking calendar widget for its earliest bookable date.
//!
//! Drives a Chromium tab over the DevTools protocol, runs the discovery engine
//! from `slotwatch-core`, and notifies when the earliest date changes.

use clap::Parser;

mod browser;
mod cli;
mod config;
mod notify;
mod once;
mod watch;

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = std::env::var("SLOTWATCH_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    init_tracing(args.debug);

    let file = config::load_file(args.config.as_deref())?;
    let discovery = config::resolve_discovery(file.discovery, &args.tuning)?;

    match args.command.unwrap_or(cli::Command::Watch) {
        cli::Command::Watch => {
            let settings = config::resolve_watch(file.watch, &args.watch)?;
            tracing::info!("slotwatch starting");
            watch::run(args.browser, discovery, settings).await?;
        }
        cli::Command::Once(opts) => {
            let browser_opts = args.browser;
            let failures = tokio::task::spawn_blocking(move || {
                once::run(&browser_opts, &discovery, &opts)
            })
            .await??;
            if failures > 0 {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
