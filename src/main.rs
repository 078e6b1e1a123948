//! concert-watch — get a push the moment concert tickets go on sale.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌───────────┐ Response ┌────────────┐ message ┌───────────┐
//! │ source/   │ ───────► │ monitor.rs │ ──────► │ notify/   │
//! │ (fetch +  │          │ (loop +    │         │ (gateway) │
//! │ classify) │          │  state)    │         └───────────┘
//! └───────────┘          └────────────┘
//!                              ▲
//!                              │ gen()
//!                         ┌──────────┐
//!                         │ delay.rs │
//!                         └──────────┘
//! ```
//!
//! * **`config`** — loads and validates the JSON config file.
//! * **`source/`** — the `Fetch` trait, the HTTP implementation, and the
//!   feed classifier.
//! * **`notify/`** — the `Notify` trait and the WxPusher gateway client.
//! * **`delay`** — fixed or gamma-distributed pauses between checks.
//! * **`monitor`** — the watch list, open/closed state, and the endless
//!   polling loop.
//! * **`main`** — parses arguments, sets up logging, wires everything
//!   together, and hands control to the monitor.

mod config;
mod delay;
mod error;
mod monitor;
mod notify;
mod source;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use config::Config;
use monitor::Monitor;
use notify::WxPusher;
use source::HttpSource;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the JSON config file.
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Validate the config, print the watch list, and exit.
    #[arg(long)]
    check: bool,
}

fn init_logging() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let config = Config::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    if args.check {
        println!("config ok, watching {} concert(s):", config.concerts.len());
        for concert in &config.concerts {
            println!("  {}  {}", concert.name, concert.url);
        }
        return Ok(());
    }

    let timeout = config.timeout();
    let source = HttpSource::new(timeout).context("building feed client")?;
    let notifier = WxPusher::new(&config.wx_push, timeout).context("building push client")?;
    let inner = config.duration.inner.build().context("duration.inner")?;
    let outer = config.duration.outer.build().context("duration.outer")?;

    info!(
        "watching {} concert(s), timeout {:.1}s",
        config.concerts.len(),
        timeout.as_secs_f64()
    );

    let mut monitor = Monitor::new(config.concerts, source, notifier, inner, outer);
    monitor.run()
}
