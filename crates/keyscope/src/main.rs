//! keyscope — key event monitor.
//!
//! Puts the console into raw input mode and prints every key press until
//! interrupted (or until `--count` events have been shown).  Useful for
//! finding out which virtual key code, scan code and modifier mask a key
//! produces on a given keyboard layout.
//!
//! # Usage
//!
//! ```text
//! keyscope [OPTIONS]
//!
//! Options:
//!   --config <PATH>     Config file [env: KEYSCOPE_CONFIG]
//!   --mode <MODE>       combine | single | raw
//!   --format <FORMAT>   text | json
//!   --count <N>         Stop after N events
//!   --restore-mode      Restore the console mode on exit
//! ```
//!
//! Flags override the config file.  Logs go to stderr; `RUST_LOG` overrides
//! the configured `log_level`.

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use keyscope::application::monitor::{run_monitor, MonitorOptions, OutputFormat, ReadMode};
use keyscope::infrastructure::console::open_key_scope;
use keyscope::infrastructure::storage::config::{load_config, load_config_from};

/// Print raw console key events.
#[derive(Debug, Parser)]
#[command(name = "keyscope", about = "Print raw console key events", version)]
struct Cli {
    /// Path to the TOML config file.  Defaults to the platform config dir.
    #[arg(long, env = "KEYSCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// Which read to loop on.
    #[arg(long, value_enum)]
    mode: Option<ReadMode>,

    /// Output format.
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Stop after this many events.
    #[arg(long)]
    count: Option<u64>,

    /// Put the console back into its original mode on exit, including Ctrl+C.
    #[arg(long)]
    restore_mode: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("failed to load configuration")?;

    // Logs go to stderr so stdout carries only events.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    if cli.restore_mode {
        config.console.restore_mode_on_drop = true;
    }
    let options = MonitorOptions {
        mode: cli.mode.unwrap_or(config.monitor.mode),
        format: cli.format.unwrap_or(config.monitor.format),
        max_events: cli.count,
    };

    let mut scope = open_key_scope(&config.console).context("failed to open console input")?;
    info!("keyscope ready. Press keys (Ctrl-C to exit).");

    let stdout = io::stdout();
    let printed = run_monitor(&mut scope, &options, &mut stdout.lock())
        .context("key event monitor stopped")?;

    info!(events = printed, "keyscope finished");
    Ok(())
}
