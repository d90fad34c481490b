//! Scale Monitor
//!
//! Polls a Mettler-Toledo 8217 scale and prints the latest reading as JSON
//! once per display interval. The worker reconnects on its own when the
//! cable is pulled.
//!
//! Usage:
//!   cargo run --example scale_monitor -- [OPTIONS]
//!
//! Options:
//!   --config FILE     JSON config file (defaults apply to missing keys)
//!   --port PORT       Serial port (default: /dev/ttyS0)
//!   --baud RATE       Baud rate (default: 9600)
//!   --interval SECS   Poll interval in seconds (default: 0.2)
//!   --every MS        Display interval in ms (default: 1000)
//!   --list            List serial ports and exit
//!
//! Log verbosity follows RUST_LOG (e.g. RUST_LOG=scalelink_core=debug).

use anyhow::{bail, Context};
use scalelink_core::config::ScaleConfig;
use scalelink_core::protocol::list_ports;
use scalelink_core::service::ScaleService;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut config = ScaleConfig::default();
    let mut display_every = Duration::from_millis(1000);

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let mut value = || {
            i += 1;
            args.get(i)
                .cloned()
                .with_context(|| format!("{flag} expects a value"))
        };
        match flag {
            "--config" | "-c" => {
                let path = value()?;
                config = ScaleConfig::load(&path)
                    .with_context(|| format!("loading config from {path}"))?;
            }
            "--port" | "-p" => config.port = value()?,
            "--baud" | "-b" => {
                config.baud_rate = value()?.parse().context("invalid baud rate")?
            }
            "--interval" | "-i" => {
                config.poll_interval = value()?.parse().context("invalid poll interval")?
            }
            "--every" | "-e" => {
                let ms = value()?.parse().context("invalid display interval")?;
                display_every = Duration::from_millis(ms);
            }
            "--list" | "-l" => {
                for port in list_ports() {
                    println!(
                        "{}{}",
                        port.name,
                        port.product.map(|p| format!(" ({p})")).unwrap_or_default()
                    );
                }
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => bail!("unknown argument: {other}"),
        }
        i += 1;
    }

    config.validate()?;
    tracing::info!(
        "monitoring {} at {} baud every {:.3}s",
        config.port,
        config.baud_rate,
        config.poll_interval
    );

    let service = ScaleService::from_config(&config);
    loop {
        let reading = service.latest_reading();
        println!("{}", serde_json::to_string(&reading)?);
        std::thread::sleep(display_every);
    }
}

fn print_help() {
    println!("Scale Monitor");
    println!();
    println!("Usage: scale_monitor [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config FILE     JSON config file");
    println!("  --port PORT       Serial port (default: /dev/ttyS0)");
    println!("  --baud RATE       Baud rate (default: 9600)");
    println!("  --interval SECS   Poll interval in seconds (default: 0.2)");
    println!("  --every MS        Display interval in ms (default: 1000)");
    println!("  --list            List serial ports and exit");
}
