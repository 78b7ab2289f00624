//! CLI demo for the reconciliation engine.
//!
//! This example drives a [`Fixture`] over a simulated fixture whose link can be
//! made flaky from the command line, so the retry, debounce and verify-after-write
//! behavior is visible without real hardware.
//!
//! Run with: RUST_LOG=debug cargo run --example opple_cli -- --help

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use opple_lights_rs::{Fixture, FixtureConfig, Link, SimulatedDriver, Tuning};

#[derive(Parser)]
#[command(name = "opple-cli")]
#[command(about = "Drive a simulated Opple light through the reconciliation engine", long_about = None)]
struct Cli {
    /// Host address reported in logs
    #[arg(long, default_value = "192.168.1.20", global = true)]
    host: String,

    /// MAC address used to derive the unique id
    #[arg(long, default_value = "AA:BB:CC:DD:EE:FF", global = true)]
    mac: String,

    /// Shrink every delay by this factor to make the demo faster
    #[arg(long, default_value = "1", global = true)]
    speedup: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cached state after one refresh
    Status,

    /// Turn the light on
    On {
        /// Brightness (clamped to 10-255)
        #[arg(short, long, allow_negative_numbers = true)]
        brightness: Option<i64>,
        /// Color temperature in Kelvin (clamped to 2700-5700)
        #[arg(short, long, allow_negative_numbers = true)]
        temp: Option<i64>,
    },

    /// Turn the light off
    Off,

    /// Walk through degradation, going offline and recovering
    Outage,

    /// Refresh on a schedule while the link drops every Nth poll
    Watch {
        /// Number of refreshes to run
        #[arg(short, long, default_value = "10")]
        cycles: u32,
        /// Drop every Nth poll (0 never drops)
        #[arg(short, long, default_value = "3")]
        drop_every: u32,
    },

    /// Print diagnostics as JSON
    Diagnostics,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let defaults = Tuning::default();
    let speedup = cli.speedup.max(1);
    let tuning = Tuning {
        min_poll_interval: defaults.min_poll_interval / speedup,
        retry_delay: defaults.retry_delay / speedup,
        settle_delay: defaults.settle_delay / speedup,
        ..defaults
    };

    let config = FixtureConfig::new(&cli.host, &cli.mac, None);
    let driver = Arc::new(SimulatedDriver::online(128, 4000));
    let fixture = Fixture::with_tuning(config, tuning.clone(), Arc::clone(&driver))?;

    println!("Connecting to {} ({})...", fixture.name(), fixture.unique_id());
    fixture.refresh().await;

    match cli.command {
        Commands::Status => print_state(&fixture),

        Commands::On { brightness, temp } => {
            let outcome = fixture.turn_on(brightness, temp).await;
            println!("turn on: {:?}", outcome);
            for write in driver.writes() {
                println!("  wrote {}", write);
            }
            print_state(&fixture);
        }

        Commands::Off => {
            let outcome = fixture.turn_off().await;
            println!("turn off: {:?}", outcome);
            print_state(&fixture);
        }

        Commands::Outage => {
            driver.set_link(Link::Down);
            for step in 1..=2 {
                tokio::time::sleep(tuning.min_poll_interval).await;
                let availability = fixture.refresh().await;
                println!("\nfailed cycle {}: {:?}", step, availability);
                print_state(&fixture);
            }

            println!("\nturning on while offline...");
            println!("turn on: {:?}", fixture.turn_on(Some(255), None).await);

            driver.set_link(Link::Up);
            driver.set_device(true, 120, 4000);
            tokio::time::sleep(tuning.min_poll_interval).await;
            println!("\nrecovered: {:?}", fixture.refresh().await);
            print_state(&fixture);
        }

        Commands::Watch { cycles, drop_every } => {
            for cycle in 1..=cycles {
                if drop_every > 0 && cycle % drop_every == 0 {
                    driver.queue([Link::Down; 3]);
                }
                tokio::time::sleep(tuning.min_poll_interval).await;
                let availability = fixture.refresh().await;
                println!(
                    "[{:>3}] {:?} available={} failures={}",
                    cycle,
                    availability,
                    fixture.available(),
                    fixture.consecutive_failures()
                );
            }
        }

        Commands::Diagnostics => {
            println!("{}", serde_json::to_string_pretty(&fixture.diagnostics())?);
        }
    }

    Ok(())
}

fn print_state<D: opple_lights_rs::Driver>(fixture: &Fixture<D>) {
    let state = fixture.state();
    println!("  Available: {}", state.available);
    println!("  State: {}", fixture.availability());
    println!("  Power: {}", if state.power_on { "ON" } else { "OFF" });
    println!("  Brightness: {}", state.brightness);
    println!("  Temperature: {}", state.color_temp);
}
