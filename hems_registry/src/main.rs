//! # HEMS Device Registry Binary
//!
//! Configures the devices declared in the HEMS configuration file and dumps
//! their readings.
//!
//! # Usage
//!
//! ```bash
//! # Dump all meters
//! hems --config hems.toml meter
//!
//! # Dump a single charger
//! hems --config hems.toml charger wallbox
//!
//! # Configure everything and report degraded vehicles
//! hems --config hems.toml -v check
//! ```

#![deny(warnings)]

use clap::{Parser, Subcommand};
use hems_common::config::{ConfigLoader, HemsConfig, LogLevel, select_by_name};
use hems_common::device::Class;
use hems_registry::{DeviceRegistry, Factories, ProbeReport, probe};
use std::path::PathBuf;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// HEMS device registry - configure and inspect devices
#[derive(Parser, Debug)]
#[command(name = "hems")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Configure and inspect home energy management devices")]
#[command(long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "hems.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Configure meters and dump their readings
    Meter {
        /// Only this meter
        name: Option<String>,
    },
    /// Configure chargers and dump their state
    Charger {
        /// Only this charger
        name: Option<String>,
    },
    /// Configure vehicles and dump their state
    Vehicle {
        /// Only this vehicle
        name: Option<String>,
    },
    /// Configure all devices and report the result
    Check,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("hems failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let conf = HemsConfig::load(&args.config);
    let log_level = conf
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);

    let mut conf = conf?;
    conf.validate()?;
    info!(
        "{} v{} using {}",
        conf.shared.service_name,
        env!("CARGO_PKG_VERSION"),
        args.config.display()
    );

    let runtime = tokio::runtime::Runtime::new()?;
    let registry = DeviceRegistry::new().with_timeout(conf.construct_timeout());
    let factories = Factories::builtin();

    match args.command {
        Command::Meter { name } => {
            select_by_name(&selection(name), &mut conf.meters)?;
            runtime.block_on(registry.configure_meters(&conf.meters, factories.meter.as_ref()))?;
            dump(&registry, Class::Meter)?;
        }
        Command::Charger { name } => {
            select_by_name(&selection(name), &mut conf.chargers)?;
            runtime.block_on(registry.configure_chargers(&conf.chargers, factories.charger))?;
            dump(&registry, Class::Charger)?;
        }
        Command::Vehicle { name } => {
            select_by_name(&selection(name), &mut conf.vehicles)?;
            runtime.block_on(registry.configure_vehicles(&conf.vehicles, factories.vehicle))?;
            dump(&registry, Class::Vehicle)?;
        }
        Command::Check => {
            runtime.block_on(registry.configure(&conf, &factories))?;
            check(&registry);
        }
    }

    Ok(())
}

fn selection(name: Option<String>) -> Vec<String> {
    name.into_iter().collect()
}

/// Print one section per configured device of the class.
fn dump(registry: &DeviceRegistry, class: Class) -> Result<(), Box<dyn std::error::Error>> {
    for conf in registry.config(class) {
        println!("{} '{}' ({})", class, conf.name, conf.typ);

        match class {
            Class::Meter => {
                let meter = registry.meter(&conf.name)?;
                print_report(&probe(&*meter));
            }
            Class::Charger => {
                let charger = registry.charger(&conf.name)?;
                match charger.status() {
                    Ok(status) => println!("  Status: {:?}", status),
                    Err(e) => println!("  Status: {}", e),
                }
                match charger.enabled() {
                    Ok(enabled) => println!("  Enabled: {}", enabled),
                    Err(e) => println!("  Enabled: {}", e),
                }
                print_report(&probe(&*charger));
            }
            Class::Vehicle => {
                let vehicle = registry.vehicle(&conf.name)?;
                println!("  Title: {}", vehicle.title());
                println!("  Capacity: {} kWh", vehicle.capacity());
                if let Some(err) = vehicle.construction_error() {
                    println!("  Degraded: {}", err);
                }
                print_report(&probe(&*vehicle));
            }
        }
    }

    Ok(())
}

fn print_report(report: &ProbeReport) {
    for (capability, res) in report {
        match (&res.value, &res.error) {
            (Some(value), _) => println!("  {}: {}", capability, value),
            (None, Some(err)) => println!("  {}: {}", capability, err),
            (None, None) => println!("  {}: -", capability),
        }
    }
}

fn check(registry: &DeviceRegistry) {
    for class in Class::ALL {
        println!("{}s: {}", class, registry.config(class).len());
    }

    let degraded = registry.degraded_vehicles();
    if degraded.is_empty() {
        info!("all devices configured");
    } else {
        for name in &degraded {
            let reason = registry
                .vehicle_registry()
                .devices()
                .get(name)
                .and_then(|v| v.construction_error().map(|e| e.to_string()))
                .unwrap_or_default();
            warn!("vehicle '{}' degraded: {}", name, reason);
        }
        println!("degraded vehicles: {}", degraded.join(", "));
    }
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        log_level.as_directive().parse().unwrap_or(Level::INFO)
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
