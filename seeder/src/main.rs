mod dataset;

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::Parser;
use dataset::SeedOptions;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Generates a ColdTrace demo dataset (devices, readings, alerts) as JSON
#[derive(Debug, Parser)]
#[command(name = "coldtrace-seeder", version)]
struct Args {
    /// Number of devices to create
    #[arg(long, env = "SEED_DEVICES", default_value_t = 8)]
    devices: usize,

    /// Readings generated per device
    #[arg(long, env = "SEED_READINGS", default_value_t = 48)]
    readings: usize,

    /// Minutes between consecutive readings of one device
    #[arg(long, env = "SEED_INTERVAL_MINUTES", default_value_t = 30)]
    interval_minutes: i64,

    /// RNG seed for a reproducible dataset
    #[arg(long, env = "SEED_RNG")]
    seed: Option<u64>,

    /// Write to this file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON document
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    // stdout carries the JSON document; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    anyhow::ensure!(args.interval_minutes > 0, "--interval-minutes must be positive");

    info!(
        "Seeding {} devices with {} readings every {} min",
        args.devices, args.readings, args.interval_minutes
    );

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let opts = SeedOptions {
        devices: args.devices,
        readings_per_device: args.readings,
        interval: Duration::try_minutes(args.interval_minutes)
            .context("--interval-minutes is too large")?,
    };

    let data = dataset::generate(&mut rng, &opts, Utc::now()).context("Failed to generate seed data")?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&data)?
    } else {
        serde_json::to_string(&data)?
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote seed data to {}", path.display());
        }
        None => println!("{}", json),
    }

    info!(
        "Seeded {} devices, {} readings, {} alerts ({} active, {} critical)",
        data.stats.total_devices,
        data.stats.total_readings,
        data.alerts.len(),
        data.stats.active_alerts,
        data.stats.critical_alerts
    );

    Ok(())
}
