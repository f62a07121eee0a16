//! fxroute Simulator
//!
//! Drives the conversion engine with scripted scenarios or a concurrent load
//! of random conversions racing periodic reconfigurations.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fxroute_engine::EngineConfig;

mod controller;
mod metrics;
mod network;
mod scenario;

use controller::{LoadSettings, SimulationController};
use network::RateNetwork;
use scenario::Scenario;

/// fxroute Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "Scenario and load simulator for the fxroute conversion engine")]
struct Args {
    /// Number of currencies in a generated network
    #[arg(short, long, default_value = "12")]
    currencies: usize,

    /// Extra rates added on top of the generated spanning tree
    #[arg(long, default_value = "6")]
    extra_edges: usize,

    /// JSON rate file to load instead of generating a network
    #[arg(long)]
    rates: Option<PathBuf>,

    /// Built-in scenario name, or a path to a JSON scenario file
    #[arg(short, long)]
    scenario: Option<String>,

    /// Concurrent conversion workers
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Milliseconds between reconfigurations (0 = never)
    #[arg(long, default_value = "500")]
    reconfigure_ms: u64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Run duration in seconds (0 = until Ctrl+C)
    #[arg(long, default_value = "10")]
    duration: u64,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Starting fxroute simulator");

    // Load configuration
    let config = EngineConfig::from_env();
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let network = match &args.rates {
        Some(path) => {
            info!(path = %path.display(), "Loading rate file");
            RateNetwork::from_file(path)?
        }
        None => {
            let mut rng = match args.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            RateNetwork::random(&mut rng, args.currencies, args.extra_edges)?
        }
    };

    let controller = SimulationController::new(config, network, args.seed)?;

    if let Some(name) = &args.scenario {
        let scenario = match Scenario::load(name) {
            Ok(scenario) => scenario,
            Err(_) => Scenario::from_file(Path::new(name))?,
        };

        let report = controller.run_scenario(scenario).await?;
        info!(passed = report.passed, failed = report.failed, "Scenario complete");

        if report.failed > 0 {
            anyhow::bail!("{} scenario step(s) failed", report.failed);
        }
        return Ok(());
    }

    controller.initialize().await?;

    let settings = LoadSettings {
        workers: args.workers,
        reconfigure_every: (args.reconfigure_ms > 0)
            .then(|| Duration::from_millis(args.reconfigure_ms)),
        extra_edges: args.extra_edges,
    };
    let duration = (args.duration > 0).then(|| Duration::from_secs(args.duration));

    let started = Instant::now();
    controller.run(settings, duration).await?;
    let elapsed = started.elapsed().as_secs_f64();

    // Print metrics
    let metrics = controller.get_metrics().await;
    let stats = controller.engine().stats();
    info!("Simulation complete");
    info!("Total conversions: {}", metrics.total_conversions);
    info!("Successful: {}", metrics.successful_conversions);
    info!("Failed: {}", metrics.failed_conversions);
    info!("Mismatched: {}", metrics.mismatched_conversions);
    info!("Reconfigurations: {}", metrics.reconfigurations);
    info!("Success rate: {:.4}", metrics.success_rate());
    info!("Throughput: {:.0}/s", metrics.throughput(elapsed));
    info!(
        "Latency avg/p50/p99: {}/{}/{} µs",
        metrics.average_latency_us(),
        metrics.p50_latency_us(),
        metrics.p99_latency_us()
    );
    info!("Cache hit ratio: {:.4}", stats.cache.hit_ratio());

    if metrics.mismatched_conversions > 0 {
        anyhow::bail!(
            "{} conversions disagreed with their configuration",
            metrics.mismatched_conversions
        );
    }

    Ok(())
}
