//! Simulation controller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use fxroute_common::Money;
use fxroute_engine::{ConversionEngine, EngineConfig, FxError};

use crate::metrics::SimulationMetrics;
use crate::network::RateNetwork;
use crate::scenario::{Scenario, ScenarioStep};

/// How many past generations keep a reference engine.
const REFERENCE_WINDOW: u64 = 8;

/// Settings for continuous mode.
#[derive(Debug, Clone)]
pub struct LoadSettings {
    /// Concurrent conversion tasks.
    pub workers: usize,
    /// Interval between reconfigurations; `None` keeps the first network.
    pub reconfigure_every: Option<Duration>,
    /// Shortcut edges added on top of the spanning tree.
    pub extra_edges: usize,
}

/// Outcome of a scenario run.
#[derive(Debug, Clone, Default)]
pub struct ScenarioReport {
    pub passed: usize,
    pub failed: usize,
}

/// Controls the simulation.
pub struct SimulationController {
    /// Engine under test.
    engine: Arc<ConversionEngine>,
    /// Engine settings reused for reference engines.
    config: EngineConfig,
    /// Seed for every random stream.
    seed: u64,
    /// Currently installed network.
    network: Arc<RwLock<RateNetwork>>,
    /// Single-threaded engines holding each recent generation's rates.
    references: Arc<RwLock<HashMap<u64, Arc<ConversionEngine>>>>,
    /// Simulation metrics.
    metrics: Arc<RwLock<SimulationMetrics>>,
    /// Running flag.
    running: Arc<RwLock<bool>>,
}

impl SimulationController {
    /// Create a new simulation controller.
    pub fn new(
        config: EngineConfig,
        network: RateNetwork,
        seed: Option<u64>,
    ) -> Result<Self, FxError> {
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());

        Ok(Self {
            engine: Arc::new(ConversionEngine::new(config.clone())?),
            config,
            seed,
            network: Arc::new(RwLock::new(network)),
            references: Arc::new(RwLock::new(HashMap::new())),
            metrics: Arc::new(RwLock::new(SimulationMetrics::new())),
            running: Arc::new(RwLock::new(false)),
        })
    }

    /// Install the initial network.
    pub async fn initialize(&self) -> anyhow::Result<()> {
        let network = self.network.read().await.clone();
        install(&self.engine, &self.config, &self.references, &network).await?;

        info!(
            seed = self.seed,
            currencies = network.currencies.len(),
            rates = network.rates.len(),
            "Simulation initialized"
        );

        Ok(())
    }

    /// Run a scenario against the engine.
    pub async fn run_scenario(&self, scenario: Scenario) -> anyhow::Result<ScenarioReport> {
        info!("Running scenario: {} - {}", scenario.name, scenario.description);

        *self.running.write().await = true;
        let mut report = ScenarioReport::default();

        for (index, step) in scenario.steps.iter().enumerate() {
            if !*self.running.read().await {
                break;
            }

            if self.execute_step(index, step).await? {
                report.passed += 1;
            } else {
                report.failed += 1;
            }
        }

        *self.running.write().await = false;

        Ok(report)
    }

    /// Run in continuous mode.
    pub async fn run(&self, settings: LoadSettings, duration: Option<Duration>) -> anyhow::Result<()> {
        info!(
            workers = settings.workers,
            reconfigure_every_ms = settings.reconfigure_every.map(|d| d.as_millis() as u64),
            "Running simulation in continuous mode"
        );

        *self.running.write().await = true;

        let mut handles = Vec::with_capacity(settings.workers + 1);

        for worker in 0..settings.workers {
            let engine = self.engine.clone();
            let network = self.network.clone();
            let references = self.references.clone();
            let metrics = self.metrics.clone();
            let running = self.running.clone();
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(worker as u64 + 1));

            handles.push(tokio::spawn(async move {
                while *running.read().await {
                    let pair = network.read().await.random_pair(&mut rng);
                    let Some((from, to)) = pair else {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        continue;
                    };
                    let amount = Decimal::from(rng.gen_range(1u64..1_000_000));

                    let started = Instant::now();
                    let result = engine.convert_with_details(&from, &to, amount);
                    let latency_us = started.elapsed().as_micros() as u64;

                    match result {
                        Ok(conversion) => {
                            let reference = references.read().await.get(&conversion.generation).cloned();
                            let verified = match reference {
                                Some(reference) => {
                                    match reference.convert_with_details(&from, &to, amount) {
                                        Ok(expected) => {
                                            expected.factor == conversion.factor
                                                && expected.path == conversion.path
                                        }
                                        Err(_) => false,
                                    }
                                }
                                None => true,
                            };

                            let mut guard = metrics.write().await;
                            guard.record_success(latency_us);
                            if !verified {
                                error!(
                                    worker,
                                    generation = conversion.generation,
                                    from = %from,
                                    to = %to,
                                    "Conversion disagrees with its generation's reference"
                                );
                                guard.record_mismatch();
                            }
                        }
                        Err(e) => {
                            warn!(worker, error = %e, code = e.error_code(), "Conversion failed");
                            metrics.write().await.record_failure();
                        }
                    }

                    tokio::task::yield_now().await;
                }
            }));
        }

        if let Some(interval) = settings.reconfigure_every {
            let engine = self.engine.clone();
            let config = self.config.clone();
            let network = self.network.clone();
            let references = self.references.clone();
            let metrics = self.metrics.clone();
            let running = self.running.clone();
            let mut rng = StdRng::seed_from_u64(self.seed);
            let extra_edges = settings.extra_edges;

            handles.push(tokio::spawn(async move {
                loop {
                    tokio::time::sleep(interval).await;
                    if !*running.read().await {
                        break;
                    }

                    let next = match network.read().await.reshuffle(&mut rng, extra_edges) {
                        Ok(next) => next,
                        Err(e) => {
                            error!(error = %e, "Could not generate network");
                            break;
                        }
                    };

                    if let Err(e) = install(&engine, &config, &references, &next).await {
                        error!(error = %e, "Reconfiguration failed");
                        break;
                    }

                    *network.write().await = next;
                    metrics.write().await.record_reconfiguration();
                }
            }));
        }

        // Wait for duration or Ctrl+C
        match duration {
            Some(d) => {
                tokio::time::sleep(d).await;
            }
            None => {
                tokio::signal::ctrl_c().await?;
            }
        }

        *self.running.write().await = false;
        for handle in handles {
            handle.await?;
        }

        Ok(())
    }

    /// Execute a single scenario step. Returns whether it met its expectation.
    async fn execute_step(&self, index: usize, step: &ScenarioStep) -> anyhow::Result<bool> {
        match step {
            ScenarioStep::Wait { millis } => {
                debug!(step = index, millis, "Waiting");
                tokio::time::sleep(Duration::from_millis(*millis)).await;
                Ok(true)
            }
            ScenarioStep::Configure { rates } => match self.engine.update_configuration(rates) {
                Ok(()) => Ok(true),
                Err(e) => {
                    warn!(step = index, error = %e, "Configuration rejected");
                    Ok(false)
                }
            },
            ScenarioStep::Clear => {
                self.engine.clear_configuration();
                Ok(true)
            }
            ScenarioStep::Convert {
                from,
                to,
                amount,
                expect,
            } => {
                let amount = Money::parse(amount, from.clone())?;
                let started = Instant::now();
                let result = self.engine.convert_with_details(from, to, amount.value);
                let latency_us = started.elapsed().as_micros() as u64;

                let passed = match &result {
                    Ok(conversion) => {
                        self.metrics.write().await.record_success(latency_us);
                        let output = conversion.output.value.to_f64().unwrap_or(f64::NAN);
                        expect.matches_output(output, conversion.hops())
                    }
                    Err(e) => {
                        self.metrics.write().await.record_failure();
                        expect.matches_error(e)
                    }
                };

                match (&result, passed) {
                    (Ok(conversion), true) => info!(
                        step = index,
                        input = %conversion.input,
                        output = %conversion.rounded_output(),
                        hops = conversion.hops(),
                        cache_hit = conversion.cache_hit,
                        "Step passed"
                    ),
                    (Err(e), true) => info!(step = index, error = %e, "Step passed"),
                    (outcome, false) => {
                        error!(step = index, ?outcome, expected = ?expect, "Step failed")
                    }
                }

                Ok(passed)
            }
        }
    }

    /// Get simulation metrics.
    pub async fn get_metrics(&self) -> SimulationMetrics {
        self.metrics.read().await.clone()
    }

    pub fn engine(&self) -> &ConversionEngine {
        &self.engine
    }
}

/// Install `network` into the engine, registering its reference engine first
/// so workers can verify results from the new generation as soon as it lands.
async fn install(
    engine: &ConversionEngine,
    config: &EngineConfig,
    references: &RwLock<HashMap<u64, Arc<ConversionEngine>>>,
    network: &RateNetwork,
) -> Result<(), FxError> {
    let reference = Arc::new(ConversionEngine::with_rates(config.clone(), &network.rates)?);
    // Only this function reconfigures, so the next generation is predictable.
    let next_generation = engine.generation() + 1;

    {
        let mut references = references.write().await;
        references.insert(next_generation, reference);
        references.retain(|generation, _| generation + REFERENCE_WINDOW > next_generation);
    }

    engine.update_configuration(&network.rates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network(seed: u64) -> RateNetwork {
        RateNetwork::random(&mut StdRng::seed_from_u64(seed), 8, 4).unwrap()
    }

    #[tokio::test]
    async fn test_builtin_scenarios_pass() {
        for name in ["direct", "multi-hop", "unreachable", "reconfigure"] {
            let controller =
            SimulationController::new(EngineConfig::default(), network(1), Some(1)).unwrap();
            let report = controller.run_scenario(Scenario::load(name).unwrap()).await.unwrap();
            assert_eq!(report.failed, 0, "scenario {name} had failures");
        }
    }

    #[tokio::test]
    async fn test_failing_expectation_is_reported() {
        let controller =
            SimulationController::new(EngineConfig::default(), network(1), Some(1)).unwrap();
        let scenario = Scenario {
            name: "wrong".to_string(),
            description: "expects a path that does not exist".to_string(),
            steps: vec![ScenarioStep::Convert {
                from: "USD".into(),
                to: "EUR".into(),
                amount: "1".to_string(),
                expect: crate::scenario::Expectation::Succeeds {
                    approx: None,
                    hops: None,
                },
            }],
        };

        let report = controller.run_scenario(scenario).await.unwrap();
        assert_eq!((report.passed, report.failed), (0, 1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_continuous_mode_stays_consistent() {
        let controller =
            SimulationController::new(EngineConfig::default(), network(9), Some(9)).unwrap();
        controller.initialize().await.unwrap();

        let settings = LoadSettings {
            workers: 4,
            reconfigure_every: Some(Duration::from_millis(20)),
            extra_edges: 4,
        };
        controller
            .run(settings, Some(Duration::from_millis(300)))
            .await
            .unwrap();

        let metrics = controller.get_metrics().await;
        assert!(metrics.total_conversions > 0);
        assert!(metrics.reconfigurations > 0);
        assert_eq!(metrics.failed_conversions, 0);
        assert_eq!(metrics.mismatched_conversions, 0);
        assert!(controller.engine().generation() > 1);
    }
}
