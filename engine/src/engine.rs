//! Main conversion engine implementation.

use fxroute_common::{Currency, CurrencyPair, Money};
use parking_lot::RwLock;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheStats, PathCache};
use crate::config::EngineConfig;
use crate::conversion::Conversion;
use crate::error::{FxError, FxResult};
use crate::graph::CurrencyGraph;
use crate::path_finder::find_path;
use crate::rate::{ExchangeRate, RateConfiguration};
use crate::rate_table::RateTable;

/// Rate table, derived graph and generation, guarded together.
#[derive(Debug, Default)]
struct EngineState {
    rates: RateTable,
    graph: CurrencyGraph,
    generation: u64,
}

/// The conversion engine.
///
/// Configuration changes take the lock exclusively. Conversions hold it
/// shared for their whole run, including cache writes, so a conversion sees
/// either the complete old configuration or the complete new one and never
/// caches a factor across an invalidation. `parking_lot`'s lock is task-fair,
/// so neither side can starve the other.
pub struct ConversionEngine {
    state: RwLock<EngineState>,
    cache: PathCache,
    config: EngineConfig,
}

impl ConversionEngine {
    /// Create an empty engine. Fails if `config` does not validate.
    pub fn new(config: EngineConfig) -> FxResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Create an engine and install `rates` as its first configuration.
    pub fn with_rates(config: EngineConfig, rates: &[ExchangeRate]) -> FxResult<Self> {
        let engine = Self::new(config)?;
        engine.update_configuration(rates)?;
        Ok(engine)
    }

    fn build(config: EngineConfig) -> Self {
        Self {
            state: RwLock::new(EngineState::default()),
            cache: PathCache::with_config(config.cache.clone()),
            config,
        }
    }

    /// Replace the whole rate configuration.
    ///
    /// Every entry is validated before anything changes; a rejected update
    /// leaves the previous configuration in place.
    #[instrument(skip_all, fields(entries = rates.len()))]
    pub fn update_configuration(&self, rates: &[ExchangeRate]) -> FxResult<()> {
        for rate in rates {
            rate.validate()?;
        }

        let mut state = self.state.write();
        state.rates.clear();
        state.graph.clear();
        self.cache.invalidate_all();

        for rate in rates {
            state
                .rates
                .put_with_inverse(rate.from.clone(), rate.to.clone(), rate.rate);
        }

        let EngineState { rates: table, graph, .. } = &mut *state;
        graph.rebuild(table);
        state.generation += 1;

        info!(
            generation = state.generation,
            currencies = state.graph.node_count(),
            directed_rates = state.rates.len(),
            "Rate configuration updated"
        );

        Ok(())
    }

    /// Replace the configuration from a loaded rate file.
    pub fn apply(&self, configuration: &RateConfiguration) -> FxResult<()> {
        self.update_configuration(&configuration.rates)
    }

    /// Drop every rate, edge and cached factor.
    #[instrument(skip_all)]
    pub fn clear_configuration(&self) {
        let mut state = self.state.write();
        state.rates.clear();
        state.graph.clear();
        self.cache.invalidate_all();
        state.generation += 1;

        info!(generation = state.generation, "Rate configuration cleared");
    }

    /// Convert `amount` of `from` into `to`.
    pub fn convert(&self, from: &Currency, to: &Currency, amount: Decimal) -> FxResult<Decimal> {
        self.convert_with_details(from, to, amount)
            .map(|conversion| conversion.output.value)
    }

    /// Convert and return the full record of how the result was produced.
    #[instrument(level = "debug", skip_all, fields(from = %from, to = %to, amount = %amount))]
    pub fn convert_with_details(
        &self,
        from: &Currency,
        to: &Currency,
        amount: Decimal,
    ) -> FxResult<Conversion> {
        validate_codes(from, to)?;
        if amount <= Decimal::ZERO {
            return Err(FxError::InvalidRequest(format!(
                "amount must be positive, got {amount}"
            )));
        }

        let state = self.state.read();
        if state.rates.is_empty() {
            debug!("No rates configured");
            return Err(path_not_found(from, to));
        }

        let (path, factor, cache_hit) = match state.rates.lookup(from, to) {
            Some(rate) => {
                debug!(rate, "Direct rate");
                (vec![from.clone(), to.clone()], rate, false)
            }
            None => {
                let path = search(&state.graph, from, to)?;
                let (factor, cache_hit) = self.path_factor(&state.rates, &path)?;
                (path, factor, cache_hit)
            }
        };

        let output = apply_factor(amount, factor)?;
        let generation = state.generation;
        drop(state);

        Ok(Conversion::new(
            Money::new(amount, from.clone()),
            Money::new(output, to.clone()),
            path,
            factor,
            cache_hit,
            generation,
        ))
    }

    /// The route a conversion between the two currencies would take.
    pub fn find_route(&self, from: &Currency, to: &Currency) -> FxResult<Vec<Currency>> {
        validate_codes(from, to)?;

        let state = self.state.read();
        if state.rates.lookup(from, to).is_some() {
            return Ok(vec![from.clone(), to.clone()]);
        }
        search(&state.graph, from, to)
    }

    /// Direct rate from the table, if configured.
    pub fn direct_rate(&self, from: &Currency, to: &Currency) -> Option<f64> {
        self.state.read().rates.lookup(from, to)
    }

    /// All configured currencies, sorted.
    pub fn currencies(&self) -> Vec<Currency> {
        self.state.read().rates.currencies()
    }

    /// Number of configuration changes applied so far.
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get engine statistics.
    pub fn stats(&self) -> EngineStats {
        let state = self.state.read();
        EngineStats {
            generation: state.generation,
            currencies: state.graph.node_count(),
            directed_rates: state.rates.len(),
            graph_edges: state.graph.edge_count(),
            cache: self.cache.stats(),
        }
    }

    /// Evict cached factors that have been idle past the sliding window.
    pub fn cleanup(&self) {
        let _state = self.state.read();
        self.cache.evict_expired();
    }

    /// Cached factor for `path`, computing and caching it on a miss.
    fn path_factor(&self, rates: &RateTable, path: &[Currency]) -> FxResult<(f64, bool)> {
        let key = PathCache::key(path);
        if let Some(factor) = self.cache.get(&key) {
            return Ok((factor, true));
        }

        let factor = chain_factor(rates, path)?;
        self.cache.insert(key, factor);
        Ok((factor, false))
    }
}

impl Default for ConversionEngine {
    fn default() -> Self {
        Self::build(EngineConfig::default())
    }
}

/// Engine statistics.
#[derive(Debug, Clone)]
pub struct EngineStats {
    pub generation: u64,
    pub currencies: usize,
    pub directed_rates: usize,
    pub graph_edges: usize,
    pub cache: CacheStats,
}

fn validate_codes(from: &Currency, to: &Currency) -> FxResult<()> {
    if from.is_empty() || to.is_empty() {
        return Err(FxError::InvalidRequest(
            "currency code cannot be empty".to_string(),
        ));
    }

    if from == to {
        return Err(FxError::InvalidRequest(format!(
            "source and target currency are both {from}"
        )));
    }

    Ok(())
}

fn search(graph: &CurrencyGraph, from: &Currency, to: &Currency) -> FxResult<Vec<Currency>> {
    match find_path(graph, from, to) {
        Some(path) => {
            debug!(hops = path.len() - 1, "Conversion path found");
            Ok(path)
        }
        None => {
            debug!("No conversion path");
            Err(path_not_found(from, to))
        }
    }
}

fn path_not_found(from: &Currency, to: &Currency) -> FxError {
    FxError::ConversionPathNotFound(CurrencyPair::new(from.clone(), to.clone()))
}

/// Multiply the rates along `path`.
///
/// Each hop uses the direct rate when present and otherwise the reciprocal of
/// the reverse rate. A hop with neither means the graph and table disagree.
pub(crate) fn chain_factor(rates: &RateTable, path: &[Currency]) -> FxResult<f64> {
    let mut factor = 1.0;

    for hop in path.windows(2) {
        let (from, to) = (&hop[0], &hop[1]);
        let rate = rates
            .lookup(from, to)
            .or_else(|| rates.lookup(to, from).map(|reverse| 1.0 / reverse))
            .ok_or_else(|| {
                warn!(%from, %to, "Path hop has no rate in either direction");
                FxError::InternalInconsistency(format!("no rate between {from} and {to}"))
            })?;
        factor *= rate;
    }

    Ok(factor)
}

/// `amount * factor`, with the factor brought into decimal first.
///
/// Rates are binary floats while amounts are decimals; the product inherits
/// the float's representation error in the factor. No rounding to minor
/// units happens here.
fn apply_factor(amount: Decimal, factor: f64) -> FxResult<Decimal> {
    Decimal::from_f64(factor)
        .and_then(|factor| amount.checked_mul(factor))
        .ok_or(FxError::AmountOverflow { amount, factor })
}
