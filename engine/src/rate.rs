//! Exchange rate entries and rate configuration loading.

use fxroute_common::{Currency, CurrencyPair};
use serde::{Deserialize, Serialize};

use crate::error::{FxError, FxResult};

/// Smallest accepted rate (inclusive).
pub const MIN_RATE: f64 = 0.00001;

/// Largest accepted rate (inclusive).
pub const MAX_RATE: f64 = 99999.99999;

/// A directed exchange rate: one unit of `from` buys `rate` units of `to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub from: Currency,
    pub to: Currency,
    pub rate: f64,
}

impl ExchangeRate {
    /// Create a validated rate entry.
    pub fn new(from: Currency, to: Currency, rate: f64) -> FxResult<Self> {
        let entry = Self { from, to, rate };
        entry.validate()?;
        Ok(entry)
    }

    /// Check the bound and that the entry does not point at itself.
    ///
    /// Entries built through serde skip [`ExchangeRate::new`], so the engine
    /// calls this again before applying a configuration.
    pub fn validate(&self) -> FxResult<()> {
        if self.from.is_empty() || self.to.is_empty() {
            return Err(FxError::InvalidRequest(
                "rate entry currency code is empty".to_string(),
            ));
        }

        if self.from == self.to {
            return Err(FxError::InvalidRequest(format!(
                "rate entry {} converts a currency into itself",
                self.pair()
            )));
        }

        // NaN fails the containment check as well.
        if !(MIN_RATE..=MAX_RATE).contains(&self.rate) {
            return Err(FxError::RateOutOfRange {
                pair: self.pair(),
                rate: self.rate,
            });
        }

        Ok(())
    }

    /// The implied rate for the reverse direction.
    pub fn inverse_rate(&self) -> f64 {
        1.0 / self.rate
    }

    /// The directed pair this entry prices.
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.from.clone(), self.to.clone())
    }
}

/// A full set of rates as supplied to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateConfiguration {
    pub rates: Vec<ExchangeRate>,
}

impl RateConfiguration {
    /// Create a configuration from already validated entries.
    pub fn new(rates: Vec<ExchangeRate>) -> Self {
        Self { rates }
    }

    /// Parse a JSON document of the form `{"rates": [{"from", "to", "rate"}]}`.
    pub fn from_json(json: &str) -> FxResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| FxError::InvalidConfiguration(format!("malformed rate file: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> FxResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FxError::InvalidConfiguration(e.to_string()))
    }

    /// Validate every entry, stopping at the first failure.
    pub fn validate(&self) -> FxResult<()> {
        self.rates.iter().try_for_each(ExchangeRate::validate)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl From<Vec<ExchangeRate>> for RateConfiguration {
    fn from(rates: Vec<ExchangeRate>) -> Self {
        Self::new(rates)
    }
}
