//! Simulation scenarios.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use fxroute_common::Currency;
use fxroute_engine::{ExchangeRate, FxError};

/// A simulation scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Steps in the scenario.
    pub steps: Vec<ScenarioStep>,
}

/// A step in a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScenarioStep {
    /// Wait for a duration.
    Wait { millis: u64 },
    /// Replace the rate configuration.
    Configure { rates: Vec<ExchangeRate> },
    /// Clear the rate configuration.
    Clear,
    /// Convert and check the outcome.
    Convert {
        from: Currency,
        to: Currency,
        amount: String,
        expect: Expectation,
    },
}

/// Expected outcome of a conversion step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expectation {
    /// Succeeds, optionally with an approximate output.
    Succeeds { approx: Option<f64>, hops: Option<usize> },
    /// Fails because no path exists.
    PathNotFound,
    /// Fails request validation.
    InvalidRequest,
}

impl Expectation {
    /// Check an error outcome against the expectation.
    pub fn matches_error(&self, error: &FxError) -> bool {
        matches!(
            (self, error),
            (Expectation::PathNotFound, FxError::ConversionPathNotFound(_))
                | (Expectation::InvalidRequest, FxError::InvalidRequest(_))
        )
    }

    /// Check a successful outcome against the expectation.
    pub fn matches_output(&self, output: f64, hops: usize) -> bool {
        match self {
            Expectation::Succeeds { approx, hops: expected_hops } => {
                let output_ok = approx
                    .map(|expected| (output - expected).abs() <= expected.abs() * 1e-6)
                    .unwrap_or(true);
                output_ok && expected_hops.map(|h| h == hops).unwrap_or(true)
            }
            _ => false,
        }
    }
}

impl Scenario {
    /// Load a built-in scenario by name.
    pub fn load(name: &str) -> anyhow::Result<Self> {
        match name {
            "direct" => Ok(Self::direct()),
            "multi-hop" => Ok(Self::multi_hop()),
            "unreachable" => Ok(Self::unreachable()),
            "reconfigure" => Ok(Self::reconfigure()),
            _ => Err(anyhow::anyhow!("Unknown scenario: {}", name)),
        }
    }

    /// Load a scenario from a JSON file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Direct rates in both directions.
    fn direct() -> Self {
        Self {
            name: "direct".to_string(),
            description: "Direct conversion and its implied inverse".to_string(),
            steps: vec![
                configure(&[("USD", "EUR", 0.92)]),
                convert("USD", "EUR", "1000", succeeds(920.0, 1)),
                convert("EUR", "USD", "920", succeeds(1000.0, 1)),
                convert("USD", "USD", "1", Expectation::InvalidRequest),
                convert("USD", "EUR", "0", Expectation::InvalidRequest),
            ],
        }
    }

    /// Conversions that need intermediate currencies.
    fn multi_hop() -> Self {
        Self {
            name: "multi-hop".to_string(),
            description: "Indirect conversion through the fewest currencies".to_string(),
            steps: vec![
                configure(&[
                    ("USD", "EUR", 0.92),
                    ("EUR", "GBP", 0.85),
                    ("GBP", "JPY", 190.0),
                    ("USD", "CHF", 0.88),
                    ("CHF", "JPY", 170.0),
                ]),
                convert("USD", "GBP", "100", succeeds(78.2, 2)),
                // Through CHF is two hops, through EUR and GBP three.
                convert("USD", "JPY", "100", succeeds(14960.0, 2)),
                convert("USD", "JPY", "200", succeeds(29920.0, 2)),
                convert("EUR", "CHF", "92", succeeds(88.0, 2)),
            ],
        }
    }

    /// Disconnected currency groups.
    fn unreachable() -> Self {
        Self {
            name: "unreachable".to_string(),
            description: "Currencies in separate components cannot convert".to_string(),
            steps: vec![
                configure(&[("USD", "EUR", 0.92), ("NOK", "SEK", 0.98)]),
                convert("USD", "SEK", "10", Expectation::PathNotFound),
                convert("AUD", "USD", "10", Expectation::PathNotFound),
                convert("NOK", "SEK", "10", succeeds(9.8, 1)),
            ],
        }
    }

    /// Results follow configuration changes.
    fn reconfigure() -> Self {
        Self {
            name: "reconfigure".to_string(),
            description: "Updates and clears replace every rate and cached path".to_string(),
            steps: vec![
                configure(&[("USD", "EUR", 0.5), ("EUR", "GBP", 0.5)]),
                convert("USD", "GBP", "100", succeeds(25.0, 2)),
                configure(&[("USD", "EUR", 2.0), ("EUR", "GBP", 2.0)]),
                convert("USD", "GBP", "100", succeeds(400.0, 2)),
                ScenarioStep::Wait { millis: 10 },
                ScenarioStep::Clear,
                convert("USD", "GBP", "100", Expectation::PathNotFound),
            ],
        }
    }
}

fn configure(rates: &[(&str, &str, f64)]) -> ScenarioStep {
    ScenarioStep::Configure {
        rates: rates
            .iter()
            .map(|(from, to, rate)| ExchangeRate {
                from: Currency::new(*from),
                to: Currency::new(*to),
                rate: *rate,
            })
            .collect(),
    }
}

fn convert(from: &str, to: &str, amount: &str, expect: Expectation) -> ScenarioStep {
    ScenarioStep::Convert {
        from: Currency::new(from),
        to: Currency::new(to),
        amount: amount.to_string(),
        expect,
    }
}

fn succeeds(approx: f64, hops: usize) -> Expectation {
    Expectation::Succeeds {
        approx: Some(approx),
        hops: Some(hops),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxroute_common::CurrencyPair;

    #[test]
    fn test_load_builtin_scenarios() {
        for name in ["direct", "multi-hop", "unreachable", "reconfigure"] {
            let scenario = Scenario::load(name).unwrap();
            assert_eq!(scenario.name, name);
            assert!(!scenario.steps.is_empty());
        }
        assert!(Scenario::load("nope").is_err());
    }

    #[test]
    fn test_scenario_json_round_trip() {
        let scenario = Scenario::load("multi-hop").unwrap();
        let json = serde_json::to_string(&scenario).unwrap();
        let parsed: Scenario = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.steps.len(), scenario.steps.len());
    }

    #[test]
    fn test_expectation_matching() {
        let pair = CurrencyPair::new(Currency::usd(), Currency::eur());
        assert!(Expectation::PathNotFound.matches_error(&FxError::ConversionPathNotFound(pair)));
        assert!(!Expectation::InvalidRequest.matches_error(&FxError::InternalInconsistency(
            "gap".into()
        )));

        let expectation = succeeds(100.0, 2);
        assert!(expectation.matches_output(100.00001, 2));
        assert!(!expectation.matches_output(101.0, 2));
        assert!(!expectation.matches_output(100.0, 3));
    }
}
