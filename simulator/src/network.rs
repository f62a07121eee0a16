//! Generated rate networks.

use std::fs;
use std::path::Path;

use rand::Rng;

use fxroute_common::Currency;
use fxroute_engine::{ExchangeRate, FxResult, RateConfiguration};

const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Largest network a three-letter code space can name.
pub const MAX_CURRENCIES: usize = 26 * 26 * 26;

/// A set of currencies and the rates connecting them.
#[derive(Debug, Clone)]
pub struct RateNetwork {
    pub currencies: Vec<Currency>,
    pub rates: Vec<ExchangeRate>,
}

impl RateNetwork {
    /// Generate a connected network.
    ///
    /// A random spanning tree keeps every pair reachable; `extra_edges` more
    /// rates add shortcuts so paths of different lengths compete.
    pub fn random<R: Rng>(rng: &mut R, size: usize, extra_edges: usize) -> anyhow::Result<Self> {
        if !(2..=MAX_CURRENCIES).contains(&size) {
            anyhow::bail!("network size must be between 2 and {MAX_CURRENCIES}, got {size}");
        }

        let currencies: Vec<Currency> = (0..size).map(synthetic_code).collect();
        let mut rates = Vec::with_capacity(size - 1 + extra_edges);

        for i in 1..size {
            let j = rng.gen_range(0..i);
            rates.push(random_rate(rng, &currencies[i], &currencies[j])?);
        }

        for _ in 0..extra_edges {
            let (from, to) = distinct_pair(rng, size);
            rates.push(random_rate(rng, &currencies[from], &currencies[to])?);
        }

        Ok(Self { currencies, rates })
    }

    /// Load a network from a JSON rate file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = fs::read_to_string(path)?;
        let configuration = RateConfiguration::from_json(&json)?;
        Ok(Self::from_configuration(configuration))
    }

    pub fn from_configuration(configuration: RateConfiguration) -> Self {
        let mut currencies: Vec<Currency> = configuration
            .rates
            .iter()
            .flat_map(|r| [r.from.clone(), r.to.clone()])
            .collect();
        currencies.sort();
        currencies.dedup();

        Self {
            currencies,
            rates: configuration.rates,
        }
    }

    /// Same currencies, freshly drawn rates on a new topology.
    pub fn reshuffle<R: Rng>(&self, rng: &mut R, extra_edges: usize) -> anyhow::Result<Self> {
        Self::random(rng, self.currencies.len(), extra_edges)
    }

    /// Pick two different currencies.
    pub fn random_pair<R: Rng>(&self, rng: &mut R) -> Option<(Currency, Currency)> {
        if self.currencies.len() < 2 {
            return None;
        }
        let (from, to) = distinct_pair(rng, self.currencies.len());
        Some((self.currencies[from].clone(), self.currencies[to].clone()))
    }
}

/// `0 -> AAA`, `1 -> AAB`, ... `17575 -> ZZZ`.
fn synthetic_code(index: usize) -> Currency {
    let letters = [index / 676 % 26, index / 26 % 26, index % 26]
        .map(|digit| ALPHABET[digit] as char);
    Currency::new(letters.iter().collect::<String>())
}

fn distinct_pair<R: Rng>(rng: &mut R, size: usize) -> (usize, usize) {
    let from = rng.gen_range(0..size);
    let mut to = rng.gen_range(0..size - 1);
    if to >= from {
        to += 1;
    }
    (from, to)
}

fn random_rate<R: Rng>(rng: &mut R, from: &Currency, to: &Currency) -> FxResult<ExchangeRate> {
    // Five decimal places, like quoted rates.
    let rate = (rng.gen_range(0.05..20.0) * 100_000.0_f64).round() / 100_000.0;
    ExchangeRate::new(from.clone(), to.clone(), rate)
}
