//! Conversion records.

use chrono::{DateTime, Utc};
use fxroute_common::{Currency, CurrencyPair, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a conversion was priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    /// A single rate from the table.
    Direct,
    /// A chain of rates along a discovered path.
    MultiHop,
}

/// Represents a completed currency conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversion {
    /// Unique conversion ID.
    pub id: Uuid,
    /// Input amount.
    pub input: Money,
    /// Output amount, unrounded.
    pub output: Money,
    /// Currencies visited, source first.
    pub path: Vec<Currency>,
    /// Combined factor applied to the input.
    pub factor: f64,
    /// Direct or multi-hop.
    pub route: Route,
    /// Whether the factor came from the path cache.
    pub cache_hit: bool,
    /// Configuration generation the conversion observed.
    pub generation: u64,
    /// When the conversion was executed.
    pub executed_at: DateTime<Utc>,
}

impl Conversion {
    /// Create a new conversion record.
    pub fn new(
        input: Money,
        output: Money,
        path: Vec<Currency>,
        factor: f64,
        cache_hit: bool,
        generation: u64,
    ) -> Self {
        let route = if path.len() > 2 {
            Route::MultiHop
        } else {
            Route::Direct
        };

        Self {
            id: Uuid::now_v7(),
            input,
            output,
            path,
            factor,
            route,
            cache_hit,
            generation,
            executed_at: Utc::now(),
        }
    }

    /// Number of rates applied.
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// Output rounded to the target currency's minor units.
    pub fn rounded_output(&self) -> Money {
        self.output.round()
    }

    /// Get the effective rate used.
    pub fn effective_rate(&self) -> Decimal {
        if self.input.value.is_zero() {
            return Decimal::ZERO;
        }
        self.output.value / self.input.value
    }

    /// Get the currency pair.
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.input.currency.clone(), self.output.currency.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(path: &[&str], output: Decimal) -> Conversion {
        let path: Vec<Currency> = path.iter().map(|c| Currency::new(*c)).collect();
        let input = Money::new(dec!(1000), path[0].clone());
        let output = Money::new(output, path[path.len() - 1].clone());
        Conversion::new(input, output, path, 0.92, false, 1)
    }

    #[test]
    fn test_route_kind() {
        let direct = record(&["USD", "EUR"], dec!(920));
        assert_eq!(direct.route, Route::Direct);
        assert_eq!(direct.hops(), 1);

        let multi = record(&["USD", "EUR", "GBP"], dec!(780));
        assert_eq!(multi.route, Route::MultiHop);
        assert_eq!(multi.hops(), 2);
        assert_eq!(multi.pair(), CurrencyPair::new(Currency::usd(), Currency::gbp()));
    }

    #[test]
    fn test_conversion_effective_rate() {
        let conversion = record(&["USD", "EUR"], dec!(920));
        assert_eq!(conversion.effective_rate(), dec!(0.92));
    }

    #[test]
    fn test_rounded_output() {
        let conversion = record(&["USD", "JPY"], dec!(149876.5432));
        assert_eq!(conversion.rounded_output().value, dec!(149877));
    }
}
