//! Monetary types for fxroute.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CurrencyError;

/// A monetary amount with currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount value (high precision decimal).
    pub value: Decimal,
    /// ISO 4217 currency code.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money instance.
    pub fn new(value: Decimal, currency: Currency) -> Self {
        Self { value, currency }
    }

    /// Create from a string value.
    pub fn parse(value: &str, currency: Currency) -> Result<Self, CurrencyError> {
        let value = value
            .trim()
            .parse::<Decimal>()
            .map_err(|e| CurrencyError::InvalidAmount(format!("{value:?}: {e}")))?;
        Ok(Self { value, currency })
    }

    /// Round to the currency's standard decimal places.
    pub fn round(&self) -> Self {
        let places = self.currency.decimal_places();
        Self {
            value: self.value.round_dp(places),
            currency: self.currency.clone(),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

/// ISO 4217 style currency code.
///
/// `Currency::new` only normalizes case. Use [`Currency::parse`] for input that
/// has not been validated yet; it accepts exactly three ASCII letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Length of a well-formed code.
    pub const CODE_LEN: usize = 3;

    /// Create a new currency from code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    /// Validate and normalize a currency code.
    pub fn parse(code: &str) -> Result<Self, CurrencyError> {
        let trimmed = code.trim();
        if trimmed.len() != Self::CODE_LEN || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CurrencyError::InvalidCode(code.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Whether the code is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the standard decimal places for this currency.
    pub fn decimal_places(&self) -> u32 {
        match self.0.as_str() {
            "JPY" | "KRW" | "VND" => 0,
            "BHD" | "KWD" | "OMR" => 3,
            _ => 2,
        }
    }

    /// Common currencies
    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn gbp() -> Self {
        Self::new("GBP")
    }

    pub fn jpy() -> Self {
        Self::new("JPY")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = CurrencyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

/// A directed currency pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Currency being converted from.
    pub base: Currency,
    /// Currency being converted to.
    pub quote: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(base: Currency, quote: Currency) -> Self {
        Self { base, quote }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_amount() {
        let result = Money::parse("12,5", Currency::usd());
        assert!(matches!(result, Err(CurrencyError::InvalidAmount(_))));
    }

    #[test]
    fn test_money_round() {
        let yen = Money::parse("1234.56", Currency::jpy()).unwrap();
        assert_eq!(yen.round().value, Decimal::from(1235));

        let usd = Money::parse("10.005", Currency::usd()).unwrap();
        assert_eq!(usd.round().value, Decimal::new(1000, 2));
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!(Currency::parse("USD").unwrap(), Currency::usd());
        assert_eq!(Currency::parse(" eur ").unwrap(), Currency::eur());

        for bad in ["", "US", "USDT", "U$D", "12A"] {
            assert!(
                matches!(Currency::parse(bad), Err(CurrencyError::InvalidCode(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_currency_serde_validates() {
        let parsed: Currency = serde_json::from_str("\"gbp\"").unwrap();
        assert_eq!(parsed, Currency::gbp());
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"GBP\"");

        assert!(serde_json::from_str::<Currency>("\"POUND\"").is_err());
    }

    #[test]
    fn test_currency_decimal_places() {
        assert_eq!(Currency::usd().decimal_places(), 2);
        assert_eq!(Currency::eur().decimal_places(), 2);
        assert_eq!(Currency::jpy().decimal_places(), 0);
    }

    #[test]
    fn test_pair_display() {
        let pair = CurrencyPair::new(Currency::usd(), Currency::eur());
        assert_eq!(pair.to_string(), "USD/EUR");
    }
}
