//! Conversion engine error types.

use fxroute_common::CurrencyPair;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in the conversion engine.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FxError {
    /// Empty currency code, non-positive amount or identical currencies.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Submitted rate falls outside the accepted bound.
    #[error("Rate {rate} for {pair} is outside the accepted range")]
    RateOutOfRange { pair: CurrencyPair, rate: f64 },

    /// No route connects the two currencies.
    #[error("No conversion path for {0}")]
    ConversionPathNotFound(CurrencyPair),

    /// A path was found but one of its hops has no rate in either direction.
    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),

    /// The converted amount does not fit in a decimal.
    #[error("Amount {amount} overflows when multiplied by factor {factor}")]
    AmountOverflow { amount: Decimal, factor: f64 },

    /// Engine configuration or rate file cannot be used.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl FxError {
    /// Get error code for responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::InvalidRequest(_) => "INVALID_REQUEST",
            FxError::RateOutOfRange { .. } => "RATE_OUT_OF_RANGE",
            FxError::ConversionPathNotFound(_) => "CONVERSION_PATH_NOT_FOUND",
            FxError::InternalInconsistency(_) => "INTERNAL_INCONSISTENCY",
            FxError::AmountOverflow { .. } => "AMOUNT_OVERFLOW",
            FxError::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
        }
    }

    /// Check if the caller can fix this error by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FxError::InvalidRequest(_)
                | FxError::RateOutOfRange { .. }
                | FxError::ConversionPathNotFound(_)
                | FxError::AmountOverflow { .. }
                | FxError::InvalidConfiguration(_)
        )
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;

#[cfg(test)]
mod tests {
    use super::*;
    use fxroute_common::Currency;

    #[test]
    fn test_error_codes() {
        let pair = CurrencyPair::new(Currency::usd(), Currency::eur());

        assert_eq!(
            FxError::ConversionPathNotFound(pair.clone()).error_code(),
            "CONVERSION_PATH_NOT_FOUND"
        );
        assert_eq!(
            FxError::RateOutOfRange { pair, rate: 0.0 }.error_code(),
            "RATE_OUT_OF_RANGE"
        );
    }

    #[test]
    fn test_internal_inconsistency_is_not_client_error() {
        assert!(!FxError::InternalInconsistency("gap".into()).is_client_error());
        assert!(FxError::InvalidRequest("same currency".into()).is_client_error());
    }

    #[test]
    fn test_display() {
        let pair = CurrencyPair::new(Currency::usd(), Currency::jpy());
        let err = FxError::ConversionPathNotFound(pair);
        assert_eq!(err.to_string(), "No conversion path for USD/JPY");
    }
}
