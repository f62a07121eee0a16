//! Error types for boundary validation of currency data.

use thiserror::Error;

/// Errors raised while validating currency input at the boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    /// Code is not exactly three ASCII letters.
    #[error("Invalid currency code: {0:?}")]
    InvalidCode(String),

    /// Amount string could not be parsed as a decimal.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

impl CurrencyError {
    /// Get error code for responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            CurrencyError::InvalidCode(_) => "INVALID_CURRENCY_CODE",
            CurrencyError::InvalidAmount(_) => "INVALID_AMOUNT",
        }
    }
}

/// Result type alias for currency validation.
pub type Result<T> = std::result::Result<T, CurrencyError>;
