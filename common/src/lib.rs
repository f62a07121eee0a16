//! fxroute Common Types
//!
//! Shared types used across fxroute: currency codes, currency pairs and
//! monetary amounts, plus the boundary validation errors for them.

pub mod monetary;
pub mod error;

pub use monetary::*;
pub use error::*;
