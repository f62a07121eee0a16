//! fxroute Conversion Engine
//!
//! In-memory currency conversion over a table of pairwise exchange rates.
//!
//! # Features
//!
//! - Direct conversion when a rate between the two currencies is configured
//! - Fewest-hop path discovery through other currencies otherwise
//! - Path factor caching with sliding expiration
//! - Atomic wholesale configuration updates under concurrent conversions
//!
//! # Example
//!
//! ```rust
//! use fxroute_common::Currency;
//! use fxroute_engine::{ConversionEngine, ExchangeRate};
//! use rust_decimal::Decimal;
//!
//! let engine = ConversionEngine::default();
//! engine.update_configuration(&[
//!     ExchangeRate::new(Currency::usd(), Currency::eur(), 0.92)?,
//!     ExchangeRate::new(Currency::eur(), Currency::gbp(), 0.85)?,
//! ])?;
//!
//! let gbp = engine.convert(&Currency::usd(), &Currency::gbp(), Decimal::from(100))?;
//! assert!(gbp > Decimal::from(78) && gbp < Decimal::from(79));
//! # Ok::<(), fxroute_engine::FxError>(())
//! ```

pub mod cache;
pub mod config;
pub mod conversion;
pub mod engine;
pub mod error;
mod graph;
mod path_finder;
pub mod rate;
mod rate_table;

pub use cache::{CacheStats, PathCache, PathCacheConfig};
pub use config::EngineConfig;
pub use conversion::{Conversion, Route};
pub use engine::{ConversionEngine, EngineStats};
pub use error::{FxError, FxResult};
pub use rate::{ExchangeRate, RateConfiguration, MAX_RATE, MIN_RATE};
