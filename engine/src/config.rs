//! Engine configuration.

use chrono::Duration;

use crate::cache::PathCacheConfig;
use crate::error::{FxError, FxResult};

/// Configuration for the conversion engine.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Path cache configuration.
    pub cache: PathCacheConfig,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads `FX_CACHE_SLIDING_EXPIRATION_SECS` and `FX_CACHE_MAX_ENTRIES`;
    /// unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(secs) = lookup("FX_CACHE_SLIDING_EXPIRATION_SECS") {
            if let Ok(secs) = secs.parse::<u32>() {
                config.cache.sliding_expiration = Duration::seconds(i64::from(secs));
            }
        }

        if let Some(max) = lookup("FX_CACHE_MAX_ENTRIES") {
            if let Ok(max) = max.parse() {
                config.cache.max_entries = max;
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> FxResult<()> {
        if self.cache.sliding_expiration <= Duration::zero() {
            return Err(FxError::InvalidConfiguration(
                "Cache sliding expiration must be positive".to_string(),
            ));
        }

        if self.cache.max_entries == 0 {
            return Err(FxError::InvalidConfiguration(
                "Cache max entries cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}
