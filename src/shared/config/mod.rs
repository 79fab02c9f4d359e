//! Offline core configuration module
//!
//! Provides construction-time configuration for the cache and draft-sync
//! services. Services receive the config by value at startup; there is no
//! ambient global configuration.

use thiserror::Error;

/// Expected cache schema version for the current build.
///
/// Bumping this wipes all cached collections on the next
/// `CacheService::initialize` call - a full rebuild is the only migration
/// strategy.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Offline core configuration
#[derive(Debug, Clone)]
pub struct OfflineConfig {
    /// Cache schema version expected by this build
    pub schema_version: u32,
    /// Age in milliseconds after which cached content counts as stale
    pub staleness_threshold_ms: i64,
    /// Attempt ceiling after which a draft requires manual retry
    pub max_sync_attempts: u32,
    /// Base retry interval in milliseconds (doubles per failed attempt)
    pub backoff_base_ms: i64,
    /// Maximum retry interval in milliseconds
    pub backoff_max_ms: i64,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            schema_version: CACHE_SCHEMA_VERSION,
            staleness_threshold_ms: 24 * 60 * 60 * 1000,
            max_sync_attempts: 5,
            backoff_base_ms: 2_000,
            backoff_max_ms: 5 * 60 * 1000,
        }
    }
}

impl OfflineConfig {
    /// Create a new OfflineConfigBuilder
    pub fn builder() -> OfflineConfigBuilder {
        OfflineConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.staleness_threshold_ms <= 0 {
            return Err(ConfigError::InvalidValue("staleness_threshold_ms"));
        }
        if self.max_sync_attempts == 0 {
            return Err(ConfigError::InvalidValue("max_sync_attempts"));
        }
        if self.backoff_base_ms <= 0 || self.backoff_max_ms < self.backoff_base_ms {
            return Err(ConfigError::InvalidValue("backoff_base_ms"));
        }
        Ok(())
    }
}

/// Builder for OfflineConfig
#[derive(Debug, Default)]
pub struct OfflineConfigBuilder {
    schema_version: Option<u32>,
    staleness_threshold_ms: Option<i64>,
    max_sync_attempts: Option<u32>,
    backoff_base_ms: Option<i64>,
    backoff_max_ms: Option<i64>,
}

impl OfflineConfigBuilder {
    /// Set the expected cache schema version
    pub fn schema_version(mut self, version: u32) -> Self {
        self.schema_version = Some(version);
        self
    }

    /// Set the staleness threshold in milliseconds
    pub fn staleness_threshold_ms(mut self, ms: i64) -> Self {
        self.staleness_threshold_ms = Some(ms);
        self
    }

    /// Set the draft sync attempt ceiling
    pub fn max_sync_attempts(mut self, attempts: u32) -> Self {
        self.max_sync_attempts = Some(attempts);
        self
    }

    /// Set the base backoff interval in milliseconds
    pub fn backoff_base_ms(mut self, ms: i64) -> Self {
        self.backoff_base_ms = Some(ms);
        self
    }

    /// Set the maximum backoff interval in milliseconds
    pub fn backoff_max_ms(mut self, ms: i64) -> Self {
        self.backoff_max_ms = Some(ms);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<OfflineConfig, ConfigError> {
        let defaults = OfflineConfig::default();
        let config = OfflineConfig {
            schema_version: self.schema_version.unwrap_or(defaults.schema_version),
            staleness_threshold_ms: self
                .staleness_threshold_ms
                .unwrap_or(defaults.staleness_threshold_ms),
            max_sync_attempts: self.max_sync_attempts.unwrap_or(defaults.max_sync_attempts),
            backoff_base_ms: self.backoff_base_ms.unwrap_or(defaults.backoff_base_ms),
            backoff_max_ms: self.backoff_max_ms.unwrap_or(defaults.backoff_max_ms),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
}
