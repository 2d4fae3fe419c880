//! Engine configuration with sensible defaults.
//!
//! [`EngineConfig`] carries every tunable knob of the aggregation pipeline:
//! batching, per-task deadlines, retry/backoff policy, result caps, cache
//! freshness, and pagination. The defaults are tuned for a handful of
//! providers sharing constrained network infrastructure.

use crate::error::EngineError;
use std::time::Duration;

/// Configuration for the aggregation engine.
///
/// Use [`Default::default()`] for sensible defaults, or construct with field
/// overrides for custom behaviour. Validated once at engine construction.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How many providers are fetched concurrently. Batch N+1 never starts
    /// before batch N has fully resolved; this is the sole backpressure
    /// mechanism.
    pub batch_size: usize,
    /// Per-task deadline. Expiry yields a `Timeout` outcome and the
    /// underlying call is abandoned, never retried.
    pub request_timeout: Duration,
    /// How many times a transient failure is retried (total attempts are
    /// `retry_cap + 1`). Timeouts and cancellations are never retried.
    pub retry_cap: u32,
    /// Base delay for exponential retry backoff: `backoff_base * 2^attempt`.
    pub backoff_base: Duration,
    /// Upper bound on the retry backoff delay.
    pub backoff_cap: Duration,
    /// Fixed pause between batches, spreading load on shared infrastructure.
    pub batch_delay: Duration,
    /// Per-provider item cap applied before emission, bounding aggregator work.
    pub per_provider_cap: usize,
    /// Per-bucket item cap applied after deduplication.
    pub bucket_item_cap: usize,
    /// Maximum bucket count emitted by `finalize`, bounding rendering cost.
    pub bucket_cap: usize,
    /// Soft freshness window for cached feeds. A stale entry still serves as
    /// fallback; consumers should trigger a new round once it lapses.
    pub cache_freshness: Duration,
    /// Provider panes per page in the windower.
    pub page_size: usize,
    /// Inclusive range of provider counts drawn by
    /// [`crate::registry::ProviderSelection::Sample`].
    pub sample_sizes: (usize, usize),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: 2,
            request_timeout: Duration::from_secs(15),
            retry_cap: 2,
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(10),
            batch_delay: Duration::from_millis(300),
            per_provider_cap: 8,
            bucket_item_cap: 20,
            bucket_cap: 6,
            cache_freshness: Duration::from_secs(600),
            page_size: 3,
            sample_sizes: (2, 3),
        }
    }
}

impl EngineConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `batch_size`, `per_provider_cap`, `bucket_item_cap`, `bucket_cap`,
    ///   and `page_size` must be greater than 0
    /// - `request_timeout` must be non-zero
    /// - `backoff_base` must be <= `backoff_cap`
    /// - `sample_sizes` must be a non-empty, ordered range
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.batch_size == 0 {
            return Err(EngineError::Config(
                "batch_size must be greater than 0".into(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(EngineError::Config(
                "request_timeout must be non-zero".into(),
            ));
        }
        if self.backoff_base > self.backoff_cap {
            return Err(EngineError::Config(
                "backoff_base must be <= backoff_cap".into(),
            ));
        }
        if self.per_provider_cap == 0 {
            return Err(EngineError::Config(
                "per_provider_cap must be greater than 0".into(),
            ));
        }
        if self.bucket_item_cap == 0 {
            return Err(EngineError::Config(
                "bucket_item_cap must be greater than 0".into(),
            ));
        }
        if self.bucket_cap == 0 {
            return Err(EngineError::Config(
                "bucket_cap must be greater than 0".into(),
            ));
        }
        if self.page_size == 0 {
            return Err(EngineError::Config(
                "page_size must be greater than 0".into(),
            ));
        }
        if self.sample_sizes.0 == 0 || self.sample_sizes.0 > self.sample_sizes.1 {
            return Err(EngineError::Config(
                "sample_sizes must be a non-empty ordered range".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = EngineConfig::default();
        assert_eq!(config.batch_size, 2);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.retry_cap, 2);
        assert_eq!(config.backoff_base, Duration::from_secs(1));
        assert_eq!(config.backoff_cap, Duration::from_secs(10));
        assert_eq!(config.batch_delay, Duration::from_millis(300));
        assert_eq!(config.per_provider_cap, 8);
        assert_eq!(config.bucket_item_cap, 20);
        assert_eq!(config.bucket_cap, 6);
        assert_eq!(config.cache_freshness, Duration::from_secs(600));
        assert_eq!(config.page_size, 3);
        assert_eq!(config.sample_sizes, (2, 3));
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_batch_size_rejected() {
        let config = EngineConfig {
            batch_size: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = EngineConfig {
            request_timeout: Duration::ZERO,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("request_timeout"));
    }

    #[test]
    fn inverted_backoff_range_rejected() {
        let config = EngineConfig {
            backoff_base: Duration::from_secs(20),
            backoff_cap: Duration::from_secs(10),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("backoff"));
    }

    #[test]
    fn zero_page_size_rejected() {
        let config = EngineConfig {
            page_size: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn zero_caps_rejected() {
        for (field, config) in [
            (
                "per_provider_cap",
                EngineConfig {
                    per_provider_cap: 0,
                    ..Default::default()
                },
            ),
            (
                "bucket_item_cap",
                EngineConfig {
                    bucket_item_cap: 0,
                    ..Default::default()
                },
            ),
            (
                "bucket_cap",
                EngineConfig {
                    bucket_cap: 0,
                    ..Default::default()
                },
            ),
        ] {
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains(field), "expected {field} error");
        }
    }

    #[test]
    fn invalid_sample_range_rejected() {
        let config = EngineConfig {
            sample_sizes: (3, 2),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            sample_sizes: (0, 2),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn equal_sample_bounds_valid() {
        let config = EngineConfig {
            sample_sizes: (2, 2),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn equal_backoff_bounds_valid() {
        let config = EngineConfig {
            backoff_base: Duration::from_secs(5),
            backoff_cap: Duration::from_secs(5),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
