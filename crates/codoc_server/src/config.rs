//! Server configuration.

use std::time::Duration;
use thiserror::Error;

/// Default distance in server sequences above which a pull answers with a
/// snapshot instead of changes.
pub const DEFAULT_SNAPSHOT_THRESHOLD: u64 = 500;
/// Default server sequence step at which a fresh snapshot is materialized.
pub const DEFAULT_SNAPSHOT_INTERVAL: u64 = 100;
/// Default RPC port.
pub const DEFAULT_RPC_PORT: u16 = 11101;
/// Default profiling port.
pub const DEFAULT_PROFILING_PORT: u16 = 11102;
/// Default maximum RPC request size (4 MiB).
pub const DEFAULT_RPC_MAX_REQUEST_BYTES: usize = 4 * 1024 * 1024;
/// Default number of retries against the auth webhook.
pub const DEFAULT_AUTH_WEBHOOK_MAX_RETRIES: u32 = 10;
/// Default upper bound on the auth webhook retry backoff.
pub const DEFAULT_AUTH_WEBHOOK_MAX_WAIT_INTERVAL: Duration = Duration::from_secs(3);
/// Default TTL for cached authorized webhook results.
pub const DEFAULT_AUTH_WEBHOOK_CACHE_AUTH_TTL: Duration = Duration::from_secs(10);
/// Default TTL for cached unauthorized webhook results.
pub const DEFAULT_AUTH_WEBHOOK_CACHE_UNAUTH_TTL: Duration = Duration::from_secs(10);

/// Errors from validating a configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The snapshot threshold is zero.
    #[error("snapshot threshold must be positive")]
    ZeroSnapshotThreshold,

    /// The snapshot interval is zero.
    #[error("snapshot interval must be positive")]
    ZeroSnapshotInterval,
}

/// Configuration for the sync core and the service layers around it.
///
/// The snapshot knobs drive the core directly; the RPC, profiling and auth
/// webhook settings are consumed by the transport and auth layers built on
/// top. Connection settings for a concrete store backend belong to that
/// backend's own configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Distance in server sequences above which a pull answers with a
    /// snapshot instead of changes.
    pub snapshot_threshold: u64,
    /// Server sequence step at which a fresh snapshot is materialized.
    pub snapshot_interval: u64,
    /// Port the RPC transport binds to.
    pub rpc_port: u16,
    /// Maximum accepted RPC request size in bytes.
    pub rpc_max_request_bytes: usize,
    /// Port the profiling endpoint binds to.
    pub profiling_port: u16,
    /// Number of retries against the auth webhook.
    pub auth_webhook_max_retries: u32,
    /// Upper bound on the auth webhook retry backoff.
    pub auth_webhook_max_wait_interval: Duration,
    /// TTL for cached authorized webhook results.
    pub auth_webhook_cache_auth_ttl: Duration,
    /// TTL for cached unauthorized webhook results.
    pub auth_webhook_cache_unauth_ttl: Duration,
}

impl Config {
    /// Creates a configuration with the default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the snapshot threshold.
    #[must_use]
    pub fn with_snapshot_threshold(mut self, threshold: u64) -> Self {
        self.snapshot_threshold = threshold;
        self
    }

    /// Sets the snapshot interval.
    #[must_use]
    pub fn with_snapshot_interval(mut self, interval: u64) -> Self {
        self.snapshot_interval = interval;
        self
    }

    /// Returns an error if the configuration is unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.snapshot_threshold == 0 {
            return Err(ConfigError::ZeroSnapshotThreshold);
        }
        if self.snapshot_interval == 0 {
            return Err(ConfigError::ZeroSnapshotInterval);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_threshold: DEFAULT_SNAPSHOT_THRESHOLD,
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
            rpc_port: DEFAULT_RPC_PORT,
            rpc_max_request_bytes: DEFAULT_RPC_MAX_REQUEST_BYTES,
            profiling_port: DEFAULT_PROFILING_PORT,
            auth_webhook_max_retries: DEFAULT_AUTH_WEBHOOK_MAX_RETRIES,
            auth_webhook_max_wait_interval: DEFAULT_AUTH_WEBHOOK_MAX_WAIT_INTERVAL,
            auth_webhook_cache_auth_ttl: DEFAULT_AUTH_WEBHOOK_CACHE_AUTH_TTL,
            auth_webhook_cache_unauth_ttl: DEFAULT_AUTH_WEBHOOK_CACHE_UNAUTH_TTL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.snapshot_threshold, 500);
        assert_eq!(config.snapshot_interval, 100);
        assert_eq!(config.rpc_port, 11101);
        assert_eq!(config.rpc_max_request_bytes, 4 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder() {
        let config = Config::new()
            .with_snapshot_threshold(2)
            .with_snapshot_interval(10);
        assert_eq!(config.snapshot_threshold, 2);
        assert_eq!(config.snapshot_interval, 10);
    }

    #[test]
    fn zero_knobs_rejected() {
        assert_eq!(
            Config::new().with_snapshot_threshold(0).validate(),
            Err(ConfigError::ZeroSnapshotThreshold)
        );
        assert_eq!(
            Config::new().with_snapshot_interval(0).validate(),
            Err(ConfigError::ZeroSnapshotInterval)
        );
    }
}
