//! Channel configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use resilient_channel::ChannelConfig;
//!
//! let config = ChannelConfig::new("ws://127.0.0.1:8000/ws/signaling/42/doctor")
//!     .with_max_retries(5)
//!     .with_base_retry_delay(Duration::from_millis(500));
//!
//! assert_eq!(config.max_retries, 5);
//! assert!(config.enabled);
//! ```
//!
//! The same settings can be shipped as JSON:
//!
//! ```json
//! { "endpoint": "wss://api.example.com/ws", "maxRetries": 3, "baseRetryDelayMs": 1000, "enabled": true }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Default cap on consecutive reconnect attempts.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default backoff unit.
pub const DEFAULT_BASE_RETRY_DELAY: Duration = Duration::from_millis(1000);

// ============================================================================
// ChannelConfig
// ============================================================================

/// Immutable settings a channel is constructed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelConfig {
    /// Address of the remote peer. Interpreted by the connector.
    pub endpoint: String,

    /// Cap on consecutive reconnect attempts.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff unit; retry `n` waits `base_retry_delay * 2^n`.
    #[serde(rename = "baseRetryDelayMs", with = "duration_ms", default = "default_base_retry_delay")]
    pub base_retry_delay: Duration,

    /// Whether the channel connects as soon as it is created.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// ============================================================================
// Constructors
// ============================================================================

impl ChannelConfig {
    /// Creates a config with default retry settings.
    #[inline]
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            max_retries: DEFAULT_MAX_RETRIES,
            base_retry_delay: DEFAULT_BASE_RETRY_DELAY,
            enabled: true,
        }
    }

    /// Parses a config from JSON.
    ///
    /// Only `endpoint` is required.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ChannelConfig {
    /// Sets the retry cap.
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the backoff unit.
    #[inline]
    #[must_use]
    pub fn with_base_retry_delay(mut self, delay: Duration) -> Self {
        self.base_retry_delay = delay;
        self
    }

    /// Sets whether the channel connects on creation.
    #[inline]
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

// ============================================================================
// Serde Helpers
// ============================================================================

const fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

const fn default_base_retry_delay() -> Duration {
    DEFAULT_BASE_RETRY_DELAY
}

const fn default_enabled() -> bool {
    true
}

/// Durations as whole milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// ============================================================================
// Tests
// ============================================================================
