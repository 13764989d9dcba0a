//! Error types for the resilient channel.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Fallible owner calls return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use resilient_channel::{ResilientChannel, Result};
//!
//! fn ping(channel: &ResilientChannel) -> Result<()> {
//!     channel.send("ping")?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidEndpoint`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`] |
//! | Admission | [`Error::NotConnected`] |
//! | Terminal | [`Error::RetriesExhausted`] |
//! | External | [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

use crate::channel::Phase;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when the channel configuration cannot be used.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Endpoint cannot be used to open a connection.
    ///
    /// Raised at attempt time, so it consumes a retry slot like any other
    /// failed attempt.
    #[error("Invalid endpoint '{endpoint}': {message}")]
    InvalidEndpoint {
        /// The rejected endpoint.
        endpoint: String,
        /// Why it was rejected.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Underlying connection failed to open or dropped.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Underlying connection is gone.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Admission Errors
    // ========================================================================
    /// Send attempted while the channel is not open. The payload was dropped.
    #[error("Cannot send data: connection not established (phase: {phase})")]
    NotConnected {
        /// Phase at the moment of the send.
        phase: Phase,
    },

    // ========================================================================
    // Terminal Errors
    // ========================================================================
    /// Consecutive failures reached the retry cap.
    #[error("Failed to connect after {retries} retries")]
    RetriesExhausted {
        /// Retries consumed before giving up.
        retries: u32,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid endpoint error.
    #[inline]
    pub fn invalid_endpoint(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a not-connected error.
    #[inline]
    pub fn not_connected(phase: Phase) -> Self {
        Self::NotConnected { phase }
    }

    /// Creates a retries exhausted error.
    #[inline]
    pub fn retries_exhausted(retries: u32) -> Self {
        Self::RetriesExhausted { retries }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::ConnectionClosed)
    }

    /// Returns `true` if the retry ladder recovers from this error.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionClosed
                | Self::InvalidEndpoint { .. }
        )
    }

    /// Returns `true` if the channel stopped retrying.
    ///
    /// Only an explicit reconnect resumes a channel after this error.
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
