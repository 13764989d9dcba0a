//! Builder pattern for channel construction.
//!
//! Provides a fluent API for configuring and starting a [`ResilientChannel`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use resilient_channel::ResilientChannel;
//!
//! # async fn example() -> resilient_channel::Result<()> {
//! let channel = ResilientChannel::builder("ws://127.0.0.1:8000/ws/signaling/42/patient")
//!     .max_retries(5)
//!     .base_retry_delay(Duration::from_millis(500))
//!     .on_open(|| println!("connected"))
//!     .connect()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::transport::{Connector, Payload, WebSocketConnector};

use super::config::ChannelConfig;
use super::core::ResilientChannel;
use super::handlers::{Handlers, Notice};

// ============================================================================
// ChannelBuilder
// ============================================================================

/// Builder for a [`ResilientChannel`].
///
/// Use [`ResilientChannel::builder()`] to create one.
pub struct ChannelBuilder {
    /// Channel configuration.
    config: ChannelConfig,
    /// Owner callbacks.
    handlers: Handlers,
    /// Transport; WebSocket when unset.
    connector: Option<Arc<dyn Connector>>,
}

// ============================================================================
// ChannelBuilder Implementation
// ============================================================================

impl ChannelBuilder {
    /// Creates a builder for `endpoint` with default settings.
    #[inline]
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::from_config(ChannelConfig::new(endpoint))
    }

    /// Creates a builder from an existing configuration.
    #[inline]
    #[must_use]
    pub fn from_config(config: ChannelConfig) -> Self {
        Self {
            config,
            handlers: Handlers::new(),
            connector: None,
        }
    }

    /// Sets the cap on consecutive retries.
    #[inline]
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Sets the backoff unit.
    #[inline]
    #[must_use]
    pub fn base_retry_delay(mut self, delay: Duration) -> Self {
        self.config.base_retry_delay = delay;
        self
    }

    /// Sets whether the channel connects on start.
    #[inline]
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// Sets the message handler.
    #[must_use]
    pub fn on_message(mut self, handler: impl Fn(&Payload) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_message(handler);
        self
    }

    /// Sets the open handler.
    #[must_use]
    pub fn on_open(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_open(handler);
        self
    }

    /// Sets the close handler.
    #[must_use]
    pub fn on_close(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_close(handler);
        self
    }

    /// Sets the error handler.
    #[must_use]
    pub fn on_error(mut self, handler: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_error(handler);
        self
    }

    /// Sets the notice handler.
    #[must_use]
    pub fn on_notice(mut self, handler: impl Fn(&Notice) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_notice(handler);
        self
    }

    /// Replaces the whole handler table.
    #[inline]
    #[must_use]
    pub fn handlers(mut self, handlers: Handlers) -> Self {
        self.handlers = handlers;
        self
    }

    /// Sets a custom transport.
    #[must_use]
    pub fn connector(mut self, connector: impl Connector) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Starts the channel.
    ///
    /// Connects immediately unless the channel was built disabled. Endpoint
    /// problems are reported through `on_error` and the retry ladder, not
    /// here.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if called outside a Tokio runtime
    pub fn connect(self) -> Result<ResilientChannel> {
        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(WebSocketConnector::new()));

        ResilientChannel::spawn(self.config, self.handlers, connector)
    }
}

impl fmt::Debug for ChannelBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelBuilder")
            .field("config", &self.config)
            .field("handlers", &self.handlers)
            .field("custom_connector", &self.connector.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
