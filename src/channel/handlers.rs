//! Owner-facing handler table and notices.
//!
//! Handlers are registered once, at construction. Invocations for one
//! channel never overlap and follow the order of the underlying events,
//! whether they run on the event loop or inside an owner call such as
//! `reconnect()`. A missing handler is a no-op.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use crate::error::Error;
use crate::transport::Payload;

use super::state::Phase;

// ============================================================================
// Types
// ============================================================================

/// Called for each inbound message, unmodified and in arrival order.
pub type MessageHandler = Box<dyn Fn(&Payload) + Send + Sync>;

/// Called when the connection opens or closes.
pub type LifecycleHandler = Box<dyn Fn() + Send + Sync>;

/// Called for connection errors and for retry exhaustion.
pub type ErrorHandler = Box<dyn Fn(&Error) + Send + Sync>;

/// Called for owner-visible notices.
pub type NoticeHandler = Box<dyn Fn(&Notice) + Send + Sync>;

// ============================================================================
// Notice
// ============================================================================

/// Short-lived notification meant for the owner's interface (e.g. a toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Connection opened after at least one retry.
    Reconnected {
        /// Retries it took.
        attempts: u32,
    },
    /// A retry was scheduled after the connection closed.
    RetryScheduled {
        /// Wait before the retry fires.
        delay: Duration,
        /// 1-based retry number.
        attempt: u32,
        /// Configured retry cap.
        max_retries: u32,
    },
    /// Retry cap reached; the channel stopped reconnecting.
    RetriesExhausted {
        /// Retries consumed.
        retries: u32,
    },
    /// A send was rejected because the channel was not open.
    SendDropped {
        /// Phase at the time of the send.
        phase: Phase,
    },
}

impl Notice {
    /// Returns `true` for notices that report a failure.
    #[inline]
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. } | Self::SendDropped { .. })
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reconnected { .. } => f.write_str("Reconnected successfully"),
            Self::RetryScheduled {
                delay,
                attempt,
                max_retries,
            } => write!(
                f,
                "Connection lost. Retrying in {}s... ({attempt}/{max_retries})",
                delay.as_secs_f64()
            ),
            Self::RetriesExhausted { .. } => {
                f.write_str("Failed to connect after multiple attempts")
            }
            Self::SendDropped { .. } => {
                f.write_str("Cannot send data: Connection not established")
            }
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Table of optional owner callbacks.
///
/// # Example
///
/// ```
/// use resilient_channel::Handlers;
///
/// let handlers = Handlers::new()
///     .on_open(|| println!("connected"))
///     .on_message(|payload| println!("received {payload}"))
///     .on_notice(|notice| println!("{notice}"));
/// ```
#[derive(Default)]
pub struct Handlers {
    on_message: Option<MessageHandler>,
    on_open: Option<LifecycleHandler>,
    on_close: Option<LifecycleHandler>,
    on_error: Option<ErrorHandler>,
    on_notice: Option<NoticeHandler>,
}

impl Handlers {
    /// Creates an empty handler table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the message handler.
    #[must_use]
    pub fn on_message(mut self, handler: impl Fn(&Payload) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Box::new(handler));
        self
    }

    /// Sets the open handler.
    #[must_use]
    pub fn on_open(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_open = Some(Box::new(handler));
        self
    }

    /// Sets the close handler.
    #[must_use]
    pub fn on_close(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_close = Some(Box::new(handler));
        self
    }

    /// Sets the error handler.
    #[must_use]
    pub fn on_error(mut self, handler: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Sets the notice handler.
    #[must_use]
    pub fn on_notice(mut self, handler: impl Fn(&Notice) + Send + Sync + 'static) -> Self {
        self.on_notice = Some(Box::new(handler));
        self
    }
}

// ============================================================================
// Dispatch
// ============================================================================

impl Handlers {
    pub(crate) fn message(&self, payload: &Payload) {
        if let Some(handler) = &self.on_message {
            handler(payload);
        }
    }

    pub(crate) fn open(&self) {
        if let Some(handler) = &self.on_open {
            handler();
        }
    }

    pub(crate) fn close(&self) {
        if let Some(handler) = &self.on_close {
            handler();
        }
    }

    pub(crate) fn error(&self, error: &Error) {
        if let Some(handler) = &self.on_error {
            handler(error);
        }
    }

    pub(crate) fn notice(&self, notice: &Notice) {
        if let Some(handler) = &self.on_notice {
            handler(notice);
        }
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("on_message", &self.on_message.is_some())
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_notice", &self.on_notice.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
