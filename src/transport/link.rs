//! Transport seam between the channel and an underlying connection.
//!
//! A [`Connector`] starts connection attempts; each attempt is represented
//! by a [`Link`] the channel owns exclusively, and reports its outcome
//! asynchronously through an [`EventSink`].
//!
//! # Event Contract
//!
//! For every attempt, a connector reports:
//!
//! 1. At most one [`TransportEvent::Opened`]
//! 2. Any number of [`TransportEvent::Message`] while open, in arrival order
//! 3. Optionally one [`TransportEvent::Error`] describing a failure
//! 4. Exactly one [`TransportEvent::Closed`] when the attempt ends
//!
//! Either `Error` or `Closed` ends the attempt from the channel's point of
//! view. Anything reported after that is discarded.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio::sync::mpsc;

use crate::error::Result;
use crate::identifiers::Generation;

// ============================================================================
// Payload
// ============================================================================

/// A single message carried by the channel, forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame.
    Binary(Vec<u8>),
}

impl Payload {
    /// Returns the text content, if this is a text payload.
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    /// Returns the raw bytes of the payload.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    /// Returns the payload size in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns `true` if the payload is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self::Binary(bytes.to_vec())
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Binary(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

// ============================================================================
// TransportEvent
// ============================================================================

/// Outcome reported by a connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Connection established.
    Opened,
    /// Inbound message.
    Message(Payload),
    /// Connection failed or broke.
    Error(String),
    /// Connection ended.
    Closed,
}

/// Transport event tagged with the attempt that produced it.
#[derive(Debug)]
pub(crate) struct RoutedEvent {
    pub generation: Generation,
    pub event: TransportEvent,
}

// ============================================================================
// EventSink
// ============================================================================

/// Reporting handle given to a [`Connector`] for a single attempt.
///
/// Cheap to clone. Every event it emits is tagged with the attempt's
/// generation, so a sink that outlives its attempt cannot disturb newer
/// attempts.
#[derive(Clone)]
pub struct EventSink {
    generation: Generation,
    tx: mpsc::UnboundedSender<RoutedEvent>,
}

impl EventSink {
    pub(crate) fn new(generation: Generation, tx: mpsc::UnboundedSender<RoutedEvent>) -> Self {
        Self { generation, tx }
    }

    /// Returns the generation of the attempt this sink reports for.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Reports that the connection is established.
    pub fn opened(&self) -> bool {
        self.emit(TransportEvent::Opened)
    }

    /// Reports an inbound message.
    pub fn message(&self, payload: impl Into<Payload>) -> bool {
        self.emit(TransportEvent::Message(payload.into()))
    }

    /// Reports a connection failure.
    pub fn error(&self, message: impl Into<String>) -> bool {
        self.emit(TransportEvent::Error(message.into()))
    }

    /// Reports that the connection ended.
    pub fn closed(&self) -> bool {
        self.emit(TransportEvent::Closed)
    }

    /// Returns `true` once the owning channel has shut down.
    #[inline]
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.tx.is_closed()
    }

    /// Returns `false` if the channel is gone.
    fn emit(&self, event: TransportEvent) -> bool {
        self.tx
            .send(RoutedEvent {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("generation", &self.generation)
            .field("detached", &self.is_detached())
            .finish()
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Starts connection attempts against an endpoint.
///
/// `connect` must return immediately; the attempt's outcome is reported
/// through the sink. Returning `Err` means the attempt could not even be
/// started (e.g. a malformed endpoint).
pub trait Connector: Send + Sync + 'static {
    /// Begins a connection attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the attempt cannot be started.
    fn connect(&self, endpoint: &str, sink: EventSink) -> Result<Box<dyn Link>>;
}

/// Handle to one underlying connection, exclusively owned by a channel.
pub trait Link: Send {
    /// Writes a payload to the connection without blocking.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is already gone.
    fn send(&self, payload: Payload) -> Result<()>;

    /// Requests the connection to close. Idempotent.
    fn close(&self);
}

// ============================================================================
// Tests
// ============================================================================
