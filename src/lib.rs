//! Resilient Channel - Reconnecting real-time message transport.
//!
//! This library keeps a bidirectional message channel to a remote peer
//! alive across network failures, for call signaling and live updates
//! during a video consultation.
//!
//! # Architecture
//!
//! The channel follows an owner/event-loop model:
//!
//! - **Owner**: holds the [`ResilientChannel`] handle, sends payloads, forces
//!   reconnects, receives callbacks
//! - **Event loop**: one Tokio task per channel applying transport events and
//!   retry timers to the channel state
//!
//! Key design principles:
//!
//! - At most one live connection per channel
//! - Exponential backoff (`base * 2^n`) up to `max_retries`, then `Failed`
//! - Every attempt carries a generation; late events from older attempts are
//!   dropped
//! - No callback runs after [`ResilientChannel::close`] returns
//! - Sends outside the open phase are rejected, never queued
//!
//! # Quick Start
//!
//! ```no_run
//! use resilient_channel::{PeerRole, ResilientChannel, Result, SignalMessage, signaling_endpoint};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let endpoint = signaling_endpoint("http://localhost:8000", "42", PeerRole::Doctor)?;
//!
//!     let channel = ResilientChannel::builder(endpoint)
//!         .on_message(|payload| {
//!             if let Ok(message) = SignalMessage::from_payload(payload) {
//!                 println!("signal: {}", message.kind());
//!             }
//!         })
//!         .on_notice(|notice| eprintln!("{notice}"))
//!         .connect()?;
//!
//!     // Sends are dropped with a notice until the channel is open.
//!     let _ = channel.send_json(&SignalMessage::Offer { sdp: "v=0".into() });
//!
//!     channel.close();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`channel`] | [`ResilientChannel`], builder, config, handlers |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Signaling message types and room URLs |
//! | [`transport`] | Connector seam and WebSocket transport |

// ============================================================================
// Modules
// ============================================================================

/// Resilient channel: lifecycle, retry ladder, send admission.
///
/// Use [`ResilientChannel::builder()`] to create a channel.
pub mod channel;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Signaling protocol message types.
pub mod protocol;

/// Transport layer.
///
/// Connector/Link traits and the WebSocket implementation.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Channel types
pub use channel::{
    ChannelBuilder, ChannelConfig, ChannelStatus, Handlers, Notice, Phase, ResilientChannel,
    retry_delay,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ChannelId, Generation};

// Protocol types
pub use protocol::{IceCandidate, PeerRole, SignalMessage, signaling_endpoint};

// Transport types
pub use transport::{Connector, EventSink, Link, Payload, TransportEvent, WebSocketConnector};
