//! Transport layer underneath the resilient channel.
//!
//! The channel never talks to sockets directly. It asks a [`Connector`] for
//! a new [`Link`] on each attempt and learns about the attempt's fate through
//! an [`EventSink`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐  connect(endpoint, sink)  ┌──────────────────┐
//! │ ResilientChannel │──────────────────────────►│    Connector     │
//! │                  │                           └────────┬─────────┘
//! │  owns Box<Link>  │◄──── send / close ────────  Link   │ spawns
//! │                  │                                    ▼
//! │   event loop     │◄─── Opened/Message/Error/Closed ─ link task
//! └──────────────────┘          (via EventSink)
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `link` | Connector/Link traits, payloads, event sink |
//! | `websocket` | `tokio-tungstenite` client connector |

// ============================================================================
// Submodules
// ============================================================================

/// Transport traits and event types.
pub mod link;

/// WebSocket client connector.
pub mod websocket;

#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Re-exports
// ============================================================================

pub use link::{Connector, EventSink, Link, Payload, TransportEvent};
pub use websocket::WebSocketConnector;
