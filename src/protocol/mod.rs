//! Signaling protocol spoken over the channel.
//!
//! The channel itself moves opaque payloads. This module gives call
//! negotiation typed messages and room addresses so owners do not hand-roll
//! the wire JSON.
//!
//! # Message Types
//!
//! | `type` | Direction | Purpose |
//! |--------|-----------|---------|
//! | `offer` | Peer → Peer | Session description offer |
//! | `answer` | Peer → Peer | Session description answer |
//! | `ice-candidate` | Peer → Peer | Trickled ICE candidate |
//! | `user-joined` | Relay → Peer | A peer entered the room |
//! | `user-left` | Relay → Peer | A peer left the room |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `endpoint` | Room URL construction |
//! | `signal` | Message and role types |

// ============================================================================
// Submodules
// ============================================================================

/// Signaling room addresses.
pub mod endpoint;

/// Signaling message types.
pub mod signal;

// ============================================================================
// Re-exports
// ============================================================================

pub use endpoint::signaling_endpoint;
pub use signal::{IceCandidate, PeerRole, SignalMessage};
