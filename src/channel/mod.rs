//! Resilient channel module.
//!
//! A [`ResilientChannel`] keeps one connection to a remote peer alive,
//! retrying with exponential backoff and reporting its lifecycle through
//! owner callbacks.
//!
//! # Lifecycle
//!
//! ```text
//!         enabled / reconnect()
//!  Idle ───────────────────────► Connecting ──── opened ────► Open
//!   ▲                              ▲    │                      │
//!   │ close() / pause              │    │ error / closed       │ error / closed
//!   │                    retry due │    ▼                      │
//!   └─────────────────────────── Closed ◄──────────────────────┘
//!                                  │
//!                                  │ retry_count >= max_retries
//!                                  ▼
//!                               Failed ── reconnect() ──► Connecting
//! ```
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ResilientChannel`] | Channel handle: send, reconnect, close |
//! | [`ChannelBuilder`] | Fluent configuration builder |
//! | [`ChannelConfig`] | Endpoint and retry settings |
//! | [`Handlers`] | Owner callback table |
//! | [`Notice`] | Owner-visible notifications |
//! | [`Phase`] | Lifecycle phase |

// ============================================================================
// Submodules
// ============================================================================

/// Retry delay computation.
pub mod backoff;

/// Fluent builder pattern for channel construction.
pub mod builder;

/// Channel configuration.
pub mod config;

/// Channel handle and event loop.
pub mod core;

/// Owner callbacks and notices.
pub mod handlers;

mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use backoff::retry_delay;
pub use builder::ChannelBuilder;
pub use config::{ChannelConfig, DEFAULT_BASE_RETRY_DELAY, DEFAULT_MAX_RETRIES};
pub use core::{ChannelStatus, ResilientChannel};
pub use handlers::{Handlers, Notice};
pub use state::Phase;
