//! Channel phase and retry bookkeeping.
//!
//! [`ChannelState`] owns every mutable fact about a channel. Its methods are
//! the state machine's transitions; none of them perform I/O or invoke
//! handlers, so the invariants can be checked without a runtime.
//!
//! # State Transitions
//!
//! ```text
//! Idle ──begin_attempt──► Connecting ──mark_open──► Open
//!                              │                      │
//!                              └────finish_attempt────┘
//!                                         │
//!                    retry_count < max ───┴─── retry_count >= max
//!                            ▼                        ▼
//!                  Closed (retry armed)            Failed
//!                            │
//!                take_due_retry + begin_attempt
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::task::AbortHandle;

use crate::error::Error;
use crate::identifiers::Generation;
use crate::transport::Link;

use super::backoff::retry_delay;
use super::config::ChannelConfig;

// ============================================================================
// Phase
// ============================================================================

/// Lifecycle phase of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Not connected and not trying to.
    Idle,
    /// Connection attempt in flight.
    Connecting,
    /// Connected; sends are admitted.
    Open,
    /// Connection ended; a retry may be pending.
    Closed,
    /// Retry cap reached; waiting for an explicit reconnect.
    Failed,
}

impl Phase {
    /// Returns the lowercase name of the phase.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RetryTimer
// ============================================================================

/// Handle to a scheduled retry. Dropping it cancels the retry.
pub(crate) struct RetryTimer {
    generation: Generation,
    delay: Duration,
    handle: AbortHandle,
}

impl RetryTimer {
    pub fn new(generation: Generation, delay: Duration, handle: AbortHandle) -> Self {
        Self {
            generation,
            delay,
            handle,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Drop for RetryTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ============================================================================
// Closure
// ============================================================================

/// What happens after an attempt ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NextStep {
    /// Retry after `delay`; `attempt` is the 1-based retry number.
    Retry { delay: Duration, attempt: u32 },
    /// Retry cap reached.
    Exhausted { retries: u32 },
    /// Channel disabled; stay closed.
    Halt,
}

/// Result of ending the current attempt.
pub(crate) struct Closure {
    /// Link of the ended attempt, to be closed outside the state lock.
    pub link: Option<Box<dyn Link>>,
    pub was_open: bool,
    pub next: NextStep,
    /// Generation a scheduled retry must carry.
    pub generation: Generation,
}

// ============================================================================
// ChannelState
// ============================================================================

/// Mutable channel state, owned by exactly one channel.
pub(crate) struct ChannelState {
    pub phase: Phase,
    pub retry_count: u32,
    pub last_error: Option<String>,
    pub generation: Generation,
    pub enabled: bool,
    pub terminated: bool,
    pub link: Option<Box<dyn Link>>,
    pub pending_retry: Option<RetryTimer>,
    max_retries: u32,
    base_retry_delay: Duration,
}

impl ChannelState {
    pub fn new(config: &ChannelConfig) -> Self {
        Self {
            phase: Phase::Idle,
            retry_count: 0,
            last_error: None,
            generation: Generation::INITIAL,
            enabled: config.enabled,
            terminated: false,
            link: None,
            pending_retry: None,
            max_retries: config.max_retries,
            base_retry_delay: config.base_retry_delay,
        }
    }

    /// Returns `true` if events from `generation` may still change state.
    #[inline]
    pub fn is_current(&self, generation: Generation) -> bool {
        !self.terminated && self.generation == generation
    }

    /// Starts a new attempt and returns its generation.
    pub fn begin_attempt(&mut self) -> Generation {
        self.cancel_retry();
        self.generation = self.generation.next();
        self.phase = Phase::Connecting;
        self.last_error = None;
        self.generation
    }

    /// Stores the link for `generation`, handing it back if superseded.
    pub fn attach_link(
        &mut self,
        generation: Generation,
        link: Box<dyn Link>,
    ) -> Result<(), Box<dyn Link>> {
        if self.is_current(generation) && self.phase == Phase::Connecting {
            self.link = Some(link);
            Ok(())
        } else {
            Err(link)
        }
    }

    /// Moves to `Open`, returning the retry count that preceded it.
    pub fn mark_open(&mut self, generation: Generation) -> Option<u32> {
        if !self.is_current(generation) || self.phase != Phase::Connecting {
            return None;
        }

        let previous = self.retry_count;
        self.phase = Phase::Open;
        self.retry_count = 0;
        self.last_error = None;
        self.pending_retry = None;
        Some(previous)
    }

    #[inline]
    pub fn accepts_message(&self, generation: Generation) -> bool {
        self.is_current(generation) && self.phase == Phase::Open
    }

    /// Records a failure of the current attempt.
    pub fn record_error(&mut self, generation: Generation, message: String) -> bool {
        if !self.is_current(generation) || !self.is_attempt_live() {
            return false;
        }
        self.last_error = Some(message);
        true
    }

    /// Ends the current attempt and decides between retry and failure.
    ///
    /// The caller arms the retry timer while still holding the state.
    pub fn finish_attempt(&mut self, generation: Generation) -> Option<Closure> {
        if !self.is_current(generation) || !self.is_attempt_live() {
            return None;
        }

        let was_open = self.phase == Phase::Open;
        let link = self.link.take();
        self.generation = self.generation.next();

        let next = if !self.enabled {
            self.phase = Phase::Closed;
            NextStep::Halt
        } else if self.retry_count < self.max_retries {
            let delay = retry_delay(self.base_retry_delay, self.retry_count);
            self.retry_count += 1;
            self.phase = Phase::Closed;
            NextStep::Retry {
                delay,
                attempt: self.retry_count,
            }
        } else {
            self.phase = Phase::Failed;
            self.last_error = Some(Error::retries_exhausted(self.retry_count).to_string());
            NextStep::Exhausted {
                retries: self.retry_count,
            }
        };

        Some(Closure {
            link,
            was_open,
            next,
            generation: self.generation,
        })
    }

    /// Stores the pending retry, cancelling any previous one.
    pub fn arm_retry(&mut self, timer: RetryTimer) {
        self.pending_retry = Some(timer);
    }

    /// Consumes the pending retry if it belongs to `generation`.
    pub fn take_due_retry(&mut self, generation: Generation) -> bool {
        let due = self.is_current(generation)
            && self.phase == Phase::Closed
            && self
                .pending_retry
                .as_ref()
                .is_some_and(|timer| timer.generation == generation);

        if due {
            self.pending_retry = None;
        }
        due
    }

    /// Cancels the pending retry, if any.
    pub fn cancel_retry(&mut self) -> bool {
        self.pending_retry.take().is_some()
    }

    /// Forced reset: clears the retry ladder and detaches the live link.
    ///
    /// Returns the detached link and whether it was open.
    pub fn reset(&mut self) -> (Option<Box<dyn Link>>, bool) {
        self.cancel_retry();
        self.retry_count = 0;
        self.enabled = true;
        self.detach()
    }

    /// Pauses the channel without tearing it down.
    pub fn park(&mut self) -> (Option<Box<dyn Link>>, bool) {
        self.cancel_retry();
        self.enabled = false;
        self.detach()
    }

    /// Tears the channel down for good.
    pub fn terminate(&mut self) -> Option<Box<dyn Link>> {
        self.cancel_retry();
        self.enabled = false;
        let (link, _) = self.detach();
        self.terminated = true;
        link
    }

    #[inline]
    fn is_attempt_live(&self) -> bool {
        matches!(self.phase, Phase::Connecting | Phase::Open)
    }

    fn detach(&mut self) -> (Option<Box<dyn Link>>, bool) {
        let was_open = self.phase == Phase::Open;
        self.generation = self.generation.next();
        self.phase = Phase::Idle;
        (self.link.take(), was_open)
    }
}

// ============================================================================
// Tests
// ============================================================================
