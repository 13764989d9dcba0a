//! The resilient channel handle and its event loop.
//!
//! # Event Loop
//!
//! Each channel spawns one tokio task that handles:
//!
//! - Transport events (open, message, error, close) tagged by generation
//! - Retry timer expiry
//! - Shutdown after [`ResilientChannel::close`]
//!
//! Owner calls (`send`, `reconnect`, `close`, `set_enabled`) act on the
//! shared state directly and never wait on the loop.
//!
//! # Dispatch
//!
//! Every transition that may invoke handlers runs under a re-entrant
//! dispatch lock. `close()` takes the same lock, so once it returns no
//! handler is running and none will run again. Handlers may call back into
//! the channel from the dispatching thread.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, ReentrantMutex};
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, error, info, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{ChannelId, Generation};
use crate::transport::link::RoutedEvent;
use crate::transport::{Connector, EventSink, Payload, TransportEvent};

use super::builder::ChannelBuilder;
use super::config::ChannelConfig;
use super::handlers::{Handlers, Notice};
use super::state::{ChannelState, NextStep, Phase, RetryTimer};

// ============================================================================
// Control
// ============================================================================

/// Internal commands for the event loop.
enum Control {
    /// A retry timer elapsed.
    RetryElapsed { generation: Generation },
    /// Stop the loop.
    Shutdown,
}

// ============================================================================
// ChannelStatus
// ============================================================================

/// Point-in-time snapshot of a channel, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatus {
    /// Current phase.
    pub phase: Phase,
    /// Consecutive failed attempts since the last open.
    pub retry_count: u32,
    /// Most recent failure description.
    pub last_error: Option<String>,
    /// Delay of the pending retry, if one is scheduled.
    #[serde(skip)]
    pub pending_retry: Option<Duration>,
}

impl ChannelStatus {
    /// Returns `true` if the channel is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.phase == Phase::Open
    }

    /// Returns `true` while an attempt is in flight.
    #[inline]
    #[must_use]
    pub fn is_connecting(&self) -> bool {
        self.phase == Phase::Connecting
    }
}

// ============================================================================
// Shared
// ============================================================================

/// State shared between the handle and the event loop.
struct Shared {
    id: ChannelId,
    config: ChannelConfig,
    handlers: Handlers,
    connector: Arc<dyn Connector>,
    runtime: Handle,
    state: Mutex<ChannelState>,
    dispatch: ReentrantMutex<()>,
    events_tx: mpsc::UnboundedSender<RoutedEvent>,
    control_tx: mpsc::UnboundedSender<Control>,
}

// ============================================================================
// ResilientChannel
// ============================================================================

/// Reconnecting message channel to a single endpoint.
///
/// Keeps one underlying connection alive, retrying with exponential backoff
/// when it drops, and stops after `max_retries` consecutive failures until
/// [`reconnect`](Self::reconnect) is called. Dropping the handle closes the
/// channel.
///
/// # Example
///
/// ```no_run
/// use resilient_channel::ResilientChannel;
///
/// # async fn example() -> resilient_channel::Result<()> {
/// let channel = ResilientChannel::builder("ws://127.0.0.1:8000/ws/signaling/42/doctor")
///     .max_retries(5)
///     .on_message(|payload| println!("peer says {payload}"))
///     .on_notice(|notice| eprintln!("{notice}"))
///     .connect()?;
///
/// if channel.is_connected() {
///     channel.send("hello")?;
/// }
///
/// channel.close();
/// # Ok(())
/// # }
/// ```
pub struct ResilientChannel {
    shared: Arc<Shared>,
}

// ============================================================================
// ResilientChannel - Constructor
// ============================================================================

impl ResilientChannel {
    /// Creates a builder for a channel to `endpoint`.
    #[inline]
    #[must_use]
    pub fn builder(endpoint: impl Into<String>) -> ChannelBuilder {
        ChannelBuilder::new(endpoint)
    }

    /// Spawns the event loop and, if enabled, starts the first attempt.
    pub(crate) fn spawn(
        config: ChannelConfig,
        handlers: Handlers,
        connector: Arc<dyn Connector>,
    ) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|_| Error::config("channel must be created inside a Tokio runtime"))?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            id: ChannelId::new(),
            state: Mutex::new(ChannelState::new(&config)),
            config,
            handlers,
            connector,
            runtime: runtime.clone(),
            dispatch: ReentrantMutex::new(()),
            events_tx,
            control_tx,
        });

        runtime.spawn(run_event_loop(Arc::clone(&shared), events_rx, control_rx));

        debug!(
            channel = %shared.id,
            endpoint = %shared.config.endpoint,
            max_retries = shared.config.max_retries,
            enabled = shared.config.enabled,
            "Channel created"
        );

        if shared.config.enabled {
            let _dispatch = shared.dispatch.lock();
            shared.start_attempt();
        }

        Ok(Self { shared })
    }
}

// ============================================================================
// ResilientChannel - Public API
// ============================================================================

impl ResilientChannel {
    /// Sends a payload if the channel is open.
    ///
    /// Nothing is queued: outside [`Phase::Open`] the payload is dropped and
    /// a [`Notice::SendDropped`] is emitted.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the channel is not open
    /// - [`Error::ConnectionClosed`] if the link went away before reporting it
    pub fn send(&self, payload: impl Into<Payload>) -> Result<()> {
        let shared = &self.shared;
        let payload = payload.into();

        let phase = {
            let state = shared.state.lock();
            match (state.phase, state.link.as_ref()) {
                (Phase::Open, Some(link)) => {
                    let size = payload.len();
                    link.send(payload)?;
                    trace!(channel = %shared.id, size, "Payload forwarded");
                    return Ok(());
                }
                (phase, _) => phase,
            }
        };

        warn!(channel = %shared.id, %phase, "Cannot send data: connection not established");

        let _dispatch = shared.dispatch.lock();
        shared.notify(Notice::SendDropped { phase });
        Err(Error::not_connected(phase))
    }

    /// Serializes `value` as JSON and sends it as a text payload.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if serialization fails
    /// - Any error of [`send`](Self::send)
    pub fn send_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.send(Payload::Text(text))
    }

    /// Forces a fresh connection attempt.
    ///
    /// Cancels any pending retry, resets the retry count, closes the live
    /// connection (invoking `on_close` if it was open) and connects again
    /// immediately. Works from any phase, including [`Phase::Failed`]. Does
    /// nothing after [`close`](Self::close).
    pub fn reconnect(&self) {
        let shared = &self.shared;
        let _dispatch = shared.dispatch.lock();

        let (link, was_open) = {
            let mut state = shared.state.lock();
            if state.terminated {
                warn!(channel = %shared.id, "Reconnect ignored on closed channel");
                return;
            }
            state.reset()
        };

        info!(channel = %shared.id, "Reconnecting");

        if let Some(link) = link {
            link.close();
        }
        if was_open {
            shared.emit(Handlers::close);
        }

        shared.start_attempt();
    }

    /// Pauses or resumes the channel.
    ///
    /// Disabling cancels any pending retry and closes the live connection
    /// without tearing the channel down. Enabling a paused channel starts a
    /// fresh attempt. Does nothing after [`close`](Self::close).
    pub fn set_enabled(&self, enabled: bool) {
        let shared = &self.shared;
        let _dispatch = shared.dispatch.lock();

        if enabled {
            {
                let mut state = shared.state.lock();
                if state.terminated || state.enabled {
                    return;
                }
                state.enabled = true;
                state.retry_count = 0;
            }
            debug!(channel = %shared.id, "Channel resumed");
            shared.start_attempt();
        } else {
            let (link, was_open) = {
                let mut state = shared.state.lock();
                if state.terminated || !state.enabled {
                    return;
                }
                state.park()
            };
            debug!(channel = %shared.id, "Channel paused");
            if let Some(link) = link {
                link.close();
            }
            if was_open {
                shared.emit(Handlers::close);
            }
        }
    }

    /// Shuts the channel down for good.
    ///
    /// Cancels any pending retry and closes the live connection. Once this
    /// returns, no handler is invoked again. Safe to call repeatedly.
    pub fn close(&self) {
        let shared = &self.shared;
        let _dispatch = shared.dispatch.lock();

        let link = {
            let mut state = shared.state.lock();
            if state.terminated {
                return;
            }
            state.terminate()
        };

        if let Some(link) = link {
            link.close();
        }
        let _ = shared.control_tx.send(Control::Shutdown);

        info!(channel = %shared.id, "Channel closed");
    }
}

// ============================================================================
// ResilientChannel - Accessors
// ============================================================================

impl ResilientChannel {
    /// Returns the channel's unique id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ChannelId {
        self.shared.id
    }

    /// Returns the configuration the channel was created with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ChannelConfig {
        &self.shared.config
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.shared.state.lock().phase
    }

    /// Returns `true` if the channel is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.phase() == Phase::Open
    }

    /// Returns `true` while a connection attempt is in flight.
    #[must_use]
    pub fn is_connecting(&self) -> bool {
        self.phase() == Phase::Connecting
    }

    /// Returns the most recent failure description.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.shared.state.lock().last_error.clone()
    }

    /// Returns the number of consecutive failed attempts since the last open.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.shared.state.lock().retry_count
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().terminated
    }

    /// Returns a snapshot of the channel state.
    #[must_use]
    pub fn status(&self) -> ChannelStatus {
        let state = self.shared.state.lock();
        ChannelStatus {
            phase: state.phase,
            retry_count: state.retry_count,
            last_error: state.last_error.clone(),
            pending_retry: state.pending_retry.as_ref().map(RetryTimer::delay),
        }
    }
}

impl fmt::Debug for ResilientChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientChannel")
            .field("id", &self.shared.id)
            .field("endpoint", &self.shared.config.endpoint)
            .field("status", &self.status())
            .finish()
    }
}

impl Drop for ResilientChannel {
    fn drop(&mut self) {
        self.close();
    }
}

// ============================================================================
// Shared - Transitions
// ============================================================================

impl Shared {
    /// Opens a new attempt. Caller holds the dispatch lock.
    fn start_attempt(&self) {
        let (generation, retry_count) = {
            let mut state = self.state.lock();
            if state.terminated || !state.enabled {
                return;
            }
            (state.begin_attempt(), state.retry_count)
        };

        debug!(
            channel = %self.id,
            %generation,
            retry_count,
            endpoint = %self.config.endpoint,
            "Opening connection"
        );

        let sink = EventSink::new(generation, self.events_tx.clone());
        let result = {
            let _runtime = self.runtime.enter();
            self.connector.connect(&self.config.endpoint, sink)
        };

        match result {
            Ok(link) => {
                let superseded = self.state.lock().attach_link(generation, link);
                if let Err(link) = superseded {
                    link.close();
                }
            }
            Err(e) => {
                error!(channel = %self.id, %generation, error = %e, "Error creating connection");
                let recorded = self.state.lock().record_error(generation, e.to_string());
                if recorded {
                    self.emit(|handlers| handlers.error(&e));
                    self.finish_attempt(generation);
                }
            }
        }
    }

    /// Routes one transport event.
    fn handle_transport_event(&self, routed: RoutedEvent) {
        let _dispatch = self.dispatch.lock();
        let RoutedEvent { generation, event } = routed;

        match event {
            TransportEvent::Opened => self.handle_opened(generation),

            TransportEvent::Message(payload) => {
                if self.state.lock().accepts_message(generation) {
                    self.emit(|handlers| handlers.message(&payload));
                } else {
                    trace!(channel = %self.id, %generation, "Discarding stale message");
                }
            }

            TransportEvent::Error(message) => {
                let recorded = self.state.lock().record_error(generation, message.clone());
                if recorded {
                    error!(channel = %self.id, %generation, error = %message, "Connection error occurred");
                    let error = Error::connection(message);
                    self.emit(|handlers| handlers.error(&error));
                    self.finish_attempt(generation);
                }
            }

            TransportEvent::Closed => self.finish_attempt(generation),
        }
    }

    fn handle_opened(&self, generation: Generation) {
        let Some(previous_retries) = self.state.lock().mark_open(generation) else {
            debug!(channel = %self.id, %generation, "Ignoring stale open");
            return;
        };

        info!(channel = %self.id, %generation, "Connection open");
        self.emit(Handlers::open);

        if previous_retries > 0 {
            info!(channel = %self.id, retries = previous_retries, "Reconnected successfully");
            self.notify(Notice::Reconnected {
                attempts: previous_retries,
            });
        }
    }

    /// Ends the current attempt and schedules a retry or fails.
    fn finish_attempt(&self, generation: Generation) {
        let closure = {
            let mut state = self.state.lock();
            let Some(closure) = state.finish_attempt(generation) else {
                return;
            };
            if let NextStep::Retry { delay, .. } = closure.next {
                let timer = self.schedule_retry(closure.generation, delay);
                state.arm_retry(timer);
            }
            closure
        };

        if let Some(link) = closure.link {
            link.close();
        }

        debug!(channel = %self.id, %generation, was_open = closure.was_open, "Connection closed");
        self.emit(Handlers::close);

        match closure.next {
            NextStep::Retry { delay, attempt } => {
                let max_retries = self.config.max_retries;
                warn!(
                    channel = %self.id,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    attempt,
                    max_retries,
                    "Connection lost, retry scheduled"
                );
                self.notify(Notice::RetryScheduled {
                    delay,
                    attempt,
                    max_retries,
                });
            }
            NextStep::Exhausted { retries } => {
                error!(channel = %self.id, retries, "Failed to connect after multiple attempts");
                self.notify(Notice::RetriesExhausted { retries });
                let error = Error::retries_exhausted(retries);
                self.emit(|handlers| handlers.error(&error));
            }
            NextStep::Halt => {}
        }
    }

    /// Spawns the timer task for a retry.
    ///
    /// The deadline is fixed here, not when the task first runs. Delays past
    /// the clock's range wait indefinitely instead of overflowing.
    fn schedule_retry(&self, generation: Generation, delay: Duration) -> RetryTimer {
        let timer = {
            let _runtime = self.runtime.enter();
            sleep(delay)
        };
        let control_tx = self.control_tx.clone();

        let task = self.runtime.spawn(async move {
            timer.await;
            let _ = control_tx.send(Control::RetryElapsed { generation });
        });

        RetryTimer::new(generation, delay, task.abort_handle())
    }

    fn handle_retry_elapsed(&self, generation: Generation) {
        let _dispatch = self.dispatch.lock();

        if !self.state.lock().take_due_retry(generation) {
            debug!(channel = %self.id, %generation, "Ignoring cancelled retry");
            return;
        }

        self.start_attempt();
    }
}

// ============================================================================
// Shared - Handler Dispatch
// ============================================================================

impl Shared {
    /// Invokes a handler unless the channel has been closed.
    fn emit(&self, invoke: impl FnOnce(&Handlers)) {
        if self.state.lock().terminated {
            return;
        }
        invoke(&self.handlers);
    }

    fn notify(&self, notice: Notice) {
        self.emit(|handlers| handlers.notice(&notice));
    }
}

// ============================================================================
// Event Loop
// ============================================================================

/// Processes transport events and timer expiry until shutdown.
async fn run_event_loop(
    shared: Arc<Shared>,
    mut events_rx: mpsc::UnboundedReceiver<RoutedEvent>,
    mut control_rx: mpsc::UnboundedReceiver<Control>,
) {
    loop {
        tokio::select! {
            biased;

            control = control_rx.recv() => {
                match control {
                    Some(Control::RetryElapsed { generation }) => {
                        shared.handle_retry_elapsed(generation);
                    }
                    Some(Control::Shutdown) | None => break,
                }
            }

            routed = events_rx.recv() => {
                match routed {
                    Some(routed) => shared.handle_transport_event(routed),
                    None => break,
                }
            }
        }
    }

    debug!(channel = %shared.id, "Event loop terminated");
}

// ============================================================================
// Tests
// ============================================================================
