//! Scriptable in-memory connector for channel tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::error::{Error, Result};

use super::link::{Connector, EventSink, Link, Payload};

/// What the next connection attempt does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Script {
    /// Opens right away.
    Open,
    /// Reports an error, then closes.
    Fail,
    /// `connect` itself returns an invalid endpoint error.
    Reject,
    /// Stays in flight until the test drives the sink.
    Pending,
}

/// One recorded `connect` call.
pub(crate) struct Attempt {
    pub at: Instant,
    pub endpoint: String,
    pub sink: EventSink,
    pub sent: Arc<Mutex<Vec<Payload>>>,
    pub closed: Arc<AtomicBool>,
}

struct MockState {
    script: VecDeque<Script>,
    fallback: Script,
    attempts: Vec<Attempt>,
}

/// Connector whose attempts follow a script and are recorded for assertions.
#[derive(Clone)]
pub(crate) struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    /// Runs `script` in order, then `fallback` for every later attempt.
    pub fn new(script: impl IntoIterator<Item = Script>, fallback: Script) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                script: script.into_iter().collect(),
                fallback,
                attempts: Vec::new(),
            })),
        }
    }

    /// Every attempt fails.
    pub fn failing() -> Self {
        Self::new([], Script::Fail)
    }

    /// Queues more scripted outcomes.
    pub fn push(&self, script: Script) {
        self.state.lock().script.push_back(script);
    }

    pub fn attempt_count(&self) -> usize {
        self.state.lock().attempts.len()
    }

    pub fn attempt_times(&self) -> Vec<Instant> {
        self.state.lock().attempts.iter().map(|a| a.at).collect()
    }

    pub fn endpoint(&self, index: usize) -> String {
        self.state.lock().attempts[index].endpoint.clone()
    }

    pub fn sink(&self, index: usize) -> EventSink {
        self.state.lock().attempts[index].sink.clone()
    }

    pub fn sent(&self, index: usize) -> Vec<Payload> {
        self.state.lock().attempts[index].sent.lock().clone()
    }

    pub fn is_closed(&self, index: usize) -> bool {
        self.state.lock().attempts[index].closed.load(Ordering::SeqCst)
    }

    /// Number of links the channel has not closed yet.
    pub fn live_links(&self) -> usize {
        self.state
            .lock()
            .attempts
            .iter()
            .filter(|a| !a.closed.load(Ordering::SeqCst))
            .count()
    }
}

impl Connector for MockConnector {
    fn connect(&self, endpoint: &str, sink: EventSink) -> Result<Box<dyn Link>> {
        let mut state = self.state.lock();
        let script = state.script.pop_front().unwrap_or(state.fallback);

        let sent = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        state.attempts.push(Attempt {
            at: Instant::now(),
            endpoint: endpoint.to_owned(),
            sink: sink.clone(),
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        });

        match script {
            Script::Open => {
                sink.opened();
            }
            Script::Fail => {
                sink.error("connection refused");
                sink.closed();
            }
            Script::Reject => {
                closed.store(true, Ordering::SeqCst);
                return Err(Error::invalid_endpoint(endpoint, "rejected by mock"));
            }
            Script::Pending => {}
        }

        Ok(Box::new(MockLink { sent, closed }))
    }
}

struct MockLink {
    sent: Arc<Mutex<Vec<Payload>>>,
    closed: Arc<AtomicBool>,
}

impl Link for MockLink {
    fn send(&self, payload: Payload) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::ConnectionClosed);
        }
        self.sent.lock().push(payload);
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
