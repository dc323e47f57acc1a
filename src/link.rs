//! Poll Worker
//!
//! Dedicated thread running the receive loop over a [`Protocol`].
//!
//! ## Link States
//! ```text
//!              transport fault            reconnect attempt
//!  Connected ─────────────────► Faulted ─────────────────► Rediscovering(n)
//!      ▲                                                     │      │
//!      └──────────────────── reconnect ok ───────────────────┘      │
//!                                        attempts exhausted ────────┴──► Failed
//! ```
//!
//! - Decode faults are logged and skipped; they never leave `Connected`.
//! - Backoff between attempts doubles up to the configured ceiling.
//! - `stop()` interrupts any wait and ends the loop in `Stopped`.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{BridgeError, Result};
use crate::protocol::Protocol;
use crate::stream::Transport;

/// Observable state of the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connected,
    Faulted,
    Rediscovering { attempt: u32 },
    Stopped,
    Failed,
}

/// Handle to the polling thread
pub struct PollWorker {
    handle: Option<JoinHandle<(Protocol, Result<()>)>>,
    stop_tx: Sender<()>,
    state: Arc<RwLock<LinkState>>,
    events: Receiver<LinkState>,
}

impl PollWorker {
    /// Move the protocol onto a new thread and start polling
    pub fn spawn<T>(protocol: Protocol, transport: T, config: &Config) -> Result<Self>
    where
        T: Transport + 'static,
    {
        let (stop_tx, stop_rx) = channel::bounded(1);
        let (event_tx, events) = channel::unbounded();
        let state = Arc::new(RwLock::new(LinkState::Connected));

        let mut runner = Runner {
            protocol,
            transport,
            config: config.clone(),
            stop: stop_rx,
            state: Arc::clone(&state),
            events: event_tx,
        };

        let handle = thread::Builder::new()
            .name("bytelang-poll".to_string())
            .spawn(move || {
                let result = runner.run();
                (runner.protocol, result)
            })?;

        Ok(Self {
            handle: Some(handle),
            stop_tx,
            state,
            events,
        })
    }

    pub fn state(&self) -> LinkState {
        *self.state.read()
    }

    /// Every state change, in order
    pub fn events(&self) -> &Receiver<LinkState> {
        &self.events
    }

    /// Ask the loop to end; returns immediately
    pub fn stop(&self) {
        let _ = self.stop_tx.try_send(());
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Wait for the loop to end and take the protocol back
    ///
    /// The result is `Err` when the loop gave up on the link.
    pub fn join(mut self) -> (Protocol, Result<()>) {
        let handle = self
            .handle
            .take()
            .unwrap_or_else(|| unreachable!("poll worker joined twice"));
        match handle.join() {
            Ok(output) => output,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

impl Drop for PollWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.stop();
            let _ = handle.join();
        }
    }
}

// =============================================================================
// Loop
// =============================================================================

struct Runner<T> {
    protocol: Protocol,
    transport: T,
    config: Config,
    stop: Receiver<()>,
    state: Arc<RwLock<LinkState>>,
    events: Sender<LinkState>,
}

impl<T: Transport> Runner<T> {
    fn run(&mut self) -> Result<()> {
        tracing::info!("Polling {}", self.transport.describe());

        loop {
            match self.protocol.poll() {
                Ok(_) => {}
                Err(e) if e.is_decode() => {
                    tracing::warn!("Dropped malformed message: {}", e);
                }
                Err(BridgeError::Interrupted) => break,
                Err(e) if e.is_transport() => {
                    tracing::warn!(
                        "Connection error: {}. Rediscovering {}",
                        e,
                        self.transport.describe()
                    );
                    self.set_state(LinkState::Faulted);
                    if !self.recover(e)? {
                        break;
                    }
                }
                Err(e) => {
                    self.set_state(LinkState::Failed);
                    return Err(e);
                }
            }

            if self.wait(self.config.poll_interval()) {
                break;
            }
        }

        tracing::info!("Shutting down poll loop");
        self.set_state(LinkState::Stopped);
        Ok(())
    }

    /// Reconnect with backoff. `Ok(false)` means a stop arrived meanwhile.
    fn recover(&mut self, cause: BridgeError) -> Result<bool> {
        self.transport.close();
        let mut last_error = cause;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            if let Some(max) = self.config.max_reconnect_attempts {
                if attempt > max {
                    tracing::error!(
                        "Giving up on {} after {} attempts",
                        self.transport.describe(),
                        max
                    );
                    self.set_state(LinkState::Failed);
                    return Err(last_error);
                }
            }

            self.set_state(LinkState::Rediscovering { attempt });
            match self.transport.reconnect() {
                Ok(()) => {
                    tracing::info!("Connected to {}", self.transport.describe());
                    self.set_state(LinkState::Connected);
                    return Ok(true);
                }
                Err(e) => {
                    tracing::warn!("Reconnect attempt {} failed: {}", attempt, e);
                    last_error = e;
                }
            }

            if self.wait(self.config.backoff(attempt)) {
                return Ok(false);
            }
        }
    }

    /// Sleep unless stopped; `true` when the loop must end
    fn wait(&self, timeout: Duration) -> bool {
        match self.stop.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => false,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }

    fn set_state(&self, next: LinkState) {
        let mut state = self.state.write();
        if *state != next {
            tracing::debug!("Link state {:?} -> {:?}", *state, next);
            *state = next;
            let _ = self.events.send(next);
        }
    }
}
