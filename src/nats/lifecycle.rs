//! NATS connection lifecycle
//!
//! Tracks the run loop that owns the NATS connection and answers the
//! liveness and readiness probes from it.
//!
//! - Liveness: the run loop has not exited
//! - Readiness: the connection handle has been published through the
//!   readiness gate, and the live link reports itself connected

use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use super::client::{LinkStatus, Transport};
use crate::types::ProbeError;

const PHASE_UNINITIALIZED: u8 = 0;
const PHASE_CONNECTING: u8 = 1;
const PHASE_CONNECTED: u8 = 2;
const PHASE_EXITED: u8 = 3;

/// Observable connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Uninitialized,
    Connecting,
    Ready,
    Reconnecting,
    Disconnected,
}

/// Supervises the connection to the NATS cluster
pub struct ConnectionLifecycle {
    phase: AtomicU8,
    /// One-shot readiness gate: `None` until the transport is opened, then fixed
    gate: watch::Sender<Option<Arc<dyn Transport>>>,
}

impl Default for ConnectionLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionLifecycle {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(None);
        Self {
            phase: AtomicU8::new(PHASE_UNINITIALIZED),
            gate,
        }
    }

    /// Mark the run loop as started
    ///
    /// The returned guard marks it as exited when dropped, whichever way the
    /// run loop ends.
    pub fn begin_run(&self) -> RunGuard<'_> {
        self.phase.store(PHASE_CONNECTING, Ordering::SeqCst);
        debug!("Connection lifecycle: connecting");
        RunGuard { lifecycle: self }
    }

    /// Open the readiness gate with the connected transport
    ///
    /// Only the first call has any effect; returns whether this call opened it.
    pub fn open(&self, transport: Arc<dyn Transport>) -> bool {
        let mut slot = Some(transport);
        let opened = self.gate.send_if_modified(|current| {
            if current.is_none() {
                *current = slot.take();
                true
            } else {
                false
            }
        });

        if opened {
            // Never move an exited run loop back to connected
            let _ = self.phase.compare_exchange(
                PHASE_CONNECTING,
                PHASE_CONNECTED,
                Ordering::SeqCst,
                Ordering::SeqCst,
            );
            info!("NATS client ready");
        }
        opened
    }

    /// The connected transport, if the gate is open
    pub fn transport(&self) -> Option<Arc<dyn Transport>> {
        self.gate.borrow().clone()
    }

    /// Whether the run loop has exited
    pub fn has_exited(&self) -> bool {
        self.phase.load(Ordering::SeqCst) == PHASE_EXITED
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        match self.phase.load(Ordering::SeqCst) {
            PHASE_UNINITIALIZED => ConnectionState::Uninitialized,
            PHASE_CONNECTING => ConnectionState::Connecting,
            PHASE_EXITED => ConnectionState::Disconnected,
            _ => match self.transport().map(|t| t.status()) {
                Some(LinkStatus::Connected) => ConnectionState::Ready,
                _ => ConnectionState::Reconnecting,
            },
        }
    }

    /// Liveness probe: fails once the run loop has exited
    pub fn liveness_check(&self) -> Result<(), ProbeError> {
        if self.has_exited() {
            return Err(ProbeError::NotLive);
        }
        Ok(())
    }

    /// Readiness probe
    pub fn readiness_check(&self) -> Result<(), ProbeError> {
        let Some(transport) = self.transport() else {
            return Err(ProbeError::NotInitialised);
        };

        if self.has_exited() {
            return Err(ProbeError::Disconnected);
        }

        match transport.status() {
            LinkStatus::Connected => Ok(()),
            LinkStatus::Reconnecting => Err(ProbeError::Reconnecting),
            LinkStatus::Disconnected => Err(ProbeError::Disconnected),
        }
    }
}

/// Marks the run loop as exited when dropped
pub struct RunGuard<'a> {
    lifecycle: &'a ConnectionLifecycle,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.lifecycle.phase.store(PHASE_EXITED, Ordering::SeqCst);
        info!("Connection lifecycle: run loop exited");
    }
}
