//! One-shot readiness gate.
//!
//! The dispatcher opens the gate when the station gets an address; the
//! request call site blocks on it before touching the network.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::ReadyWait;

/// A latch that opens once and stays open.
#[derive(Debug, Default)]
pub struct ReadinessGate {
    ready: Mutex<bool>,
    cond: Condvar,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the gate and wake all waiters.
    ///
    /// Returns `true` only for the call that actually opened it.
    pub fn signal(&self) -> bool {
        let mut ready = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        if *ready {
            return false;
        }
        *ready = true;
        self.cond.notify_all();
        true
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until the gate opens.
    pub fn wait(&self) {
        let mut ready = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        while !*ready {
            ready = self.cond.wait(ready).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until the gate opens or `timeout` elapses.
    ///
    /// Returns whether the gate is open.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut ready = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        while !*ready {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .cond
                .wait_timeout(ready, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            ready = guard;
        }
        true
    }
}

/// Suspend the caller until the network is usable, per `strategy`.
///
/// Returns whether the caller should go ahead with its request. A signal
/// wait proceeds only once the gate is open; a fixed delay always proceeds,
/// warning when the address had not arrived in time.
pub fn wait_ready(gate: &ReadinessGate, strategy: ReadyWait) -> bool {
    match strategy {
        ReadyWait::Signal { .. } => {
            let ready = gate.wait_timeout(strategy.duration());
            if ready {
                info!("Network ready");
            } else {
                warn!("Network not ready after {:?}", strategy.duration());
            }
            ready
        }
        ReadyWait::FixedDelay { .. } => {
            std::thread::sleep(strategy.duration());
            let ready = gate.is_ready();
            if !ready {
                warn!(
                    "No address after fixed {:?} delay, continuing anyway",
                    strategy.duration()
                );
            }
            true
        }
    }
}
