//! Heartbeat response handling: batch sizing and authentication outcome.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::constants::FRAMED_UNIT_LEN;
use crate::error::ResponseError;
use crate::protocol::HeartbeatResponse;
use crate::stats::RelayStats;

/// Number of framed units per data write.
///
/// Written only by the negotiation controller, read by the TS task. The
/// value never decreases and never exceeds the batch buffer capacity.
#[derive(Debug)]
pub struct BatchTarget {
    value: AtomicUsize,
    capacity: usize,
}

impl BatchTarget {
    pub fn new(initial: usize, capacity: usize) -> Self {
        assert!(capacity > 0, "batch capacity must be non-zero");
        Self {
            value: AtomicUsize::new(initial.clamp(1, capacity)),
            capacity,
        }
    }

    pub fn get(&self) -> usize {
        self.value.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Ratchet up to `candidate` (clamped to capacity); returns the new target
    pub fn raise(&self, candidate: usize) -> usize {
        let candidate = candidate.min(self.capacity);
        let prev = self.value.fetch_max(candidate, Ordering::AcqRel);
        prev.max(candidate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Probing,
    Operating,
    Terminated,
}

/// What a single response did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    Accepted { tested_len: i16, target: usize },
    Rejected,
}

pub struct Negotiator {
    target: Arc<BatchTarget>,
    stats: Arc<RelayStats>,
    shutdown: CancellationToken,
    state: SessionState,
}

impl Negotiator {
    pub fn new(target: Arc<BatchTarget>, stats: Arc<RelayStats>, shutdown: CancellationToken) -> Self {
        Self {
            target,
            stats,
            shutdown,
            state: SessionState::Probing,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn handle(&mut self, datagram: &[u8]) -> Outcome {
        if self.state == SessionState::Terminated {
            return Outcome::Ignored;
        }

        let resp = match HeartbeatResponse::decode(datagram) {
            Ok(resp) => resp,
            Err(ResponseError::BadMagic(magic)) => {
                debug!("ignoring datagram with magic 0x{magic:04X}");
                return Outcome::Ignored;
            }
            Err(ResponseError::Short(len)) => {
                debug!(len, "ignoring short datagram");
                return Outcome::Ignored;
            }
        };

        if !resp.authenticated {
            error!("server reported authentication failed, check callsign and key");
            self.state = SessionState::Terminated;
            self.shutdown.cancel();
            return Outcome::Rejected;
        }

        let candidate = usize::try_from(resp.tested_len).unwrap_or(0) / FRAMED_UNIT_LEN;
        let target = self.target.raise(candidate);
        self.stats.record_server_totals(resp.ts_forwarded, resp.ts_lost);
        self.state = SessionState::Operating;

        info!(
            "heartbeat response: tested size {}B (max batch now {}), TS uploaded total {}, loss {}",
            resp.tested_len, target, resp.ts_forwarded, resp.ts_lost
        );
        Outcome::Accepted {
            tested_len: resp.tested_len,
            target,
        }
    }
}
