//! Heartbeat / probe engine.
//!
//! The first `PROBE_TICKS` heartbeats grow by one framed unit per second so
//! the server can report the largest datagram it received intact. After that
//! a single-unit keep-alive goes out every `KEEPALIVE_INTERVAL`. Every
//! heartbeat carries the station identity; there is no separate handshake.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::constants::{KEEPALIVE_INTERVAL, PROBE_INTERVAL, PROBE_TICKS};
use crate::protocol::encode_heartbeat;
use crate::stats::RelayStats;
use crate::types::StationIdentity;

/// One heartbeat to send and how long to wait afterwards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTick {
    pub units: usize,
    pub delay_after: Duration,
}

/// Endless probe-then-keepalive schedule
#[derive(Debug, Default)]
pub struct ProbeSchedule {
    tick: usize,
}

impl ProbeSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_probing(&self) -> bool {
        self.tick < PROBE_TICKS
    }
}

impl Iterator for ProbeSchedule {
    type Item = ProbeTick;

    fn next(&mut self) -> Option<ProbeTick> {
        let tick = if self.is_probing() {
            self.tick += 1;
            ProbeTick {
                units: self.tick,
                delay_after: PROBE_INTERVAL,
            }
        } else {
            ProbeTick {
                units: 1,
                delay_after: KEEPALIVE_INTERVAL,
            }
        };
        Some(tick)
    }
}

/// Runs until `shutdown` fires. Send failures are logged and the schedule continues.
pub async fn run_heartbeat(
    socket: Arc<UdpSocket>,
    identity: Arc<StationIdentity>,
    stats: Arc<RelayStats>,
    shutdown: CancellationToken,
) {
    for tick in ProbeSchedule::new() {
        if shutdown.is_cancelled() {
            break;
        }
        let hb = encode_heartbeat(&identity, tick.units);
        match socket.send(&hb).await {
            Ok(n) => {
                debug!(units = tick.units, bytes = n, "heartbeat sent");
                stats.heartbeats_sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => warn!(units = tick.units, "heartbeat send failed: {e}"),
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(tick.delay_after) => {}
        }
    }
    debug!("heartbeat loop stopped");
}
