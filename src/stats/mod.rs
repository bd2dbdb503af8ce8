//! Relay counters shared across tasks

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use serde::Serialize;

use crate::realign::IngestOutcome;

/// Each counter has a single writing task; everything else only reads.
#[derive(Default)]
pub struct RelayStats {
    // TS task
    pub datagrams_in: AtomicU64,
    pub packets_extracted: AtomicU64,
    pub invalid_dropped: AtomicU64,
    pub null_dropped: AtomicU64,
    pub frames_forwarded: AtomicU64,
    pub batches_sent: AtomicU64,
    pub bytes_sent: AtomicU64,
    pub send_errors: AtomicU64,
    pub overflow_events: AtomicU64,
    pub resync_bytes_discarded: AtomicU64,

    // telemetry task
    pub telemetry_samples: AtomicU64,

    // heartbeat task
    pub heartbeats_sent: AtomicU64,

    // negotiation controller
    pub responses: AtomicU64,
    pub server_forwarded: AtomicI64,
    pub server_lost: AtomicI64,
}

impl RelayStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_ingest(&self, outcome: &IngestOutcome) {
        self.datagrams_in.fetch_add(1, Ordering::Relaxed);
        self.packets_extracted
            .fetch_add(outcome.packets as u64, Ordering::Relaxed);
        if outcome.truncated > 0 {
            self.overflow_events.fetch_add(1, Ordering::Relaxed);
        }
        self.resync_bytes_discarded
            .fetch_add(outcome.discarded as u64, Ordering::Relaxed);
    }

    pub fn record_batch(&self, bytes: usize) {
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_server_totals(&self, forwarded: i32, lost: i32) {
        self.responses.fetch_add(1, Ordering::Relaxed);
        self.server_forwarded.store(forwarded as i64, Ordering::Relaxed);
        self.server_lost.store(lost as i64, Ordering::Relaxed);
    }

    /// Point-in-time copy for reporting
    pub fn snapshot(&self) -> StatsSnapshot {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            datagrams_in: get(&self.datagrams_in),
            packets_extracted: get(&self.packets_extracted),
            invalid_dropped: get(&self.invalid_dropped),
            null_dropped: get(&self.null_dropped),
            frames_forwarded: get(&self.frames_forwarded),
            batches_sent: get(&self.batches_sent),
            bytes_sent: get(&self.bytes_sent),
            send_errors: get(&self.send_errors),
            overflow_events: get(&self.overflow_events),
            resync_bytes_discarded: get(&self.resync_bytes_discarded),
            telemetry_samples: get(&self.telemetry_samples),
            heartbeats_sent: get(&self.heartbeats_sent),
            responses: get(&self.responses),
            server_forwarded: self.server_forwarded.load(Ordering::Relaxed),
            server_lost: self.server_lost.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub datagrams_in: u64,
    pub packets_extracted: u64,
    pub invalid_dropped: u64,
    pub null_dropped: u64,
    pub frames_forwarded: u64,
    pub batches_sent: u64,
    pub bytes_sent: u64,
    pub send_errors: u64,
    pub overflow_events: u64,
    pub resync_bytes_discarded: u64,
    pub telemetry_samples: u64,
    pub heartbeats_sent: u64,
    pub responses: u64,
    pub server_forwarded: i64,
    pub server_lost: i64,
}
