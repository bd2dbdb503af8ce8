//! Latest signal-quality sample shared between the telemetry and TS tasks.
//!
//! Value and capture time are packed into one `AtomicU64` so a reader never
//! sees a value from one sample paired with the timestamp of another. The
//! telemetry task is the only writer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::debug;

use crate::constants::{QUALITY_FRESHNESS, QUALITY_PARAM_ID};
use crate::parsers::parse_status_line;

/// Reported when no fresh sample exists
pub const QUALITY_UNKNOWN: u8 = 0;

pub struct QualityTracker {
    epoch: Instant,
    /// `(millis since epoch + 1) << 8 | value`, 0 = never recorded
    packed: AtomicU64,
}

impl QualityTracker {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            packed: AtomicU64::new(0),
        }
    }

    /// Feed one telemetry datagram; returns true if it updated the sample
    pub fn ingest(&self, datagram: &[u8]) -> bool {
        self.ingest_at(datagram, Instant::now())
    }

    pub fn ingest_at(&self, datagram: &[u8], now: Instant) -> bool {
        match parse_status_line(datagram) {
            Some((QUALITY_PARAM_ID, value)) => {
                // MER arrives pre-scaled by 10; saturate rather than wrap into the sentinel
                let value = value.clamp(0, u8::MAX as i32) as u8;
                self.record_at(value, now);
                true
            }
            Some((id, _)) => {
                debug!(param = id, "ignoring status parameter");
                false
            }
            None => false,
        }
    }

    pub fn record_at(&self, value: u8, at: Instant) {
        let ms = at.saturating_duration_since(self.epoch).as_millis() as u64;
        self.packed
            .store(((ms + 1) << 8) | value as u64, Ordering::Release);
    }

    /// Quality byte for a frame built now
    pub fn current(&self) -> u8 {
        self.current_at(Instant::now())
    }

    /// Sample value if it is younger than the freshness window at `now`, else 0
    pub fn current_at(&self, now: Instant) -> u8 {
        let packed = self.packed.load(Ordering::Acquire);
        let stamp = packed >> 8;
        if stamp == 0 {
            return QUALITY_UNKNOWN;
        }
        let recorded_ms = stamp - 1;
        let now_ms = now.saturating_duration_since(self.epoch).as_millis() as u64;
        if now_ms.saturating_sub(recorded_ms) < QUALITY_FRESHNESS.as_millis() as u64 {
            (packed & 0xFF) as u8
        } else {
            QUALITY_UNKNOWN
        }
    }
}

impl Default for QualityTracker {
    fn default() -> Self {
        Self::new()
    }
}
