//! TS path: realign → validate/filter → frame → batch

mod batch;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;

use tracing::debug;

pub use batch::BatchBuffer;

use crate::error::RealignError;
use crate::negotiation::BatchTarget;
use crate::parsers::parse_header;
use crate::protocol::{write_framed_unit, FrameHeader};
use crate::quality::QualityTracker;
use crate::realign::{IngestOutcome, Realigner};
use crate::stats::RelayStats;
use crate::types::StationIdentity;

/// Stamps counter and quality onto forwarded packets.
/// The counter advances once per forwarded frame and wraps at 2^32.
pub struct FrameBuilder {
    counter: u32,
    quality: Arc<QualityTracker>,
}

impl FrameBuilder {
    pub fn new(quality: Arc<QualityTracker>) -> Self {
        Self::starting_at(quality, 0)
    }

    pub fn starting_at(quality: Arc<QualityTracker>, counter: u32) -> Self {
        Self { counter, quality }
    }

    pub fn next_header(&mut self, now: Instant) -> FrameHeader {
        let header = FrameHeader {
            counter: self.counter,
            quality: self.quality.current_at(now),
        };
        self.counter = self.counter.wrapping_add(1);
        header
    }
}

/// Everything downstream of the realigner
struct FrameSink {
    identity: Arc<StationIdentity>,
    builder: FrameBuilder,
    batch: BatchBuffer,
    target: Arc<BatchTarget>,
    stats: Arc<RelayStats>,
}

impl FrameSink {
    fn forward<F: FnMut(&[u8])>(&mut self, packet: &[u8], flush: &mut F) {
        let hdr = match parse_header(packet) {
            Ok(hdr) => hdr,
            Err(e) => {
                debug!("TS_INVALID: {e}");
                self.stats.invalid_dropped.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };
        // null/padding packets only keep the source bitrate constant
        if hdr.is_null() {
            self.stats.null_dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let header = self.builder.next_header(Instant::now());
        let Some(slot) = self.batch.next_slot() else {
            // unreachable while commit() clamps to capacity
            self.batch.reset();
            return;
        };
        write_framed_unit(slot, header, &self.identity, packet);
        self.stats.frames_forwarded.fetch_add(1, Ordering::Relaxed);

        if self.batch.commit(self.target.get()) {
            flush(self.batch.payload());
            self.batch.reset();
        }
    }
}

/// Owned by the TS ingest task
pub struct PacketProcessor {
    realigner: Realigner,
    sink: FrameSink,
}

impl PacketProcessor {
    pub fn new(
        identity: Arc<StationIdentity>,
        quality: Arc<QualityTracker>,
        target: Arc<BatchTarget>,
        stats: Arc<RelayStats>,
    ) -> Self {
        Self::with_builder(identity, FrameBuilder::new(quality), target, stats)
    }

    pub fn with_builder(
        identity: Arc<StationIdentity>,
        builder: FrameBuilder,
        target: Arc<BatchTarget>,
        stats: Arc<RelayStats>,
    ) -> Self {
        let capacity = target.capacity();
        Self {
            realigner: Realigner::new(),
            sink: FrameSink {
                identity,
                builder,
                batch: BatchBuffer::new(capacity),
                target,
                stats,
            },
        }
    }

    /// Process one TS datagram. `flush` is called with the full batch
    /// payload each time the batch reaches its target.
    pub fn process_datagram<F>(&mut self, chunk: &[u8], mut flush: F) -> Result<IngestOutcome, RealignError>
    where
        F: FnMut(&[u8]),
    {
        let sink = &mut self.sink;
        let outcome = self
            .realigner
            .ingest(chunk, |packet| sink.forward(packet, &mut flush))?;
        sink.stats.record_ingest(&outcome);
        Ok(outcome)
    }

    pub fn pending_frames(&self) -> usize {
        self.sink.batch.fill()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{
        BATCH_CAPACITY, DATA_HEADER_LEN, FRAMED_UNIT_LEN, TS_NULL_PID, TS_PACKET_SIZE,
    };
    use proptest::prelude::*;
    use std::time::Duration;

    fn ts_packet(pid: u16, tag: u8) -> Vec<u8> {
        let mut p = vec![tag; TS_PACKET_SIZE];
        p[0] = 0x47;
        p[1] = (pid >> 8) as u8 & 0x1F;
        p[2] = pid as u8;
        p[3] = 0x10;
        p
    }

    fn processor(target: usize, quality: Arc<QualityTracker>, counter: u32) -> PacketProcessor {
        PacketProcessor::with_builder(
            Arc::new(StationIdentity::new("M0ABC", "k3y")),
            FrameBuilder::starting_at(quality, counter),
            Arc::new(BatchTarget::new(target, BATCH_CAPACITY)),
            Arc::new(RelayStats::new()),
        )
    }

    fn units(payload: &[u8]) -> Vec<(FrameHeader, &[u8])> {
        payload
            .chunks_exact(FRAMED_UNIT_LEN)
            .filter_map(|u| FrameHeader::decode(u).map(|(h, _)| (h, &u[DATA_HEADER_LEN..])))
            .collect()
    }

    #[test]
    fn junk_then_packet_frames_with_counter_zero() {
        let mut p = processor(1, Arc::new(QualityTracker::new()), 0);
        let mut chunk = vec![0x00, 0x00];
        chunk.extend(ts_packet(0x100, 0xAB));

        let mut writes = Vec::new();
        p.process_datagram(&chunk, |w| writes.push(w.to_vec())).unwrap();
        assert_eq!(writes.len(), 1);
        let frames = units(&writes[0]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].0, FrameHeader { counter: 0, quality: 0 });
        assert_eq!(frames[0].1, &ts_packet(0x100, 0xAB)[..]);
    }

    #[test]
    fn four_packets_one_write_in_order() {
        let mut p = processor(4, Arc::new(QualityTracker::new()), 0);
        let mut chunk = Vec::new();
        for tag in 1..=4 {
            chunk.extend(ts_packet(0x100, tag));
        }
        let mut writes = Vec::new();
        p.process_datagram(&chunk, |w| writes.push(w.to_vec())).unwrap();

        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].len(), BATCH_CAPACITY * FRAMED_UNIT_LEN);
        let frames = units(&writes[0]);
        let counters: Vec<u32> = frames.iter().map(|(h, _)| h.counter).collect();
        assert_eq!(counters, vec![0, 1, 2, 3]);
        for (i, (_, payload)) in frames.iter().enumerate() {
            assert_eq!(payload[5], i as u8 + 1);
        }
        assert_eq!(p.pending_frames(), 0);
    }

    #[test]
    fn null_and_invalid_packets_are_not_framed() {
        let mut p = processor(2, Arc::new(QualityTracker::new()), 0);
        let mut bad = ts_packet(0x100, 0);
        bad[1] |= 0x80; // transport error
        let mut chunk = ts_packet(TS_NULL_PID, 0);
        chunk.extend(bad);
        chunk.extend(ts_packet(0x101, 1));
        chunk.extend(ts_packet(TS_NULL_PID, 0));
        chunk.extend(ts_packet(0x102, 2));

        let mut writes = Vec::new();
        p.process_datagram(&chunk, |w| writes.push(w.to_vec())).unwrap();
        assert_eq!(writes.len(), 1);
        let frames = units(&writes[0]);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].0.counter, 0);
        assert_eq!(frames[1].0.counter, 1);

        let snap = p.sink.stats.snapshot();
        assert_eq!(snap.null_dropped, 2);
        assert_eq!(snap.invalid_dropped, 1);
        assert_eq!(snap.frames_forwarded, 2);
    }

    #[test]
    fn fresh_quality_is_stamped() {
        let quality = Arc::new(QualityTracker::new());
        quality.record_at(150, Instant::now());
        let mut p = processor(1, quality, 0);

        let mut writes = Vec::new();
        p.process_datagram(&ts_packet(0x100, 0), |w| writes.push(w.to_vec())).unwrap();
        assert_eq!(units(&writes[0])[0].0.quality, 150);
    }

    #[test]
    fn stale_quality_is_unknown() {
        let quality = Arc::new(QualityTracker::new());
        let mut builder = FrameBuilder::new(quality.clone());
        let t0 = Instant::now();
        quality.record_at(150, t0);
        assert_eq!(builder.next_header(t0 + Duration::from_millis(200)).quality, 150);
        assert_eq!(builder.next_header(t0 + Duration::from_millis(1500)).quality, 0);
    }

    #[test]
    fn counter_wraps() {
        let mut b = FrameBuilder::starting_at(Arc::new(QualityTracker::new()), u32::MAX);
        let now = Instant::now();
        assert_eq!(b.next_header(now).counter, u32::MAX);
        assert_eq!(b.next_header(now).counter, 0);
    }

    #[test]
    fn partial_batch_waits() {
        let mut p = processor(4, Arc::new(QualityTracker::new()), 0);
        let mut writes = 0;
        p.process_datagram(&ts_packet(0x100, 0), |_| writes += 1).unwrap();
        assert_eq!(writes, 0);
        assert_eq!(p.pending_frames(), 1);
    }

    proptest! {
        #[test]
        fn forwarded_counters_step_by_one(
            start in any::<u32>(),
            pids in proptest::collection::vec(prop_oneof![Just(TS_NULL_PID), 0u16..0x1FFF], 1..60),
        ) {
            let mut p = processor(1, Arc::new(QualityTracker::new()), start);
            let mut chunk = Vec::new();
            for &pid in &pids {
                chunk.extend(ts_packet(pid, 0));
            }
            let mut counters = Vec::new();
            p.process_datagram(&chunk, |w| {
                counters.extend(units(w).iter().take(1).map(|(h, _)| h.counter));
            }).unwrap();

            let expected = pids.iter().filter(|&&pid| pid != TS_NULL_PID).count();
            prop_assert_eq!(counters.len(), expected);
            for pair in counters.windows(2) {
                prop_assert_eq!(pair[1], pair[0].wrapping_add(1));
            }
            if let Some(first) = counters.first() {
                prop_assert_eq!(*first, start);
            }
        }
    }
}
