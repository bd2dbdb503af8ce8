//! Stream realignment: arbitrary UDP chunk boundaries in, 188-byte packets out.

use tracing::warn;

use crate::constants::{REALIGN_CAPACITY, TS_PACKET_SIZE, TS_SYNC_BYTE};
use crate::error::RealignError;

/// What one `ingest` call did, for stats
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    pub packets: usize,
    /// Bytes cut from the tail of the incoming chunk
    pub truncated: usize,
    /// Junk bytes dropped while hunting for sync
    pub discarded: usize,
}

/// Bounded accumulator owned by the TS ingest task
pub struct Realigner {
    buf: Box<[u8]>,
    len: usize,
}

impl Realigner {
    pub fn new() -> Self {
        Self::with_capacity(REALIGN_CAPACITY)
    }

    /// Panics if `capacity` cannot hold a single packet
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity >= TS_PACKET_SIZE,
            "realign capacity must hold at least one packet"
        );
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    /// Valid bytes currently held
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Append `chunk` and hand every complete packet to `emit`, oldest first.
    /// The remainder stays buffered for the next call.
    pub fn ingest<F>(&mut self, chunk: &[u8], mut emit: F) -> Result<IngestOutcome, RealignError>
    where
        F: FnMut(&[u8]),
    {
        if chunk.is_empty() {
            return Err(RealignError::EmptyChunk);
        }
        let mut outcome = IngestOutcome::default();

        let room = self.capacity() - self.len;
        let take = chunk.len().min(room);
        if take < chunk.len() {
            outcome.truncated = chunk.len() - take;
            warn!(
                incoming = chunk.len(),
                overflow = outcome.truncated,
                "TS input too large for remaining realign buffer, truncating"
            );
        }
        self.buf[self.len..self.len + take].copy_from_slice(&chunk[..take]);
        self.len += take;

        if self.buf[0] != TS_SYNC_BYTE {
            match self.buf[..self.len].iter().position(|&b| b == TS_SYNC_BYTE) {
                None => {
                    outcome.discarded = self.len;
                    self.len = 0;
                    return Ok(outcome);
                }
                Some(k) => {
                    self.buf.copy_within(k..self.len, 0);
                    self.len -= k;
                    outcome.discarded = k;
                }
            }
        }

        let mut offset = 0;
        while self.len - offset >= TS_PACKET_SIZE {
            emit(&self.buf[offset..offset + TS_PACKET_SIZE]);
            offset += TS_PACKET_SIZE;
            outcome.packets += 1;
        }
        if offset > 0 {
            self.buf.copy_within(offset..self.len, 0);
            self.len -= offset;
        }
        Ok(outcome)
    }
}

impl Default for Realigner {
    fn default() -> Self {
        Self::new()
    }
}
