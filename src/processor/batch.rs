//! Fixed-capacity batch buffer.
//!
//! Slots are filled left to right. A flush always covers every slot, so the
//! datagram length is `capacity * FRAMED_UNIT_LEN` whatever the target is;
//! slots past the fill count keep whatever they last held (zeroes at start).

use crate::constants::FRAMED_UNIT_LEN;

pub struct BatchBuffer {
    buf: Box<[u8]>,
    fill: usize,
    capacity: usize,
}

impl BatchBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity * FRAMED_UNIT_LEN].into_boxed_slice(),
            fill: 0,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn fill(&self) -> usize {
        self.fill
    }

    /// Next free slot, `None` when every slot is used
    pub fn next_slot(&mut self) -> Option<&mut [u8]> {
        if self.fill >= self.capacity {
            return None;
        }
        let start = self.fill * FRAMED_UNIT_LEN;
        Some(&mut self.buf[start..start + FRAMED_UNIT_LEN])
    }

    /// Mark the slot returned by `next_slot` as used.
    /// Returns true once the fill count reaches `target` (clamped to capacity).
    pub fn commit(&mut self, target: usize) -> bool {
        debug_assert!(self.fill < self.capacity);
        self.fill += 1;
        self.fill >= target.clamp(1, self.capacity)
    }

    /// Full buffer contents for one network write
    pub fn payload(&self) -> &[u8] {
        &self.buf
    }

    pub fn reset(&mut self) {
        self.fill = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flushes_at_target_with_full_payload() {
        let mut b = BatchBuffer::new(4);
        b.next_slot().unwrap().fill(1);
        assert!(!b.commit(2));
        b.next_slot().unwrap().fill(2);
        assert!(b.commit(2));
        assert_eq!(b.payload().len(), 4 * FRAMED_UNIT_LEN);
        assert_eq!(b.payload()[FRAMED_UNIT_LEN], 2);
        assert_eq!(b.payload()[2 * FRAMED_UNIT_LEN], 0);
        b.reset();
        assert_eq!(b.fill(), 0);
    }

    #[test]
    fn oversized_target_is_clamped() {
        let mut b = BatchBuffer::new(2);
        b.next_slot().unwrap();
        assert!(!b.commit(100));
        b.next_slot().unwrap();
        assert!(b.commit(100));
        assert!(b.next_slot().is_none());
    }
}
