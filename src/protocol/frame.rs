use bytes::{Buf, BufMut};

use crate::constants::{
    DATA_FRAME_MAGIC, DATA_HEADER_LEN, FRAMED_UNIT_LEN, IDENTITY_FIELD_LEN, TS_PACKET_SIZE,
};
use crate::types::StationIdentity;

/// Header stamped in front of every forwarded TS packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub counter: u32,
    pub quality: u8,
}

impl FrameHeader {
    /// Read back a header from an encoded unit, `None` if the magic is wrong
    pub fn decode(unit: &[u8]) -> Option<(Self, [u8; IDENTITY_FIELD_LEN])> {
        if unit.len() < DATA_HEADER_LEN {
            return None;
        }
        let mut r = unit;
        if r.get_u16_le() != DATA_FRAME_MAGIC {
            return None;
        }
        let counter = r.get_u32_le();
        let quality = r.get_u8();
        let mut callsign = [0u8; IDENTITY_FIELD_LEN];
        r.copy_to_slice(&mut callsign);
        Some((Self { counter, quality }, callsign))
    }
}

/// Encode one framed unit into `slot` (exactly `FRAMED_UNIT_LEN` bytes)
pub fn write_framed_unit(
    slot: &mut [u8],
    header: FrameHeader,
    identity: &StationIdentity,
    packet: &[u8],
) {
    debug_assert_eq!(slot.len(), FRAMED_UNIT_LEN);
    debug_assert_eq!(packet.len(), TS_PACKET_SIZE);

    let mut w = &mut slot[..];
    w.put_u16_le(DATA_FRAME_MAGIC);
    w.put_u32_le(header.counter);
    w.put_u8(header.quality);
    w.put_slice(identity.callsign());
    w.put_slice(identity.key());
    w.put_slice(packet);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_layout() {
        let id = StationIdentity::new("M0ABC", "k3y");
        let mut packet = [0x55u8; TS_PACKET_SIZE];
        packet[0] = 0x47;
        let mut slot = [0u8; FRAMED_UNIT_LEN];
        write_framed_unit(&mut slot, FrameHeader { counter: 0x01020304, quality: 150 }, &id, &packet);

        assert_eq!(&slot[0..2], &[0xA2, 0x55]);
        assert_eq!(&slot[2..6], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(slot[6], 150);
        assert_eq!(&slot[7..17], b"M0ABC\0\0\0\0\0");
        assert_eq!(&slot[17..27], b"k3y\0\0\0\0\0\0\0");
        assert_eq!(&slot[DATA_HEADER_LEN..], &packet[..]);

        let (hdr, callsign) = FrameHeader::decode(&slot).unwrap();
        assert_eq!(hdr.counter, 0x01020304);
        assert_eq!(&callsign, id.callsign());
    }

    #[test]
    fn decode_rejects_zeroed_slot() {
        assert!(FrameHeader::decode(&[0u8; FRAMED_UNIT_LEN]).is_none());
    }
}
