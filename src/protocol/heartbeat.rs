use bytes::{BufMut, BytesMut};

use crate::constants::{FRAMED_UNIT_LEN, HEARTBEAT_HEADER_LEN, HEARTBEAT_MAGIC};
use crate::types::StationIdentity;

/// Build a heartbeat padded to `units` framed-unit lengths.
/// The declared length field carries the full datagram size.
pub fn encode_heartbeat(identity: &StationIdentity, units: usize) -> BytesMut {
    let len = (units.max(1) * FRAMED_UNIT_LEN).max(HEARTBEAT_HEADER_LEN);
    let mut buf = BytesMut::with_capacity(len);
    buf.put_u16_le(HEARTBEAT_MAGIC);
    buf.put_slice(identity.callsign());
    buf.put_slice(identity.key());
    buf.put_i16_le(i16::try_from(len).unwrap_or(i16::MAX));
    buf.resize(len, 0);
    buf
}
