//! TS packet header parser

use bitstream_io::{BigEndian, BitRead, BitReader};

use crate::constants::{TS_NULL_PID, TS_PACKET_SIZE, TS_SYNC_BYTE};
use crate::error::TsHeaderError;

/// Decoded 4-byte transport packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TsHeader {
    pub transport_error: bool,
    pub payload_unit_start: bool,
    pub priority: bool,
    pub pid: u16,
    pub scrambling: u8,
    pub adaptation_field_ctrl: u8,
    pub continuity_counter: u8,
}

impl TsHeader {
    pub fn is_null(&self) -> bool {
        self.pid == TS_NULL_PID
    }
}

/// Parse and validate the header of one 188-byte packet
pub fn parse_header(packet: &[u8]) -> Result<TsHeader, TsHeaderError> {
    if packet.len() != TS_PACKET_SIZE {
        return Err(TsHeaderError::BadLength(packet.len()));
    }
    if packet[0] != TS_SYNC_BYTE {
        return Err(TsHeaderError::BadSync(packet[0]));
    }

    // bytes 1..4 are always present past the length check
    let hdr = read_fields(&packet[1..4]).map_err(|_| TsHeaderError::BadLength(packet.len()))?;

    if hdr.transport_error {
        return Err(TsHeaderError::TransportError(hdr.pid));
    }
    Ok(hdr)
}

fn read_fields(bytes: &[u8]) -> std::io::Result<TsHeader> {
    let mut br = BitReader::endian(bytes, BigEndian);
    Ok(TsHeader {
        transport_error: br.read::<1, u8>()? != 0,
        payload_unit_start: br.read::<1, u8>()? != 0,
        priority: br.read::<1, u8>()? != 0,
        pid: br.read::<13, u16>()?,
        scrambling: br.read::<2, u8>()?,
        adaptation_field_ctrl: br.read::<2, u8>()?,
        continuity_counter: br.read::<4, u8>()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(pid: u16, flags: u8) -> [u8; TS_PACKET_SIZE] {
        let mut p = [0xFFu8; TS_PACKET_SIZE];
        p[0] = TS_SYNC_BYTE;
        p[1] = flags | ((pid >> 8) as u8 & 0x1F);
        p[2] = pid as u8;
        p[3] = 0x17;
        p
    }

    #[test]
    fn parses_pid_and_flags() {
        let hdr = parse_header(&packet(0x0100, 0x40)).unwrap();
        assert_eq!(hdr.pid, 0x0100);
        assert!(hdr.payload_unit_start);
        assert!(!hdr.transport_error);
        assert_eq!(hdr.adaptation_field_ctrl, 1);
        assert_eq!(hdr.continuity_counter, 7);
        assert!(!hdr.is_null());
    }

    #[test]
    fn null_pid_is_recognised() {
        assert!(parse_header(&packet(TS_NULL_PID, 0)).unwrap().is_null());
    }

    #[test]
    fn rejects_bad_sync() {
        let mut p = packet(0x100, 0);
        p[0] = 0x48;
        assert_eq!(parse_header(&p), Err(TsHeaderError::BadSync(0x48)));
    }

    #[test]
    fn rejects_transport_error() {
        assert_eq!(
            parse_header(&packet(0x0042, 0x80)),
            Err(TsHeaderError::TransportError(0x0042))
        );
    }

    #[test]
    fn rejects_short_packet() {
        assert_eq!(parse_header(&[0x47; 100]), Err(TsHeaderError::BadLength(100)));
    }
}
