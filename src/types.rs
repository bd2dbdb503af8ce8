use std::fmt;

use crate::constants::{
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TELEMETRY_PORT, DEFAULT_TS_PORT, IDENTITY_FIELD_LEN,
};

/// Fixed-width callsign + preshared key, set once at startup
#[derive(Clone, PartialEq, Eq)]
pub struct StationIdentity {
    callsign: [u8; IDENTITY_FIELD_LEN],
    key: [u8; IDENTITY_FIELD_LEN],
}

impl StationIdentity {
    /// Truncates each field to 10 bytes and zero-pads the rest
    pub fn new(callsign: &str, key: &str) -> Self {
        Self {
            callsign: fixed_field(callsign),
            key: fixed_field(key),
        }
    }

    pub fn callsign(&self) -> &[u8; IDENTITY_FIELD_LEN] {
        &self.callsign
    }

    pub fn key(&self) -> &[u8; IDENTITY_FIELD_LEN] {
        &self.key
    }

    pub fn callsign_str(&self) -> String {
        field_str(&self.callsign)
    }

    /// Both fields must carry at least one byte
    pub fn is_complete(&self) -> bool {
        self.callsign[0] != 0 && self.key[0] != 0
    }

    pub fn key_len(&self) -> usize {
        self.key.iter().take_while(|&&b| b != 0).count()
    }
}

// keep the key out of logs
impl fmt::Debug for StationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StationIdentity")
            .field("callsign", &self.callsign_str())
            .field("key_len", &self.key_len())
            .finish()
    }
}

fn fixed_field(s: &str) -> [u8; IDENTITY_FIELD_LEN] {
    let mut out = [0u8; IDENTITY_FIELD_LEN];
    let n = s.len().min(IDENTITY_FIELD_LEN);
    out[..n].copy_from_slice(&s.as_bytes()[..n]);
    out
}

fn field_str(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Address family restriction for the uplink socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressFamily {
    /// IPv6 preferred, IPv4 fallback
    #[default]
    Any,
    V4,
    V6,
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::Any => f.write_str("IPv6/IPv4"),
            AddressFamily::V4 => f.write_str("IPv4"),
            AddressFamily::V6 => f.write_str("IPv6"),
        }
    }
}

/// Why the relay stopped without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    AuthenticationRejected,
    Interrupted,
}

/// Configuration options for the relay
#[derive(Debug, Clone)]
pub struct Options {
    pub host: String,
    pub port: u16,
    pub family: AddressFamily,
    pub identity: StationIdentity,
    pub ts_port: u16,
    pub telemetry_port: u16,
    /// Interval of the JSON stats snapshot, 0 disables it
    pub report_secs: u64,
}

impl Options {
    pub fn new(identity: StationIdentity) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            family: AddressFamily::Any,
            identity,
            ts_port: DEFAULT_TS_PORT,
            telemetry_port: DEFAULT_TELEMETRY_PORT,
            report_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_fields_are_truncated_and_padded() {
        let id = StationIdentity::new("M0ABC", "averyveryverylongkey");
        assert_eq!(id.callsign(), b"M0ABC\0\0\0\0\0");
        assert_eq!(id.key(), b"averyveryv");
        assert_eq!(id.callsign_str(), "M0ABC");
        assert_eq!(id.key_len(), 10);
        assert!(id.is_complete());
    }

    #[test]
    fn empty_fields_are_incomplete() {
        assert!(!StationIdentity::new("", "key").is_complete());
        assert!(!StationIdentity::new("M0ABC", "").is_complete());
    }

    #[test]
    fn debug_hides_key() {
        let id = StationIdentity::new("M0ABC", "secret");
        let dbg = format!("{id:?}");
        assert!(dbg.contains("M0ABC"));
        assert!(!dbg.contains("secret"));
    }
}
