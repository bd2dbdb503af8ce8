//! Constants for TS relaying and the uplink protocol

use std::time::Duration;

/// MPEG-TS packet constants
pub const TS_PACKET_SIZE: usize = 188;
pub const TS_SYNC_BYTE: u8 = 0x47;
pub const TS_NULL_PID: u16 = 0x1FFF;

/// Local ingest ports
pub const DEFAULT_TS_PORT: u16 = 9002;
pub const DEFAULT_TELEMETRY_PORT: u16 = 9003;

/// Default uplink server
pub const DEFAULT_HOST: &str = "live.ariss.org";
pub const DEFAULT_PORT: u16 = 5678;

/// Receive buffer for ingest sockets (SO_RCVBUF and per-read buffer)
pub const INGEST_RECV_BUFFER: usize = 212_992;

/// Realignment accumulator capacity
pub const REALIGN_CAPACITY: usize = 16_384;

/// Station identity field width on the wire
pub const IDENTITY_FIELD_LEN: usize = 10;

/// Magic discriminators (little-endian on the wire)
pub const DATA_FRAME_MAGIC: u16 = 0x55A2;
pub const HEARTBEAT_MAGIC: u16 = 0x55A3;
pub const HEARTBEAT_RESPONSE_MAGIC: u16 = 0x55A4;

/// magic(2) + counter(4) + quality(1) + callsign(10) + key(10)
pub const DATA_HEADER_LEN: usize = 2 + 4 + 1 + IDENTITY_FIELD_LEN * 2;
/// One framed unit: header + TS payload
pub const FRAMED_UNIT_LEN: usize = DATA_HEADER_LEN + TS_PACKET_SIZE;

/// magic(2) + callsign(10) + key(10) + declared length(2)
pub const HEARTBEAT_HEADER_LEN: usize = 2 + IDENTITY_FIELD_LEN * 2 + 2;
/// magic(2) + auth(1) + echoed length(2) + forwarded(4) + lost(4)
pub const HEARTBEAT_RESPONSE_LEN: usize = 2 + 1 + 2 + 4 + 4;
pub const AUTH_REJECTED: u8 = 0x00;

/// Batch buffer slots; the wire payload of a data write is always this many units
pub const BATCH_CAPACITY: usize = 4;
pub const DEFAULT_BATCH_TARGET: usize = 2;

/// Heartbeat / probe timing
pub const PROBE_TICKS: usize = 10;
pub const PROBE_INTERVAL: Duration = Duration::from_secs(1);
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(10);

/// Quality sample freshness window
pub const QUALITY_FRESHNESS: Duration = Duration::from_millis(1000);
/// Telemetry parameter carrying the MER / SNR indicator
pub const QUALITY_PARAM_ID: i32 = 12;

/// Negotiation controller poll interval
pub const RESPONSE_POLL_INTERVAL: Duration = Duration::from_millis(50);
pub const RESPONSE_BUFFER: usize = 1024;
