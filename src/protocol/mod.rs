//! Uplink wire formats.
//!
//! All multi-byte fields are little-endian regardless of host.
//!
//! ```text
//! data frame      magic(2) counter(4) quality(1) callsign(10) key(10) ts(188)
//! heartbeat       magic(2) callsign(10) key(10) declared_len(2, i16) zero fill
//! hb response     magic(2) auth(1) echoed_len(2, i16) forwarded(4, i32) lost(4, i32)
//! ```

pub mod frame;
pub mod heartbeat;
pub mod response;

pub use frame::{write_framed_unit, FrameHeader};
pub use heartbeat::encode_heartbeat;
pub use response::HeartbeatResponse;
