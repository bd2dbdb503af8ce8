//! Error types for the relay

use std::io;
use thiserror::Error;

/// Process-level failures. Anything in here ends the relay.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("failed to resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("no usable address for {host} ({family})")]
    NoUsableAddress { host: String, family: String },

    #[error("failed to bind UDP port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Rejections from the stream realigner
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RealignError {
    #[error("invalid zero-length TS datagram")]
    EmptyChunk,
}

/// TS header validation failures
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TsHeaderError {
    #[error("packet length {0} is not 188")]
    BadLength(usize),

    #[error("bad sync byte 0x{0:02X}")]
    BadSync(u8),

    #[error("transport error indicator set on PID 0x{0:04X}")]
    TransportError(u16),
}

/// Heartbeat response decode failures
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResponseError {
    #[error("response too short: {0} bytes")]
    Short(usize),

    #[error("unknown magic 0x{0:04X}")]
    BadMagic(u16),
}

pub type Result<T, E = RelayError> = std::result::Result<T, E>;
