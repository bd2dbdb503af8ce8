// src/lib.rs
//! MPEG-TS uplink relay.
//!
//! Receives a TS feed and receiver status lines on local UDP ports, frames
//! each TS packet with station identity, a counter and the current signal
//! quality, and forwards batches to the aggregation server. A heartbeat loop
//! authenticates the station and discovers the largest safe batch size.

pub mod relay {
    pub use crate::core::Relay;
    pub use crate::error::RelayError;
    pub use crate::types::{AddressFamily, Options, ShutdownReason, StationIdentity};

    /// Async entry-point; returns when authentication fails, on Ctrl-C, or on a fatal socket error
    pub async fn run(opts: Options) -> Result<ShutdownReason, RelayError> {
        Relay::bind(opts).await?.run().await
    }
}

pub mod constants;
pub mod error;
pub mod heartbeat;
pub mod negotiation;
pub mod network;
pub mod parsers;
pub mod processor;
pub mod protocol;
pub mod quality;
pub mod realign;
pub mod report;
pub mod stats;
pub mod types;
mod core;
