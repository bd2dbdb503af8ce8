//! Parsers for the relay's two ingest feeds
//!
//! `ts` validates transport packet headers, `telemetry` decodes the
//! receiver's status lines.

pub mod telemetry;
pub mod ts;

pub use telemetry::parse_status_line;
pub use ts::{parse_header, TsHeader};
