//! Periodic JSON snapshot of relay state

use serde::Serialize;

use crate::stats::{RelayStats, StatsSnapshot};

/// JSON structure for one report line
#[derive(Debug, Serialize)]
pub struct RelayReport {
    pub ts_time: String,
    pub callsign: String,
    pub batch_target: usize,
    pub quality: u8,
    #[serde(flatten)]
    pub counters: StatsSnapshot,
}

/// Report generator for relay statistics
pub struct Reporter;

impl Reporter {
    pub fn create_report(
        stats: &RelayStats,
        callsign: String,
        batch_target: usize,
        quality: u8,
    ) -> RelayReport {
        RelayReport {
            ts_time: chrono::Utc::now().to_rfc3339(),
            callsign,
            batch_target,
            quality,
            counters: stats.snapshot(),
        }
    }

    pub fn to_json(report: &RelayReport) -> String {
        serde_json::to_string(report).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    }
}
