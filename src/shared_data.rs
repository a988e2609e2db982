// src/shared_data.rs

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::flow_analyzer::metrics::NetworkMetrics;

/// Seconds since the Unix epoch (0 if the clock is before it).
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// One flat row per metrics snapshot, as written to the metrics log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub timestamp: u64,
    pub tick: u64,
    pub strategy: String,
    pub coordination_efficiency: f64,
    pub total_vehicles: u64,
    pub average_wait_time: f64,
    pub network_throughput: f64,
    pub co2_reduction: f64,
    /// Hotspot ids joined with ';'.
    pub congestion_hotspots: String,
}

impl MetricsRecord {
    pub fn from_metrics(timestamp: u64, tick: u64, strategy: &str, metrics: &NetworkMetrics) -> Self {
        Self {
            timestamp,
            tick,
            strategy: strategy.to_string(),
            coordination_efficiency: metrics.coordination_efficiency,
            total_vehicles: metrics.total_vehicles,
            average_wait_time: metrics.average_wait_time,
            network_throughput: metrics.network_throughput,
            co2_reduction: metrics.co2_reduction,
            congestion_hotspots: metrics
                .congestion_hotspots
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(";"),
        }
    }
}
