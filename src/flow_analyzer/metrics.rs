use serde::{Deserialize, Serialize};

use crate::simulation_engine::grid::IntersectionGrid;
use crate::simulation_engine::intersection::IntersectionId;

/// Network-level statistics derived from the current intersection states.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    /// How closely phases matched the last executed strategy's ideal pattern (%).
    pub coordination_efficiency: f64,
    pub total_vehicles: u64,
    /// Seconds.
    pub average_wait_time: f64,
    /// Vehicles per hour.
    pub network_throughput: f64,
    /// Emissions-reduction proxy (%).
    pub co2_reduction: f64,
    /// Intersections above the hotspot threshold, in grid order.
    pub congestion_hotspots: Vec<IntersectionId>,
}

/// Computes the metrics snapshot. `coordination_efficiency` is the score of
/// the last executed strategy run. An empty grid yields all zeros.
pub fn calculate_network_metrics(
    grid: &IntersectionGrid,
    coordination_efficiency: f64,
) -> NetworkMetrics {
    if grid.is_empty() {
        return NetworkMetrics::default();
    }
    let config = grid.config();
    let nodes = grid.nodes();
    let node_count = nodes.len() as f64;

    let total_vehicles: u64 = nodes.iter().map(|n| n.vehicle_count() as u64).sum();

    let average_congestion =
        nodes.iter().map(|n| n.congestion_level()).sum::<f64>() / node_count;
    let average_wait_time =
        config.base_wait_seconds + average_congestion * config.wait_per_congestion_percent;

    // Each intersection discharges one vehicle per average wait.
    let network_throughput = if average_wait_time > 0.0 {
        3600.0 / average_wait_time * node_count
    } else {
        0.0
    };

    let coordination_efficiency = finite_or_zero(coordination_efficiency).min(100.0);
    let co2_reduction = (coordination_efficiency * config.co2_factor).clamp(0.0, 100.0);

    let congestion_hotspots = nodes
        .iter()
        .filter(|n| n.congestion_level() > config.hotspot_threshold)
        .map(|n| n.id)
        .collect();

    NetworkMetrics {
        coordination_efficiency,
        total_vehicles,
        average_wait_time: finite_or_zero(average_wait_time),
        network_throughput: finite_or_zero(network_throughput),
        co2_reduction,
        congestion_hotspots,
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
