use serde::{Deserialize, Serialize};

use crate::flow_analyzer::metrics::NetworkMetrics;
use crate::simulation_engine::grid::IntersectionGrid;
use crate::simulation_engine::intersection::IntersectionId;

/// A congestion alert with a message and recommended action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CongestionAlert {
    /// `None` for network-wide alerts.
    pub intersection: Option<IntersectionId>,
    pub message: String,
    pub recommended_action: String,
}

/// Turns a metrics snapshot into alerts: one per hotspot, plus a network-wide
/// alert when more than half of the intersections are hotspots.
pub fn analyze_congestion(grid: &IntersectionGrid, metrics: &NetworkMetrics) -> Vec<CongestionAlert> {
    let mut alerts = Vec::new();

    if !grid.is_empty() && metrics.congestion_hotspots.len() * 2 > grid.len() {
        alerts.push(CongestionAlert {
            intersection: None,
            message: format!(
                "Network-wide congestion: {} of {} intersections above threshold",
                metrics.congestion_hotspots.len(),
                grid.len()
            ),
            recommended_action: String::from("Switch to a congestion-responsive strategy."),
        });
    }

    for id in &metrics.congestion_hotspots {
        let Some(node) = grid.get(id) else {
            continue;
        };
        alerts.push(CongestionAlert {
            intersection: Some(*id),
            message: format!(
                "Intersection {} is heavily congested ({:.0}%)",
                id,
                node.congestion_level()
            ),
            recommended_action: String::from("Extend green on the loaded approach."),
        });
    }

    alerts
}

/// Reports alerts through the log.
pub fn log_congestion_alerts(alerts: &[CongestionAlert]) {
    for alert in alerts {
        match alert.intersection {
            Some(id) => log::warn!("[{}] {} {}", id, alert.message, alert.recommended_action),
            None => log::warn!("{} {}", alert.message, alert.recommended_action),
        }
    }
}
