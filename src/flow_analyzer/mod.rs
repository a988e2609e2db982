pub mod alerts;
pub mod metrics;

pub use alerts::{analyze_congestion, log_congestion_alerts, CongestionAlert};
pub use metrics::{calculate_network_metrics, NetworkMetrics};
