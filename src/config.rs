use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{CoordinationError, Result};
use crate::global_variables::*;

/// Tunable constants for the grid, the phase cycle, the strategies and the
/// metrics model. Every field falls back to its named default when absent
/// from a JSON config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Time units a phase stays green before switching.
    pub phase_duration: f64,
    /// Timer advance applied per driving-loop tick.
    pub tick_size: f64,
    /// Maximum vehicles an intersection can hold.
    pub vehicle_capacity: u32,
    /// Congestion percentage above which an intersection is a hotspot.
    pub hotspot_threshold: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub trend_window: usize,
    /// Green-wave lag per hop along the travel axis.
    pub wave_offset: f64,
    /// Upper bound on any single timer nudge applied by a strategy.
    pub max_correction: f64,
    /// Timer units per congestion percentage point (adaptive offset).
    pub adaptive_gain: f64,
    pub distributed_step: f64,
    /// Samples ahead the predictive strategy extrapolates.
    pub prediction_horizon: f64,
    pub base_wait_seconds: f64,
    pub wait_per_congestion_percent: f64,
    pub co2_factor: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            phase_duration: PHASE_DURATION,
            tick_size: DEFAULT_TICK,
            vehicle_capacity: VEHICLE_CAPACITY,
            hotspot_threshold: HOTSPOT_THRESHOLD,
            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            trend_window: TREND_WINDOW,
            wave_offset: WAVE_OFFSET,
            max_correction: MAX_CORRECTION,
            adaptive_gain: ADAPTIVE_GAIN,
            distributed_step: DISTRIBUTED_STEP,
            prediction_horizon: PREDICTION_HORIZON,
            base_wait_seconds: BASE_WAIT_SECONDS,
            wait_per_congestion_percent: WAIT_PER_CONGESTION_PERCENT,
            co2_factor: CO2_FACTOR,
        }
    }
}

impl SimulationConfig {
    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SimulationConfig = serde_json::from_str(json)
            .map_err(|e| CoordinationError::Config(format!("invalid config json: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        log::info!("Loaded configuration from {}", path.as_ref().display());
        Self::from_json_str(&raw)
    }

    /// Rejects values that would break the timer, capacity or percentage
    /// invariants downstream.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("phase_duration", self.phase_duration),
            ("canvas_width", self.canvas_width),
            ("canvas_height", self.canvas_height),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(CoordinationError::Config(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        let non_negative = [
            ("tick_size", self.tick_size),
            ("wave_offset", self.wave_offset),
            ("max_correction", self.max_correction),
            ("adaptive_gain", self.adaptive_gain),
            ("distributed_step", self.distributed_step),
            ("prediction_horizon", self.prediction_horizon),
            ("base_wait_seconds", self.base_wait_seconds),
            ("wait_per_congestion_percent", self.wait_per_congestion_percent),
            ("co2_factor", self.co2_factor),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(CoordinationError::Config(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }

        if self.vehicle_capacity == 0 {
            return Err(CoordinationError::Config(
                "vehicle_capacity must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.hotspot_threshold) {
            return Err(CoordinationError::Config(format!(
                "hotspot_threshold must be a percentage, got {}",
                self.hotspot_threshold
            )));
        }
        if self.trend_window < 2 {
            return Err(CoordinationError::Config(
                "trend_window must keep at least 2 samples".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_named_constants() {
        let config = SimulationConfig::default();
        assert_eq!(config.phase_duration, PHASE_DURATION);
        assert_eq!(config.vehicle_capacity, VEHICLE_CAPACITY);
        assert_eq!(config.hotspot_threshold, HOTSPOT_THRESHOLD);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            SimulationConfig::from_json_str(r#"{ "phase_duration": 20.0, "vehicle_capacity": 50 }"#)
                .unwrap();
        assert_eq!(config.phase_duration, 20.0);
        assert_eq!(config.vehicle_capacity, 50);
        assert_eq!(config.hotspot_threshold, HOTSPOT_THRESHOLD);
        assert_eq!(config.trend_window, TREND_WINDOW);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = SimulationConfig::from_json_str(r#"{ "vehicle_capacity": 0 }"#).unwrap_err();
        assert!(matches!(err, CoordinationError::Config(_)));
    }

    #[test]
    fn test_non_positive_phase_duration_rejected() {
        let err = SimulationConfig::from_json_str(r#"{ "phase_duration": 0.0 }"#).unwrap_err();
        assert!(matches!(err, CoordinationError::Config(_)));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(SimulationConfig::from_json_str("{ not json").is_err());
    }
}
