// Signal timing
pub const PHASE_DURATION: f64 = 30.0;
pub const DEFAULT_TICK: f64 = 1.0;

// Intersection load
pub const VEHICLE_CAPACITY: u32 = 30;
pub const HOTSPOT_THRESHOLD: f64 = 70.0;

// Layout extent the lattice is spread over (canvas units)
pub const CANVAS_WIDTH: f64 = 800.0;
pub const CANVAS_HEIGHT: f64 = 600.0;

// Number of vehicle-count samples kept per intersection for trend estimation
pub const TREND_WINDOW: usize = 5;

// Strategy gains. Holds are kept below one tick so a green is slowed, never frozen.
pub const WAVE_OFFSET: f64 = 5.0;
pub const MAX_CORRECTION: f64 = 0.5;
pub const ADAPTIVE_GAIN: f64 = 0.05;
pub const DISTRIBUTED_STEP: f64 = 2.0;
pub const PREDICTION_HORIZON: f64 = 3.0;

// Metrics model
pub const BASE_WAIT_SECONDS: f64 = 5.0;
pub const WAIT_PER_CONGESTION_PERCENT: f64 = 0.6;
pub const CO2_FACTOR: f64 = 0.3;

// Load perturbation applied by the reference driving loop
pub const MAX_ARRIVALS_PER_TICK: i64 = 4;
pub const MAX_DEPARTURES_PER_TICK: i64 = 3;
