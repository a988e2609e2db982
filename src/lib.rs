pub mod config;
pub mod control_system;
pub mod detection;
pub mod error;
pub mod flow_analyzer;
pub mod global_variables;
pub mod monitoring;
pub mod shared_data;
pub mod simulation_engine;
pub mod storage;

pub use config::SimulationConfig;
pub use control_system::coordination::{CoordinationEngine, CoordinationStrategy, StrategyKind};
pub use control_system::phase_controller::PhaseController;
pub use error::{CoordinationError, Result};
pub use flow_analyzer::metrics::NetworkMetrics;
pub use simulation_engine::grid::IntersectionGrid;
pub use simulation_engine::intersection::{
    IntersectionId, IntersectionNode, IntersectionUpdate, LightState, Phase, SignalState,
};
