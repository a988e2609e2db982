// simulation_engine/mod.rs
pub mod grid;
pub mod intersection;
pub mod simulation;
