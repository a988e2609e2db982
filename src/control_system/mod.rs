pub mod coordination;
pub mod phase_controller;
pub mod strategies;
