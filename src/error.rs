use thiserror::Error;

use crate::simulation_engine::intersection::IntersectionId;

/// Errors surfaced by the coordination engine and its supporting utilities.
///
/// None of these are fatal to a driving loop: a failed update leaves every
/// other intersection untouched, and a rejected strategy keeps the previous
/// one active.
#[derive(Debug, Error)]
pub enum CoordinationError {
    /// No intersection with this id exists in the current grid.
    #[error("intersection {0} not found")]
    NodeNotFound(IntersectionId),

    /// The strategy tag is not one of the known coordination policies.
    #[error("invalid coordination strategy '{0}'")]
    InvalidStrategy(String),

    /// A grid needs at least one row and one column.
    #[error("invalid grid dimensions {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },

    /// Malformed or out-of-range configuration.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoordinationError>;
