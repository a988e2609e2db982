use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::SimulationConfig;
use crate::control_system::strategies;
use crate::error::{CoordinationError, Result};
use crate::flow_analyzer::metrics::{calculate_network_metrics, NetworkMetrics};
use crate::simulation_engine::grid::IntersectionGrid;
use crate::simulation_engine::intersection::{IntersectionId, IntersectionNode, IntersectionUpdate};

/// The fixed set of network-wide coordination policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    GreenWave,
    AdaptiveOffset,
    DistributedControl,
    Predictive,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::GreenWave,
        StrategyKind::AdaptiveOffset,
        StrategyKind::DistributedControl,
        StrategyKind::Predictive,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            StrategyKind::GreenWave => "green_wave",
            StrategyKind::AdaptiveOffset => "adaptive_offset",
            StrategyKind::DistributedControl => "distributed_control",
            StrategyKind::Predictive => "predictive",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StrategyKind::GreenWave => {
                "Staggers offsets along the main travel axis so greens follow the traffic"
            }
            StrategyKind::AdaptiveOffset => {
                "Extends the current green where congestion exceeds the neighbourhood"
            }
            StrategyKind::DistributedControl => {
                "Each intersection negotiates timing with its direct neighbours only"
            }
            StrategyKind::Predictive => {
                "Biases phases ahead of congestion extrapolated from recent load"
            }
        }
    }

    /// Timing changes this policy wants for the current grid.
    fn plan(self, grid: &IntersectionGrid) -> strategies::Plan {
        match self {
            StrategyKind::GreenWave => strategies::plan_green_wave(grid),
            StrategyKind::AdaptiveOffset => strategies::plan_adaptive_offset(grid),
            StrategyKind::DistributedControl => strategies::plan_distributed_control(grid),
            StrategyKind::Predictive => strategies::plan_predictive(grid),
        }
    }

    /// How closely the grid matches this policy's ideal pattern, in percent.
    pub fn alignment(self, grid: &IntersectionGrid) -> f64 {
        match self {
            StrategyKind::GreenWave => strategies::green_wave_alignment(grid),
            StrategyKind::AdaptiveOffset => strategies::adaptive_offset_alignment(grid),
            StrategyKind::DistributedControl => strategies::distributed_control_alignment(grid),
            StrategyKind::Predictive => strategies::predictive_alignment(grid),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for StrategyKind {
    type Err = CoordinationError;

    fn from_str(s: &str) -> Result<Self> {
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| CoordinationError::InvalidStrategy(s.to_string()))
    }
}

/// The active strategy together with the score its last run achieved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinationStrategy {
    pub kind: StrategyKind,
    pub description: &'static str,
    /// Alignment reached by the most recent `execute_strategy`, 0..=100.
    pub efficiency: f64,
}

impl CoordinationStrategy {
    pub fn new(kind: StrategyKind) -> Self {
        Self {
            kind,
            description: kind.description(),
            efficiency: 0.0,
        }
    }
}

/// Owns the intersection grid and applies the active coordination strategy to it.
#[derive(Debug, Clone)]
pub struct CoordinationEngine {
    grid: IntersectionGrid,
    strategy: CoordinationStrategy,
    /// Descriptor of the most recent run; metrics report its efficiency until
    /// the next `execute_strategy`.
    last_executed: Option<CoordinationStrategy>,
}

impl CoordinationEngine {
    /// Creates an engine with an empty grid and the green-wave strategy active.
    /// Rejects a config that fails `SimulationConfig::validate`.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Ok(Self {
            grid: IntersectionGrid::new(config)?,
            strategy: CoordinationStrategy::new(StrategyKind::GreenWave),
            last_executed: None,
        })
    }

    /// Rebuilds the grid. The previous run's efficiency no longer describes
    /// the new nodes, so it is dropped.
    pub fn initialize_grid(&mut self, rows: usize, cols: usize) -> Result<()> {
        self.grid.initialize_grid(rows, cols)?;
        self.last_executed = None;
        Ok(())
    }

    pub fn intersections(&self) -> Vec<IntersectionNode> {
        self.grid.intersections()
    }

    pub fn update_intersection(
        &mut self,
        id: IntersectionId,
        update: IntersectionUpdate,
    ) -> Result<()> {
        self.grid.update_intersection(id, update)
    }

    pub fn advance_phase(&mut self, id: IntersectionId, tick: f64) -> Result<bool> {
        self.grid.advance_phase(id, tick)
    }

    pub fn grid(&self) -> &IntersectionGrid {
        &self.grid
    }

    pub fn strategy(&self) -> &CoordinationStrategy {
        &self.strategy
    }

    pub fn last_executed(&self) -> Option<&CoordinationStrategy> {
        self.last_executed.as_ref()
    }

    /// Replaces the active strategy; node state is left as is. The switch
    /// shows up in metrics only after the next `execute_strategy`.
    pub fn set_strategy(&mut self, kind: StrategyKind) {
        if self.strategy.kind == kind {
            return;
        }
        log::info!("Coordination strategy {} -> {}", self.strategy.kind, kind);
        self.strategy = CoordinationStrategy::new(kind);
    }

    /// Parses and activates a strategy tag. Unknown tags are rejected and the
    /// current strategy stays active.
    pub fn set_strategy_by_name(&mut self, name: &str) -> Result<()> {
        let kind = name.parse::<StrategyKind>().map_err(|e| {
            log::warn!("Rejected strategy '{}', keeping {}", name, self.strategy.kind);
            e
        })?;
        self.set_strategy(kind);
        Ok(())
    }

    /// Runs the active strategy once over the whole grid and records its
    /// resulting alignment as the strategy's efficiency.
    /// Returns how many intersections were adjusted.
    pub fn execute_strategy(&mut self) -> Result<usize> {
        if self.grid.is_empty() {
            return Ok(0);
        }

        let kind = self.strategy.kind;
        let plan = kind.plan(&self.grid);
        let adjusted = plan.len();
        for (id, update) in plan {
            self.grid.update_intersection(id, update)?;
        }

        self.strategy.efficiency = kind.alignment(&self.grid).clamp(0.0, 100.0);
        self.last_executed = Some(self.strategy.clone());
        log::debug!(
            "{} adjusted {} intersections, efficiency {:.1}%",
            kind,
            adjusted,
            self.strategy.efficiency
        );
        Ok(adjusted)
    }

    /// Network statistics for the current grid, scored with the efficiency of
    /// the last executed run (0 before any run).
    pub fn calculate_network_metrics(&self) -> NetworkMetrics {
        let efficiency = self.last_executed.as_ref().map_or(0.0, |s| s.efficiency);
        calculate_network_metrics(&self.grid, efficiency)
    }
}
