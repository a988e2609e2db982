use std::collections::HashMap;

use crate::config::SimulationConfig;
use crate::control_system::phase_controller::PhaseController;
use crate::error::{CoordinationError, Result};
use crate::simulation_engine::intersection::{IntersectionId, IntersectionNode, IntersectionUpdate};

/// Represents the lattice of signal-controlled intersections.
#[derive(Debug, Clone)]
pub struct IntersectionGrid {
    /// Intersections in creation (row-major) order.
    nodes: Vec<IntersectionNode>,
    /// Position of each intersection inside `nodes`.
    index: HashMap<IntersectionId, usize>,
    rows: usize,
    cols: usize,
    config: SimulationConfig,
    phase_controller: PhaseController,
}

impl IntersectionGrid {
    /// Creates an empty grid; call `initialize_grid` to lay out intersections.
    /// The config is validated first so every later derivation divides by a
    /// positive phase duration and capacity.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let phase_controller = PhaseController::new(config.phase_duration);
        Ok(Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            rows: 0,
            cols: 0,
            config,
            phase_controller,
        })
    }

    /// Replaces the grid with `rows * cols` fresh intersections on a regular
    /// lattice, each wired to its up/down/left/right neighbours.
    ///
    /// Zero rows or columns are rejected and the previous grid is kept.
    pub fn initialize_grid(&mut self, rows: usize, cols: usize) -> Result<()> {
        if rows == 0 || cols == 0 || rows > u16::MAX as usize || cols > u16::MAX as usize {
            return Err(CoordinationError::InvalidDimensions { rows, cols });
        }

        let spacing_x = self.config.canvas_width / (cols + 1) as f64;
        let spacing_y = self.config.canvas_height / (rows + 1) as f64;

        let mut nodes = Vec::with_capacity(rows * cols);
        let mut index = HashMap::with_capacity(rows * cols);

        // --- Create intersections ---
        for row in 0..rows {
            for col in 0..cols {
                let id = IntersectionId(row as u16, col as u16);
                let position = ((col + 1) as f64 * spacing_x, (row + 1) as f64 * spacing_y);
                let mut node = IntersectionNode::new(
                    id,
                    position,
                    self.config.vehicle_capacity,
                    self.config.trend_window,
                );

                // --- Wire grid neighbours (edge nodes get fewer) ---
                if row > 0 {
                    node.connected.push(IntersectionId((row - 1) as u16, col as u16));
                }
                if col > 0 {
                    node.connected.push(IntersectionId(row as u16, (col - 1) as u16));
                }
                if col + 1 < cols {
                    node.connected.push(IntersectionId(row as u16, (col + 1) as u16));
                }
                if row + 1 < rows {
                    node.connected.push(IntersectionId((row + 1) as u16, col as u16));
                }

                index.insert(id, nodes.len());
                nodes.push(node);
            }
        }

        self.nodes = nodes;
        self.index = index;
        self.rows = rows;
        self.cols = cols;
        log::info!("Initialized {}x{} intersection grid", rows, cols);
        Ok(())
    }

    /// Snapshot of all intersections in creation order.
    pub fn intersections(&self) -> Vec<IntersectionNode> {
        self.nodes.clone()
    }

    /// Borrowed view of the intersections in creation order.
    pub fn nodes(&self) -> &[IntersectionNode] {
        &self.nodes
    }

    pub fn get(&self, id: &IntersectionId) -> Option<&IntersectionNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn neighbors_of(&self, id: &IntersectionId) -> Result<&[IntersectionId]> {
        self.get(id)
            .map(|node| node.connected.as_slice())
            .ok_or(CoordinationError::NodeNotFound(*id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// (rows, cols) of the current lattice; (0, 0) before initialization.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn phase_controller(&self) -> &PhaseController {
        &self.phase_controller
    }

    /// Merges the given fields into the intersection with `id`.
    ///
    /// Vehicle counts are clamped to capacity, a phase change re-derives the
    /// signal heads, and a timer that reaches the phase duration triggers the
    /// phase transition. Unknown ids leave the grid untouched.
    pub fn update_intersection(
        &mut self,
        id: IntersectionId,
        update: IntersectionUpdate,
    ) -> Result<()> {
        let &i = self
            .index
            .get(&id)
            .ok_or(CoordinationError::NodeNotFound(id))?;
        let node = &mut self.nodes[i];

        if let Some(position) = update.position {
            node.position = position;
        }
        if let Some(phase) = update.current_phase {
            node.set_phase(phase);
        }
        if let Some(timer) = update.phase_timer {
            node.set_phase_timer(timer);
        }
        if update.vehicle_count.is_some() || update.vehicle_delta.is_some() {
            let base = update
                .vehicle_count
                .unwrap_or(node.vehicle_count() as i64);
            let count = base.saturating_add(update.vehicle_delta.unwrap_or(0));
            node.set_vehicle_count(count);
        }

        self.phase_controller.settle(node);
        Ok(())
    }

    /// Advances the phase timer of one intersection by `tick`.
    /// Returns whether the phase flipped.
    pub fn advance_phase(&mut self, id: IntersectionId, tick: f64) -> Result<bool> {
        let &i = self
            .index
            .get(&id)
            .ok_or(CoordinationError::NodeNotFound(id))?;
        Ok(self.phase_controller.advance(&mut self.nodes[i], tick))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation_engine::intersection::Phase;

    fn grid(rows: usize, cols: usize) -> IntersectionGrid {
        let mut grid = IntersectionGrid::new(SimulationConfig::default()).unwrap();
        grid.initialize_grid(rows, cols).unwrap();
        grid
    }

    #[test]
    fn test_lattice_size_and_symmetric_adjacency() {
        for rows in 1..=5 {
            for cols in 1..=5 {
                let g = grid(rows, cols);
                assert_eq!(g.len(), rows * cols);
                for node in g.nodes() {
                    assert!(!node.connected.contains(&node.id));
                    for neighbor in &node.connected {
                        let other = g.get(neighbor).unwrap();
                        assert!(
                            other.connected.contains(&node.id),
                            "{} lists {} but not the reverse",
                            node.id,
                            neighbor
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_corner_edge_and_inner_degrees() {
        let g = grid(3, 3);
        assert_eq!(g.neighbors_of(&IntersectionId(0, 0)).unwrap().len(), 2);
        assert_eq!(g.neighbors_of(&IntersectionId(0, 1)).unwrap().len(), 3);
        assert_eq!(g.neighbors_of(&IntersectionId(1, 1)).unwrap().len(), 4);
    }

    #[test]
    fn test_creation_order_is_row_major() {
        let g = grid(2, 3);
        let ids: Vec<_> = g.nodes().iter().map(|n| n.id).collect();
        assert_eq!(
            ids,
            vec![
                IntersectionId(0, 0),
                IntersectionId(0, 1),
                IntersectionId(0, 2),
                IntersectionId(1, 0),
                IntersectionId(1, 1),
                IntersectionId(1, 2),
            ]
        );
    }

    #[test]
    fn test_positions_spread_over_canvas() {
        let g = grid(1, 3);
        let xs: Vec<f64> = g.nodes().iter().map(|n| n.position.0).collect();
        assert_eq!(xs, vec![200.0, 400.0, 600.0]);
        assert!(g.nodes().iter().all(|n| n.position.1 == 300.0));
    }

    #[test]
    fn test_reinitialize_replaces_state() {
        let mut g = grid(2, 2);
        g.update_intersection(
            IntersectionId(0, 0),
            IntersectionUpdate::default().with_vehicle_count(10),
        )
        .unwrap();
        g.initialize_grid(3, 1).unwrap();
        assert_eq!(g.len(), 3);
        assert_eq!(g.dimensions(), (3, 1));
        assert!(g.nodes().iter().all(|n| n.vehicle_count() == 0
            && n.phase_timer() == 0.0
            && n.current_phase() == Phase::NorthSouth));
    }

    #[test]
    fn test_zero_dimensions_rejected_and_grid_kept() {
        let mut g = grid(2, 2);
        let err = g.initialize_grid(0, 4).unwrap_err();
        assert!(matches!(err, CoordinationError::InvalidDimensions { rows: 0, cols: 4 }));
        assert_eq!(g.len(), 4);
    }

    #[test]
    fn test_new_rejects_degenerate_config() {
        let zero_duration = SimulationConfig {
            phase_duration: 0.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            IntersectionGrid::new(zero_duration),
            Err(CoordinationError::Config(_))
        ));

        let zero_capacity = SimulationConfig {
            vehicle_capacity: 0,
            ..SimulationConfig::default()
        };
        assert!(IntersectionGrid::new(zero_capacity).is_err());

        let nan_gain = SimulationConfig {
            adaptive_gain: f64::NAN,
            ..SimulationConfig::default()
        };
        assert!(IntersectionGrid::new(nan_gain).is_err());
    }

    #[test]
    fn test_unknown_id_is_reported_without_side_effects() {
        let mut g = grid(2, 2);
        let before = g.intersections();
        let err = g
            .update_intersection(
                IntersectionId(9, 9),
                IntersectionUpdate::default().with_vehicle_delta(5),
            )
            .unwrap_err();
        assert!(matches!(err, CoordinationError::NodeNotFound(IntersectionId(9, 9))));
        for (a, b) in before.iter().zip(g.nodes()) {
            assert_eq!(a.vehicle_count(), b.vehicle_count());
        }
    }

    #[test]
    fn test_vehicle_delta_clamped() {
        let mut g = grid(1, 1);
        let id = IntersectionId(0, 0);
        g.update_intersection(id, IntersectionUpdate::default().with_vehicle_delta(i64::MAX))
            .unwrap();
        assert_eq!(g.get(&id).unwrap().vehicle_count(), 30);
        assert!((g.get(&id).unwrap().congestion_level() - 100.0).abs() < 1e-9);

        g.update_intersection(id, IntersectionUpdate::default().with_vehicle_delta(-1_000))
            .unwrap();
        assert_eq!(g.get(&id).unwrap().vehicle_count(), 0);
        assert_eq!(g.get(&id).unwrap().congestion_level(), 0.0);
    }

    #[test]
    fn test_timer_update_past_duration_flips_phase() {
        let mut g = grid(1, 1);
        let id = IntersectionId(0, 0);
        g.update_intersection(id, IntersectionUpdate::default().with_phase_timer(31.0))
            .unwrap();
        let node = g.get(&id).unwrap();
        assert_eq!(node.current_phase(), Phase::EastWest);
        assert_eq!(node.phase_timer(), 0.0);
        assert!(node.signal_state().is_consistent_with(Phase::EastWest));
    }

    #[test]
    fn test_phase_update_rederives_signals() {
        let mut g = grid(1, 2);
        let id = IntersectionId(0, 1);
        g.update_intersection(id, IntersectionUpdate::default().with_phase(Phase::EastWest))
            .unwrap();
        assert!(g
            .get(&id)
            .unwrap()
            .signal_state()
            .is_consistent_with(Phase::EastWest));
    }

    #[test]
    fn test_advance_phase_through_grid() {
        let mut g = grid(1, 1);
        let id = IntersectionId(0, 0);
        for _ in 0..29 {
            assert!(!g.advance_phase(id, 1.0).unwrap());
        }
        assert!(g.advance_phase(id, 1.0).unwrap());
        assert!(g.advance_phase(IntersectionId(1, 1), 1.0).is_err());
    }
}
