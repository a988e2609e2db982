use crate::simulation_engine::intersection::IntersectionNode;

/// Drives the two-phase signal cycle of an intersection.
///
/// The controller holds no per-node state; the elapsed time lives on the node
/// itself, so the same controller serves every intersection in the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseController {
    phase_duration: f64,
}

impl PhaseController {
    pub fn new(phase_duration: f64) -> Self {
        Self { phase_duration }
    }

    pub fn phase_duration(&self) -> f64 {
        self.phase_duration
    }

    /// Length of a full north-south + east-west cycle.
    pub fn cycle_length(&self) -> f64 {
        self.phase_duration * 2.0
    }

    /// Increases the elapsed time and switches phase once the duration is reached.
    /// Returns whether the phase flipped.
    pub fn advance(&self, node: &mut IntersectionNode, tick: f64) -> bool {
        let tick = if tick.is_finite() { tick.max(0.0) } else { 0.0 };
        node.set_phase_timer(node.phase_timer() + tick);
        self.settle(node)
    }

    /// Fires the transition when the timer has reached the phase duration:
    /// flip the phase, reset the timer, re-derive the signal heads.
    pub fn settle(&self, node: &mut IntersectionNode) -> bool {
        if node.phase_timer() < self.phase_duration {
            return false;
        }
        let next = node.current_phase().other();
        node.set_phase(next);
        node.set_phase_timer(0.0);
        log::debug!("Intersection {} switching to {:?}", node.id, next);
        true
    }

    /// Position of the node inside the full cycle, in `[0, cycle_length)`.
    pub fn cycle_position(&self, node: &IntersectionNode) -> f64 {
        node.current_phase().cycle_index() as f64 * self.phase_duration + node.phase_timer()
    }
}
