use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Unique identifier for an intersection using (row, col) lattice coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IntersectionId(pub u16, pub u16);

impl IntersectionId {
    pub fn row(&self) -> u16 {
        self.0
    }

    pub fn col(&self) -> u16 {
        self.1
    }
}

impl fmt::Display for IntersectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I-{}-{}", self.0, self.1)
    }
}

/// Which traffic axis currently holds the green.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    NorthSouth,
    EastWest,
}

impl Phase {
    pub fn other(self) -> Self {
        match self {
            Phase::NorthSouth => Phase::EastWest,
            Phase::EastWest => Phase::NorthSouth,
        }
    }

    /// Position of this phase inside one full two-phase cycle.
    pub fn cycle_index(self) -> usize {
        match self {
            Phase::NorthSouth => 0,
            Phase::EastWest => 1,
        }
    }
}

/// Possible states of a single signal head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightState {
    Green,
    Red,
}

/// The four approach signals of an intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalState {
    pub north: LightState,
    pub south: LightState,
    pub east: LightState,
    pub west: LightState,
}

impl SignalState {
    /// Signal heads for a phase: the matching axis green, the other red.
    pub fn for_phase(phase: Phase) -> Self {
        let (ns, ew) = match phase {
            Phase::NorthSouth => (LightState::Green, LightState::Red),
            Phase::EastWest => (LightState::Red, LightState::Green),
        };
        Self {
            north: ns,
            south: ns,
            east: ew,
            west: ew,
        }
    }

    /// Opposing heads agree, exactly one axis is green, and it is the phase's axis.
    pub fn is_consistent_with(&self, phase: Phase) -> bool {
        *self == Self::for_phase(phase)
    }
}

/// Represents a signal-controlled intersection (node) of the grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntersectionNode {
    /// Unique identifier for the intersection.
    pub id: IntersectionId,
    /// Layout coordinate (x, y) in canvas units.
    pub position: (f64, f64),
    /// Grid-adjacent intersections, linked in both directions.
    pub connected: Vec<IntersectionId>,
    current_phase: Phase,
    phase_timer: f64,
    signal_state: SignalState,
    vehicle_count: u32,
    capacity: u32,
    congestion_level: f64,
    recent_counts: VecDeque<u32>,
    trend_window: usize,
}

impl IntersectionNode {
    /// Creates an empty intersection showing the north-south green.
    pub fn new(
        id: IntersectionId,
        position: (f64, f64),
        capacity: u32,
        trend_window: usize,
    ) -> Self {
        Self {
            id,
            position,
            connected: Vec::new(),
            current_phase: Phase::NorthSouth,
            phase_timer: 0.0,
            signal_state: SignalState::for_phase(Phase::NorthSouth),
            vehicle_count: 0,
            capacity: capacity.max(1),
            congestion_level: 0.0,
            recent_counts: VecDeque::with_capacity(trend_window),
            trend_window: trend_window.max(2),
        }
    }

    pub fn current_phase(&self) -> Phase {
        self.current_phase
    }

    pub fn phase_timer(&self) -> f64 {
        self.phase_timer
    }

    pub fn signal_state(&self) -> SignalState {
        self.signal_state
    }

    pub fn vehicle_count(&self) -> u32 {
        self.vehicle_count
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Share of capacity occupied, in percent.
    pub fn congestion_level(&self) -> f64 {
        self.congestion_level
    }

    /// Vehicle counts recorded by recent load updates, oldest first.
    pub fn recent_counts(&self) -> &VecDeque<u32> {
        &self.recent_counts
    }

    /// Switches the phase and re-derives the signal heads from it.
    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.current_phase = phase;
        self.signal_state = SignalState::for_phase(phase);
    }

    /// Raw timer write; callers go through `PhaseController::settle` afterwards.
    pub(crate) fn set_phase_timer(&mut self, timer: f64) {
        self.phase_timer = if timer.is_finite() { timer.max(0.0) } else { 0.0 };
    }

    /// Stores a count clamped to `[0, capacity]` and records it for trend estimation.
    pub(crate) fn set_vehicle_count(&mut self, count: i64) {
        let clamped = count.clamp(0, self.capacity as i64) as u32;
        self.vehicle_count = clamped;
        self.congestion_level = clamped as f64 * 100.0 / self.capacity as f64;

        if self.recent_counts.len() == self.trend_window {
            self.recent_counts.pop_front();
        }
        self.recent_counts.push_back(clamped);
    }
}

/// Partial field set merged into a node by `IntersectionGrid::update_intersection`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntersectionUpdate {
    pub position: Option<(f64, f64)>,
    pub current_phase: Option<Phase>,
    pub phase_timer: Option<f64>,
    /// Absolute vehicle count, clamped to capacity.
    pub vehicle_count: Option<i64>,
    /// Relative change applied after `vehicle_count`, clamped to capacity.
    pub vehicle_delta: Option<i64>,
}

impl IntersectionUpdate {
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some((x, y));
        self
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.current_phase = Some(phase);
        self
    }

    pub fn with_phase_timer(mut self, timer: f64) -> Self {
        self.phase_timer = Some(timer);
        self
    }

    pub fn with_vehicle_count(mut self, count: i64) -> Self {
        self.vehicle_count = Some(count);
        self
    }

    pub fn with_vehicle_delta(mut self, delta: i64) -> Self {
        self.vehicle_delta = Some(delta);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_state_for_each_phase() {
        let ns = SignalState::for_phase(Phase::NorthSouth);
        assert_eq!(ns.north, LightState::Green);
        assert_eq!(ns.south, LightState::Green);
        assert_eq!(ns.east, LightState::Red);
        assert_eq!(ns.west, LightState::Red);

        let ew = SignalState::for_phase(Phase::EastWest);
        assert_eq!(ew.north, LightState::Red);
        assert_eq!(ew.east, LightState::Green);
        assert!(ew.is_consistent_with(Phase::EastWest));
        assert!(!ew.is_consistent_with(Phase::NorthSouth));
    }

    #[test]
    fn test_vehicle_count_clamped_and_congestion_derived() {
        let mut node = IntersectionNode::new(IntersectionId(0, 0), (0.0, 0.0), 30, 5);
        node.set_vehicle_count(1_000);
        assert_eq!(node.vehicle_count(), 30);
        assert!((node.congestion_level() - 100.0).abs() < f64::EPSILON);

        node.set_vehicle_count(-42);
        assert_eq!(node.vehicle_count(), 0);
        assert_eq!(node.congestion_level(), 0.0);

        node.set_vehicle_count(12);
        assert!((node.congestion_level() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_whole_percent_congestion_is_exact() {
        for capacity in 1..=100u32 {
            let mut node = IntersectionNode::new(IntersectionId(0, 0), (0.0, 0.0), capacity, 5);
            for count in 0..=capacity {
                if count * 100 % capacity != 0 {
                    continue;
                }
                node.set_vehicle_count(count as i64);
                assert_eq!(node.congestion_level(), (count * 100 / capacity) as f64);
            }
        }
    }

    #[test]
    fn test_recent_counts_bounded_by_window() {
        let mut node = IntersectionNode::new(IntersectionId(0, 0), (0.0, 0.0), 30, 3);
        for count in [1, 2, 3, 4, 5] {
            node.set_vehicle_count(count);
        }
        let history: Vec<u32> = node.recent_counts().iter().copied().collect();
        assert_eq!(history, vec![3, 4, 5]);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(IntersectionId(2, 7).to_string(), "I-2-7");
    }
}
