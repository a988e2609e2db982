//! The four coordination policies.
//!
//! Each policy is split into a planner, which reads a consistent view of the
//! grid and returns the timing changes it wants, and an alignment score, which
//! rates how closely the current grid matches the pattern that policy aims
//! for (0..=100). Plans are computed before any of them is applied, so the
//! result never depends on node iteration order.

use crate::simulation_engine::grid::IntersectionGrid;
use crate::simulation_engine::intersection::{
    IntersectionId, IntersectionNode, IntersectionUpdate, Phase,
};

pub type Plan = Vec<(IntersectionId, IntersectionUpdate)>;

// =============================================================================
// Shared helpers
// =============================================================================

/// Mean congestion of the node's direct neighbours, `None` for isolated nodes.
fn neighbor_mean_congestion(grid: &IntersectionGrid, node: &IntersectionNode) -> Option<f64> {
    let levels: Vec<f64> = node
        .connected
        .iter()
        .filter_map(|id| grid.get(id))
        .map(|n| n.congestion_level())
        .collect();
    if levels.is_empty() {
        None
    } else {
        Some(levels.iter().sum::<f64>() / levels.len() as f64)
    }
}

/// Converts a position in the full cycle back into (phase, timer).
fn phase_at(cycle_position: f64, phase_duration: f64) -> (Phase, f64) {
    let cycle = phase_duration * 2.0;
    let mut pos = cycle_position.rem_euclid(cycle);
    if pos >= cycle {
        pos = 0.0;
    }
    if pos < phase_duration {
        (Phase::NorthSouth, pos)
    } else {
        (Phase::EastWest, pos - phase_duration)
    }
}

/// Shortest signed distance from `actual` to `target` on a cycle.
fn cycle_offset(target: f64, actual: f64, cycle: f64) -> f64 {
    let d = (target - actual).rem_euclid(cycle);
    if d > cycle / 2.0 {
        d - cycle
    } else {
        d
    }
}

/// Timer shift as an update. Positive shifts shorten the current green,
/// negative shifts hold it.
fn shift_timer(node: &IntersectionNode, shift: f64) -> Option<IntersectionUpdate> {
    if shift == 0.0 || !shift.is_finite() {
        return None;
    }
    Some(IntersectionUpdate::default().with_phase_timer((node.phase_timer() + shift).max(0.0)))
}

/// Score for "share of green still ahead matches the wanted share".
fn remaining_green_score(node: &IntersectionNode, phase_duration: f64, wanted: f64) -> f64 {
    let remaining = 1.0 - node.phase_timer() / phase_duration;
    1.0 - (remaining - wanted.clamp(0.0, 1.0)).abs()
}

fn to_percent(scores: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = scores.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        return 0.0;
    }
    (sum / count as f64 * 100.0).clamp(0.0, 100.0)
}

// =============================================================================
// Green wave
// =============================================================================

/// Hops from the reference node along the dominant travel axis. The longer
/// grid dimension is the dominant axis; square grids run east-west.
fn wave_hops(grid: &IntersectionGrid, node: &IntersectionNode) -> f64 {
    let (rows, cols) = grid.dimensions();
    if cols >= rows {
        node.id.col() as f64
    } else {
        node.id.row() as f64
    }
}

/// Cycle offset of each node from its ideal green-wave position.
fn wave_offsets(grid: &IntersectionGrid) -> Vec<(usize, f64)> {
    let Some(reference) = grid.nodes().first() else {
        return Vec::new();
    };
    let config = grid.config();
    let controller = grid.phase_controller();
    let cycle = controller.cycle_length();
    let reference_pos = controller.cycle_position(reference);
    let reference_hops = wave_hops(grid, reference);

    grid.nodes()
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let lag = (wave_hops(grid, node) - reference_hops) * config.wave_offset;
            let target = reference_pos - lag;
            (i, cycle_offset(target, controller.cycle_position(node), cycle))
        })
        .collect()
}

pub fn plan_green_wave(grid: &IntersectionGrid) -> Plan {
    let config = grid.config();
    let controller = grid.phase_controller();
    let mut plan = Vec::new();

    for (i, offset) in wave_offsets(grid) {
        let node = &grid.nodes()[i];
        // A hold never reaches back past the start of the current phase.
        let max_hold = config.max_correction.min(node.phase_timer());
        let correction = offset.clamp(-max_hold, config.max_correction);
        if correction == 0.0 {
            continue;
        }
        if correction < 0.0 {
            if let Some(update) = shift_timer(node, correction) {
                plan.push((node.id, update));
            }
            continue;
        }
        let (phase, timer) = phase_at(
            controller.cycle_position(node) + correction,
            config.phase_duration,
        );
        plan.push((
            node.id,
            IntersectionUpdate::default()
                .with_phase(phase)
                .with_phase_timer(timer),
        ));
    }
    plan
}

pub fn green_wave_alignment(grid: &IntersectionGrid) -> f64 {
    let half_cycle = grid.phase_controller().phase_duration();
    to_percent(
        wave_offsets(grid)
            .into_iter()
            .map(|(_, offset)| 1.0 - offset.abs() / half_cycle),
    )
}

// =============================================================================
// Adaptive offset
// =============================================================================

pub fn plan_adaptive_offset(grid: &IntersectionGrid) -> Plan {
    let config = grid.config();
    let mut plan = Vec::new();

    for node in grid.nodes() {
        let Some(mean) = neighbor_mean_congestion(grid, node) else {
            continue;
        };
        // Busier than the neighbourhood: hold the green by pulling the timer back.
        let imbalance = node.congestion_level() - mean;
        let shift = (-imbalance * config.adaptive_gain)
            .clamp(-config.max_correction, config.max_correction);
        if let Some(update) = shift_timer(node, shift) {
            plan.push((node.id, update));
        }
    }
    plan
}

pub fn adaptive_offset_alignment(grid: &IntersectionGrid) -> f64 {
    let duration = grid.phase_controller().phase_duration();
    to_percent(grid.nodes().iter().map(|node| {
        let imbalance = neighbor_mean_congestion(grid, node)
            .map(|mean| node.congestion_level() - mean)
            .unwrap_or(0.0);
        remaining_green_score(node, duration, 0.5 + imbalance / 200.0)
    }))
}

// =============================================================================
// Distributed control
// =============================================================================

/// The most congested direct neighbour; ties go to the first listed.
fn heaviest_neighbor<'a>(
    grid: &'a IntersectionGrid,
    node: &IntersectionNode,
) -> Option<&'a IntersectionNode> {
    node.connected
        .iter()
        .filter_map(|id| grid.get(id))
        .fold(None::<&IntersectionNode>, |best, n| match best {
            Some(b) if b.congestion_level() >= n.congestion_level() => Some(b),
            _ => Some(n),
        })
}

pub fn plan_distributed_control(grid: &IntersectionGrid) -> Plan {
    let config = grid.config();
    let mut plan = Vec::new();

    for node in grid.nodes() {
        let Some(mean) = neighbor_mean_congestion(grid, node) else {
            continue;
        };
        let local = node.congestion_level();

        let shift = if local > mean {
            -config.max_correction
        } else if local < mean {
            match heaviest_neighbor(grid, node) {
                Some(leader) if leader.current_phase() == node.current_phase() => {
                    ((leader.phase_timer() - node.phase_timer()) / 2.0)
                        .clamp(-config.max_correction, config.distributed_step)
                }
                Some(_) => config.distributed_step,
                None => 0.0,
            }
        } else {
            0.0
        };

        if let Some(update) = shift_timer(node, shift) {
            plan.push((node.id, update));
        }
    }
    plan
}

pub fn distributed_control_alignment(grid: &IntersectionGrid) -> f64 {
    let duration = grid.phase_controller().phase_duration();
    to_percent(grid.nodes().iter().map(|node| {
        let Some(mean) = neighbor_mean_congestion(grid, node) else {
            return 1.0;
        };
        if node.congestion_level() >= mean {
            return 1.0;
        }
        match heaviest_neighbor(grid, node) {
            Some(leader) if leader.current_phase() == node.current_phase() => {
                1.0 - (leader.phase_timer() - node.phase_timer()).abs() / duration
            }
            Some(_) => 0.0,
            None => 1.0,
        }
    }))
}

// =============================================================================
// Predictive
// =============================================================================

/// Least-squares slope of the recorded vehicle counts, in vehicles per sample.
pub fn count_trend(node: &IntersectionNode) -> f64 {
    let samples = node.recent_counts();
    let n = samples.len();
    if n < 2 {
        return 0.0;
    }
    let mean_x = (n - 1) as f64 / 2.0;
    let mean_y = samples.iter().map(|&c| c as f64).sum::<f64>() / n as f64;
    let (num, den) = samples
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (x, &y)| {
            let dx = x as f64 - mean_x;
            (num + dx * (y as f64 - mean_y), den + dx * dx)
        });
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Congestion expected `prediction_horizon` samples ahead, in percent.
pub fn projected_congestion(grid: &IntersectionGrid, node: &IntersectionNode) -> f64 {
    let horizon = grid.config().prediction_horizon;
    let projected = node.vehicle_count() as f64 + count_trend(node) * horizon;
    (projected / node.capacity() as f64 * 100.0).clamp(0.0, 100.0)
}

pub fn plan_predictive(grid: &IntersectionGrid) -> Plan {
    let config = grid.config();
    let mut plan = Vec::new();

    for node in grid.nodes() {
        let trend = count_trend(node);
        if trend == 0.0 {
            continue;
        }
        let expected_rise = trend * config.prediction_horizon / node.capacity() as f64 * 100.0;
        let bias = (expected_rise.abs() * config.adaptive_gain).min(config.max_correction);

        let shift = if trend > 0.0 && projected_congestion(grid, node) > config.hotspot_threshold {
            -bias
        } else if trend < 0.0 {
            bias
        } else {
            0.0
        };

        if let Some(update) = shift_timer(node, shift) {
            plan.push((node.id, update));
        }
    }
    plan
}

pub fn predictive_alignment(grid: &IntersectionGrid) -> f64 {
    let config = grid.config();
    let duration = grid.phase_controller().phase_duration();
    to_percent(grid.nodes().iter().map(|node| {
        let pressure = projected_congestion(grid, node) - config.hotspot_threshold;
        remaining_green_score(node, duration, 0.5 + pressure / 200.0)
    }))
}
