// benches/bench_network_metrics.rs
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use signal_grid::simulation_engine::simulation::TrafficSimulation;
use signal_grid::{SimulationConfig, StrategyKind};

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("calculate_network_metrics");

    for &size in [4usize, 16, 32].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut sim = TrafficSimulation::with_grid(
                SimulationConfig::default(),
                size,
                size,
                StrategyKind::Predictive,
                42,
            )
            .unwrap();
            // Warm the grid so trends and hotspots exist.
            for _ in 0..20 {
                sim.step().unwrap();
            }
            b.iter(|| black_box(sim.engine().calculate_network_metrics()));
        });
    }
    group.finish();
}

fn bench_simulation_step(c: &mut Criterion) {
    c.bench_function("simulation_step_8x8", |b| {
        let mut sim = TrafficSimulation::with_grid(
            SimulationConfig::default(),
            8,
            8,
            StrategyKind::GreenWave,
            7,
        )
        .unwrap();
        b.iter(|| black_box(sim.step().unwrap()));
    });
}

criterion_group!(benches, bench_metrics, bench_simulation_step);
criterion_main!(benches);
