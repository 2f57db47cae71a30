use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use contagion::{
    ExecutionMode, LocationGraph, LocationGraphBuilder, Simulation, SimulationConfigBuilder,
};

static LOCATIONS: u32 = 2_000;
static INDIVIDUALS: usize = 20_000;
static EPOCHS: u32 = 30;
static SEED: u64 = 123;

/// A ring with a long-range chord at every tenth location.
fn small_world() -> LocationGraph {
    let mut builder = LocationGraphBuilder::with_locations(LOCATIONS);
    for location in 0..LOCATIONS {
        builder
            .add_edge(location, (location + 1) % LOCATIONS)
            .expect("ring edge");
        if location % 10 == 0 {
            builder
                .add_edge(location, (location * 7 + 13) % LOCATIONS)
                .expect("chord edge");
        }
    }
    builder.build().expect("failed to build graph")
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let graph = small_world();
    let mut group = c.benchmark_group("epochs");
    group.sample_size(10);

    for workers in [1, 2, 4] {
        let config = SimulationConfigBuilder::default()
            .individual_count(INDIVIDUALS)
            .total_epochs(EPOCHS)
            .worker_count(workers)
            .initial_infected_count(10)
            .infection_probability(0.3)
            .random_seed(SEED)
            .build()
            .expect("failed to build config");
        let simulation = Simulation::new(config, &graph).expect("failed to start simulation");

        for mode in [ExecutionMode::Serial, ExecutionMode::Parallel] {
            if mode == ExecutionMode::Serial && workers > 1 {
                continue;
            }
            group.bench_with_input(
                BenchmarkId::new(format!("{mode:?}"), workers),
                &mode,
                |bencher, &mode| {
                    bencher.iter_batched(
                        || simulation.new_population(SEED).expect("population"),
                        |mut population| simulation.run(&mut population, mode),
                        criterion::BatchSize::LargeInput,
                    );
                },
            );
        }
    }
    group.finish();
}

criterion_group!(epoch_benches, criterion_benchmark);
criterion_main!(epoch_benches);
