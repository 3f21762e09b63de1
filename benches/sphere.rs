use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use jeans_psy::ops::{Evaluation, Problem, ProblemBounds, ProblemResult};
use jeans_psy::{Encoding, Limits, PolysomyGa, RunOptions, VariableBounds};
use rand::rngs::StdRng;
use rand::SeedableRng;

struct SphereProblem {
    variables: Vec<VariableBounds>,
}

impl SphereProblem {
    fn new(dimensions: usize) -> Self {
        Self {
            variables: vec![VariableBounds::real(-5.12, 5.12); dimensions],
        }
    }
}

impl ProblemBounds for SphereProblem {
    fn dimensions(&self) -> usize {
        self.variables.len()
    }

    fn variables(&self) -> &[VariableBounds] {
        &self.variables
    }
}

impl Problem for SphereProblem {
    fn evaluate(&mut self, decisions: &[Vec<f64>]) -> ProblemResult<Evaluation> {
        Ok(Evaluation::single(
            decisions
                .iter()
                .map(|row| row.iter().map(|value| value * value).sum())
                .collect(),
        ))
    }
}

fn run_ga(problem: SphereProblem, blocks: &[(Encoding, usize)], generations: usize) {
    let options = RunOptions {
        limits: Limits::max_generations(generations),
        verbose: false,
        log_interval: 0,
        ..RunOptions::default()
    };
    let mut engine = PolysomyGa::builder_from_blocks(problem, blocks)
        .expect("valid block split")
        .population_size(100)
        .options(options)
        .build()
        .expect("valid GA configuration");
    let mut rng = StdRng::seed_from_u64(42);
    engine.run(None, &mut rng).expect("optimization to succeed");
}

fn sphere_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("sphere-psy-ega");
    for &dimensions in &[30_usize, 60_usize] {
        let half = dimensions / 2;
        let layouts = [
            ("real", vec![(Encoding::RealInteger, dimensions)]),
            (
                "real+gray",
                vec![(Encoding::RealInteger, half), (Encoding::BinaryGray, dimensions - half)],
            ),
        ];
        for (name, blocks) in layouts {
            group.bench_function(BenchmarkId::new(name, dimensions), |b| {
                b.iter_batched(
                    || SphereProblem::new(dimensions),
                    |problem| run_ga(problem, &blocks, 200),
                    BatchSize::SmallInput,
                );
            });
        }
    }
    group.finish();
}

criterion_group!(benches, sphere_benchmark);
criterion_main!(benches);
