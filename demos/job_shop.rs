//! Single-machine scheduling with a tunable speed setting.
//!
//! The first block orders the jobs, the second picks one integer speed level
//! per job. Faster levels cut processing time but cost energy.

use jeans_psy::ops::{Evaluation, Problem, ProblemBounds, ProblemResult};
use jeans_psy::{Encoding, Limits, PolysomyGa, RunOptions, VariableBounds};
use rand::SeedableRng;
use std::error::Error;

struct Job {
    duration: f64,
    due: f64,
}

struct JobShop {
    jobs: Vec<Job>,
    variables: Vec<VariableBounds>,
}

impl JobShop {
    fn new(jobs: Vec<Job>) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let last = (jobs.len() - 1) as f64;
        let mut variables = vec![VariableBounds::integer(0.0, last); jobs.len()];
        variables.extend(vec![VariableBounds::integer(1.0, 3.0); jobs.len()]);
        Self { jobs, variables }
    }

    fn cost(&self, row: &[f64]) -> f64 {
        let (order, speeds) = row.split_at(self.jobs.len());
        let mut clock = 0.0;
        let mut tardiness = 0.0;
        let mut energy = 0.0;
        for &job in order {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let idx = job as usize;
            let speed = speeds[idx];
            clock += self.jobs[idx].duration / speed;
            tardiness += (clock - self.jobs[idx].due).max(0.0);
            energy += speed * speed;
        }
        tardiness + 0.5 * energy
    }
}

impl ProblemBounds for JobShop {
    fn dimensions(&self) -> usize {
        self.variables.len()
    }

    fn variables(&self) -> &[VariableBounds] {
        &self.variables
    }
}

impl Problem for JobShop {
    fn evaluate(&mut self, decisions: &[Vec<f64>]) -> ProblemResult<Evaluation> {
        Ok(Evaluation::single(
            decisions.iter().map(|row| self.cost(row)).collect(),
        ))
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let jobs = [(4.0, 6.0), (2.0, 3.0), (6.0, 20.0), (3.0, 9.0), (5.0, 12.0), (1.0, 2.0)]
        .into_iter()
        .map(|(duration, due)| Job { duration, due })
        .collect::<Vec<_>>();
    let width = jobs.len();
    let problem = JobShop::new(jobs);

    let options = RunOptions {
        limits: Limits {
            max_generations: Some(300),
            max_trapped_count: Some(60),
            ..Limits::default()
        },
        log_interval: 10,
        ..RunOptions::default()
    };
    let mut engine = PolysomyGa::builder_from_blocks(
        problem,
        &[(Encoding::Permutation, width), (Encoding::RealInteger, width)],
    )?
    .population_size(60)
    .options(options)
    .build()?;

    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let outcome = engine.run(None, &mut rng)?;
    let report = &outcome.report;
    match &report.best {
        Some(best) => {
            let (order, speeds) = best.decision.split_at(width);
            println!("order:  {order:?}");
            println!("speeds: {speeds:?}");
            println!("cost:   {:.3}", best.objectives[0]);
        }
        None => println!("no feasible schedule found"),
    }
    println!(
        "stopped after {} generations ({}), {} evaluations",
        report.generations, report.reason, report.evaluations
    );
    Ok(())
}
