use jeans_psy::ops::{
    Evaluation, Problem, ProblemBounds, ProblemResult, RankScaling, RouletteWheelSelection, Sense,
};
use jeans_psy::{
    Chromosome, Encoding, Limits, PolysomyGa, Population, RunOptions, StopReason, VariableBounds,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;

/// Shifted sphere with its minimum at `center` in every dimension.
struct ShiftedSphere {
    variables: Vec<VariableBounds>,
    center: f64,
}

impl ShiftedSphere {
    fn new(dimensions: usize, center: f64) -> Self {
        Self {
            variables: vec![VariableBounds::real(0.0, 1.0); dimensions],
            center,
        }
    }
}

impl ProblemBounds for ShiftedSphere {
    fn dimensions(&self) -> usize {
        self.variables.len()
    }

    fn variables(&self) -> &[VariableBounds] {
        &self.variables
    }
}

impl Problem for ShiftedSphere {
    fn evaluate(&mut self, decisions: &[Vec<f64>]) -> ProblemResult<Evaluation> {
        Ok(Evaluation::single(
            decisions
                .iter()
                .map(|row| row.iter().map(|x| (x - self.center).powi(2)).sum())
                .collect(),
        ))
    }
}

/// Minimize `x0 + x1` subject to `x0 + x1 >= 1`.
struct HalfPlane {
    variables: Vec<VariableBounds>,
}

impl ProblemBounds for HalfPlane {
    fn dimensions(&self) -> usize {
        2
    }

    fn variables(&self) -> &[VariableBounds] {
        &self.variables
    }
}

impl Problem for HalfPlane {
    fn evaluate(&mut self, decisions: &[Vec<f64>]) -> ProblemResult<Evaluation> {
        let sums: Vec<f64> = decisions.iter().map(|row| row[0] + row[1]).collect();
        let violations = sums.iter().map(|sum| (1.0 - sum).max(0.0)).collect();
        Ok(Evaluation::with_violations(
            sums.into_iter().map(|sum| vec![sum]).collect(),
            violations,
        ))
    }
}

/// Scheduling toy: a job order followed by integer machine assignments.
struct Schedule {
    variables: Vec<VariableBounds>,
    jobs: usize,
}

impl Schedule {
    fn new(jobs: usize, machines: usize) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let mut variables = vec![VariableBounds::integer(0.0, (jobs - 1) as f64); jobs];
        variables.extend(vec![VariableBounds::integer(0.0, 4.0); machines]);
        Self { variables, jobs }
    }
}

impl ProblemBounds for Schedule {
    fn dimensions(&self) -> usize {
        self.variables.len()
    }

    fn variables(&self) -> &[VariableBounds] {
        &self.variables
    }
}

impl Problem for Schedule {
    fn evaluate(&mut self, decisions: &[Vec<f64>]) -> ProblemResult<Evaluation> {
        Ok(Evaluation::single(
            decisions
                .iter()
                .map(|row| {
                    let (order, machines) = row.split_at(self.jobs);
                    let inversions = order
                        .iter()
                        .enumerate()
                        .flat_map(move |(i, a)| order[i + 1..].iter().filter(move |b| *b < a))
                        .count();
                    #[allow(clippy::cast_precision_loss)]
                    let inversions = inversions as f64;
                    inversions + machines.iter().sum::<f64>()
                })
                .collect(),
        ))
    }
}

/// Counts the ones of a bit-string encoded integer and is maximized.
struct Plateau {
    variables: Vec<VariableBounds>,
}

impl ProblemBounds for Plateau {
    fn dimensions(&self) -> usize {
        self.variables.len()
    }

    fn variables(&self) -> &[VariableBounds] {
        &self.variables
    }

    fn senses(&self) -> Vec<Sense> {
        vec![Sense::Maximize]
    }
}

impl Problem for Plateau {
    fn evaluate(&mut self, decisions: &[Vec<f64>]) -> ProblemResult<Evaluation> {
        Ok(Evaluation::single(
            decisions.iter().map(|row| row.iter().sum()).collect(),
        ))
    }
}

#[test]
fn sphere_converges_near_the_optimum() {
    let problem = ShiftedSphere::new(5, 0.3);
    let mut ga = PolysomyGa::builder_from_blocks(problem, &[(Encoding::RealInteger, 5)])
        .unwrap()
        .population_size(20)
        .max_generations(50)
        .build()
        .unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    let outcome = ga.run(None, &mut rng).unwrap();

    let best = outcome.report.best.expect("feasible best");
    assert!(best.objectives[0] < 0.05, "best objective {}", best.objectives[0]);
    assert!(best.decision.iter().all(|x| (0.0..=1.0).contains(x)));
    assert_eq!(outcome.report.evaluations, 20 + 50 * 19);

    // The archive only ever records improvements.
    for pair in outcome.report.archive.windows(2) {
        assert!(pair[1].objectives[0] < pair[0].objectives[0]);
        assert!(pair[1].generation > pair[0].generation);
    }
}

#[test]
fn feasible_solutions_win_over_better_infeasible_ones() {
    let problem = HalfPlane {
        variables: vec![VariableBounds::real(0.0, 1.0); 2],
    };
    let mut ga = PolysomyGa::builder_from_blocks(problem, &[(Encoding::RealInteger, 2)])
        .unwrap()
        .population_size(20)
        .max_generations(40)
        .build()
        .unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    let outcome = ga.run(None, &mut rng).unwrap();

    let best = outcome.report.best.expect("feasible best");
    assert!(best.objectives[0] >= 1.0 - 1e-12);
    assert!(best.objectives[0] < 1.2, "best objective {}", best.objectives[0]);
    // The elite leads the final population and is feasible.
    let violations = outcome.population.violations().unwrap();
    assert_eq!(violations[0], 0.0);
}

#[test]
fn permutation_with_machine_assignment_keeps_block_shapes() {
    let problem = Schedule::new(8, 3);
    let mut ga = PolysomyGa::builder_from_blocks(
        problem,
        &[(Encoding::Permutation, 8), (Encoding::RealInteger, 3)],
    )
    .unwrap()
    .population_size(12)
    .max_generations(5)
    .build()
    .unwrap();
    let mut rng = StdRng::seed_from_u64(8);
    let outcome = ga.run(None, &mut rng).unwrap();

    let blocks = outcome.population.blocks();
    assert_eq!(blocks.len(), 2);
    assert!(blocks[0].iter().all(|row| row.len() == 8));
    assert!(blocks[1].iter().all(|row| row.len() == 3));
    for row in outcome.population.phenotype() {
        let mut order = row[..8].to_vec();
        order.sort_by(f64::total_cmp);
        assert_eq!(order, (0..8_u8).map(f64::from).collect::<Vec<_>>());
        assert!(row[8..].iter().all(|m| m.fract() == 0.0 && (0.0..=4.0).contains(m)));
    }
}

#[test]
fn prophet_is_trusted_and_kept_first() {
    let problem = ShiftedSphere::new(5, 0.3);
    let mut ga = PolysomyGa::builder_from_blocks(problem, &[(Encoding::RealInteger, 5)])
        .unwrap()
        .population_size(10)
        .max_generations(3)
        .build()
        .unwrap();
    let mut prophet = Population::from_blocks(
        Arc::clone(ga.layout()),
        vec![vec![Chromosome::new(vec![0.3; 5])]],
    )
    .unwrap();
    // A made-up objective shows the prophet is not re-evaluated.
    prophet.set_evaluation(vec![vec![-1.0]], vec![0.0]).unwrap();

    let mut rng = StdRng::seed_from_u64(11);
    let outcome = ga.run(Some(prophet), &mut rng).unwrap();
    let best = outcome.report.best.expect("feasible best");
    assert_eq!(best.objectives, vec![-1.0]);
    assert_eq!(best.decision, vec![0.3; 5]);
    assert_eq!(best.generation, 0);
    assert_eq!(outcome.population.phenotype()[0], vec![0.3; 5]);
    assert_eq!(outcome.population.len(), 10);
}

#[test]
fn unevaluated_prophet_fails_the_run() {
    let problem = ShiftedSphere::new(2, 0.5);
    let mut ga = PolysomyGa::builder_from_blocks(problem, &[(Encoding::RealInteger, 2)])
        .unwrap()
        .population_size(4)
        .max_generations(2)
        .build()
        .unwrap();
    let prophet = Population::from_blocks(
        Arc::clone(ga.layout()),
        vec![vec![Chromosome::new(vec![0.5, 0.5])]],
    )
    .unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    assert!(ga.run(Some(prophet), &mut rng).is_err());
}

#[test]
fn stagnation_stops_the_run() {
    let problem = Plateau {
        variables: vec![VariableBounds::integer(0.0, 1.0); 4],
    };
    let limits = Limits {
        max_generations: Some(100),
        max_trapped_count: Some(3),
        ..Limits::default()
    };
    let mut ga = PolysomyGa::builder_from_blocks(problem, &[(Encoding::BinaryGray, 4)])
        .unwrap()
        .population_size(40)
        .limits(limits)
        .build()
        .unwrap();
    let mut rng = StdRng::seed_from_u64(21);
    let outcome = ga.run(None, &mut rng).unwrap();

    // At most four improvements are possible, so stagnation ends the run.
    let best = outcome.report.best.expect("feasible best");
    assert!(best.objectives[0] >= 3.0);
    assert_eq!(outcome.report.reason, StopReason::Trapped);
    assert!(outcome.report.generations >= 3);
    assert!(outcome.report.generations < 100);
}

#[test]
fn evaluation_budget_stops_the_run() {
    let problem = ShiftedSphere::new(3, 0.5);
    let limits = Limits {
        max_evaluations: Some(100),
        ..Limits::default()
    };
    let mut ga = PolysomyGa::builder_from_blocks(problem, &[(Encoding::RealInteger, 3)])
        .unwrap()
        .population_size(10)
        .limits(limits)
        .build()
        .unwrap();
    let mut rng = StdRng::seed_from_u64(6);
    let outcome = ga.run(None, &mut rng).unwrap();
    assert_eq!(outcome.report.reason, StopReason::MaxEvaluations);
    // 10 initial evaluations plus 9 per generation; 10 + 9 * 10 = 100.
    assert_eq!(outcome.report.generations, 10);
    assert_eq!(outcome.report.evaluations, 100);
}

#[test]
fn time_budget_alone_stops_the_run() {
    let problem = ShiftedSphere::new(3, 0.5);
    let limits = Limits {
        max_time: Some(Duration::from_millis(30)),
        ..Limits::default()
    };
    let options = RunOptions {
        limits,
        verbose: false,
        ..RunOptions::default()
    };
    let mut ga = PolysomyGa::builder_from_blocks(problem, &[(Encoding::RealInteger, 3)])
        .unwrap()
        .population_size(10)
        .options(options)
        .build()
        .unwrap();
    let mut rng = StdRng::seed_from_u64(17);
    let outcome = ga.run(None, &mut rng).unwrap();
    assert_eq!(outcome.report.reason, StopReason::MaxTime);
    assert!(outcome.report.elapsed >= Duration::from_millis(30));
    assert_eq!(outcome.report.evaluations, 10 + 9 * outcome.report.generations);
}

#[test]
fn alternative_operators_and_quiet_options() {
    let problem = ShiftedSphere::new(4, 0.7);
    let options = RunOptions {
        limits: Limits::max_generations(15),
        verbose: false,
        log_interval: 5,
        ..RunOptions::default()
    };
    let mut ga = PolysomyGa::builder_from_blocks(
        problem,
        &[(Encoding::RealInteger, 2), (Encoding::BinaryGray, 2)],
    )
    .unwrap()
    .population_size(16)
    .options(options)
    .selection(RouletteWheelSelection)
    .scaling(RankScaling)
    .build()
    .unwrap();
    let mut rng = StdRng::seed_from_u64(13);
    let outcome = ga.run(None, &mut rng).unwrap();
    assert_eq!(outcome.report.reason, StopReason::MaxGenerations);
    // Generations 0, 5, 10 and 15 are traced.
    assert_eq!(outcome.report.trace.generation, vec![0, 5, 10, 15]);
    assert!(outcome.report.best.is_some());
}
