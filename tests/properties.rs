use jeans_psy::ops::{Evaluation, Problem, ProblemBounds, ProblemResult};
use jeans_psy::{
    Encoding, FieldDescriptor, PolysomyGa, PopulationLayout, StopReason, VariableBounds,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::rc::Rc;

/// Mixed problem: a permutation block, a binary block and a real block.
///
/// Every batch is checked against the declared domains and the batch sizes
/// are recorded.
struct Audited {
    layout: PopulationLayout,
    variables: Vec<VariableBounds>,
    batches: Vec<usize>,
    violations: Vec<String>,
}

impl Audited {
    fn new() -> Self {
        let permutation =
            FieldDescriptor::permutation(vec![VariableBounds::integer(0.0, 7.0); 8]).unwrap();
        let binary = FieldDescriptor::binary_with_precision(
            vec![
                VariableBounds::real(-2.0, 2.0).with_inclusion(false, true),
                VariableBounds::integer(0.0, 9.0),
            ],
            3,
            jeans_psy::BitCoding::Gray,
        )
        .unwrap();
        let real = FieldDescriptor::real_integer(vec![
            VariableBounds::real(0.0, 1.0),
            VariableBounds::real(-1.0, 1.0).with_inclusion(true, false),
            VariableBounds::integer(-5.0, 5.0),
        ])
        .unwrap();
        let layout = PopulationLayout::new(
            &[Encoding::Permutation, Encoding::BinaryGray, Encoding::RealInteger],
            vec![permutation, binary, real],
        )
        .unwrap();
        let variables = layout.variables();
        Self {
            layout,
            variables,
            batches: Vec::new(),
            violations: Vec::new(),
        }
    }

    fn audit(&mut self, row: &[f64]) {
        for (idx, (value, variable)) in row.iter().zip(&self.variables).enumerate() {
            if !variable.contains(*value) {
                self.violations
                    .push(format!("variable {idx} = {value} outside {variable:?}"));
            }
        }
        let mut tour = row[..8].to_vec();
        tour.sort_by(f64::total_cmp);
        if tour != (0..8_u8).map(f64::from).collect::<Vec<_>>() {
            self.violations.push(format!("invalid permutation {:?}", &row[..8]));
        }
    }
}

impl ProblemBounds for Audited {
    fn dimensions(&self) -> usize {
        self.variables.len()
    }

    fn variables(&self) -> &[VariableBounds] {
        &self.variables
    }
}

impl Problem for Audited {
    fn evaluate(&mut self, decisions: &[Vec<f64>]) -> ProblemResult<Evaluation> {
        self.batches.push(decisions.len());
        for row in decisions {
            self.audit(row);
        }
        Ok(Evaluation::single(
            decisions
                .iter()
                .map(|row| {
                    let displacement: f64 = row[..8]
                        .iter()
                        .enumerate()
                        .map(|(position, city)| (city - position as f64).abs())
                        .sum();
                    let tail: f64 = row[8..].iter().map(|value| value * value).sum();
                    displacement + tail
                })
                .collect(),
        ))
    }
}

#[test]
fn mixed_blocks_respect_domains_and_population_size() {
    let problem = Audited::new();
    let layout = problem.layout.clone();
    let best_history = Rc::new(RefCell::new(Vec::new()));
    let recorder = Rc::clone(&best_history);
    let mut ga = PolysomyGa::builder(problem, layout)
        .population_size(16)
        .max_generations(25)
        .on_generation(move |stats| {
            let best = stats.best_objectives.as_ref().map(|values| values[0]);
            recorder.borrow_mut().push(best);
        })
        .build()
        .unwrap();
    let mut rng = StdRng::seed_from_u64(2024);
    let outcome = ga.run(None, &mut rng).unwrap();

    let problem = ga.problem();
    assert!(problem.violations.is_empty(), "{:?}", problem.violations);
    assert_eq!(problem.batches[0], 16);
    assert!(problem.batches[1..].iter().all(|&batch| batch == 15));
    assert_eq!(problem.batches.len(), 26);

    assert_eq!(outcome.population.len(), 16);
    for (rows, field) in outcome.population.blocks().iter().zip(ga.layout().blocks()) {
        assert_eq!(rows.len(), 16);
        assert!(rows.iter().all(|row| field.is_valid_row(row.genes())));
    }

    let history = best_history.borrow();
    assert_eq!(history.len(), 26);
    for pair in history.windows(2) {
        let (previous, current) = (pair[0].unwrap(), pair[1].unwrap());
        assert!(current <= previous + 1e-12, "elitism regressed: {previous} -> {current}");
    }
}

#[test]
fn generation_limit_is_exact() {
    let problem = Audited::new();
    let layout = problem.layout.clone();
    let calls = Rc::new(RefCell::new(0_usize));
    let counter = Rc::clone(&calls);
    let mut ga = PolysomyGa::builder(problem, layout)
        .population_size(8)
        .max_generations(10)
        .on_generation(move |_| *counter.borrow_mut() += 1)
        .build()
        .unwrap();
    let mut rng = StdRng::seed_from_u64(10);
    let outcome = ga.run(None, &mut rng).unwrap();
    assert_eq!(outcome.report.reason, StopReason::MaxGenerations);
    assert_eq!(outcome.report.generations, 10);
    assert_eq!(*calls.borrow(), 11);
    assert_eq!(outcome.report.trace.records(), 11);
}

#[test]
fn fixed_seed_replays_the_run() {
    let run = |seed: u64| {
        let problem = Audited::new();
        let layout = problem.layout.clone();
        let mut ga = PolysomyGa::builder(problem, layout)
            .population_size(10)
            .max_generations(6)
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        ga.run(None, &mut rng).unwrap()
    };
    let first = run(77);
    let second = run(77);
    assert_eq!(first.population.blocks(), second.population.blocks());
    assert_eq!(first.report.best, second.report.best);
    assert_eq!(first.report.archive, second.report.archive);
}
