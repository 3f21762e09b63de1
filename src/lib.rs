#![warn(missing_docs)]

/*!
    An elitist genetic algorithm for single-objective problems whose decision vector is split
    into several independently encoded chromosome blocks ("polysomy").

    Each block is a permutation, a binary/Gray bit string, or a vector of real/integer values,
    and carries its own recombination and mutation operators. The genome decodes block by
    block into one phenotype that the [`Problem`](ops::Problem) evaluates in batches.

    ```
    use jeans_psy::ops::{Evaluation, Problem, ProblemBounds, ProblemResult};
    use jeans_psy::{Encoding, PolysomyGa, VariableBounds};
    use rand::SeedableRng;

    // Visit order of four cities plus a real-valued speed setting.
    struct Tour {
        variables: Vec<VariableBounds>,
    }

    impl ProblemBounds for Tour {
        fn dimensions(&self) -> usize { self.variables.len() }
        fn variables(&self) -> &[VariableBounds] { &self.variables }
    }

    impl Problem for Tour {
        fn evaluate(&mut self, decisions: &[Vec<f64>]) -> ProblemResult<Evaluation> {
            Ok(Evaluation::single(
                decisions
                    .iter()
                    .map(|row| {
                        let order: f64 = row[..4].windows(2).map(|pair| (pair[1] - pair[0]).abs()).sum();
                        order + (row[4] - 0.5).powi(2)
                    })
                    .collect(),
            ))
        }
    }

    let mut variables = vec![VariableBounds::integer(0.0, 3.0); 4];
    variables.push(VariableBounds::real(0.0, 1.0));
    let problem = Tour { variables };
    let mut ga = PolysomyGa::builder_from_blocks(
        problem,
        &[(Encoding::Permutation, 4), (Encoding::RealInteger, 1)],
    )
    .unwrap()
    .population_size(20)
    .max_generations(30)
    .build()
    .unwrap();
    let mut rng = rand::rngs::StdRng::seed_from_u64(3);
    let outcome = ga.run(None, &mut rng).unwrap();
    assert!(outcome.report.best.is_some());
    ```
    !*/

pub mod core;
pub mod ops;
pub mod psy_ega;
pub mod termination;

pub use crate::core::experiment::{BestRecord, DrawingMode, GenerationStats, RunReport, Trace};
pub use crate::core::{
    validate_bounds, BitCoding, BoundsError, Chromosome, Encoding, FieldDescriptor, Gene,
    Individual, LayoutError, Population, PopulationLayout, VariableBounds, VariableKind,
};
pub use crate::ops::{OperatorError, OperatorPair};
pub use crate::psy_ega::{
    ConfigError, EvolutionError, Phase, PolysomyGa, PolysomyGaBuilder, RunFailure, RunOptions,
    RunOutcome,
};
pub use crate::termination::{Limits, Status, StopReason, TerminationController};
