//! Genetic operators and problem abstractions.
//!
//! This module groups the traits that describe how users interact with the
//! genetic algorithm core. Each sub-module focuses on a particular aspect of
//! the optimization workflow so the implementations can stay lightweight and
//! single-purpose.

pub mod crossover;
pub mod mutation;
pub mod problem;
pub mod scaling;
pub mod selection;

pub use crossover::{PartiallyMatchedCrossover, RecombinationOperator, TwoPointCrossover};
pub use mutation::{
    BitFlipMutation, BreederMutation, InversionMutation, MutationContext, MutationOperator,
};
pub use problem::{Evaluation, Problem, ProblemBounds, ProblemError, ProblemResult, Sense};
pub use scaling::{FitnessScaling, LinearScaling, RankScaling};
pub use selection::{RouletteWheelSelection, SelectionOperator, TournamentSelection};

use crate::core::{Encoding, FieldDescriptor};
use rand::RngCore;

/// Crossover probability of the default recombination operators.
pub const DEFAULT_CROSSOVER_PROBABILITY: f64 = 0.7;
/// Per-individual inversion probability for permutation blocks.
pub const DEFAULT_INVERSION_PROBABILITY: f64 = 0.5;
/// Shrink factor of the breeder mutation.
pub const DEFAULT_MUTATION_SHRINK: f64 = 0.5;
/// Number of step levels of the breeder mutation.
pub const DEFAULT_MUTATION_GRADIENT: u32 = 20;
/// Tournament size of the default selection operator.
pub const DEFAULT_TOURNAMENT_SIZE: usize = 2;

/// Errors raised when an operator is configured with invalid parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OperatorError {
    /// A probability was outside `[0, 1]` or not finite.
    #[error("{operator} probability must be within [0, 1] (received {value})")]
    InvalidProbability {
        /// Operator reporting the error.
        operator: &'static str,
        /// Offending value.
        value: f64,
    },
    /// Any other numeric parameter failed validation.
    #[error("{operator} parameter {parameter} was invalid (received {value})")]
    InvalidParameter {
        /// Operator reporting the error.
        operator: &'static str,
        /// Name of the parameter.
        parameter: &'static str,
        /// Offending value.
        value: f64,
    },
    /// Tournaments need at least two contestants.
    #[error("tournament size must be at least two (received {0})")]
    InvalidTournamentSize(usize),
    /// Selection was asked to draw from an empty fitness vector.
    #[error("cannot select from an empty fitness vector")]
    EmptyFitness,
}

pub(crate) fn check_probability(operator: &'static str, value: f64) -> Result<f64, OperatorError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(OperatorError::InvalidProbability { operator, value })
    }
}

/// Uniform draw from `[0, 1)`.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn random_unit(rng: &mut dyn RngCore) -> f64 {
    let value = rng.next_u64() as f64;
    (value / (u64::MAX as f64 + 1.0)).min(1.0 - f64::EPSILON)
}

/// Recombination and mutation operators applied to one chromosome block.
pub struct OperatorPair {
    /// Recombines adjacent parent rows.
    pub recombination: Box<dyn RecombinationOperator>,
    /// Perturbs the recombined rows.
    pub mutation: Box<dyn MutationOperator>,
}

impl OperatorPair {
    /// Pairs arbitrary operators.
    pub fn new(
        recombination: impl RecombinationOperator + 'static,
        mutation: impl MutationOperator + 'static,
    ) -> Self {
        Self {
            recombination: Box::new(recombination),
            mutation: Box::new(mutation),
        }
    }

    /// Default operators for a block:
    ///
    /// | encoding | recombination | mutation |
    /// | --- | --- | --- |
    /// | permutation | partially matched, 0.7 | inversion, 0.5 |
    /// | binary/Gray | two-point, 0.7 | bit flip, 1 / bits |
    /// | real/integer | two-point, 0.7 | breeder, 1 / decision dimension |
    ///
    /// # Errors
    /// Returns [`OperatorError`] only if a default parameter is rejected, for
    /// example a zero `decision_dimensions`.
    pub fn for_field(
        field: &FieldDescriptor,
        decision_dimensions: usize,
    ) -> Result<Self, OperatorError> {
        let pair = match field.encoding() {
            Encoding::Permutation => Self::new(
                PartiallyMatchedCrossover::new(DEFAULT_CROSSOVER_PROBABILITY)?,
                InversionMutation::new(DEFAULT_INVERSION_PROBABILITY)?,
            ),
            Encoding::BinaryGray => Self::new(
                TwoPointCrossover::new(DEFAULT_CROSSOVER_PROBABILITY)?,
                BitFlipMutation::per_gene_default(),
            ),
            Encoding::RealInteger => {
                if decision_dimensions == 0 {
                    return Err(OperatorError::InvalidParameter {
                        operator: "breeder mutation",
                        parameter: "decision dimensions",
                        value: 0.0,
                    });
                }
                #[allow(clippy::cast_precision_loss)]
                let probability = 1.0 / decision_dimensions as f64;
                Self::new(
                    TwoPointCrossover::new(DEFAULT_CROSSOVER_PROBABILITY)?,
                    BreederMutation::new(
                        probability,
                        DEFAULT_MUTATION_SHRINK,
                        DEFAULT_MUTATION_GRADIENT,
                    )?,
                )
            }
        };
        Ok(pair)
    }
}

impl std::fmt::Debug for OperatorPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorPair").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::VariableBounds;

    #[test]
    fn probabilities_outside_unit_interval_are_rejected() {
        assert!(check_probability("test", 0.3).is_ok());
        assert!(check_probability("test", 1.5).is_err());
        assert!(check_probability("test", f64::NAN).is_err());
    }

    #[test]
    fn real_blocks_need_a_decision_dimension() {
        let field = FieldDescriptor::real_integer(vec![VariableBounds::real(0.0, 1.0)]).unwrap();
        assert!(OperatorPair::for_field(&field, 0).is_err());
        assert!(OperatorPair::for_field(&field, 3).is_ok());
    }
}
