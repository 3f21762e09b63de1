//! Mutation operators that perturb the rows of one chromosome block.

use super::{check_probability, random_unit, OperatorError};
use crate::core::{Chromosome, FieldDescriptor, Gene};
use rand::seq::index;
use rand::RngCore;
use std::sync::Arc;

/// Run state visible to mutation operators.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MutationContext {
    /// Current generation index.
    pub generation: usize,
    /// Fraction of the run budget already used, within `[0, 1]`.
    pub progress: f64,
}

/// Perturbs one row of a chromosome block.
///
/// Implementations must return a row the block's [`FieldDescriptor`]
/// accepts: same length, genes inside their domains and, for permutation
/// blocks, no repeated values.
///
/// # Examples
/// ```
/// use jeans_psy::ops::{MutationContext, MutationOperator};
/// use jeans_psy::{FieldDescriptor, VariableBounds};
/// use rand::thread_rng;
///
/// struct Reverse;
///
/// impl MutationOperator for Reverse {
///     fn mutate(
///         &self,
///         genes: &[f64],
///         _field: &FieldDescriptor,
///         _context: &MutationContext,
///         _rng: &mut dyn rand::RngCore,
///     ) -> Vec<f64> {
///         genes.iter().rev().copied().collect()
///     }
/// }
///
/// let field = FieldDescriptor::permutation(vec![VariableBounds::integer(0.0, 2.0); 3]).unwrap();
/// let mut rng = thread_rng();
/// let row = Reverse.mutate(&[0.0, 1.0, 2.0], &field, &MutationContext::default(), &mut rng);
/// assert_eq!(row, vec![2.0, 1.0, 0.0]);
/// ```
pub trait MutationOperator: Send + Sync {
    /// Mutates one row and returns the result.
    fn mutate(
        &self,
        genes: &[Gene],
        field: &FieldDescriptor,
        context: &MutationContext,
        rng: &mut dyn RngCore,
    ) -> Vec<Gene>;

    /// Mutates every row of a block.
    fn mutate_block(
        &self,
        rows: &[Chromosome],
        field: &FieldDescriptor,
        context: &MutationContext,
        rng: &mut dyn RngCore,
    ) -> Vec<Chromosome> {
        rows.iter()
            .map(|row| Chromosome::new(self.mutate(row.genes(), field, context, rng)))
            .collect()
    }
}

impl<T: MutationOperator + ?Sized> MutationOperator for &T {
    fn mutate(
        &self,
        genes: &[Gene],
        field: &FieldDescriptor,
        context: &MutationContext,
        rng: &mut dyn RngCore,
    ) -> Vec<Gene> {
        (**self).mutate(genes, field, context, rng)
    }
}

impl<T: MutationOperator + ?Sized> MutationOperator for &mut T {
    fn mutate(
        &self,
        genes: &[Gene],
        field: &FieldDescriptor,
        context: &MutationContext,
        rng: &mut dyn RngCore,
    ) -> Vec<Gene> {
        (**self).mutate(genes, field, context, rng)
    }
}

impl<T: MutationOperator + ?Sized> MutationOperator for Box<T> {
    fn mutate(
        &self,
        genes: &[Gene],
        field: &FieldDescriptor,
        context: &MutationContext,
        rng: &mut dyn RngCore,
    ) -> Vec<Gene> {
        (**self).mutate(genes, field, context, rng)
    }
}

impl<T: MutationOperator + ?Sized> MutationOperator for Arc<T> {
    fn mutate(
        &self,
        genes: &[Gene],
        field: &FieldDescriptor,
        context: &MutationContext,
        rng: &mut dyn RngCore,
    ) -> Vec<Gene> {
        (**self).mutate(genes, field, context, rng)
    }
}

/// Reverses a random segment of the row.
///
/// Only positions move, so permutation rows stay permutations.
#[derive(Debug, Clone)]
pub struct InversionMutation {
    probability: f64,
}

impl InversionMutation {
    /// Creates an inversion applied to each row with `probability`.
    ///
    /// # Errors
    /// Returns [`OperatorError::InvalidProbability`] outside `[0, 1]`.
    pub fn new(probability: f64) -> Result<Self, OperatorError> {
        Ok(Self {
            probability: check_probability("inversion mutation", probability)?,
        })
    }
}

impl MutationOperator for InversionMutation {
    fn mutate(
        &self,
        genes: &[Gene],
        _field: &FieldDescriptor,
        _context: &MutationContext,
        rng: &mut dyn RngCore,
    ) -> Vec<Gene> {
        let mut row = genes.to_vec();
        if row.len() < 2 || random_unit(rng) >= self.probability {
            return row;
        }
        let picks = index::sample(rng, row.len(), 2);
        let (first, second) = (picks.index(0), picks.index(1));
        row[first.min(second)..=first.max(second)].reverse();
        row
    }
}

/// Flips each bit independently.
#[derive(Debug, Clone)]
pub struct BitFlipMutation {
    probability: Option<f64>,
}

impl BitFlipMutation {
    /// Flips each bit with a fixed `probability`.
    ///
    /// # Errors
    /// Returns [`OperatorError::InvalidProbability`] outside `[0, 1]`.
    pub fn new(probability: f64) -> Result<Self, OperatorError> {
        Ok(Self {
            probability: Some(check_probability("bit flip mutation", probability)?),
        })
    }

    /// Flips each bit with probability `1 / row length`.
    #[must_use]
    pub fn per_gene_default() -> Self {
        Self { probability: None }
    }
}

impl MutationOperator for BitFlipMutation {
    fn mutate(
        &self,
        genes: &[Gene],
        _field: &FieldDescriptor,
        _context: &MutationContext,
        rng: &mut dyn RngCore,
    ) -> Vec<Gene> {
        if genes.is_empty() {
            return Vec::new();
        }
        #[allow(clippy::cast_precision_loss)]
        let probability = self
            .probability
            .unwrap_or_else(|| 1.0 / genes.len() as f64);
        genes
            .iter()
            .map(|&bit| {
                if random_unit(rng) < probability {
                    1.0 - bit
                } else {
                    bit
                }
            })
            .collect()
    }
}

/// Breeder GA mutation for real and integer genes.
///
/// Each gene mutates with `probability` by `± radius * delta`, where
/// `radius = (upper - lower) * shrink^(1 + progress)` narrows as the run
/// advances and `delta = Σ_k b_k 2^-k` over `gradient` Bernoulli(1/gradient)
/// draws favours small steps. Values leaving the domain are reflected back
/// and integral variables are rounded.
#[derive(Debug, Clone)]
pub struct BreederMutation {
    probability: f64,
    shrink: f64,
    gradient: u32,
}

impl BreederMutation {
    /// Creates a breeder mutation.
    ///
    /// # Errors
    /// Returns [`OperatorError`] when `probability` or `shrink` lies outside
    /// `[0, 1]`, or when `gradient` is zero.
    pub fn new(probability: f64, shrink: f64, gradient: u32) -> Result<Self, OperatorError> {
        let probability = check_probability("breeder mutation", probability)?;
        if !(shrink.is_finite() && shrink > 0.0 && shrink <= 1.0) {
            return Err(OperatorError::InvalidParameter {
                operator: "breeder mutation",
                parameter: "shrink",
                value: shrink,
            });
        }
        if gradient == 0 {
            return Err(OperatorError::InvalidParameter {
                operator: "breeder mutation",
                parameter: "gradient",
                value: 0.0,
            });
        }
        Ok(Self {
            probability,
            shrink,
            gradient,
        })
    }

    fn delta(&self, rng: &mut dyn RngCore) -> f64 {
        let chance = 1.0 / f64::from(self.gradient);
        (0..self.gradient)
            .filter(|_| random_unit(rng) < chance)
            .map(|level| 0.5_f64.powf(f64::from(level)))
            .sum()
    }
}

impl MutationOperator for BreederMutation {
    fn mutate(
        &self,
        genes: &[Gene],
        field: &FieldDescriptor,
        context: &MutationContext,
        rng: &mut dyn RngCore,
    ) -> Vec<Gene> {
        let progress = context.progress.clamp(0.0, 1.0);
        let scale = self.shrink.powf(1.0 + progress);
        genes
            .iter()
            .zip(field.variables())
            .map(|(&gene, variable)| {
                if random_unit(rng) >= self.probability {
                    return gene;
                }
                let radius = (variable.upper - variable.lower) * scale;
                let sign = if random_unit(rng) < 0.5 { -1.0 } else { 1.0 };
                variable.reflect(gene + sign * radius * self.delta(rng))
            })
            .collect()
    }
}
