//! Recombination operators that mix the rows of one chromosome block.

use super::{check_probability, random_unit, OperatorError};
use crate::core::{Chromosome, Gene};
use rand::{Rng, RngCore};
use std::sync::Arc;

/// Produces two offspring rows from two parent rows of the same block.
///
/// Operators must preserve row length, and for permutation blocks they must
/// return valid permutations of the parents' values.
///
/// # Examples
/// ```
/// use jeans_psy::ops::RecombinationOperator;
/// use jeans_psy::Chromosome;
/// use rand::thread_rng;
///
/// struct Swap;
///
/// impl RecombinationOperator for Swap {
///     fn recombine_pair(&self, parent_a: &[f64], parent_b: &[f64], _rng: &mut dyn rand::RngCore) -> (Vec<f64>, Vec<f64>) {
///         (parent_b.to_vec(), parent_a.to_vec())
///     }
/// }
///
/// let rows = vec![
///     Chromosome::new(vec![0.0, 1.0]),
///     Chromosome::new(vec![2.0, 3.0]),
///     Chromosome::new(vec![4.0, 5.0]),
/// ];
/// let mut rng = thread_rng();
/// let children = Swap.recombine(&rows, &mut rng);
/// assert_eq!(children[0].genes(), &[2.0, 3.0]);
/// assert_eq!(children[1].genes(), &[0.0, 1.0]);
/// // An unpaired last row passes through untouched.
/// assert_eq!(children[2].genes(), &[4.0, 5.0]);
/// ```
pub trait RecombinationOperator: Send + Sync {
    /// Recombines one pair of parent rows.
    fn recombine_pair(
        &self,
        parent_a: &[Gene],
        parent_b: &[Gene],
        rng: &mut dyn RngCore,
    ) -> (Vec<Gene>, Vec<Gene>);

    /// Recombines adjacent rows `(0, 1), (2, 3), ...` of a block.
    ///
    /// The output has exactly as many rows as the input.
    fn recombine(&self, rows: &[Chromosome], rng: &mut dyn RngCore) -> Vec<Chromosome> {
        let mut offspring = Vec::with_capacity(rows.len());
        for pair in rows.chunks(2) {
            match pair {
                [parent_a, parent_b] => {
                    let (child_a, child_b) =
                        self.recombine_pair(parent_a.genes(), parent_b.genes(), rng);
                    offspring.push(Chromosome::new(child_a));
                    offspring.push(Chromosome::new(child_b));
                }
                _ => offspring.extend(pair.iter().cloned()),
            }
        }
        offspring
    }
}

impl<T: RecombinationOperator + ?Sized> RecombinationOperator for &T {
    fn recombine_pair(
        &self,
        parent_a: &[Gene],
        parent_b: &[Gene],
        rng: &mut dyn RngCore,
    ) -> (Vec<Gene>, Vec<Gene>) {
        (**self).recombine_pair(parent_a, parent_b, rng)
    }
}

impl<T: RecombinationOperator + ?Sized> RecombinationOperator for &mut T {
    fn recombine_pair(
        &self,
        parent_a: &[Gene],
        parent_b: &[Gene],
        rng: &mut dyn RngCore,
    ) -> (Vec<Gene>, Vec<Gene>) {
        (**self).recombine_pair(parent_a, parent_b, rng)
    }
}

impl<T: RecombinationOperator + ?Sized> RecombinationOperator for Box<T> {
    fn recombine_pair(
        &self,
        parent_a: &[Gene],
        parent_b: &[Gene],
        rng: &mut dyn RngCore,
    ) -> (Vec<Gene>, Vec<Gene>) {
        (**self).recombine_pair(parent_a, parent_b, rng)
    }
}

impl<T: RecombinationOperator + ?Sized> RecombinationOperator for Arc<T> {
    fn recombine_pair(
        &self,
        parent_a: &[Gene],
        parent_b: &[Gene],
        rng: &mut dyn RngCore,
    ) -> (Vec<Gene>, Vec<Gene>) {
        (**self).recombine_pair(parent_a, parent_b, rng)
    }
}

/// Swaps the segment between two random cut points.
///
/// Suitable for binary and real/integer blocks; it never changes gene values,
/// only their owner, so domain membership is preserved.
#[derive(Debug, Clone)]
pub struct TwoPointCrossover {
    probability: f64,
}

impl TwoPointCrossover {
    /// Creates a two-point crossover applied to each pair with `probability`.
    ///
    /// # Errors
    /// Returns [`OperatorError::InvalidProbability`] outside `[0, 1]`.
    pub fn new(probability: f64) -> Result<Self, OperatorError> {
        Ok(Self {
            probability: check_probability("two-point crossover", probability)?,
        })
    }

    /// Probability that a pair is recombined.
    #[must_use]
    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl RecombinationOperator for TwoPointCrossover {
    fn recombine_pair(
        &self,
        parent_a: &[Gene],
        parent_b: &[Gene],
        rng: &mut dyn RngCore,
    ) -> (Vec<Gene>, Vec<Gene>) {
        let mut child_a = parent_a.to_vec();
        let mut child_b = parent_b.to_vec();
        let len = child_a.len().min(child_b.len());
        if len < 2 || random_unit(rng) >= self.probability {
            return (child_a, child_b);
        }
        let (start, end) = cut_points(len, rng);
        child_a[start..end].swap_with_slice(&mut child_b[start..end]);
        (child_a, child_b)
    }
}

/// Partially matched crossover (PMX) for permutation blocks.
///
/// Each child inherits the segment between two cut points from one parent;
/// the remaining positions come from the other parent, with values that would
/// duplicate the segment replaced through the segment's value mapping.
/// Parents drawn from a wider domain than the block width still yield
/// duplicate-free rows.
#[derive(Debug, Clone)]
pub struct PartiallyMatchedCrossover {
    probability: f64,
}

impl PartiallyMatchedCrossover {
    /// Creates a PMX operator applied to each pair with `probability`.
    ///
    /// # Errors
    /// Returns [`OperatorError::InvalidProbability`] outside `[0, 1]`.
    pub fn new(probability: f64) -> Result<Self, OperatorError> {
        Ok(Self {
            probability: check_probability("partially matched crossover", probability)?,
        })
    }

    /// Probability that a pair is recombined.
    #[must_use]
    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl RecombinationOperator for PartiallyMatchedCrossover {
    fn recombine_pair(
        &self,
        parent_a: &[Gene],
        parent_b: &[Gene],
        rng: &mut dyn RngCore,
    ) -> (Vec<Gene>, Vec<Gene>) {
        let len = parent_a.len();
        if len < 2 || parent_b.len() != len || random_unit(rng) >= self.probability {
            return (parent_a.to_vec(), parent_b.to_vec());
        }
        let (start, end) = cut_points(len, rng);
        (
            pmx_child(parent_a, parent_b, start, end),
            pmx_child(parent_b, parent_a, start, end),
        )
    }
}

/// Child carrying `donor[start..end]` with the rest filled from `filler`.
fn pmx_child(donor: &[Gene], filler: &[Gene], start: usize, end: usize) -> Vec<Gene> {
    let segment = &donor[start..end];
    let mut child = filler.to_vec();
    child[start..end].copy_from_slice(segment);
    for position in (0..start).chain(end..child.len()) {
        let mut value = filler[position];
        // The mapping is injective and `value` starts outside the filler's
        // segment, so the chain ends in at most `end - start` steps.
        while let Some(offset) = segment.iter().position(|gene| *gene == value) {
            value = filler[start + offset];
        }
        child[position] = value;
    }
    child
}

/// Two distinct cut points `start < end` within `0..=len`.
fn cut_points(len: usize, rng: &mut dyn RngCore) -> (usize, usize) {
    let first = rng.gen_range(0..=len);
    let mut second = rng.gen_range(0..len);
    if second >= first {
        second += 1;
    }
    (first.min(second), first.max(second))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn is_permutation_of(row: &[Gene], values: &[Gene]) -> bool {
        let mut row = row.to_vec();
        let mut values = values.to_vec();
        row.sort_by(f64::total_cmp);
        values.sort_by(f64::total_cmp);
        row == values
    }

    #[test]
    fn cut_points_are_ordered_and_distinct() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let (start, end) = cut_points(5, &mut rng);
            assert!(start < end && end <= 5);
        }
    }

    #[test]
    fn two_point_preserves_gene_multiset_per_locus() {
        let operator = TwoPointCrossover::new(1.0).unwrap();
        let parent_a = [0.0; 6];
        let parent_b = [1.0; 6];
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let (child_a, child_b) = operator.recombine_pair(&parent_a, &parent_b, &mut rng);
            assert_eq!(child_a.len(), 6);
            for (gene_a, gene_b) in child_a.iter().zip(&child_b) {
                assert_eq!(gene_a + gene_b, 1.0);
            }
        }
    }

    #[test]
    fn zero_probability_copies_parents() {
        let operator = TwoPointCrossover::new(0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(13);
        let (child_a, child_b) = operator.recombine_pair(&[1.0, 2.0], &[3.0, 4.0], &mut rng);
        assert_eq!(child_a, vec![1.0, 2.0]);
        assert_eq!(child_b, vec![3.0, 4.0]);
    }

    #[test]
    fn pmx_keeps_children_valid_permutations() {
        let operator = PartiallyMatchedCrossover::new(1.0).unwrap();
        let parent_a = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let parent_b = [7.0, 3.0, 5.0, 1.0, 0.0, 6.0, 2.0, 4.0];
        let mut rng = StdRng::seed_from_u64(19);
        for _ in 0..200 {
            let (child_a, child_b) = operator.recombine_pair(&parent_a, &parent_b, &mut rng);
            assert!(is_permutation_of(&child_a, &parent_a), "{child_a:?}");
            assert!(is_permutation_of(&child_b, &parent_a), "{child_b:?}");
        }
    }

    #[test]
    fn pmx_handles_partial_domains() {
        let operator = PartiallyMatchedCrossover::new(1.0).unwrap();
        let parent_a = [0.0, 1.0, 2.0, 3.0];
        let parent_b = [9.0, 2.0, 7.0, 0.0];
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..200 {
            let (child_a, child_b) = operator.recombine_pair(&parent_a, &parent_b, &mut rng);
            for child in [child_a, child_b] {
                let mut sorted = child.clone();
                sorted.sort_by(f64::total_cmp);
                sorted.dedup();
                assert_eq!(sorted.len(), 4, "{child:?}");
            }
        }
    }

    #[test]
    fn pmx_matches_a_known_exchange() {
        // Segment [2, 5) from A: values 2, 3, 4 map onto B's 5, 1, 0.
        let child = pmx_child(
            &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            &[4.0, 3.0, 5.0, 1.0, 0.0, 2.0],
            2,
            5,
        );
        assert_eq!(child, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn recombine_keeps_row_count() {
        let operator = TwoPointCrossover::new(0.7).unwrap();
        let rows: Vec<Chromosome> = (0..5_u8)
            .map(|idx| Chromosome::new(vec![f64::from(idx); 4]))
            .collect();
        let mut rng = StdRng::seed_from_u64(23);
        let offspring = operator.recombine(&rows, &mut rng);
        assert_eq!(offspring.len(), 5);
        assert_eq!(offspring[4].genes(), rows[4].genes());
    }

    #[test]
    fn invalid_probability_is_rejected() {
        assert!(TwoPointCrossover::new(-0.1).is_err());
        assert!(PartiallyMatchedCrossover::new(2.0).is_err());
    }
}
