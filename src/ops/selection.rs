//! Selection operators that draw breeding indices from a fitness vector.

use super::{OperatorError, DEFAULT_TOURNAMENT_SIZE};
use rand::seq::index;
use rand::{Rng, RngCore};
use std::sync::Arc;

/// Selects parents according to their fitness.
///
/// Higher fitness must never lower the chance of being drawn. Draws are
/// independent, so the same index may appear several times.
///
/// # Examples
/// ```
/// use jeans_psy::ops::SelectionOperator;
///
/// struct BestOnly;
///
/// impl SelectionOperator for BestOnly {
///     fn select_index(&self, fitness_values: &[f64], _rng: &mut dyn rand::RngCore) -> Option<usize> {
///         fitness_values
///             .iter()
///             .enumerate()
///             .max_by(|(_, a), (_, b)| a.total_cmp(b))
///             .map(|(idx, _)| idx)
///     }
/// }
///
/// let mut rng = rand::thread_rng();
/// let picks = BestOnly.select(&[0.0, 10.0, 3.0], 4, &mut rng).unwrap();
/// assert_eq!(picks, vec![1, 1, 1, 1]);
/// ```
pub trait SelectionOperator: Send + Sync {
    /// Returns one index into `fitness_values`.
    fn select_index(&self, fitness_values: &[f64], rng: &mut dyn RngCore) -> Option<usize>;

    /// Draws `count` indices with replacement.
    ///
    /// # Errors
    /// Returns [`OperatorError::EmptyFitness`] when no index can be drawn.
    fn select(
        &self,
        fitness_values: &[f64],
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<usize>, OperatorError> {
        (0..count)
            .map(|_| {
                self.select_index(fitness_values, rng)
                    .ok_or(OperatorError::EmptyFitness)
            })
            .collect()
    }
}

impl<T: SelectionOperator + ?Sized> SelectionOperator for &T {
    fn select_index(&self, fitness_values: &[f64], rng: &mut dyn RngCore) -> Option<usize> {
        (**self).select_index(fitness_values, rng)
    }
}

impl<T: SelectionOperator + ?Sized> SelectionOperator for &mut T {
    fn select_index(&self, fitness_values: &[f64], rng: &mut dyn RngCore) -> Option<usize> {
        (**self).select_index(fitness_values, rng)
    }
}

impl<T: SelectionOperator + ?Sized> SelectionOperator for Box<T> {
    fn select_index(&self, fitness_values: &[f64], rng: &mut dyn RngCore) -> Option<usize> {
        (**self).select_index(fitness_values, rng)
    }
}

impl<T: SelectionOperator + ?Sized> SelectionOperator for Arc<T> {
    fn select_index(&self, fitness_values: &[f64], rng: &mut dyn RngCore) -> Option<usize> {
        (**self).select_index(fitness_values, rng)
    }
}

/// Tournament selection over distinct, uniformly drawn contestants.
///
/// The winner is the contestant with the highest fitness; among equal
/// contestants the first one drawn wins, so all-equal fitness degrades to
/// uniform sampling.
#[derive(Debug, Clone)]
pub struct TournamentSelection {
    size: usize,
}

impl TournamentSelection {
    /// Creates a tournament selector of the provided size.
    ///
    /// # Errors
    /// Returns [`OperatorError::InvalidTournamentSize`] when `size < 2`.
    pub fn new(size: usize) -> Result<Self, OperatorError> {
        if size < 2 {
            return Err(OperatorError::InvalidTournamentSize(size));
        }
        Ok(Self { size })
    }

    /// Number of contestants per tournament.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Default for TournamentSelection {
    fn default() -> Self {
        Self {
            size: DEFAULT_TOURNAMENT_SIZE,
        }
    }
}

impl SelectionOperator for TournamentSelection {
    fn select_index(&self, fitness_values: &[f64], rng: &mut dyn RngCore) -> Option<usize> {
        if fitness_values.is_empty() {
            return None;
        }
        let contestants = self.size.min(fitness_values.len());
        let mut best_idx: Option<usize> = None;
        for idx in index::sample(rng, fitness_values.len(), contestants) {
            best_idx = match best_idx {
                Some(current) if fitness_values[idx] <= fitness_values[current] => Some(current),
                _ => Some(idx),
            };
        }
        best_idx
    }
}

/// Fitness-proportional (roulette-wheel) selection.
///
/// Weights are fitness values shifted so the smallest one is zero. When every
/// weight is zero, or the total is not finite, indices are drawn uniformly.
#[derive(Debug, Clone, Default)]
pub struct RouletteWheelSelection;

impl SelectionOperator for RouletteWheelSelection {
    fn select_index(&self, fitness_values: &[f64], rng: &mut dyn RngCore) -> Option<usize> {
        if fitness_values.is_empty() {
            return None;
        }
        let floor = fitness_values
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        let total: f64 = fitness_values.iter().map(|value| value - floor).sum();
        if !(total.is_finite() && total > 0.0) {
            return Some(rng.gen_range(0..fitness_values.len()));
        }
        let mut remaining = rng.gen::<f64>() * total;
        for (idx, value) in fitness_values.iter().enumerate() {
            remaining -= value - floor;
            if remaining < 0.0 {
                return Some(idx);
            }
        }
        // Rounding left a sliver past the last positive weight.
        fitness_values.iter().rposition(|value| value - floor > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Deterministic;

    impl SelectionOperator for Deterministic {
        fn select_index(&self, _fitness_values: &[f64], _rng: &mut dyn RngCore) -> Option<usize> {
            Some(0)
        }
    }

    #[test]
    fn select_draws_requested_count() {
        let mut rng = StdRng::seed_from_u64(1);
        let picks = Deterministic.select(&[1.0, 2.0], 5, &mut rng).unwrap();
        assert_eq!(picks, vec![0; 5]);
    }

    #[test]
    fn tournament_rejects_single_contestant() {
        assert!(TournamentSelection::new(1).is_err());
        assert_eq!(TournamentSelection::default().size(), 2);
    }

    #[test]
    fn tournament_never_picks_the_worst_of_two() {
        let operator = TournamentSelection::new(2).unwrap();
        let mut rng = StdRng::seed_from_u64(17);
        let picks = operator.select(&[0.0, 1.0], 200, &mut rng).unwrap();
        assert!(picks.iter().all(|&idx| idx == 1));
    }

    #[test]
    fn tournament_favours_higher_fitness() {
        let operator = TournamentSelection::default();
        let mut rng = StdRng::seed_from_u64(23);
        let picks = operator.select(&[1.0, 2.0, 3.0, 4.0], 4000, &mut rng).unwrap();
        let mut counts = [0_usize; 4];
        picks.iter().for_each(|&idx| counts[idx] += 1);
        assert!(counts.windows(2).all(|pair| pair[0] < pair[1]), "{counts:?}");
    }

    #[test]
    fn roulette_falls_back_to_uniform_for_equal_fitness() {
        let operator = RouletteWheelSelection;
        let mut rng = StdRng::seed_from_u64(29);
        let picks = operator.select(&[3.0; 4], 4000, &mut rng).unwrap();
        let mut counts = [0_usize; 4];
        picks.iter().for_each(|&idx| counts[idx] += 1);
        assert!(counts.iter().all(|&count| count > 800), "{counts:?}");
    }

    #[test]
    fn roulette_skips_zero_weight() {
        let operator = RouletteWheelSelection;
        let mut rng = StdRng::seed_from_u64(31);
        let picks = operator.select(&[1.0, 2.0, 5.0], 500, &mut rng).unwrap();
        assert!(picks.iter().all(|&idx| idx != 0));
    }

    #[test]
    fn empty_fitness_is_an_error() {
        let mut rng = StdRng::seed_from_u64(37);
        let err = TournamentSelection::default()
            .select(&[], 1, &mut rng)
            .unwrap_err();
        assert_eq!(err, OperatorError::EmptyFitness);
    }
}
