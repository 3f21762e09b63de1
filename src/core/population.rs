//! Population snapshots and the row algebra used for elitism and seeding.
//!
//! A [`Population`] owns one genome matrix per chromosome block together with
//! the derived phenotype, objective, violation and fitness arrays. Row `k` of
//! every array describes the same individual. Changing the genome goes
//! through [`Population::from_blocks`], which rebuilds the phenotype and
//! leaves the evaluation arrays empty until [`Population::set_evaluation`]
//! fills them again.

use super::experiment::population_diversity_by;
use super::{Chromosome, LayoutError, PopulationLayout};
use rand::Rng;
use std::sync::Arc;

/// Snapshot of a single individual across every block.
///
/// # Examples
/// ```
/// use jeans_psy::{Encoding, Population, PopulationLayout, VariableBounds};
/// use rand::SeedableRng;
/// use std::sync::Arc;
///
/// let layout = PopulationLayout::split(
///     &[VariableBounds::real(0.0, 1.0); 2],
///     &[(Encoding::RealInteger, 2)],
/// )
/// .unwrap();
/// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
/// let population = Population::random(Arc::new(layout), 3, &mut rng);
/// let individual = population.individual(0).unwrap();
/// assert_eq!(individual.phenotype().len(), 2);
/// assert!(individual.objectives().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    chromosomes: Vec<Chromosome>,
    phenotype: Vec<f64>,
    objectives: Option<Vec<f64>>,
    violation: Option<f64>,
    fitness: Option<f64>,
}

impl Individual {
    /// One chromosome per block, in layout order.
    #[must_use]
    pub fn chromosomes(&self) -> &[Chromosome] {
        &self.chromosomes
    }

    /// Decoded decision vector.
    #[must_use]
    pub fn phenotype(&self) -> &[f64] {
        &self.phenotype
    }

    /// Raw objective values, once evaluated.
    #[must_use]
    pub fn objectives(&self) -> Option<&[f64]> {
        self.objectives.as_deref()
    }

    /// Constraint violation, once evaluated; zero means feasible.
    #[must_use]
    pub fn violation(&self) -> Option<f64> {
        self.violation
    }

    /// Scaled fitness, once computed.
    #[must_use]
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }
}

/// Genome blocks of `N` individuals plus their derived arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    layout: Arc<PopulationLayout>,
    blocks: Vec<Vec<Chromosome>>,
    phenotype: Vec<Vec<f64>>,
    objectives: Option<Vec<Vec<f64>>>,
    violations: Option<Vec<f64>>,
    fitness: Option<Vec<f64>>,
}

impl Population {
    /// Samples `size` individuals uniformly within every block's domain.
    pub fn random<R: Rng + ?Sized>(layout: Arc<PopulationLayout>, size: usize, rng: &mut R) -> Self {
        let blocks: Vec<Vec<Chromosome>> = layout
            .blocks()
            .iter()
            .map(|field| (0..size).map(|_| field.sample(rng)).collect())
            .collect();
        let phenotype = decode_all(&layout, &blocks, size);
        Self {
            layout,
            blocks,
            phenotype,
            objectives: None,
            violations: None,
            fitness: None,
        }
    }

    /// Assembles a population from raw genome blocks and decodes its
    /// phenotype. Evaluation arrays start empty.
    ///
    /// # Errors
    /// Returns [`LayoutError::BlockCountMismatch`] when the number of blocks
    /// differs from the layout and [`LayoutError::MalformedBlock`] when row
    /// counts or row widths disagree.
    pub fn from_blocks(
        layout: Arc<PopulationLayout>,
        blocks: Vec<Vec<Chromosome>>,
    ) -> Result<Self, LayoutError> {
        if blocks.len() != layout.len() {
            return Err(LayoutError::BlockCountMismatch {
                encodings: layout.len(),
                fields: blocks.len(),
            });
        }
        let size = blocks.first().map_or(0, Vec::len);
        for (block, (rows, field)) in blocks.iter().zip(layout.blocks()).enumerate() {
            if rows.len() != size {
                return Err(LayoutError::MalformedBlock {
                    block,
                    reason: format!("{} rows where {size} were expected", rows.len()),
                });
            }
            if let Some(row) = rows.iter().find(|row| row.len() != field.gene_count()) {
                return Err(LayoutError::MalformedBlock {
                    block,
                    reason: format!(
                        "row of {} genes where {} were expected",
                        row.len(),
                        field.gene_count()
                    ),
                });
            }
        }
        let phenotype = decode_all(&layout, &blocks, size);
        Ok(Self {
            layout,
            blocks,
            phenotype,
            objectives: None,
            violations: None,
            fitness: None,
        })
    }

    /// Stores objective values and constraint violations, one entry per
    /// individual. Any previous fitness is discarded.
    ///
    /// # Errors
    /// Returns [`LayoutError::EvaluationLength`] when an array does not cover
    /// the population.
    pub fn set_evaluation(
        &mut self,
        objectives: Vec<Vec<f64>>,
        violations: Vec<f64>,
    ) -> Result<(), LayoutError> {
        for found in [objectives.len(), violations.len()] {
            if found != self.len() {
                return Err(LayoutError::EvaluationLength {
                    expected: self.len(),
                    found,
                });
            }
        }
        self.objectives = Some(objectives);
        self.violations = Some(violations);
        self.fitness = None;
        Ok(())
    }

    /// Stores a freshly scaled fitness vector.
    ///
    /// # Errors
    /// Returns [`LayoutError::EvaluationLength`] when the vector does not
    /// cover the population.
    pub fn set_fitness(&mut self, fitness: Vec<f64>) -> Result<(), LayoutError> {
        if fitness.len() != self.len() {
            return Err(LayoutError::EvaluationLength {
                expected: self.len(),
                found: fitness.len(),
            });
        }
        self.fitness = Some(fitness);
        Ok(())
    }

    /// Number of individuals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.phenotype.len()
    }

    /// Indicates whether the population holds no individual.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phenotype.is_empty()
    }

    /// Block layout shared by every individual.
    #[must_use]
    pub fn layout(&self) -> &Arc<PopulationLayout> {
        &self.layout
    }

    /// Genome matrices, one per block.
    #[must_use]
    pub fn blocks(&self) -> &[Vec<Chromosome>] {
        &self.blocks
    }

    /// Consumes the population and returns its genome matrices.
    #[must_use]
    pub fn into_blocks(self) -> Vec<Vec<Chromosome>> {
        self.blocks
    }

    /// Decoded decision vectors.
    #[must_use]
    pub fn phenotype(&self) -> &[Vec<f64>] {
        &self.phenotype
    }

    /// Raw objective matrix, when evaluated.
    #[must_use]
    pub fn objectives(&self) -> Option<&[Vec<f64>]> {
        self.objectives.as_deref()
    }

    /// Constraint violations, when evaluated.
    #[must_use]
    pub fn violations(&self) -> Option<&[f64]> {
        self.violations.as_deref()
    }

    /// Fitness vector, when scaled.
    #[must_use]
    pub fn fitness(&self) -> Option<&[f64]> {
        self.fitness.as_deref()
    }

    /// Whether objective and violation arrays are present.
    #[must_use]
    pub fn is_evaluated(&self) -> bool {
        self.objectives.is_some() && self.violations.is_some()
    }

    /// Returns a snapshot of one individual.
    #[must_use]
    pub fn individual(&self, index: usize) -> Option<Individual> {
        let phenotype = self.phenotype.get(index)?.clone();
        Some(Individual {
            chromosomes: self.blocks.iter().map(|rows| rows[index].clone()).collect(),
            phenotype,
            objectives: self.objectives.as_ref().map(|values| values[index].clone()),
            violation: self.violations.as_ref().map(|values| values[index]),
            fitness: self.fitness.as_ref().map(|values| values[index]),
        })
    }

    /// Index of the highest fitness; ties resolve to the lowest index.
    #[must_use]
    pub fn best_index(&self) -> Option<usize> {
        let fitness = self.fitness.as_ref()?;
        let mut best: Option<usize> = None;
        for (idx, value) in fitness.iter().enumerate() {
            match best {
                Some(current) if *value <= fitness[current] => {}
                _ => best = Some(idx),
            }
        }
        best
    }

    /// Returns the rows at `indices`, in order and with repetition, across
    /// every block and derived array.
    ///
    /// # Panics
    /// Panics when an index is out of range.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        let pick = |values: &Vec<f64>| -> Vec<f64> { indices.iter().map(|&idx| values[idx]).collect() };
        Self {
            layout: Arc::clone(&self.layout),
            blocks: self
                .blocks
                .iter()
                .map(|rows| indices.iter().map(|&idx| rows[idx].clone()).collect())
                .collect(),
            phenotype: indices
                .iter()
                .map(|&idx| self.phenotype[idx].clone())
                .collect(),
            objectives: self
                .objectives
                .as_ref()
                .map(|values| indices.iter().map(|&idx| values[idx].clone()).collect()),
            violations: self.violations.as_ref().map(pick),
            fitness: self.fitness.as_ref().map(pick),
        }
    }

    /// Keeps only the first `len` individuals.
    #[must_use]
    pub fn truncated(mut self, len: usize) -> Self {
        self.blocks.iter_mut().for_each(|rows| rows.truncate(len));
        self.phenotype.truncate(len);
        if let Some(values) = self.objectives.as_mut() {
            values.truncate(len);
        }
        if let Some(values) = self.violations.as_mut() {
            values.truncate(len);
        }
        if let Some(values) = self.fitness.as_mut() {
            values.truncate(len);
        }
        self
    }

    /// Appends the rows of `other` after the rows of `self`.
    ///
    /// A derived array survives only when both operands carry it.
    ///
    /// # Examples
    /// ```
    /// use jeans_psy::{Encoding, Population, PopulationLayout, VariableBounds};
    /// use rand::SeedableRng;
    /// use std::sync::Arc;
    ///
    /// let layout = Arc::new(
    ///     PopulationLayout::split(&[VariableBounds::real(0.0, 1.0)], &[(Encoding::RealInteger, 1)])
    ///         .unwrap(),
    /// );
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(9);
    /// let head = Population::random(Arc::clone(&layout), 1, &mut rng);
    /// let tail = Population::random(layout, 4, &mut rng);
    /// let joined = head.concat(&tail).unwrap();
    /// assert_eq!(joined.len(), 5);
    /// assert_eq!(joined.phenotype()[0], head.phenotype()[0]);
    /// ```
    ///
    /// # Errors
    /// Returns [`LayoutError::IncompatibleLayouts`] when the block structures
    /// differ.
    pub fn concat(&self, other: &Self) -> Result<Self, LayoutError> {
        if !Arc::ptr_eq(&self.layout, &other.layout) && self.layout != other.layout {
            return Err(LayoutError::IncompatibleLayouts);
        }
        let join = |lhs: &Option<Vec<f64>>, rhs: &Option<Vec<f64>>| -> Option<Vec<f64>> {
            match (lhs, rhs) {
                (Some(lhs), Some(rhs)) => Some(lhs.iter().chain(rhs).copied().collect()),
                _ => None,
            }
        };
        let objectives: Option<Vec<Vec<f64>>> = match (&self.objectives, &other.objectives) {
            (Some(lhs), Some(rhs)) => Some(lhs.iter().chain(rhs).cloned().collect()),
            _ => None,
        };
        Ok(Self {
            layout: Arc::clone(&self.layout),
            blocks: self
                .blocks
                .iter()
                .zip(&other.blocks)
                .map(|(lhs, rhs)| lhs.iter().chain(rhs).cloned().collect())
                .collect(),
            phenotype: self
                .phenotype
                .iter()
                .chain(&other.phenotype)
                .cloned()
                .collect(),
            objectives,
            violations: join(&self.violations, &other.violations),
            fitness: join(&self.fitness, &other.fitness),
        })
    }

    /// Root-mean-square spread of the phenotype around its centroid.
    #[must_use]
    pub fn diversity(&self) -> f64 {
        population_diversity_by(self.len(), |idx| self.phenotype[idx].as_slice())
    }
}

fn decode_all(layout: &PopulationLayout, blocks: &[Vec<Chromosome>], size: usize) -> Vec<Vec<f64>> {
    (0..size)
        .map(|row| {
            layout
                .blocks()
                .iter()
                .zip(blocks)
                .flat_map(|(field, rows)| field.decode(rows[row].genes()))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Encoding, VariableBounds};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mixed_layout() -> Arc<PopulationLayout> {
        let mut variables = vec![VariableBounds::integer(0.0, 4.0); 5];
        variables.extend(vec![VariableBounds::real(-1.0, 1.0); 2]);
        Arc::new(
            PopulationLayout::split(
                &variables,
                &[(Encoding::Permutation, 5), (Encoding::RealInteger, 2)],
            )
            .unwrap(),
        )
    }

    fn evaluated(size: usize, rng: &mut StdRng) -> Population {
        let mut population = Population::random(mixed_layout(), size, rng);
        let objectives = (0..size).map(|idx| vec![idx as f64]).collect();
        population.set_evaluation(objectives, vec![0.0; size]).unwrap();
        population
            .set_fitness((0..size).map(|idx| idx as f64).collect())
            .unwrap();
        population
    }

    #[test]
    fn phenotype_concatenates_blocks_in_order() {
        let mut rng = StdRng::seed_from_u64(2);
        let population = Population::random(mixed_layout(), 4, &mut rng);
        for (row, phenotype) in population.phenotype().iter().enumerate() {
            assert_eq!(phenotype.len(), 7);
            assert_eq!(&phenotype[..5], population.blocks()[0][row].genes());
            assert_eq!(&phenotype[5..], population.blocks()[1][row].genes());
        }
    }

    #[test]
    fn select_repeats_rows_across_every_array() {
        let mut rng = StdRng::seed_from_u64(3);
        let population = evaluated(4, &mut rng);
        let picked = population.select(&[3, 3, 0]);
        assert_eq!(picked.len(), 3);
        assert_eq!(picked.fitness().unwrap(), &[3.0, 3.0, 0.0]);
        assert_eq!(picked.objectives().unwrap()[1], vec![3.0]);
        assert_eq!(picked.blocks()[0][0], population.blocks()[0][3]);
        assert_eq!(picked.phenotype()[2], population.phenotype()[0]);
    }

    #[test]
    fn concat_keeps_derived_arrays_only_when_both_have_them() {
        let mut rng = StdRng::seed_from_u64(4);
        let evaluated_rows = evaluated(2, &mut rng);
        let fresh = Population::random(mixed_layout(), 3, &mut rng);
        let both = evaluated_rows.concat(&evaluated_rows).unwrap();
        assert_eq!(both.len(), 4);
        assert!(both.is_evaluated());
        let mixed = evaluated_rows.concat(&fresh).unwrap();
        assert_eq!(mixed.len(), 5);
        assert!(!mixed.is_evaluated());
        assert!(mixed.fitness().is_none());
    }

    #[test]
    fn concat_rejects_foreign_layouts() {
        let mut rng = StdRng::seed_from_u64(5);
        let other_layout = Arc::new(
            PopulationLayout::split(&[VariableBounds::real(0.0, 1.0)], &[(Encoding::RealInteger, 1)])
                .unwrap(),
        );
        let lhs = Population::random(mixed_layout(), 2, &mut rng);
        let rhs = Population::random(other_layout, 2, &mut rng);
        assert_eq!(lhs.concat(&rhs).unwrap_err(), LayoutError::IncompatibleLayouts);
    }

    #[test]
    fn best_index_prefers_first_of_ties() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut population = evaluated(4, &mut rng);
        population.set_fitness(vec![1.0, 5.0, 5.0, 2.0]).unwrap();
        assert_eq!(population.best_index(), Some(1));
    }

    #[test]
    fn from_blocks_rejects_ragged_rows() {
        let layout = mixed_layout();
        let blocks = vec![
            vec![Chromosome::new(vec![0.0, 1.0, 2.0, 3.0, 4.0])],
            vec![Chromosome::new(vec![0.0])],
        ];
        let err = Population::from_blocks(layout, blocks).unwrap_err();
        assert!(matches!(err, LayoutError::MalformedBlock { block: 1, .. }));
    }

    #[test]
    fn truncated_drops_trailing_rows() {
        let mut rng = StdRng::seed_from_u64(7);
        let population = evaluated(5, &mut rng).truncated(2);
        assert_eq!(population.len(), 2);
        assert_eq!(population.blocks()[1].len(), 2);
        assert_eq!(population.violations().unwrap().len(), 2);
    }
}
