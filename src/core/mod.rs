//! Core genetic algorithm primitives.
//!
//! This module provides the genome model driven by the
//! [`PolysomyGa`](crate::PolysomyGa) engine: single rows of genes
//! ([`Chromosome`]), per-variable domains ([`VariableBounds`]), per-block
//! encodings and decoding metadata ([`field`]), and the population snapshot
//! with its row algebra ([`population`]).

pub mod experiment;
pub mod field;
pub mod population;

use rand::distributions::{Distribution, Uniform};
use rand::Rng;

pub use field::{BitCoding, Encoding, FieldDescriptor, LayoutError, PopulationLayout};
pub use population::{Individual, Population};

/// Scalar type used to represent a single gene value.
///
/// Permutation genes hold integral values, binary genes hold `0.0` or `1.0`,
/// and real-interval genes hold the decision value directly.
///
/// # Examples
/// ```
/// use jeans_psy::Gene;
/// let gene: Gene = 1.0;
/// assert_eq!(gene, 1.0);
/// ```
pub type Gene = f64;

/// One row of genes belonging to a single individual within one block.
///
/// # Examples
/// ```
/// use jeans_psy::Chromosome;
/// let chromosome = Chromosome::new(vec![0.0, 1.0]);
/// assert_eq!(chromosome.len(), 2);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Chromosome {
    genes: Vec<Gene>,
}

impl Chromosome {
    /// Creates a chromosome from raw genes.
    #[must_use]
    pub fn new(genes: Vec<Gene>) -> Self {
        Self { genes }
    }

    /// Returns the number of genes stored in the chromosome.
    ///
    /// # Examples
    /// ```
    /// use jeans_psy::Chromosome;
    /// let chromosome = Chromosome::new(vec![0.0, 1.0, 2.0]);
    /// assert_eq!(chromosome.len(), 3);
    /// ```
    #[must_use]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Indicates whether the chromosome has zero genes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Returns a shared slice with all genes.
    ///
    /// # Examples
    /// ```
    /// use jeans_psy::Chromosome;
    /// let chromosome = Chromosome::new(vec![0.25, 0.5]);
    /// assert_eq!(chromosome.genes(), &[0.25, 0.5]);
    /// ```
    #[must_use]
    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    /// Returns a mutable slice with all genes.
    pub fn genes_mut(&mut self) -> &mut [Gene] {
        &mut self.genes
    }

    /// Consumes the chromosome and returns its genes.
    #[must_use]
    pub fn into_genes(self) -> Vec<Gene> {
        self.genes
    }

    /// Returns an iterator over the genes.
    pub fn iter(&self) -> impl Iterator<Item = &Gene> {
        self.genes.iter()
    }

    /// Generates a random real-interval chromosome, one gene per variable.
    ///
    /// # Examples
    /// ```
    /// use jeans_psy::{Chromosome, VariableBounds};
    /// use rand::SeedableRng;
    ///
    /// let bounds = [VariableBounds::real(-1.0, 1.0), VariableBounds::integer(0.0, 5.0)];
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(3);
    /// let chromosome = Chromosome::random_within(&bounds, &mut rng);
    /// assert_eq!(chromosome.len(), 2);
    /// assert!(bounds[1].contains(chromosome.genes()[1]));
    /// ```
    pub fn random_within<R: Rng + ?Sized>(bounds: &[VariableBounds], rng: &mut R) -> Self {
        Self {
            genes: bounds.iter().map(|variable| variable.sample(rng)).collect(),
        }
    }
}

impl From<Vec<Gene>> for Chromosome {
    fn from(genes: Vec<Gene>) -> Self {
        Self::new(genes)
    }
}

/// Whether a decision variable is continuous or integral.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableKind {
    /// Any real value within the bounds.
    #[default]
    Real,
    /// Integral values within the bounds.
    Integer,
}

/// Domain of a single decision variable.
///
/// Bounds may individually exclude their end point. The admissible values are
/// summarised by [`VariableBounds::admissible_range`].
///
/// # Examples
/// ```
/// use jeans_psy::VariableBounds;
/// let variable = VariableBounds::real(0.0, 1.0).with_inclusion(true, false);
/// assert!(variable.contains(0.0));
/// assert!(!variable.contains(1.0));
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableBounds {
    /// Lower end of the domain.
    pub lower: f64,
    /// Upper end of the domain.
    pub upper: f64,
    /// Whether `lower` itself is admissible.
    pub lower_inclusive: bool,
    /// Whether `upper` itself is admissible.
    pub upper_inclusive: bool,
    /// Continuous or integral variable.
    pub kind: VariableKind,
}

impl VariableBounds {
    /// Creates a continuous variable on the closed interval `[lower, upper]`.
    #[must_use]
    pub fn real(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper,
            lower_inclusive: true,
            upper_inclusive: true,
            kind: VariableKind::Real,
        }
    }

    /// Creates an integral variable on the closed interval `[lower, upper]`.
    #[must_use]
    pub fn integer(lower: f64, upper: f64) -> Self {
        Self {
            kind: VariableKind::Integer,
            ..Self::real(lower, upper)
        }
    }

    /// Overrides the boundary inclusion flags.
    #[must_use]
    pub fn with_inclusion(mut self, lower_inclusive: bool, upper_inclusive: bool) -> Self {
        self.lower_inclusive = lower_inclusive;
        self.upper_inclusive = upper_inclusive;
        self
    }

    /// Returns the smallest and largest admissible values.
    ///
    /// For integral variables these are the extreme integers inside the
    /// domain, for continuous variables an excluded bound is replaced by its
    /// nearest representable neighbour inside the domain.
    ///
    /// # Examples
    /// ```
    /// use jeans_psy::VariableBounds;
    /// let variable = VariableBounds::integer(0.5, 4.0).with_inclusion(true, false);
    /// assert_eq!(variable.admissible_range(), (1.0, 3.0));
    /// ```
    #[must_use]
    pub fn admissible_range(&self) -> (f64, f64) {
        match self.kind {
            VariableKind::Real => {
                let low = if self.lower_inclusive {
                    self.lower
                } else {
                    next_up(self.lower)
                };
                let high = if self.upper_inclusive {
                    self.upper
                } else {
                    next_down(self.upper)
                };
                (low, high)
            }
            VariableKind::Integer => {
                let low = if self.lower_inclusive {
                    self.lower.ceil()
                } else {
                    self.lower.floor() + 1.0
                };
                let high = if self.upper_inclusive {
                    self.upper.floor()
                } else {
                    self.upper.ceil() - 1.0
                };
                (low, high)
            }
        }
    }

    /// Checks that the domain is finite and non-empty.
    ///
    /// # Errors
    /// Returns [`BoundsError::NonFinite`] for infinite or `NaN` bounds and
    /// [`BoundsError::InvalidRange`] when no admissible value exists.
    pub fn validate(&self, dimension: usize) -> Result<(), BoundsError> {
        if !(self.lower.is_finite() && self.upper.is_finite()) {
            return Err(BoundsError::NonFinite { dimension });
        }
        let (low, high) = self.admissible_range();
        if low > high {
            return Err(BoundsError::InvalidRange {
                dimension,
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(())
    }

    /// Returns whether `value` is admissible for this variable.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        let (low, high) = self.admissible_range();
        let integral = match self.kind {
            VariableKind::Real => true,
            VariableKind::Integer => value.fract() == 0.0,
        };
        integral && value >= low && value <= high
    }

    /// Moves `value` onto the nearest admissible value.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        let (low, high) = self.admissible_range();
        let value = match self.kind {
            VariableKind::Real => value,
            VariableKind::Integer => value.round(),
        };
        value.max(low).min(high)
    }

    /// Mirrors an overshooting value back across the violated bound, then
    /// clamps whatever still lies outside.
    ///
    /// # Examples
    /// ```
    /// use jeans_psy::VariableBounds;
    /// let variable = VariableBounds::real(0.0, 1.0);
    /// assert!((variable.reflect(1.25) - 0.75).abs() < 1e-12);
    /// assert_eq!(variable.reflect(-5.0), 1.0);
    /// ```
    #[must_use]
    pub fn reflect(&self, value: f64) -> f64 {
        let (low, high) = self.admissible_range();
        let mirrored = if value < low {
            low + (low - value)
        } else if value > high {
            high - (value - high)
        } else {
            value
        };
        self.clamp(mirrored)
    }

    /// Draws a uniformly distributed admissible value.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let (low, high) = self.admissible_range();
        match self.kind {
            VariableKind::Real => {
                let sampler = Uniform::new_inclusive(low, high);
                self.clamp(sampler.sample(rng))
            }
            VariableKind::Integer => {
                #[allow(clippy::cast_possible_truncation)]
                let sampler = Uniform::new_inclusive(low as i64, high as i64);
                #[allow(clippy::cast_precision_loss)]
                {
                    sampler.sample(rng) as f64
                }
            }
        }
    }
}

/// Error returned when invalid bounds are provided.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoundsError {
    /// The number of provided bounds entries does not match the expected
    /// dimensionality.
    #[error("dimension mismatch: expected {expected} bounds entries but found {found}")]
    DimensionMismatch {
        /// Number of dimensions specified by the caller.
        expected: usize,
        /// Number of bounds entries actually provided.
        found: usize,
    },
    /// One of the dimensions has no admissible value.
    #[error("invalid bounds for dimension {dimension} (lower: {lower}, upper: {upper})")]
    InvalidRange {
        /// The index of the problematic dimension.
        dimension: usize,
        /// The invalid lower bound value.
        lower: Gene,
        /// The invalid upper bound value.
        upper: Gene,
    },
    /// One of the bounds is infinite or `NaN`.
    #[error("bounds for dimension {dimension} must be finite")]
    NonFinite {
        /// The index of the problematic dimension.
        dimension: usize,
    },
}

/// Validates every variable of a domain description.
///
/// # Errors
/// Returns the first [`BoundsError`] reported by [`VariableBounds::validate`].
pub fn validate_bounds(variables: &[VariableBounds]) -> Result<(), BoundsError> {
    variables
        .iter()
        .enumerate()
        .try_for_each(|(dimension, variable)| variable.validate(dimension))
}

/// Smallest representable value strictly greater than `value`.
pub(crate) fn next_up(value: f64) -> f64 {
    if value.is_nan() || value == f64::INFINITY {
        return value;
    }
    if value == 0.0 {
        return f64::from_bits(1);
    }
    let bits = value.to_bits();
    if value > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

/// Largest representable value strictly smaller than `value`.
pub(crate) fn next_down(value: f64) -> f64 {
    -next_up(-value)
}
