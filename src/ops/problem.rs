//! Problem abstractions consumed by the engine.

use crate::core::{validate_bounds, BoundsError, VariableBounds};
use std::sync::Arc;

/// Convenience alias used by the problem traits.
pub type ProblemResult<T> = Result<T, ProblemError>;

/// Errors produced when a problem and its evaluations disagree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProblemError {
    /// The candidate contains the wrong number of decision variables.
    #[error("candidate has {found} decision variables but problem expects {expected}")]
    DimensionMismatch {
        /// Number of variables expected by the problem.
        expected: usize,
        /// Number of variables provided by the candidate solution.
        found: usize,
    },
    /// The variable domains do not align with the expected dimensionality.
    #[error("problem declares {expected} dimensions but describes {found} variable domains")]
    BoundsLengthMismatch {
        /// Dimensionality reported by the problem.
        expected: usize,
        /// Number of variable domains.
        found: usize,
    },
    /// The evaluation returned a different number of rows than requested.
    #[error("evaluation returned {found} rows for {expected} candidates")]
    RowCountMismatch {
        /// Number of evaluated candidates.
        expected: usize,
        /// Number of returned objective rows.
        found: usize,
    },
    /// An objective row has the wrong number of entries.
    #[error("objective row {row} holds {found} values but the problem has {expected} objectives")]
    ObjectiveCountMismatch {
        /// Offending row.
        row: usize,
        /// Number of objectives declared by the problem.
        expected: usize,
        /// Number of values in the row.
        found: usize,
    },
    /// The violation vector does not cover every candidate.
    #[error("violation vector holds {found} values for {expected} candidates")]
    ViolationCountMismatch {
        /// Number of evaluated candidates.
        expected: usize,
        /// Length of the violation vector.
        found: usize,
    },
    /// An objective or violation value was `NaN` or infinite.
    #[error("evaluation of row {row} produced a non-finite value")]
    NonFinite {
        /// Offending row.
        row: usize,
        /// Offending objective, `None` for the violation value.
        column: Option<usize>,
    },
    /// Problem-specific failure reported by user code.
    #[error("{0}")]
    Domain(String),
    /// A variable domain is malformed.
    #[error(transparent)]
    Bounds(#[from] BoundsError),
}

/// Optimization direction of one objective.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sense {
    /// Smaller values are better.
    #[default]
    Minimize,
    /// Larger values are better.
    Maximize,
}

impl Sense {
    /// Factor turning a raw objective into a minimized one.
    #[must_use]
    pub fn factor(self) -> f64 {
        match self {
            Self::Minimize => 1.0,
            Self::Maximize => -1.0,
        }
    }
}

/// Objective and constraint values of a batch of candidates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Evaluation {
    /// One objective row per candidate.
    pub objectives: Vec<Vec<f64>>,
    /// Aggregate constraint violation per candidate; `None` means feasible.
    pub violations: Option<Vec<f64>>,
}

impl Evaluation {
    /// Unconstrained evaluation.
    #[must_use]
    pub fn new(objectives: Vec<Vec<f64>>) -> Self {
        Self {
            objectives,
            violations: None,
        }
    }

    /// Constrained evaluation; positive violations mark infeasibility.
    #[must_use]
    pub fn with_violations(objectives: Vec<Vec<f64>>, violations: Vec<f64>) -> Self {
        Self {
            objectives,
            violations: Some(violations),
        }
    }

    /// Unconstrained single-objective evaluation.
    #[must_use]
    pub fn single(values: Vec<f64>) -> Self {
        Self::new(values.into_iter().map(|value| vec![value]).collect())
    }
}

/// Domain metadata of a problem.
pub trait ProblemBounds {
    /// Returns the number of decision variables handled by the problem.
    fn dimensions(&self) -> usize;

    /// Domain of every decision variable, in phenotype order.
    fn variables(&self) -> &[VariableBounds];

    /// Number of objectives.
    fn objectives(&self) -> usize {
        1
    }

    /// Optimization direction per objective.
    fn senses(&self) -> Vec<Sense> {
        vec![Sense::Minimize; self.objectives()]
    }

    /// Ensures the variable domains match the reported dimensionality.
    ///
    /// # Errors
    /// Returns [`ProblemError::BoundsLengthMismatch`] or
    /// [`ProblemError::Bounds`] for malformed domains.
    fn validate_bounds(&self) -> ProblemResult<()> {
        let expected = self.dimensions();
        let found = self.variables().len();
        if expected != found {
            return Err(ProblemError::BoundsLengthMismatch { expected, found });
        }
        validate_bounds(self.variables())?;
        Ok(())
    }

    /// Ensures that a candidate with the provided length is valid for the problem.
    ///
    /// # Errors
    /// Returns [`ProblemError::DimensionMismatch`] when the candidate contains
    /// the wrong number of decision variables.
    fn validate_candidate_length(&self, candidate_len: usize) -> ProblemResult<()> {
        let expected = self.dimensions();
        if candidate_len != expected {
            return Err(ProblemError::DimensionMismatch {
                expected,
                found: candidate_len,
            });
        }
        Ok(())
    }
}

impl<T: ProblemBounds + ?Sized> ProblemBounds for &T {
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn variables(&self) -> &[VariableBounds] {
        (**self).variables()
    }

    fn objectives(&self) -> usize {
        (**self).objectives()
    }

    fn senses(&self) -> Vec<Sense> {
        (**self).senses()
    }
}

impl<T: ProblemBounds + ?Sized> ProblemBounds for &mut T {
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn variables(&self) -> &[VariableBounds] {
        (**self).variables()
    }

    fn objectives(&self) -> usize {
        (**self).objectives()
    }

    fn senses(&self) -> Vec<Sense> {
        (**self).senses()
    }
}

impl<T: ProblemBounds + ?Sized> ProblemBounds for Box<T> {
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn variables(&self) -> &[VariableBounds] {
        (**self).variables()
    }

    fn objectives(&self) -> usize {
        (**self).objectives()
    }

    fn senses(&self) -> Vec<Sense> {
        (**self).senses()
    }
}

impl<T: ProblemBounds + ?Sized> ProblemBounds for Arc<T> {
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn variables(&self) -> &[VariableBounds] {
        (**self).variables()
    }

    fn objectives(&self) -> usize {
        (**self).objectives()
    }

    fn senses(&self) -> Vec<Sense> {
        (**self).senses()
    }
}

/// Optimization problem evaluated in batches of decoded decision vectors.
///
/// # Examples
/// ```
/// use jeans_psy::ops::{Evaluation, Problem, ProblemBounds, ProblemResult};
/// use jeans_psy::VariableBounds;
///
/// struct Sphere {
///     variables: Vec<VariableBounds>,
/// }
///
/// impl ProblemBounds for Sphere {
///     fn dimensions(&self) -> usize { self.variables.len() }
///     fn variables(&self) -> &[VariableBounds] { &self.variables }
/// }
///
/// impl Problem for Sphere {
///     fn evaluate(&mut self, decisions: &[Vec<f64>]) -> ProblemResult<Evaluation> {
///         Ok(Evaluation::single(
///             decisions.iter().map(|row| row.iter().map(|value| value * value).sum()).collect(),
///         ))
///     }
/// }
///
/// let mut problem = Sphere { variables: vec![VariableBounds::real(-5.0, 5.0); 2] };
/// let evaluation = problem.evaluate_checked(&[vec![1.0, 2.0]]).unwrap();
/// assert_eq!(evaluation.objectives, vec![vec![5.0]]);
/// ```
pub trait Problem: ProblemBounds {
    /// Evaluates every decision vector of the batch.
    ///
    /// # Errors
    /// Implementations may return [`ProblemError`] to describe domain issues.
    fn evaluate(&mut self, decisions: &[Vec<f64>]) -> ProblemResult<Evaluation>;

    /// Evaluates the batch and checks the result's shape.
    ///
    /// Every row must hold [`ProblemBounds::objectives`] finite values and
    /// the violation vector, when present, must cover every candidate.
    /// Negative violations are treated as zero.
    ///
    /// # Errors
    /// Propagates errors from [`Problem::evaluate`] and reports shape or
    /// finiteness problems of its result.
    fn evaluate_checked(&mut self, decisions: &[Vec<f64>]) -> ProblemResult<Evaluation> {
        for row in decisions {
            self.validate_candidate_length(row.len())?;
        }
        let mut evaluation = self.evaluate(decisions)?;
        let expected = decisions.len();
        if evaluation.objectives.len() != expected {
            return Err(ProblemError::RowCountMismatch {
                expected,
                found: evaluation.objectives.len(),
            });
        }
        let objectives = self.objectives();
        for (row, values) in evaluation.objectives.iter().enumerate() {
            if values.len() != objectives {
                return Err(ProblemError::ObjectiveCountMismatch {
                    row,
                    expected: objectives,
                    found: values.len(),
                });
            }
            if let Some(column) = values.iter().position(|value| !value.is_finite()) {
                return Err(ProblemError::NonFinite {
                    row,
                    column: Some(column),
                });
            }
        }
        if let Some(violations) = evaluation.violations.as_mut() {
            if violations.len() != expected {
                return Err(ProblemError::ViolationCountMismatch {
                    expected,
                    found: violations.len(),
                });
            }
            for (row, value) in violations.iter_mut().enumerate() {
                if !value.is_finite() {
                    return Err(ProblemError::NonFinite { row, column: None });
                }
                *value = value.max(0.0);
            }
        }
        Ok(evaluation)
    }
}

impl<T: Problem + ?Sized> Problem for &mut T {
    fn evaluate(&mut self, decisions: &[Vec<f64>]) -> ProblemResult<Evaluation> {
        (**self).evaluate(decisions)
    }
}

impl<T: Problem + ?Sized> Problem for Box<T> {
    fn evaluate(&mut self, decisions: &[Vec<f64>]) -> ProblemResult<Evaluation> {
        (**self).evaluate(decisions)
    }
}
