//! Run statistics and the result record handed back after a run.
//!
//! These types capture what the termination controller observes each
//! generation and provide a consistent payload for downstream analysis or
//! plotting. They are optionally serializable through the `serde` feature.

use crate::termination::StopReason;
use std::time::Duration;

/// How an external renderer should present the run.
///
/// The engine itself draws nothing; the mode is carried through to the
/// [`RunReport`] so the caller's plotting code can act on it.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawingMode {
    /// No plotting.
    #[default]
    None,
    /// Plot once after the run finished.
    Final,
    /// Plot after every generation.
    Animated,
}

/// Statistics of one population, handed to the output hook once per
/// generation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationStats {
    /// Generation index; the initial population is generation 0.
    pub generation: usize,
    /// Objective evaluations performed so far.
    pub evaluations: usize,
    /// Wall-clock time since the run started.
    pub elapsed: Duration,
    /// Raw objectives of the best feasible individual of this population.
    pub best_objectives: Option<Vec<f64>>,
    /// Mean sign-adjusted aggregate objective over feasible individuals.
    pub mean_objective: Option<f64>,
    /// Largest fitness value in the population.
    pub max_fitness: f64,
    /// Number of feasible individuals.
    pub feasible: usize,
    /// Root-mean-square phenotype spread.
    pub diversity: f64,
}

/// Time-series metrics captured during a run.
///
/// # Examples
/// ```
/// use jeans_psy::Trace;
/// let trace = Trace::new();
/// assert_eq!(trace.records(), 0);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    /// Generation index of each record.
    pub generation: Vec<usize>,
    /// Evaluations performed when each record was taken.
    pub evaluations: Vec<usize>,
    /// Best-so-far sign-adjusted aggregate objective, `NaN` while infeasible.
    pub best_objective: Vec<f64>,
    /// Mean feasible sign-adjusted aggregate objective, `NaN` while infeasible.
    pub mean_objective: Vec<f64>,
    /// Phenotype diversity per record.
    pub diversity: Vec<f64>,
}

impl Trace {
    /// Creates an empty trace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in the trace.
    #[must_use]
    pub fn records(&self) -> usize {
        self.generation.len()
    }

    pub(crate) fn push(&mut self, stats: &GenerationStats, best_so_far: Option<f64>) {
        self.generation.push(stats.generation);
        self.evaluations.push(stats.evaluations);
        self.best_objective.push(best_so_far.unwrap_or(f64::NAN));
        self.mean_objective
            .push(stats.mean_objective.unwrap_or(f64::NAN));
        self.diversity.push(stats.diversity);
    }
}

/// Best feasible solution recorded during a run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BestRecord {
    /// Raw objective values.
    pub objectives: Vec<f64>,
    /// Decoded decision vector.
    pub decision: Vec<f64>,
    /// Generation in which the solution was first observed.
    pub generation: usize,
}

/// Complete result record returned alongside the final population.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Best feasible solution found, if any individual was ever feasible.
    pub best: Option<BestRecord>,
    /// Why the run stopped.
    pub reason: StopReason,
    /// Completed generations.
    pub generations: usize,
    /// Objective evaluations performed.
    pub evaluations: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
    /// Every improvement of the best-so-far solution, oldest first.
    pub archive: Vec<BestRecord>,
    /// Periodic statistics, when logging was enabled.
    pub trace: Trace,
    /// Requested presentation of the run.
    pub drawing: DrawingMode,
}

pub(crate) fn population_diversity_by<'a, F>(size: usize, mut at: F) -> f64
where
    F: FnMut(usize) -> &'a [f64],
{
    if size == 0 {
        return 0.0;
    }
    let dimensions = at(0).len();
    if dimensions == 0 {
        return 0.0;
    }
    let mut means = vec![0.0; dimensions];
    #[allow(clippy::cast_precision_loss)]
    let population_size = size as f64;
    for idx in 0..size {
        for (dimension, value) in at(idx).iter().enumerate() {
            means[dimension] += *value;
        }
    }
    for mean in &mut means {
        *mean /= population_size;
    }
    let mut total_variance = 0.0;
    for idx in 0..size {
        for (dimension, value) in at(idx).iter().enumerate() {
            let diff = value - means[dimension];
            total_variance += (diff * diff) / population_size;
        }
    }
    #[allow(clippy::cast_precision_loss)]
    {
        (total_variance / dimensions as f64).sqrt()
    }
}
