//! Run bookkeeping and the stop decision.
//!
//! The [`TerminationController`] is queried once per generation. It computes
//! population statistics, tracks the best feasible solution seen so far,
//! records the trace and archive, forwards statistics to the output hook and
//! finally decides whether the loop continues.

use crate::core::experiment::{BestRecord, DrawingMode, GenerationStats, RunReport, Trace};
use crate::core::Population;
use crate::ops::scaling::signed_sum;
use crate::ops::Sense;
use std::fmt::{self, Display, Formatter};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Default tolerance of the stagnation check.
pub const DEFAULT_TRAPPED_TOLERANCE: f64 = 1e-6;

/// Why a run stopped.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The generation limit was reached.
    MaxGenerations,
    /// The wall-clock budget was exhausted.
    MaxTime,
    /// The evaluation budget was exhausted.
    MaxEvaluations,
    /// The result archive is full.
    MaxArchiveSize,
    /// The best value stagnated for too many consecutive generations.
    Trapped,
}

impl Display for StopReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MaxGenerations => "max-generations",
            Self::MaxTime => "max-time",
            Self::MaxEvaluations => "max-evaluations",
            Self::MaxArchiveSize => "max-archive-size",
            Self::Trapped => "trapped",
        })
    }
}

/// Controller state after a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Keep evolving.
    Running,
    /// Leave the loop.
    Stopped(StopReason),
}

/// Budget and stagnation limits. `None` means unbounded.
///
/// # Examples
/// ```
/// use jeans_psy::Limits;
/// let limits = Limits::max_generations(25);
/// assert!(limits.is_bounded());
/// assert!(!Limits::default().is_bounded());
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Limits {
    /// Number of generations to evolve.
    pub max_generations: Option<usize>,
    /// Wall-clock budget.
    pub max_time: Option<Duration>,
    /// Objective evaluation budget, counting every evaluated individual.
    pub max_evaluations: Option<usize>,
    /// Largest number of best-so-far improvements to archive.
    pub max_archive_size: Option<usize>,
    /// Changes of the best value below this tolerance count as stagnation.
    /// Must be positive and finite.
    pub trapped_tolerance: f64,
    /// Consecutive stagnating generations that stop the run.
    pub max_trapped_count: Option<usize>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_generations: None,
            max_time: None,
            max_evaluations: None,
            max_archive_size: None,
            trapped_tolerance: DEFAULT_TRAPPED_TOLERANCE,
            max_trapped_count: None,
        }
    }
}

impl Limits {
    /// Limits bounded by a generation count only.
    #[must_use]
    pub fn max_generations(generations: usize) -> Self {
        Self {
            max_generations: Some(generations),
            ..Self::default()
        }
    }

    /// Whether at least one limit can end the run.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.max_generations.is_some()
            || self.max_time.is_some()
            || self.max_evaluations.is_some()
            || self.max_archive_size.is_some()
            || self.max_trapped_count.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Watermark {
    Objective(f64),
    Violation(f64),
}

/// Per-run termination state: counters, best-so-far record, trace and archive.
#[derive(Debug)]
pub struct TerminationController {
    limits: Limits,
    senses: Vec<Sense>,
    log_interval: usize,
    verbose: bool,
    started: Instant,
    generation: usize,
    evaluations: usize,
    best: Option<(f64, BestRecord)>,
    archive: Vec<BestRecord>,
    trace: Trace,
    watermark: Option<Watermark>,
    trapped_count: usize,
}

impl TerminationController {
    /// Creates a controller; the wall clock starts now.
    #[must_use]
    pub fn new(limits: Limits, senses: Vec<Sense>, log_interval: usize, verbose: bool) -> Self {
        Self {
            limits,
            senses,
            log_interval,
            verbose,
            started: Instant::now(),
            generation: 0,
            evaluations: 0,
            best: None,
            archive: Vec::new(),
            trace: Trace::new(),
            watermark: None,
            trapped_count: 0,
        }
    }

    /// Adds `count` individual evaluations to the budget.
    pub fn record_evaluations(&mut self, count: usize) {
        self.evaluations = self.evaluations.saturating_add(count);
    }

    /// Current generation index.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Evaluations recorded so far.
    #[must_use]
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Time since the controller was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Largest used fraction among the generation, time and evaluation
    /// budgets, within `[0, 1]`. Zero when none of them is set.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        let mut fractions = Vec::with_capacity(3);
        if let Some(limit) = self.limits.max_generations {
            fractions.push(ratio(self.generation as f64, limit as f64));
        }
        if let Some(limit) = self.limits.max_time {
            fractions.push(ratio(self.elapsed().as_secs_f64(), limit.as_secs_f64()));
        }
        if let Some(limit) = self.limits.max_evaluations {
            fractions.push(ratio(self.evaluations as f64, limit as f64));
        }
        fractions.into_iter().fold(0.0, f64::max).clamp(0.0, 1.0)
    }

    /// Best feasible solution seen so far.
    #[must_use]
    pub fn best(&self) -> Option<&BestRecord> {
        self.best.as_ref().map(|(_, record)| record)
    }

    /// Inspects `population`, updates the run records, calls `hook` and
    /// decides whether to continue. When the run continues the generation
    /// counter advances.
    pub fn check(
        &mut self,
        population: &Population,
        hook: &mut dyn FnMut(&GenerationStats),
    ) -> Status {
        let (stats, best_idx) = self.summarize(population);
        if let (Some(idx), Some(objectives)) = (best_idx, stats.best_objectives.as_ref()) {
            let key = signed_sum(objectives, &self.senses);
            let improved = self.best.as_ref().map_or(true, |(best, _)| key < *best);
            if improved {
                let record = BestRecord {
                    objectives: objectives.clone(),
                    decision: population.phenotype()[idx].clone(),
                    generation: self.generation,
                };
                self.archive.push(record.clone());
                self.best = Some((key, record));
            }
        }
        let logged = self.log_interval > 0 && self.generation % self.log_interval == 0;
        if logged {
            let best_so_far = self.best.as_ref().map(|(key, _)| *key);
            self.trace.push(&stats, best_so_far);
        }
        hook(&stats);
        if self.verbose && logged {
            debug!(
                generation = stats.generation,
                evaluations = stats.evaluations,
                feasible = stats.feasible,
                best = ?stats.best_objectives,
                mean = ?stats.mean_objective,
                diversity = stats.diversity,
                "generation"
            );
        }
        self.update_trapped(&stats, population);
        match self.stop_reason(stats.elapsed) {
            Some(reason) => Status::Stopped(reason),
            None => {
                self.generation += 1;
                Status::Running
            }
        }
    }

    /// Closes the run and returns its record.
    pub fn finish(self, reason: StopReason, drawing: DrawingMode) -> RunReport {
        let elapsed = self.elapsed();
        info!(
            %reason,
            generations = self.generation,
            evaluations = self.evaluations,
            elapsed = ?elapsed,
            feasible_found = self.best.is_some(),
            "run finished"
        );
        RunReport {
            best: self.best.map(|(_, record)| record),
            reason,
            generations: self.generation,
            evaluations: self.evaluations,
            elapsed,
            archive: self.archive,
            trace: self.trace,
            drawing,
        }
    }

    fn summarize(&self, population: &Population) -> (GenerationStats, Option<usize>) {
        let mut best: Option<(usize, f64)> = None;
        let mut total = 0.0;
        let mut feasible = 0_usize;
        if let Some(objectives) = population.objectives() {
            for (idx, row) in objectives.iter().enumerate() {
                let violation = population
                    .violations()
                    .and_then(|values| values.get(idx))
                    .copied()
                    .unwrap_or(0.0);
                if violation > 0.0 {
                    continue;
                }
                let key = signed_sum(row, &self.senses);
                feasible += 1;
                total += key;
                if best.map_or(true, |(_, current)| key < current) {
                    best = Some((idx, key));
                }
            }
        }
        let best_idx = best.map(|(idx, _)| idx);
        #[allow(clippy::cast_precision_loss)]
        let mean_objective = (feasible > 0).then(|| total / feasible as f64);
        let max_fitness = population
            .fitness()
            .map_or(f64::NAN, |values| values.iter().copied().fold(f64::NEG_INFINITY, f64::max));
        let stats = GenerationStats {
            generation: self.generation,
            evaluations: self.evaluations,
            elapsed: self.elapsed(),
            best_objectives: best_idx
                .and_then(|idx| population.objectives().map(|rows| rows[idx].clone())),
            mean_objective,
            max_fitness,
            feasible,
            diversity: population.diversity(),
        };
        (stats, best_idx)
    }

    fn update_trapped(&mut self, stats: &GenerationStats, population: &Population) {
        let current = match stats.best_objectives.as_ref() {
            Some(objectives) => Some(Watermark::Objective(signed_sum(objectives, &self.senses))),
            None => population
                .violations()
                .and_then(|values| values.iter().copied().reduce(f64::min))
                .map(Watermark::Violation),
        };
        let stagnated = match (self.watermark, current) {
            (Some(Watermark::Objective(last)), Some(Watermark::Objective(now)))
            | (Some(Watermark::Violation(last)), Some(Watermark::Violation(now))) => {
                (now - last).abs() < self.limits.trapped_tolerance
            }
            _ => false,
        };
        self.trapped_count = if stagnated { self.trapped_count + 1 } else { 0 };
        self.watermark = current;
    }

    fn stop_reason(&self, elapsed: Duration) -> Option<StopReason> {
        let limits = &self.limits;
        if limits.max_time.is_some_and(|limit| elapsed >= limit) {
            return Some(StopReason::MaxTime);
        }
        if limits
            .max_evaluations
            .is_some_and(|limit| self.evaluations >= limit)
        {
            return Some(StopReason::MaxEvaluations);
        }
        if limits
            .max_generations
            .is_some_and(|limit| self.generation >= limit)
        {
            return Some(StopReason::MaxGenerations);
        }
        if limits
            .max_archive_size
            .is_some_and(|limit| self.archive.len() >= limit)
        {
            return Some(StopReason::MaxArchiveSize);
        }
        if limits
            .max_trapped_count
            .is_some_and(|limit| self.trapped_count >= limit)
        {
            return Some(StopReason::Trapped);
        }
        None
    }
}

fn ratio(used: f64, limit: f64) -> f64 {
    if limit > 0.0 {
        used / limit
    } else {
        1.0
    }
}
