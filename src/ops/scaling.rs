//! Fitness scaling: raw objectives and constraint violations to one scalar
//! per individual, higher being better.
//!
//! Every operator here ranks feasible individuals strictly above infeasible
//! ones, orders feasible individuals by their sign-adjusted objectives and
//! infeasible ones by violation magnitude.

use super::Sense;
use std::cmp::Ordering;
use std::sync::Arc;

/// Maps objective rows and violations to a fitness vector.
///
/// # Examples
/// ```
/// use jeans_psy::ops::{FitnessScaling, LinearScaling, Sense};
///
/// let objectives = vec![vec![5.0], vec![1.0]];
/// let violations = [0.0, 2.0];
/// let fitness = LinearScaling.scale(&objectives, Some(&violations), &[Sense::Minimize]);
/// // The feasible individual wins despite its worse objective.
/// assert!(fitness[0] > fitness[1]);
/// ```
pub trait FitnessScaling: Send + Sync {
    /// Computes one fitness value per objective row.
    fn scale(
        &self,
        objectives: &[Vec<f64>],
        violations: Option<&[f64]>,
        senses: &[Sense],
    ) -> Vec<f64>;
}

impl<T: FitnessScaling + ?Sized> FitnessScaling for &T {
    fn scale(
        &self,
        objectives: &[Vec<f64>],
        violations: Option<&[f64]>,
        senses: &[Sense],
    ) -> Vec<f64> {
        (**self).scale(objectives, violations, senses)
    }
}

impl<T: FitnessScaling + ?Sized> FitnessScaling for Box<T> {
    fn scale(
        &self,
        objectives: &[Vec<f64>],
        violations: Option<&[f64]>,
        senses: &[Sense],
    ) -> Vec<f64> {
        (**self).scale(objectives, violations, senses)
    }
}

impl<T: FitnessScaling + ?Sized> FitnessScaling for Arc<T> {
    fn scale(
        &self,
        objectives: &[Vec<f64>],
        violations: Option<&[f64]>,
        senses: &[Sense],
    ) -> Vec<f64> {
        (**self).scale(objectives, violations, senses)
    }
}

/// Linear fitness over min-max normalized objectives.
///
/// Feasible individuals receive `1 + (s_max - s) / (s_max - s_min)` where `s`
/// sums the normalized sign-adjusted objectives, so the best gets 2 and the
/// worst 1. Infeasible individuals receive `0.5 / (1 + violation)`, which
/// stays at or below 0.5 even for violations that vanish in `1 + violation`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearScaling;

impl FitnessScaling for LinearScaling {
    fn scale(
        &self,
        objectives: &[Vec<f64>],
        violations: Option<&[f64]>,
        senses: &[Sense],
    ) -> Vec<f64> {
        let feasible = feasibility(objectives.len(), violations);
        let aggregates = normalized_aggregates(objectives, senses, &feasible);
        let (low, high) = aggregates
            .iter()
            .zip(&feasible)
            .filter(|(_, ok)| **ok)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), (value, _)| {
                (low.min(*value), high.max(*value))
            });
        let span = high - low;
        aggregates
            .iter()
            .enumerate()
            .map(|(idx, value)| {
                if feasible[idx] {
                    if span > 0.0 {
                        1.0 + (high - value) / span
                    } else {
                        2.0
                    }
                } else {
                    INFEASIBLE_CEILING / (1.0 + violation_at(violations, idx))
                }
            })
            .collect()
    }
}

const INFEASIBLE_CEILING: f64 = 0.5;

/// Rank-based fitness: one plus the number of strictly worse individuals.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankScaling;

impl FitnessScaling for RankScaling {
    fn scale(
        &self,
        objectives: &[Vec<f64>],
        violations: Option<&[f64]>,
        senses: &[Sense],
    ) -> Vec<f64> {
        let feasible = feasibility(objectives.len(), violations);
        let aggregates = normalized_aggregates(objectives, senses, &feasible);
        let keys: Vec<(bool, f64)> = (0..objectives.len())
            .map(|idx| {
                if feasible[idx] {
                    (false, aggregates[idx])
                } else {
                    (true, violation_at(violations, idx))
                }
            })
            .collect();
        let mut order: Vec<usize> = (0..keys.len()).collect();
        order.sort_by(|a, b| compare_keys(keys[*b], keys[*a]));
        // `order` runs from worst to best; equal keys share a rank.
        let mut fitness = vec![0.0; keys.len()];
        let mut worse = 0_usize;
        let mut start = 0;
        while start < order.len() {
            let mut end = start + 1;
            while end < order.len()
                && compare_keys(keys[order[start]], keys[order[end]]) == Ordering::Equal
            {
                end += 1;
            }
            #[allow(clippy::cast_precision_loss)]
            let value = 1.0 + worse as f64;
            for &idx in &order[start..end] {
                fitness[idx] = value;
            }
            worse += end - start;
            start = end;
        }
        fitness
    }
}

/// Lower keys are better: feasible before infeasible, then by value.
fn compare_keys(a: (bool, f64), b: (bool, f64)) -> Ordering {
    a.0.cmp(&b.0).then_with(|| a.1.total_cmp(&b.1))
}

fn feasibility(len: usize, violations: Option<&[f64]>) -> Vec<bool> {
    (0..len)
        .map(|idx| violation_at(violations, idx) <= 0.0)
        .collect()
}

fn violation_at(violations: Option<&[f64]>, idx: usize) -> f64 {
    violations
        .and_then(|values| values.get(idx))
        .copied()
        .unwrap_or(0.0)
}

/// Sum of sign-adjusted objectives; lower is better.
pub(crate) fn signed_sum(row: &[f64], senses: &[Sense]) -> f64 {
    row.iter()
        .enumerate()
        .map(|(column, value)| sense_at(senses, column).factor() * value)
        .sum()
}

fn sense_at(senses: &[Sense], column: usize) -> Sense {
    senses.get(column).copied().unwrap_or_default()
}

/// Per-row sums of sign-adjusted objectives, each column min-max normalized
/// over the feasible rows. Operands are halved before subtracting so extreme
/// finite objectives cannot overflow the range.
fn normalized_aggregates(objectives: &[Vec<f64>], senses: &[Sense], feasible: &[bool]) -> Vec<f64> {
    let columns = objectives.first().map_or(0, Vec::len);
    let mut ranges = vec![(f64::INFINITY, f64::NEG_INFINITY); columns];
    for (row, _) in objectives.iter().zip(feasible).filter(|(_, ok)| **ok) {
        for (column, value) in row.iter().enumerate().take(columns) {
            let adjusted = sense_at(senses, column).factor() * value;
            let (low, high) = &mut ranges[column];
            *low = low.min(adjusted);
            *high = high.max(adjusted);
        }
    }
    objectives
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .take(columns)
                .map(|(column, value)| {
                    let adjusted = sense_at(senses, column).factor() * value;
                    let (low, high) = ranges[column];
                    if high > low {
                        (adjusted * 0.5 - low * 0.5) / (high * 0.5 - low * 0.5)
                    } else {
                        0.0
                    }
                })
                .sum()
        })
        .collect()
}
