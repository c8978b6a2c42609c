//! Choosing which parameters to prune.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::distance::{check_period, periodic_distance};
use crate::error::{PruneError, PruneResult};

/// How prunable parameters are picked from an optimized vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum PruningRule {
    /// Every parameter within `cutoff` of a multiple of the period.
    Cutoff {
        /// Largest periodic distance still pruned.
        cutoff: f64,
    },
    /// The `⌈len · fraction⌉` parameters closest to a multiple of the period.
    Percentage {
        /// Share of parameters to prune, in `[0, 1]`.
        fraction: f64,
    },
}

impl PruningRule {
    /// Check the rule's threshold.
    pub fn validate(&self) -> PruneResult<()> {
        match *self {
            PruningRule::Cutoff { cutoff } if !(cutoff.is_finite() && cutoff >= 0.0) => {
                Err(PruneError::InvalidCutoff(cutoff))
            }
            PruningRule::Percentage { fraction } if !(0.0..=1.0).contains(&fraction) => {
                Err(PruneError::InvalidPercentage(fraction))
            }
            _ => Ok(()),
        }
    }
}

/// The bare threshold, as used in stage keys (`pruned:0.9`).
impl fmt::Display for PruningRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PruningRule::Cutoff { cutoff } => write!(f, "{cutoff}"),
            PruningRule::Percentage { fraction } => write!(f, "{fraction}"),
        }
    }
}

/// Ascending indices whose periodic distance from zero is at most `cutoff`.
pub fn indices_within_cutoff(
    parameters: &[f64],
    cutoff: f64,
    period: f64,
) -> PruneResult<Vec<usize>> {
    check_period(period)?;
    PruningRule::Cutoff { cutoff }.validate()?;

    Ok(parameters
        .iter()
        .enumerate()
        .filter(|(_, p)| periodic_distance(**p, period) <= cutoff)
        .map(|(i, _)| i)
        .collect())
}

/// Ascending indices of the `⌈len · fraction⌉` parameters nearest zero.
///
/// Ties in distance go to the lower index.
pub fn indices_by_percentage(
    parameters: &[f64],
    fraction: f64,
    period: f64,
) -> PruneResult<Vec<usize>> {
    check_period(period)?;
    PruningRule::Percentage { fraction }.validate()?;

    let count = ((parameters.len() as f64 * fraction).ceil() as usize).min(parameters.len());

    let mut ranked: Vec<(usize, f64)> = parameters
        .iter()
        .map(|p| periodic_distance(*p, period))
        .enumerate()
        .collect();
    // stable: equal distances keep index order
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut selected: Vec<usize> = ranked.into_iter().take(count).map(|(i, _)| i).collect();
    selected.sort_unstable();
    Ok(selected)
}

/// Apply `rule` to `parameters`.
pub fn select(parameters: &[f64], rule: &PruningRule, period: f64) -> PruneResult<Vec<usize>> {
    let indices = match *rule {
        PruningRule::Cutoff { cutoff } => indices_within_cutoff(parameters, cutoff, period)?,
        PruningRule::Percentage { fraction } => {
            indices_by_percentage(parameters, fraction, period)?
        }
    };
    debug!(
        "Pruning rule {:?} selected {} of {} parameters",
        rule,
        indices.len(),
        parameters.len()
    );
    Ok(indices)
}

/// `count` distinct indices below `num_parameters`, uniformly at random, sorted.
pub fn random_indices<R: Rng + ?Sized>(
    num_parameters: usize,
    count: usize,
    rng: &mut R,
) -> PruneResult<Vec<usize>> {
    if count > num_parameters {
        return Err(PruneError::TooManyIndices {
            requested: count,
            available: num_parameters,
        });
    }
    let mut indices = rand::seq::index::sample(rng, num_parameters, count).into_vec();
    indices.sort_unstable();
    Ok(indices)
}
