//! Target distributions for QCBM training.
//!
//! Bin `i` of a distribution over `n` qubits is the probability of basis
//! state `i`, matching [`qlt_sim::Statevector::probabilities`].

use qlt_sim::MAX_QUBITS;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Which target distribution a QCBM experiment fits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetDistribution {
    /// Histogram of normal samples over `[0, 1]`.
    Normal {
        /// Mean of the normal distribution.
        mean: f64,
        /// Standard deviation of the normal distribution.
        stddev: f64,
        /// Number of samples drawn for the histogram.
        samples: usize,
    },
    /// Independent uniform weights, normalized.
    UniformRandom,
}

impl Default for TargetDistribution {
    fn default() -> Self {
        TargetDistribution::Normal {
            mean: 0.65,
            stddev: 0.1,
            samples: 1_000_000,
        }
    }
}

impl TargetDistribution {
    /// Draw the target distribution over `2^n_qubits` outcomes.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        n_qubits: usize,
        rng: &mut R,
    ) -> ModelResult<Vec<f64>> {
        match *self {
            TargetDistribution::Normal {
                mean,
                stddev,
                samples,
            } => discretized_normal(n_qubits, mean, stddev, samples, rng),
            TargetDistribution::UniformRandom => uniform_random(n_qubits, rng),
        }
    }

    /// Short label used in run configuration.
    pub fn label(&self) -> &'static str {
        match self {
            TargetDistribution::Normal { .. } => "normal",
            TargetDistribution::UniformRandom => "uniform_random",
        }
    }
}

/// Number of outcomes over `n_qubits`, refusing registers the simulator
/// cannot hold.
fn outcome_count(n_qubits: usize) -> ModelResult<usize> {
    if n_qubits > MAX_QUBITS {
        return Err(ModelError::InvalidDistribution(format!(
            "{n_qubits} qubits exceed the simulator limit of {MAX_QUBITS}"
        )));
    }
    Ok(1usize << n_qubits)
}

/// Normalized histogram of normal samples over `2^n_qubits` equal bins of
/// `[0, 1]`.
///
/// Samples outside `[0, 1]` are discarded; `1.0` falls in the last bin.
pub fn discretized_normal<R: Rng + ?Sized>(
    n_qubits: usize,
    mean: f64,
    stddev: f64,
    samples: usize,
    rng: &mut R,
) -> ModelResult<Vec<f64>> {
    if !(stddev > 0.0 && stddev.is_finite() && mean.is_finite()) {
        return Err(ModelError::InvalidDistribution(format!(
            "normal(mean = {mean}, stddev = {stddev})"
        )));
    }
    let normal = Normal::new(mean, stddev).map_err(|e| {
        ModelError::InvalidDistribution(format!("normal(mean = {mean}, stddev = {stddev}): {e}"))
    })?;

    let bins = outcome_count(n_qubits)?;
    let mut histogram = vec![0u64; bins];
    for _ in 0..samples {
        let x = normal.sample(rng);
        if (0.0..=1.0).contains(&x) {
            let bin = ((x * bins as f64) as usize).min(bins - 1);
            histogram[bin] += 1;
        }
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return Err(ModelError::InvalidDistribution(format!(
            "no samples of normal(mean = {mean}, stddev = {stddev}) fell inside [0, 1]"
        )));
    }
    Ok(histogram
        .into_iter()
        .map(|count| count as f64 / total as f64)
        .collect())
}

/// Uniform weights in `[0, 1)` per outcome, normalized to sum to one.
pub fn uniform_random<R: Rng + ?Sized>(n_qubits: usize, rng: &mut R) -> ModelResult<Vec<f64>> {
    let weights: Vec<f64> = (0..outcome_count(n_qubits)?).map(|_| rng.r#gen()).collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(ModelError::InvalidDistribution(
            "uniform weights summed to zero".to_string(),
        ));
    }
    Ok(weights.into_iter().map(|w| w / total).collect())
}
