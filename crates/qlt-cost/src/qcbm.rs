//! Born-machine cost: clipped negative log-likelihood of a target distribution.

use std::f64::consts::PI;

use qlt_ir::Circuit;
use qlt_models::circuits::qcbm_ansatz;
use qlt_prune::{PruneMask, check_period, weight_decay_bias};
use qlt_sim::Statevector;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::cost::{CostFunction, check_parameter_count};
use crate::error::{CostError, CostResult};
use crate::metrics::Metrics;
use crate::tracker::{NullTracker, Tracker};

/// Floor applied to model probabilities before taking logarithms.
pub const DEFAULT_CLIP: f64 = 1e-9;

/// `−Σᵢ targetᵢ · ln(max(measuredᵢ, epsilon))`.
///
/// ```rust
/// use qlt_cost::clipped_negative_log_likelihood;
///
/// let target = [0.5, 0.5];
/// let nll = clipped_negative_log_likelihood(&target, &target, 1e-9);
/// assert!((nll - std::f64::consts::LN_2).abs() < 1e-12);
/// ```
pub fn clipped_negative_log_likelihood(target: &[f64], measured: &[f64], epsilon: f64) -> f64 {
    -target
        .iter()
        .zip(measured)
        .map(|(t, m)| t * m.max(epsilon).ln())
        .sum::<f64>()
}

/// Sampling setup for shot-based evaluation.
struct Sampling {
    shots: usize,
    rng: StdRng,
}

/// Clipped negative log-likelihood of a QCBM ansatz against a target.
pub struct QcbmCost {
    target: Vec<f64>,
    ansatz: Circuit,
    mask: PruneMask,
    sampling: Option<Sampling>,
    weight_decay: f64,
    period: f64,
    tracker: Box<dyn Tracker>,
    target_entropy: f64,
    min_cnll: f64,
    circuits_run: usize,
}

impl QcbmCost {
    /// Cost of a `layers`-layer QCBM on `log2(len)` qubits.
    pub fn new(target: Vec<f64>, layers: usize) -> CostResult<Self> {
        if target.len() < 2 || !target.len().is_power_of_two() {
            return Err(CostError::InvalidTarget(format!(
                "distribution length {} is not a power of two of at least 2",
                target.len()
            )));
        }
        if target.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(CostError::InvalidTarget(
                "distribution has negative or non-finite entries".to_string(),
            ));
        }

        let n_qubits = target.len().trailing_zeros() as usize;
        let ansatz = qcbm_ansatz(n_qubits, layers)?;
        let mask = PruneMask::none(ansatz.num_parameters());
        let target_entropy = clipped_negative_log_likelihood(&target, &target, DEFAULT_CLIP);

        Ok(Self {
            target,
            ansatz,
            mask,
            sampling: None,
            weight_decay: 0.0,
            period: 2.0 * PI,
            tracker: Box::new(NullTracker),
            target_entropy,
            min_cnll: f64::INFINITY,
            circuits_run: 0,
        })
    }

    /// Prune `indices` (ascending, in full-vector positions).
    pub fn with_pruned_indices(mut self, indices: Vec<usize>) -> CostResult<Self> {
        self.mask = PruneMask::new(self.ansatz.num_parameters(), indices)?;
        Ok(self)
    }

    /// Estimate probabilities from `shots` measurements instead of exactly.
    pub fn with_samples(mut self, shots: usize, seed: u64) -> Self {
        self.sampling = Some(Sampling {
            shots,
            rng: StdRng::seed_from_u64(seed),
        });
        self
    }

    /// Weight of the periodic penalty.
    pub fn with_weight_decay(mut self, weight_decay: f64) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Period used by the penalty.
    pub fn with_parameter_period(mut self, period: f64) -> CostResult<Self> {
        check_period(period)?;
        self.period = period;
        Ok(self)
    }

    /// Send per-evaluation metrics to `tracker`.
    pub fn with_tracker(mut self, tracker: impl Tracker + 'static) -> Self {
        self.tracker = Box::new(tracker);
        self
    }

    /// Number of qubits of the ansatz.
    pub fn num_qubits(&self) -> usize {
        self.ansatz.num_qubits()
    }

    /// The lowest attainable likelihood: the target's own entropy.
    pub fn target_entropy(&self) -> f64 {
        self.target_entropy
    }

    /// Circuits simulated so far.
    pub fn circuits_run(&self) -> usize {
        self.circuits_run
    }
}

impl CostFunction for QcbmCost {
    fn num_parameters(&self) -> usize {
        self.mask.num_kept()
    }

    fn evaluate(&mut self, params: &[f64]) -> CostResult<f64> {
        check_parameter_count(self.mask.num_kept(), params)?;
        let padded = self.mask.pad(params)?;

        let state = Statevector::from_parameterized(&self.ansatz, &padded)?;
        let measured = match &mut self.sampling {
            Some(sampling) => state.sampled_probabilities(sampling.shots, &mut sampling.rng)?,
            None => state.probabilities(),
        };
        self.circuits_run += 1;

        let cnll = clipped_negative_log_likelihood(&self.target, &measured, DEFAULT_CLIP);
        let bias = weight_decay_bias(&padded, self.weight_decay, self.period)?;
        self.min_cnll = self.min_cnll.min(cnll);

        let mut metrics = Metrics::new();
        metrics
            .insert("Clipped Negative Log Likelihood", cnll)
            .insert("Minimum Clipped Negative Log Likelihood", self.min_cnll)
            .insert("Offset Clipped Negative Log Likelihood", cnll - self.target_entropy)
            .insert(
                "Minimum Offset Clipped Negative Log Likelihood",
                self.min_cnll - self.target_entropy,
            )
            .insert("Number of Circuits Run", self.circuits_run as f64);
        if self.weight_decay != 0.0 {
            metrics.insert("Parameter Weight Bias", bias);
        }
        self.tracker.log(&metrics)?;

        Ok(cnll + bias)
    }

    fn finish(&mut self) -> CostResult<()> {
        self.tracker.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::MemoryTracker;
    use approx::assert_relative_eq;
    use qlt_models::circuits::qcbm_num_parameters;

    #[test]
    fn test_clipping() {
        // a zero model probability is floored at epsilon
        let nll = clipped_negative_log_likelihood(&[1.0, 0.0], &[0.0, 1.0], 1e-9);
        assert_relative_eq!(nll, -(1e-9f64).ln(), epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_bad_targets() {
        assert!(QcbmCost::new(vec![1.0], 2).is_err());
        assert!(QcbmCost::new(vec![0.5, 0.25, 0.25], 2).is_err());
        assert!(QcbmCost::new(vec![1.5, -0.5], 2).is_err());
    }

    #[test]
    fn test_zero_parameters_give_all_zero_state() {
        // every rotation at zero leaves |00⟩ with probability one
        let target = vec![0.25; 4];
        let mut cost = QcbmCost::new(target, 2).unwrap();
        let n = qcbm_num_parameters(2, 2);
        assert_eq!(cost.num_parameters(), n);

        let value = cost.evaluate(&vec![0.0; n]).unwrap();
        let expected = -(0.25 * 1.0f64.ln() + 0.75 * (1e-9f64).ln());
        assert_relative_eq!(value, expected, epsilon = 1e-6);
        assert_relative_eq!(cost.target_entropy(), 4.0f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_metrics_and_counter() {
        let tracker = MemoryTracker::new();
        let mut cost = QcbmCost::new(vec![0.1, 0.2, 0.3, 0.4], 3)
            .unwrap()
            .with_pruned_indices(vec![0, 1])
            .unwrap()
            .with_tracker(tracker.clone());
        let params = vec![0.3; cost.num_parameters()];
        cost.evaluate(&params).unwrap();
        cost.evaluate(&params).unwrap();

        assert_eq!(cost.circuits_run(), 2);
        let records = tracker.records();
        assert_eq!(records[1].get("Number of Circuits Run"), Some(2.0));
        let offset = records[0].get("Offset Clipped Negative Log Likelihood").unwrap();
        assert!(offset >= -1e-9, "likelihood below the target entropy: {offset}");
        assert!(records[0].get("Parameter Weight Bias").is_none());
    }

    #[test]
    fn test_sampled_estimate_is_close() {
        let params: Vec<f64> = (0..qcbm_num_parameters(2, 2)).map(|i| 0.1 * i as f64).collect();
        let target = vec![0.25; 4];
        let exact = QcbmCost::new(target.clone(), 2).unwrap().evaluate(&params).unwrap();
        let sampled = QcbmCost::new(target, 2)
            .unwrap()
            .with_samples(200_000, 7)
            .evaluate(&params)
            .unwrap();
        assert!((exact - sampled).abs() < 0.05);
    }
}
