//! Quantum compiling cost: distance to a target unitary.

use ndarray::Array2;
use num_complex::Complex64;
use qlt_ir::Circuit;
use qlt_models::circuits::compiling_overparameterized;
use qlt_prune::PruneMask;
use qlt_sim::{frobenius_distance, unitary};

use crate::cost::{CostFunction, check_parameter_count};
use crate::error::{CostError, CostResult};
use crate::metrics::Metrics;
use crate::tracker::{NullTracker, Tracker};

/// Frobenius distance between a target and the overparameterized circuit.
pub struct CompilingCost {
    target: Array2<Complex64>,
    circuit: Circuit,
    mask: PruneMask,
    trivial: Option<[Vec<f64>; 2]>,
    tracker: Box<dyn Tracker>,
    min_norm: f64,
}

fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

impl CompilingCost {
    /// Cost of a `layers`-layer circuit against a 4×4 `target`.
    pub fn new(target: Array2<Complex64>, layers: usize) -> CostResult<Self> {
        if target.dim() != (4, 4) {
            return Err(CostError::InvalidTarget(format!(
                "expected a 4x4 unitary, got {:?}",
                target.dim()
            )));
        }
        let circuit = compiling_overparameterized(layers)?;
        let mask = PruneMask::none(circuit.num_parameters());
        Ok(Self {
            target,
            circuit,
            mask,
            trivial: None,
            tracker: Box::new(NullTracker),
            min_norm: f64::INFINITY,
        })
    }

    /// Prune `indices` (ascending, in full-vector positions).
    pub fn with_pruned_indices(mut self, indices: Vec<usize>) -> CostResult<Self> {
        self.mask = PruneMask::new(self.circuit.num_parameters(), indices)?;
        Ok(self)
    }

    /// Also log the distance of each padded point from two reference vectors.
    pub fn with_trivial_parameters(mut self, trivial: [Vec<f64>; 2]) -> CostResult<Self> {
        for reference in &trivial {
            if reference.len() != self.circuit.num_parameters() {
                return Err(CostError::ParameterCountMismatch {
                    expected: self.circuit.num_parameters(),
                    got: reference.len(),
                });
            }
        }
        self.trivial = Some(trivial);
        Ok(self)
    }

    /// Send per-evaluation metrics to `tracker`.
    pub fn with_tracker(mut self, tracker: impl Tracker + 'static) -> Self {
        self.tracker = Box::new(tracker);
        self
    }
}

impl CostFunction for CompilingCost {
    fn num_parameters(&self) -> usize {
        self.mask.num_kept()
    }

    fn evaluate(&mut self, params: &[f64]) -> CostResult<f64> {
        check_parameter_count(self.mask.num_kept(), params)?;
        let padded = self.mask.pad(params)?;

        let u = unitary(&self.circuit.bind(&padded)?)?;
        let norm = frobenius_distance(&self.target, &u)?;
        self.min_norm = self.min_norm.min(norm);

        let mut metrics = Metrics::new();
        metrics
            .insert("Frobenius Norm", norm)
            .insert("Minimum Frobenius Norm", self.min_norm);
        if let Some([first, second]) = &self.trivial {
            metrics
                .insert(
                    "Parameter Distance from First Trivial",
                    euclidean_distance(&padded, first),
                )
                .insert(
                    "Parameter Distance from Second Trivial",
                    euclidean_distance(&padded, second),
                );
        }
        self.tracker.log(&metrics)?;

        Ok(norm)
    }

    fn finish(&mut self) -> CostResult<()> {
        self.tracker.finish()
    }
}
