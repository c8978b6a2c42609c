//! Variational energy cost with pruning and weight decay.

use std::f64::consts::PI;

use qlt_ir::Circuit;
use qlt_prune::{PruneMask, check_period, weight_decay_bias};
use qlt_sim::{PauliHamiltonian, Statevector, expectation_value};

use crate::cost::{CostFunction, check_parameter_count};
use crate::error::CostResult;
use crate::metrics::Metrics;
use crate::tracker::{NullTracker, Tracker};

/// Energy of a parameterized ansatz plus a periodic weight-decay penalty.
///
/// The optimizer sees only the unpruned parameters; pruned slots are padded
/// back in before binding.
pub struct VqeCost {
    hamiltonian: PauliHamiltonian,
    ansatz: Circuit,
    mask: PruneMask,
    weight_decay: f64,
    period: f64,
    offset: f64,
    tracker: Box<dyn Tracker>,
    min_energy: f64,
    min_cost: f64,
    evaluations: usize,
}

impl VqeCost {
    /// Cost of `ansatz` against `hamiltonian`, nothing pruned, no penalty.
    pub fn new(hamiltonian: PauliHamiltonian, ansatz: Circuit) -> Self {
        let mask = PruneMask::none(ansatz.num_parameters());
        Self {
            hamiltonian,
            ansatz,
            mask,
            weight_decay: 0.0,
            period: 2.0 * PI,
            offset: 0.0,
            tracker: Box::new(NullTracker),
            min_energy: f64::INFINITY,
            min_cost: f64::INFINITY,
            evaluations: 0,
        }
    }

    /// Prune `indices` (ascending, in full-vector positions).
    pub fn with_pruned_indices(mut self, indices: Vec<usize>) -> CostResult<Self> {
        self.mask = PruneMask::new(self.ansatz.num_parameters(), indices)?;
        Ok(self)
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

    /// Constant added to every energy, e.g. minus the ground-state energy.
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Send per-evaluation metrics to `tracker`.
    pub fn with_tracker(mut self, tracker: impl Tracker + 'static) -> Self {
        self.tracker = Box::new(tracker);
        self
    }

    /// The pruning mask in use.
    pub fn mask(&self) -> &PruneMask {
        &self.mask
    }

    /// Offset energy at `params`, without the penalty and without logging.
    pub fn energy_of(&self, params: &[f64]) -> CostResult<f64> {
        check_parameter_count(self.mask.num_kept(), params)?;
        let padded = self.mask.pad(params)?;
        self.energy_of_padded(&padded)
    }

    fn energy_of_padded(&self, padded: &[f64]) -> CostResult<f64> {
        let state = Statevector::from_parameterized(&self.ansatz, padded)?;
        Ok(expectation_value(&self.hamiltonian, &state)? + self.offset)
    }
}

impl CostFunction for VqeCost {
    fn num_parameters(&self) -> usize {
        self.mask.num_kept()
    }

    fn evaluate(&mut self, params: &[f64]) -> CostResult<f64> {
        check_parameter_count(self.mask.num_kept(), params)?;
        let padded = self.mask.pad(params)?;

        let energy = self.energy_of_padded(&padded)?;
        let bias = weight_decay_bias(&padded, self.weight_decay, self.period)?;
        let cost = energy + bias;

        self.min_energy = self.min_energy.min(energy);
        self.min_cost = self.min_cost.min(cost);

        let mut metrics = Metrics::new();
        metrics
            .insert("Energy", energy)
            .insert("Minimum Energy", self.min_energy)
            .insert("Parameter Weight Bias", bias)
            .insert("Cost", cost)
            .insert("Minimum Cost", self.min_cost)
            .insert("Iteration", self.evaluations as f64);
        self.tracker.log(&metrics)?;
        self.evaluations += 1;

        Ok(cost)
    }

    fn finish(&mut self) -> CostResult<()> {
        self.tracker.finish()
    }
}
