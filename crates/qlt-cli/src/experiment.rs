//! Problem setup shared by the experiment commands.
//!
//! An [`Experiment`] fixes the problem, the register size and the depth,
//! and knows how to draw a trial's target, draw starting points and build
//! the cost function for any set of pruned indices.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use qlt_cost::{CompilingCost, CostFunction, QcbmCost, Tracker, VqeCost};
use qlt_ir::Circuit;
use qlt_models::circuits::{
    compiling_num_parameters, compiling_target, j1j2_alternating_ansatz, j1j2_full_ansatz,
    qcbm_num_parameters, tfim_ansatz, trivial_parameters,
};
use qlt_models::problems::{
    TargetDistribution, ground_state_energy_on, j1j2_hamiltonian, tfim_hamiltonian,
};
use qlt_optimize::OptimizerKind;
use qlt_prune::PruningRule;
use qlt_sim::{MAX_QUBITS, PauliHamiltonian};

use crate::config::{ExperimentConfig, InitRange, J1j2Ansatz};
use crate::results::StageRecord;

/// The variational problems the experiments run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Problem {
    /// VQE on the J1-J2 Heisenberg chain.
    VqeJ1j2,
    /// VQE on the transverse-field Ising chain.
    VqeTfim,
    /// Quantum circuit Born machine.
    Qcbm,
    /// Two-qubit quantum compiling.
    Compiling,
}

impl Problem {
    /// Register size the problem is fixed to, if any.
    pub fn fixed_qubits(&self) -> Option<usize> {
        match self {
            Problem::Compiling => Some(2),
            _ => None,
        }
    }

    pub fn is_vqe(&self) -> bool {
        matches!(self, Problem::VqeJ1j2 | Problem::VqeTfim)
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::VqeJ1j2 => write!(f, "vqe-j1j2"),
            Problem::VqeTfim => write!(f, "vqe-tfim"),
            Problem::Qcbm => write!(f, "qcbm"),
            Problem::Compiling => write!(f, "compiling"),
        }
    }
}

/// Trial-specific data drawn before the unpruned stage.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Target {
    #[default]
    None,
    /// QCBM target distribution.
    Distribution(Vec<f64>),
    /// Compiling target angles `(a, b)`.
    Parameters([f64; 2]),
}

impl Target {
    /// The target stored in an unpruned record.
    pub fn from_record(record: &StageRecord) -> Result<Self> {
        if let Some(distribution) = &record.target_distribution {
            return Ok(Target::Distribution(distribution.clone()));
        }
        if let Some(parameters) = &record.target_parameters {
            let [a, b] = parameters.as_slice() else {
                bail!(
                    "Stored target has {} parameters, expected 2",
                    parameters.len()
                );
            };
            return Ok(Target::Parameters([*a, *b]));
        }
        Ok(Target::None)
    }

    /// Store the target in `record`.
    pub fn write_to(&self, record: &mut StageRecord) {
        match self {
            Target::None => {}
            Target::Distribution(d) => record.target_distribution = Some(d.clone()),
            Target::Parameters(p) => record.target_parameters = Some(p.to_vec()),
        }
    }
}

enum Model {
    Vqe {
        hamiltonian: PauliHamiltonian,
        ansatz: Circuit,
        ground_state_energy: f64,
    },
    Qcbm {
        distribution: TargetDistribution,
        samples: Option<usize>,
    },
    Compiling,
}

/// A problem at a fixed register size and depth.
pub struct Experiment {
    pub problem: Problem,
    pub qubits: usize,
    pub layers: usize,
    /// Tracking project and cache file name.
    pub project: String,
    pub period: f64,
    pub pruning: PruningRule,
    pub initialization: InitRange,
    pub weight_decay: f64,
    /// Result subdirectory below the problem directory.
    variant: Option<&'static str>,
    model: Model,
}

impl Experiment {
    /// Set up `problem` on `qubits` qubits with `layers` layers.
    ///
    /// For VQE problems this computes the exact ground-state energy.
    pub fn new(
        config: &ExperimentConfig,
        problem: Problem,
        qubits: usize,
        layers: usize,
    ) -> Result<Self> {
        if let Some(fixed) = problem.fixed_qubits().filter(|&n| n != qubits) {
            bail!("{problem} is defined on {fixed} qubits, got {qubits}");
        }

        let experiment = match problem {
            Problem::VqeJ1j2 => {
                let c = &config.vqe_j1j2;
                let hamiltonian = j1j2_hamiltonian(qubits, c.j2, c.j1);
                let ansatz = match c.ansatz {
                    J1j2Ansatz::Alternating => j1j2_alternating_ansatz(qubits, layers)?,
                    J1j2Ansatz::Full => j1j2_full_ansatz(qubits, layers)?,
                };
                Self {
                    problem,
                    qubits,
                    layers,
                    project: c.project.clone(),
                    period: c.period,
                    pruning: c.pruning,
                    initialization: c.initialization,
                    weight_decay: c.weight_decay,
                    variant: Some(c.ansatz.dir_name()),
                    model: Self::vqe_model(hamiltonian, ansatz, qubits)?,
                }
            }
            Problem::VqeTfim => {
                let c = &config.vqe_tfim;
                let hamiltonian = tfim_hamiltonian(qubits, c.field, c.boundary);
                let ansatz = tfim_ansatz(qubits, layers)?;
                Self {
                    problem,
                    qubits,
                    layers,
                    project: c.project.clone(),
                    period: c.period,
                    pruning: c.pruning,
                    initialization: c.initialization,
                    weight_decay: c.weight_decay,
                    variant: None,
                    model: Self::vqe_model(hamiltonian, ansatz, qubits)?,
                }
            }
            Problem::Qcbm => {
                let c = &config.qcbm;
                if !(1..=MAX_QUBITS).contains(&qubits) {
                    bail!("qcbm needs between 1 and {MAX_QUBITS} qubits, got {qubits}");
                }
                Self {
                    problem,
                    qubits,
                    layers,
                    project: c.project.clone(),
                    period: c.period,
                    pruning: c.pruning,
                    initialization: c.initialization,
                    weight_decay: c.weight_decay,
                    variant: None,
                    model: Model::Qcbm {
                        distribution: c.target.clone(),
                        samples: c.samples,
                    },
                }
            }
            Problem::Compiling => {
                let c = &config.compiling;
                Self {
                    problem,
                    qubits,
                    layers,
                    project: c.project.clone(),
                    period: c.period(),
                    pruning: c.pruning,
                    initialization: c.initialization,
                    weight_decay: 0.0,
                    variant: None,
                    model: Model::Compiling,
                }
            }
        };

        info!(
            "{} on {} qubits, {} layers: {} parameters",
            problem,
            qubits,
            layers,
            experiment.num_parameters()
        );
        Ok(experiment)
    }

    /// The QCBM pruning-sweep setup: its own project, target and start range.
    pub fn qcbm_sweep(config: &ExperimentConfig, qubits: usize, layers: usize) -> Result<Self> {
        let sweep = &config.qcbm.sweep;
        let mut experiment = Self::new(config, Problem::Qcbm, qubits, layers)?;
        experiment.project = sweep.project.clone();
        experiment.initialization = sweep.initialization;
        experiment.model = Model::Qcbm {
            distribution: sweep.target.clone(),
            samples: config.qcbm.samples,
        };
        Ok(experiment)
    }

    fn vqe_model(hamiltonian: PauliHamiltonian, ansatz: Circuit, qubits: usize) -> Result<Model> {
        let ground_state_energy = ground_state_energy_on(&hamiltonian, qubits)
            .context("Failed to compute the ground-state energy")?;
        debug!("Ground-state energy: {:.12}", ground_state_energy);
        Ok(Model::Vqe {
            hamiltonian,
            ansatz,
            ground_state_energy,
        })
    }

    /// Length of the full parameter vector.
    pub fn num_parameters(&self) -> usize {
        match &self.model {
            Model::Vqe { ansatz, .. } => ansatz.num_parameters(),
            Model::Qcbm { .. } => qcbm_num_parameters(self.qubits, self.layers),
            Model::Compiling => compiling_num_parameters(self.layers),
        }
    }

    /// Exact ground-state energy, for VQE problems.
    pub fn ground_state_energy(&self) -> Option<f64> {
        match &self.model {
            Model::Vqe {
                ground_state_energy,
                ..
            } => Some(*ground_state_energy),
            _ => None,
        }
    }

    /// `<data_dir>/<problem>[/<variant>]/<optimizer>/<project>.json`.
    pub fn cache_path(&self, data_dir: &Path, optimizer: OptimizerKind) -> PathBuf {
        let mut path = data_dir.join(self.problem.to_string());
        if let Some(variant) = self.variant {
            path.push(variant);
        }
        path.push(optimizer.to_string());
        path.push(format!("{}.json", self.project));
        path
    }

    /// Draw the trial's target.
    pub fn draw_target<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Target> {
        match &self.model {
            Model::Vqe { .. } => Ok(Target::None),
            Model::Qcbm { distribution, .. } => {
                Ok(Target::Distribution(distribution.generate(self.qubits, rng)?))
            }
            Model::Compiling => Ok(Target::Parameters([
                rng.gen_range(0.0..self.period),
                rng.gen_range(0.0..self.period),
            ])),
        }
    }

    /// `count` values drawn uniformly from the initialization range.
    pub fn random_parameters<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<f64> {
        let (low, high) = self.initialization.bounds(self.period);
        (0..count).map(|_| rng.gen_range(low..high)).collect()
    }

    /// The VQE cost with an explicit penalty weight and energy offset.
    pub fn vqe_cost(
        &self,
        pruned_indices: Vec<usize>,
        weight_decay: f64,
        offset: f64,
    ) -> Result<VqeCost> {
        let Model::Vqe {
            hamiltonian,
            ansatz,
            ..
        } = &self.model
        else {
            bail!("{} is not a VQE problem", self.problem);
        };
        Ok(VqeCost::new(hamiltonian.clone(), ansatz.clone())
            .with_pruned_indices(pruned_indices)?
            .with_weight_decay(weight_decay)
            .with_parameter_period(self.period)?
            .with_offset(offset))
    }

    /// The lottery cost for one stage.
    ///
    /// VQE energies are offset by minus the ground-state energy. `seed`
    /// drives QCBM shot sampling. With `log_trivial`, compiling runs also
    /// log distances from the known exact solutions.
    pub fn cost(
        &self,
        target: &Target,
        pruned_indices: Vec<usize>,
        tracker: Box<dyn Tracker>,
        seed: u64,
        log_trivial: bool,
    ) -> Result<Box<dyn CostFunction>> {
        let cost: Box<dyn CostFunction> = match (&self.model, target) {
            (
                Model::Vqe {
                    ground_state_energy,
                    ..
                },
                Target::None,
            ) => Box::new(
                self.vqe_cost(pruned_indices, self.weight_decay, -ground_state_energy)?
                    .with_tracker(tracker),
            ),
            (Model::Qcbm { samples, .. }, Target::Distribution(distribution)) => {
                let mut cost = QcbmCost::new(distribution.clone(), self.layers)?
                    .with_pruned_indices(pruned_indices)?
                    .with_weight_decay(self.weight_decay)
                    .with_parameter_period(self.period)?;
                if let Some(shots) = *samples {
                    cost = cost.with_samples(shots, seed);
                }
                Box::new(cost.with_tracker(tracker))
            }
            (Model::Compiling, Target::Parameters([a, b])) => {
                let mut cost = CompilingCost::new(compiling_target(*a, *b)?, self.layers)?
                    .with_pruned_indices(pruned_indices)?;
                if log_trivial {
                    cost = cost.with_trivial_parameters(trivial_parameters(*a, *b, self.layers))?;
                }
                Box::new(cost.with_tracker(tracker))
            }
            (_, target) => bail!("{} cannot use target {:?}", self.problem, target),
        };
        Ok(cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlt_cost::NullTracker;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn small_config() -> ExperimentConfig {
        let mut config = ExperimentConfig::default();
        config.qcbm.target = TargetDistribution::Normal {
            mean: 0.65,
            stddev: 0.1,
            samples: 2_000,
        };
        config
    }

    #[test]
    fn test_parameter_counts() {
        let config = small_config();
        let j1j2 = Experiment::new(&config, Problem::VqeJ1j2, 4, 2).unwrap();
        assert_eq!(j1j2.num_parameters(), 12);
        let tfim = Experiment::new(&config, Problem::VqeTfim, 4, 3).unwrap();
        assert_eq!(tfim.num_parameters(), 6);
        let compiling = Experiment::new(&config, Problem::Compiling, 2, 2).unwrap();
        assert_eq!(compiling.num_parameters(), 22);
    }

    #[test]
    fn test_compiling_needs_two_qubits() {
        assert!(Experiment::new(&small_config(), Problem::Compiling, 3, 1).is_err());
    }

    #[test]
    fn test_qcbm_register_size_is_bounded() {
        let config = small_config();
        assert!(Experiment::new(&config, Problem::Qcbm, 0, 1).is_err());
        assert!(Experiment::new(&config, Problem::Qcbm, MAX_QUBITS + 1, 1).is_err());
        assert!(Experiment::new(&config, Problem::Qcbm, 64, 1).is_err());
    }

    #[test]
    fn test_vqe_cost_is_offset_by_ground_energy() {
        let experiment = Experiment::new(&small_config(), Problem::VqeTfim, 3, 2).unwrap();
        let e0 = experiment.ground_state_energy().unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let params = experiment.random_parameters(experiment.num_parameters(), &mut rng);

        let mut raw = experiment.vqe_cost(vec![], 0.0, 0.0).unwrap();
        let mut cost = experiment
            .cost(&Target::None, vec![], Box::new(NullTracker), 0, false)
            .unwrap();
        let raw_energy = raw.evaluate(&params).unwrap();
        let value = cost.evaluate(&params).unwrap();
        let bias =
            qlt_prune::weight_decay_bias(&params, experiment.weight_decay, experiment.period)
                .unwrap();
        assert!((value - (raw_energy - e0 + bias)).abs() < 1e-9);
        assert!(value >= -1e-9);
    }

    #[test]
    fn test_initialization_range() {
        let experiment = Experiment::new(&small_config(), Problem::VqeJ1j2, 4, 1).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let params = experiment.random_parameters(100, &mut rng);
        let half = experiment.period / 2.0;
        assert!(params.iter().all(|p| (-half..half).contains(p)));
    }

    #[test]
    fn test_targets_match_problem() {
        let config = small_config();
        let mut rng = StdRng::seed_from_u64(2);

        let qcbm = Experiment::new(&config, Problem::Qcbm, 3, 2).unwrap();
        let Target::Distribution(d) = qcbm.draw_target(&mut rng).unwrap() else {
            panic!("expected a distribution");
        };
        assert_eq!(d.len(), 8);

        let compiling = Experiment::new(&config, Problem::Compiling, 2, 1).unwrap();
        let target = compiling.draw_target(&mut rng).unwrap();
        assert!(matches!(target, Target::Parameters(_)));
        assert!(
            compiling
                .cost(&Target::None, vec![], Box::new(NullTracker), 0, false)
                .is_err()
        );
        let cost = compiling
            .cost(&target, vec![0, 1], Box::new(NullTracker), 0, true)
            .unwrap();
        assert_eq!(cost.num_parameters(), 9);
    }

    #[test]
    fn test_target_record_roundtrip() {
        let mut record = StageRecord {
            initial_parameters: vec![],
            seed: 0,
            energy: 0.0,
            optimal_parameters: vec![],
            pruned_indices: None,
            target_distribution: None,
            target_parameters: None,
            number_of_evaluations: 0,
        };
        let target = Target::Parameters([0.5, 2.0]);
        target.write_to(&mut record);
        assert_eq!(Target::from_record(&record).unwrap(), target);

        record.target_parameters = Some(vec![1.0]);
        assert!(Target::from_record(&record).is_err());
    }

    #[test]
    fn test_cache_path() {
        let config = small_config();
        let experiment = Experiment::new(&config, Problem::VqeJ1j2, 4, 1).unwrap();
        let path = experiment.cache_path(Path::new("data"), OptimizerKind::Lbfgsb);
        assert_eq!(
            path,
            Path::new("data/vqe-j1j2/alternating_ansatz/L-BFGS-B/QLT-VQE-J1J2-v0.12.json")
        );
    }
}
