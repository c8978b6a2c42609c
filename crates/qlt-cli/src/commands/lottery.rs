//! Lottery command implementation.
//!
//! Per trial, the unpruned circuit is trained from a random start. Its
//! optimum decides which parameters to prune, and the pruned circuit is
//! retrained from:
//!
//! - the original start (`pruned:{p}`)
//! - the original start plus uniform noise (`pruned_with_displacement:{p}|{d}`)
//! - a fresh random start (`pruned_and_randomized:{p}`)
//!
//! As controls, a random subnetwork with as many pruned parameters is
//! trained from the original start (`random_subnetwork:{p}`) and from a
//! fresh one (`random_subnetwork_randomized_parameters:{p}`).

use std::path::PathBuf;

use anyhow::Result;
use rand::Rng;

use qlt_optimize::OptimizerKind;
use qlt_prune::{prune, random_indices, select};

use super::common::{StageJob, StageRunner, ensure_stage, resolve_optimizer, resolve_qubits};
use crate::config::ExperimentConfig;
use crate::experiment::{Experiment, Problem, Target};
use crate::output::{create_progress_bar, print_header, print_result, print_success};
use crate::results::{
    LotteryData, ResultCache, TrialEntry, TrialLocation, stage_rng, trial_seed,
};

/// Key of the unpruned stage.
pub const UNPRUNED: &str = "unpruned";

/// Stage keys of one trial, labelled with the pruning threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct StageKeys {
    pub pruned: String,
    pub displaced: Vec<(f64, String)>,
    pub pruned_and_randomized: String,
    pub random_subnetwork: String,
    pub random_subnetwork_randomized: String,
}

impl StageKeys {
    /// Keys for threshold `label` and absolute `displacements`.
    pub fn new(label: &str, displacements: impl IntoIterator<Item = f64>) -> Self {
        Self {
            pruned: format!("pruned:{label}"),
            displaced: displacements
                .into_iter()
                .map(|d| (d, format!("pruned_with_displacement:{label}|{d}")))
                .collect(),
            pruned_and_randomized: format!("pruned_and_randomized:{label}"),
            random_subnetwork: format!("random_subnetwork:{label}"),
            random_subnetwork_randomized: format!(
                "random_subnetwork_randomized_parameters:{label}"
            ),
        }
    }

    /// Stages per trial, the unpruned one included.
    pub fn stages_per_trial(&self) -> usize {
        5 + self.displaced.len()
    }
}

/// What to run.
#[derive(Debug, Clone)]
pub struct LotteryArgs {
    pub problem: Problem,
    pub qubits: Option<usize>,
    pub layers: usize,
    pub trials: Option<usize>,
    pub optimizer: Option<OptimizerKind>,
    /// Cache file; defaults to the experiment's path below the data directory.
    pub output: Option<PathBuf>,
}

/// Run the protocol and return the updated cache.
pub fn run(config: &ExperimentConfig, args: &LotteryArgs) -> Result<ResultCache<LotteryData>> {
    let qubits = resolve_qubits(args.problem, args.qubits)?;
    let trials = args.trials.unwrap_or(config.trials);
    let optimizer = resolve_optimizer(config, args.optimizer);
    let experiment = Experiment::new(config, args.problem, qubits, args.layers)?;
    let runner = StageRunner::new(config, &experiment, &optimizer);

    let path = match &args.output {
        Some(path) => path.clone(),
        None => experiment.cache_path(&config.data_dir, optimizer.kind),
    };
    let mut cache: ResultCache<LotteryData> = ResultCache::open(path)?;

    let n = experiment.num_parameters();
    let period = experiment.period;
    let keys = StageKeys::new(
        &experiment.pruning.to_string(),
        config.lottery.displacements.iter().map(|f| f * period),
    );

    let pb = create_progress_bar((trials * keys.stages_per_trial()) as u64, "stages");
    for trial in 0..trials {
        let at = TrialLocation {
            qubits,
            layers: args.layers,
            trial,
        };
        let seed = trial_seed(args.layers, trial);
        pb.set_message(format!("trial {trial}"));

        let unpruned = ensure_stage(&mut cache, at, UNPRUNED, || {
            let mut rng = stage_rng(seed, UNPRUNED);
            let target = experiment.draw_target(&mut rng)?;
            let initial = experiment.random_parameters(n, &mut rng);
            let mut record = runner.run(StageJob {
                at,
                seed,
                key: UNPRUNED,
                kind: "unpruned",
                target: &target,
                initial_parameters: initial,
                pruned_indices: None,
                log_trivial: true,
            })?;
            target.write_to(&mut record);
            Ok(record)
        })?;
        pb.inc(1);

        let target = Target::from_record(&unpruned)?;
        let pruned = select(&unpruned.optimal_parameters, &experiment.pruning, period)?;
        let pruned_initial = prune(&unpruned.initial_parameters, &pruned)?;
        let job = |key: &'static str, initial: Vec<f64>, indices: &[usize]| StageJob {
            at,
            seed,
            key,
            kind: key,
            target: &target,
            initial_parameters: initial,
            pruned_indices: Some(indices.to_vec()),
            log_trivial: false,
        };

        ensure_stage(&mut cache, at, &keys.pruned, || {
            runner.run(StageJob {
                key: keys.pruned.as_str(),
                ..job("pruned", pruned_initial.clone(), &pruned)
            })
        })?;
        pb.inc(1);

        for (displacement, key) in &keys.displaced {
            ensure_stage(&mut cache, at, key, || {
                let mut rng = stage_rng(seed, key);
                let initial = pruned_initial
                    .iter()
                    .map(|p| p + rng.gen_range(0.0..*displacement))
                    .collect();
                runner.run(StageJob {
                    key: key.as_str(),
                    ..job("pruned_with_displacement", initial, &pruned)
                })
            })?;
            pb.inc(1);
        }

        ensure_stage(&mut cache, at, &keys.pruned_and_randomized, || {
            let mut rng = stage_rng(seed, &keys.pruned_and_randomized);
            let initial = experiment.random_parameters(pruned_initial.len(), &mut rng);
            runner.run(StageJob {
                key: keys.pruned_and_randomized.as_str(),
                ..job("pruned_and_randomized", initial, &pruned)
            })
        })?;
        pb.inc(1);

        let subnetwork = ensure_stage(&mut cache, at, &keys.random_subnetwork, || {
            let mut rng = stage_rng(seed, &keys.random_subnetwork);
            let indices = random_indices(n, pruned.len(), &mut rng)?;
            let initial = prune(&unpruned.initial_parameters, &indices)?;
            runner.run(StageJob {
                key: keys.random_subnetwork.as_str(),
                ..job("random_subnetwork", initial, &indices)
            })
        })?;
        pb.inc(1);

        let random_pruned = subnetwork.pruned_indices.unwrap_or_default();
        ensure_stage(&mut cache, at, &keys.random_subnetwork_randomized, || {
            let mut rng = stage_rng(seed, &keys.random_subnetwork_randomized);
            let initial = experiment.random_parameters(n - random_pruned.len(), &mut rng);
            runner.run(StageJob {
                key: keys.random_subnetwork_randomized.as_str(),
                ..job("random_subnetwork_randomized_parameters", initial, &random_pruned)
            })
        })?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(cache)
}

/// Execute the lottery command.
pub fn execute(config: &ExperimentConfig, args: &LotteryArgs) -> Result<()> {
    print_header(&format!("Lottery tickets for {}", args.problem));
    let cache = run(config, args)?;

    let qubits = resolve_qubits(args.problem, args.qubits)?;
    let trials = cache.data().trials(qubits, args.layers);
    let energies: Vec<f64> = trials
        .iter()
        .filter_map(|trial| match trial.get(UNPRUNED) {
            Some(TrialEntry::Stage(record)) => Some(record.energy),
            _ => None,
        })
        .collect();
    print_result("Trials", trials.len());
    if let Some(best) = energies.iter().copied().min_by(f64::total_cmp) {
        print_result("Best unpruned cost", format!("{best:.6e}"));
    }
    print_success(&format!("Results written to {}", cache.path().display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_keys() {
        let keys = StageKeys::new("0.9", [0.5, 2.0]);
        assert_eq!(keys.pruned, "pruned:0.9");
        assert_eq!(keys.displaced[0].1, "pruned_with_displacement:0.9|0.5");
        assert_eq!(keys.displaced[1].1, "pruned_with_displacement:0.9|2");
        assert_eq!(keys.pruned_and_randomized, "pruned_and_randomized:0.9");
        assert_eq!(keys.random_subnetwork, "random_subnetwork:0.9");
        assert_eq!(
            keys.random_subnetwork_randomized,
            "random_subnetwork_randomized_parameters:0.9"
        );
        assert_eq!(keys.stages_per_trial(), 7);
    }
}
