//! Weight-decay command implementation.
//!
//! Trains the unpruned VQE ansatz with every configured penalty weight and
//! records the penalized costs. Run `add-energies` afterwards to recover
//! the plain energies.

use std::path::PathBuf;

use anyhow::{Result, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use tracing::info;

use qlt_cost::minimize;
use qlt_optimize::OptimizerKind;

use super::common::{open_tracker, resolve_optimizer};
use crate::config::ExperimentConfig;
use crate::experiment::{Experiment, Problem};
use crate::output::{create_progress_bar, print_header, print_result, print_success};
use crate::results::{ResultCache, WeightDecayData, repetition_seed};

/// What to run.
#[derive(Debug, Clone)]
pub struct WeightDecayArgs {
    pub problem: Problem,
    pub qubits: usize,
    pub layers: usize,
    pub trials: Option<usize>,
    pub optimizer: Option<OptimizerKind>,
    pub output: Option<PathBuf>,
}

/// `<data_dir>/weight_decay/<optimizer>/<project>_<problem>.json`.
pub fn default_path(
    config: &ExperimentConfig,
    problem: Problem,
    optimizer: OptimizerKind,
) -> PathBuf {
    config
        .data_dir
        .join("weight_decay")
        .join(optimizer.to_string())
        .join(format!("{}_{}.json", config.weight_decay_sweep.project, problem))
}

/// Seed of repetition `trial` at penalty weight `weight_decay`.
pub fn weight_decay_seed(qubits: usize, layers: usize, trial: usize, weight_decay: f64) -> u64 {
    let shift = (weight_decay * 97_541_355.0 / 785.0).round() as u64;
    repetition_seed(qubits, layers, trial).wrapping_add(shift)
}

/// Run the sweep and return the updated cache.
pub fn run(
    config: &ExperimentConfig,
    args: &WeightDecayArgs,
) -> Result<ResultCache<WeightDecayData>> {
    if !args.problem.is_vqe() {
        bail!("weight-decay supports VQE problems only, got {}", args.problem);
    }
    let trials = args.trials.unwrap_or(config.trials);
    let optimizer = resolve_optimizer(config, args.optimizer);
    let experiment = Experiment::new(config, args.problem, args.qubits, args.layers)?;
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| default_path(config, args.problem, optimizer.kind));
    let mut cache: ResultCache<WeightDecayData> = ResultCache::open(path)?;
    let runs_dir = config.tracking.then_some(config.runs_dir.as_path());
    let (qubits_key, layers_key) = (args.qubits.to_string(), args.layers.to_string());

    let values = &config.weight_decay_sweep.values;
    let pb = create_progress_bar((trials * values.len()) as u64, "repetitions");
    for &weight_decay in values {
        let wd_key = weight_decay.to_string();
        pb.set_message(format!("weight decay {wd_key}"));

        let done = {
            let block = cache.data_mut().entry(qubits_key.clone()).or_default();
            block.ground_state_energy = experiment.ground_state_energy().unwrap_or_default();
            block
                .entries
                .entry(layers_key.clone())
                .or_default()
                .entry(wd_key.clone())
                .or_default()
                .costs
                .len()
        };
        pb.inc(done.min(trials) as u64);

        for trial in done..trials {
            let seed = weight_decay_seed(args.qubits, args.layers, trial, weight_decay);
            let mut rng = StdRng::seed_from_u64(seed);
            let initial = experiment.random_parameters(experiment.num_parameters(), &mut rng);
            let tracker = open_tracker(
                runs_dir,
                &config.weight_decay_sweep.project,
                json!({
                    "type": "weight_decay",
                    "problem": args.problem.to_string(),
                    "number_of_qubits": args.qubits,
                    "number_of_layers": args.layers,
                    "trial": trial,
                    "seed": seed,
                    "weight_decay": weight_decay,
                    "optimizer": optimizer.kind.to_string(),
                    "ground_state_energy": experiment.ground_state_energy(),
                    "initial_parameters": initial,
                }),
            )?;
            let mut cost = experiment
                .vqe_cost(Vec::new(), weight_decay, 0.0)?
                .with_tracker(tracker);
            let result = minimize(&optimizer.build(seed), &mut cost, initial)?;
            info!(
                "Weight decay {}, repetition {}: cost {:.10} after {} evaluations",
                wd_key, trial, result.optimal_value, result.num_evaluations
            );

            let record = cache
                .data_mut()
                .entry(qubits_key.clone())
                .or_default()
                .entries
                .entry(layers_key.clone())
                .or_default()
                .entry(wd_key.clone())
                .or_default();
            record.costs.push(result.optimal_value);
            record.optimal_parameter_vectors.push(result.optimal_params);
            record.number_of_evaluations.push(result.num_evaluations);
            cache.save()?;
            pb.inc(1);
        }
    }
    pb.finish_and_clear();

    Ok(cache)
}

/// Execute the weight-decay command.
pub fn execute(config: &ExperimentConfig, args: &WeightDecayArgs) -> Result<()> {
    print_header(&format!("Weight-decay sweep for {}", args.problem));
    let cache = run(config, args)?;

    let sweep = cache
        .data()
        .get(&args.qubits.to_string())
        .and_then(|block| block.entries.get(&args.layers.to_string()));
    if let Some(sweep) = sweep {
        for (wd, record) in sweep {
            if let Some(best) = record.costs.iter().copied().min_by(f64::total_cmp) {
                print_result(&format!("Best cost, weight decay {wd}"), format!("{best:.10}"));
            }
        }
    }
    print_success(&format!("Results written to {}", cache.path().display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_decay_seed() {
        assert_eq!(weight_decay_seed(4, 2, 1, 0.0), repetition_seed(4, 2, 1));
        // 97541355 / 785 = 124256.5...
        assert_eq!(weight_decay_seed(4, 2, 1, 1.0), repetition_seed(4, 2, 1) + 124_257);
        assert_ne!(
            weight_decay_seed(4, 2, 1, 1e-3),
            weight_decay_seed(4, 2, 1, 1e-2)
        );
    }

    #[test]
    fn test_rejects_non_vqe_problem() {
        let args = WeightDecayArgs {
            problem: Problem::Qcbm,
            qubits: 2,
            layers: 1,
            trials: Some(1),
            optimizer: None,
            output: None,
        };
        assert!(run(&ExperimentConfig::default(), &args).is_err());
    }
}
