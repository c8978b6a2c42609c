//! Add-energies command implementation.
//!
//! Weight-decay runs store penalized costs only. This re-evaluates every
//! stored optimum: first with the penalty, which must reproduce the stored
//! cost, then without it to get the plain energy.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::debug;

use qlt_cost::CostFunction;
use qlt_optimize::OptimizerKind;

use super::common::resolve_optimizer;
use super::weight_decay;
use crate::config::ExperimentConfig;
use crate::experiment::{Experiment, Problem};
use crate::output::{print_header, print_result, print_success};
use crate::results::{ResultCache, WeightDecayData};

/// Largest relative deviation between a stored and a recomputed cost.
pub const COST_TOLERANCE: f64 = 1e-9;

/// What to update.
#[derive(Debug, Clone)]
pub struct AddEnergiesArgs {
    pub problem: Problem,
    pub qubits: usize,
    pub layers: usize,
    pub optimizer: Option<OptimizerKind>,
    /// Weight-decay cache; defaults to the weight-decay command's path.
    pub input: Option<PathBuf>,
}

/// Fill in the energies and return the updated cache and the number of
/// energies computed.
pub fn run(
    config: &ExperimentConfig,
    args: &AddEnergiesArgs,
) -> Result<(ResultCache<WeightDecayData>, usize)> {
    let path = match &args.input {
        Some(path) => path.clone(),
        None => {
            let kind = resolve_optimizer(config, args.optimizer).kind;
            weight_decay::default_path(config, args.problem, kind)
        }
    };
    if !path.exists() {
        bail!("No weight-decay results at {}", path.display());
    }
    let mut cache: ResultCache<WeightDecayData> = ResultCache::open(path)?;
    let experiment = Experiment::new(config, args.problem, args.qubits, args.layers)?;
    let energy = experiment.vqe_cost(Vec::new(), 0.0, 0.0)?;

    let sweep = cache
        .data_mut()
        .get_mut(&args.qubits.to_string())
        .and_then(|block| block.entries.get_mut(&args.layers.to_string()))
        .with_context(|| {
            format!(
                "No results for {} qubits and {} layers",
                args.qubits, args.layers
            )
        })?;

    let mut computed = 0;
    for (wd_key, record) in sweep.iter_mut() {
        let weight_decay: f64 = wd_key
            .parse()
            .with_context(|| format!("Malformed weight-decay key '{wd_key}'"))?;
        let mut weighted = experiment.vqe_cost(Vec::new(), weight_decay, 0.0)?;

        let mut energies = Vec::with_capacity(record.costs.len());
        for (i, (params, &stored)) in record
            .optimal_parameter_vectors
            .iter()
            .zip(&record.costs)
            .enumerate()
        {
            let recomputed = weighted.evaluate(params)?;
            if (recomputed - stored).abs() > COST_TOLERANCE * stored.abs().max(1.0) {
                bail!(
                    "Weight decay {wd_key}, repetition {i}: stored cost {stored} \
                     but parameters give {recomputed}"
                );
            }
            energies.push(energy.energy_of(params)?);
        }
        debug!("Weight decay {}: {} energies", wd_key, energies.len());
        computed += energies.len();
        record.energies = energies;
    }

    cache.save()?;
    Ok((cache, computed))
}

/// Execute the add-energies command.
pub fn execute(config: &ExperimentConfig, args: &AddEnergiesArgs) -> Result<()> {
    print_header("Adding energies to weight-decay results");
    let (cache, computed) = run(config, args)?;
    print_result("Energies", computed);
    print_success(&format!("Results written to {}", cache.path().display()));
    Ok(())
}
