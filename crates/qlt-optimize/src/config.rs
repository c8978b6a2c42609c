//! Optimizer selection from run configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::result::OptimizationResult;
use crate::{CmaEs, Cobyla, Lbfgsb, Optimizer};

/// Which optimizer a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptimizerKind {
    /// Limited-memory BFGS with bounds.
    #[default]
    #[serde(alias = "l-bfgs-b", alias = "L-BFGS-B")]
    Lbfgsb,
    /// Separable CMA-ES.
    #[serde(alias = "cmaes", alias = "CMA-ES")]
    CmaEs,
    /// Trust-region simplex.
    #[serde(alias = "COBYLA")]
    Cobyla,
}

impl OptimizerKind {
    /// All optimizers, in display order.
    pub const ALL: [OptimizerKind; 3] = [
        OptimizerKind::Lbfgsb,
        OptimizerKind::CmaEs,
        OptimizerKind::Cobyla,
    ];
}

/// Conventional spelling, used in result paths (`L-BFGS-B`, `CMA-ES`).
impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizerKind::Lbfgsb => write!(f, "L-BFGS-B"),
            OptimizerKind::CmaEs => write!(f, "CMA-ES"),
            OptimizerKind::Cobyla => write!(f, "COBYLA"),
        }
    }
}

/// Error for an optimizer name that is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown optimizer '{0}'; expected one of: lbfgsb, cma-es, cobyla")]
pub struct UnknownOptimizer(pub String);

impl FromStr for OptimizerKind {
    type Err = UnknownOptimizer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "lbfgsb" | "lbfgs" => Ok(OptimizerKind::Lbfgsb),
            "cmaes" => Ok(OptimizerKind::CmaEs),
            "cobyla" => Ok(OptimizerKind::Cobyla),
            _ => Err(UnknownOptimizer(s.to_string())),
        }
    }
}

/// The chosen optimizer together with every optimizer's options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Which optimizer to run.
    pub kind: OptimizerKind,
    /// L-BFGS-B options.
    pub lbfgsb: Lbfgsb,
    /// CMA-ES options; the seed is replaced per run.
    pub cma_es: CmaEs,
    /// COBYLA options.
    pub cobyla: Cobyla,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            kind: OptimizerKind::default(),
            lbfgsb: Lbfgsb::new().with_ftol(1e-10),
            cma_es: CmaEs::new(0.01)
                .with_popsize(36)
                .with_tolx(1e-10)
                .with_maxfevals(20_000),
            cobyla: Cobyla::default(),
        }
    }
}

impl OptimizerConfig {
    /// Configuration running `kind` with default options.
    pub fn for_kind(kind: OptimizerKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// The selected optimizer, seeded with `seed` where it samples.
    pub fn build(&self, seed: u64) -> ConfiguredOptimizer {
        match self.kind {
            OptimizerKind::Lbfgsb => ConfiguredOptimizer::Lbfgsb(self.lbfgsb.clone()),
            OptimizerKind::CmaEs => {
                ConfiguredOptimizer::CmaEs(self.cma_es.clone().with_seed(seed))
            }
            OptimizerKind::Cobyla => ConfiguredOptimizer::Cobyla(self.cobyla.clone()),
        }
    }
}

/// One concrete optimizer chosen at run time.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfiguredOptimizer {
    /// L-BFGS-B.
    Lbfgsb(Lbfgsb),
    /// CMA-ES.
    CmaEs(CmaEs),
    /// COBYLA.
    Cobyla(Cobyla),
}

impl Optimizer for ConfiguredOptimizer {
    fn minimize<F>(&self, objective: F, initial_params: Vec<f64>) -> OptimizationResult
    where
        F: FnMut(&[f64]) -> f64,
    {
        match self {
            ConfiguredOptimizer::Lbfgsb(o) => o.minimize(objective, initial_params),
            ConfiguredOptimizer::CmaEs(o) => o.minimize(objective, initial_params),
            ConfiguredOptimizer::Cobyla(o) => o.minimize(objective, initial_params),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!("L-BFGS-B".parse::<OptimizerKind>().unwrap(), OptimizerKind::Lbfgsb);
        assert_eq!("lbfgsb".parse::<OptimizerKind>().unwrap(), OptimizerKind::Lbfgsb);
        assert_eq!("CMA-ES".parse::<OptimizerKind>().unwrap(), OptimizerKind::CmaEs);
        assert_eq!("cma_es".parse::<OptimizerKind>().unwrap(), OptimizerKind::CmaEs);
        assert_eq!("Cobyla".parse::<OptimizerKind>().unwrap(), OptimizerKind::Cobyla);
        assert!("adam".parse::<OptimizerKind>().is_err());
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for kind in OptimizerKind::ALL {
            assert_eq!(kind.to_string().parse::<OptimizerKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_defaults_match_experiment_settings() {
        let config = OptimizerConfig::default();
        assert_eq!(config.lbfgsb.ftol, 1e-10);
        assert_eq!(config.cma_es.sigma0, 0.01);
        assert_eq!(config.cma_es.popsize, Some(36));
        assert_eq!(config.cma_es.maxfevals, 20_000);
    }

    #[test]
    fn test_build_seeds_cma_es() {
        let config = OptimizerConfig::for_kind(OptimizerKind::CmaEs);
        match config.build(99) {
            ConfiguredOptimizer::CmaEs(cma) => assert_eq!(cma.seed, 99),
            other => panic!("unexpected optimizer {other:?}"),
        }
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = "kind: cma-es\ncma_es:\n  sigma0: 0.05\n";
        let config: OptimizerConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.kind, OptimizerKind::CmaEs);
        assert_eq!(config.cma_es.sigma0, 0.05);
        // unspecified fields fall back to the struct default, not the run default
        assert_eq!(config.cma_es.popsize, None);
        assert_eq!(config.lbfgsb.ftol, 1e-10);
    }
}
