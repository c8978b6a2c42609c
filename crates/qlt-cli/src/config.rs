//! Experiment configuration.
//!
//! Supports loading configuration from:
//! 1. A YAML file (`--config`, or `~/.qlt/config.yaml` when present)
//! 2. Environment variables with the `QLT_` prefix
//!
//! Precedence (highest to lowest): environment, file, defaults. Every field
//! has a default, so a file only needs the values it changes.

use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use qlt_models::circuits::COMPILING_PARAMETER_PERIOD;
use qlt_models::problems::{Boundary, TargetDistribution};
use qlt_optimize::OptimizerConfig;
use qlt_prune::PruningRule;

/// Result cache directory override.
pub const ENV_DATA_DIR: &str = "QLT_DATA_DIR";
/// Run-log directory override.
pub const ENV_RUNS_DIR: &str = "QLT_RUNS_DIR";
/// Run-log switch (`1`/`true`/`on` or `0`/`false`/`off`).
pub const ENV_TRACKING: &str = "QLT_TRACKING";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Uniform initialization range, in units of the parameter period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitRange {
    pub low: f64,
    pub high: f64,
}

impl InitRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Absolute bounds for a given period.
    pub fn bounds(&self, period: f64) -> (f64, f64) {
        (self.low * period, self.high * period)
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if !(self.low.is_finite() && self.high.is_finite() && self.low < self.high) {
            return Err(ConfigError::Validation(format!(
                "{name}.initialization: low ({}) must be below high ({})",
                self.low, self.high
            )));
        }
        Ok(())
    }
}

/// Which J1-J2 ansatz to train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum J1j2Ansatz {
    /// Shared angles per layer.
    #[default]
    Alternating,
    /// Independent angles per pair plus an Rx layer.
    Full,
}

impl J1j2Ansatz {
    /// Directory name in the result tree.
    pub fn dir_name(&self) -> &'static str {
        match self {
            J1j2Ansatz::Alternating => "alternating_ansatz",
            J1j2Ansatz::Full => "full_ansatz",
        }
    }
}

/// Complete experiment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Root of the JSON result caches.
    pub data_dir: PathBuf,
    /// Root of the JSONL run logs.
    pub runs_dir: PathBuf,
    /// Whether optimizations write run logs.
    pub tracking: bool,
    /// Trials per (qubits, layers).
    pub trials: usize,
    pub optimizer: OptimizerConfig,
    pub lottery: LotteryConfig,
    pub vqe_j1j2: J1j2Config,
    pub vqe_tfim: TfimConfig,
    pub qcbm: QcbmConfig,
    pub compiling: CompilingConfig,
    pub overparam: OverparamConfig,
    pub weight_decay_sweep: WeightDecaySweepConfig,
}

/// Lottery-ticket protocol settings shared by all problems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotteryConfig {
    /// Upper ends of the displacement noise, as fractions of the period.
    pub displacements: Vec<f64>,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            displacements: vec![1.0 / 128.0, 1.0 / 32.0, 1.0 / 8.0, 1.0 / 2.0],
        }
    }
}

/// J1-J2 Heisenberg chain VQE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct J1j2Config {
    pub project: String,
    pub j1: f64,
    pub j2: f64,
    pub ansatz: J1j2Ansatz,
    pub pruning: PruningRule,
    pub weight_decay: f64,
    pub period: f64,
    pub initialization: InitRange,
}

impl Default for J1j2Config {
    fn default() -> Self {
        Self {
            project: "QLT-VQE-J1J2-v0.12".to_string(),
            j1: 1.0,
            j2: 1.25,
            ansatz: J1j2Ansatz::default(),
            pruning: PruningRule::Percentage { fraction: 0.9 },
            weight_decay: 0.0,
            period: 2.0 * PI,
            initialization: InitRange::new(-0.5, 0.5),
        }
    }
}

/// Transverse-field Ising VQE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TfimConfig {
    pub project: String,
    /// Transverse field `h`.
    pub field: f64,
    pub boundary: Boundary,
    pub pruning: PruningRule,
    pub weight_decay: f64,
    pub period: f64,
    pub initialization: InitRange,
}

impl Default for TfimConfig {
    fn default() -> Self {
        Self {
            project: "QLT-VQE-TFIM-v0.4".to_string(),
            field: 1.0,
            boundary: Boundary::Open,
            pruning: PruningRule::Cutoff {
                cutoff: 0.025 * 2.0 * PI,
            },
            weight_decay: 50.0,
            period: 2.0 * PI,
            initialization: InitRange::new(0.0, 1.0),
        }
    }
}

/// Quantum circuit Born machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcbmConfig {
    pub project: String,
    pub target: TargetDistribution,
    pub pruning: PruningRule,
    pub weight_decay: f64,
    pub period: f64,
    pub initialization: InitRange,
    /// Estimate probabilities from this many shots instead of exactly.
    pub samples: Option<usize>,
    pub sweep: QcbmSweepConfig,
}

impl Default for QcbmConfig {
    fn default() -> Self {
        Self {
            project: "QLT-QCBM-v0.15".to_string(),
            target: TargetDistribution::default(),
            pruning: PruningRule::Percentage { fraction: 0.9 },
            weight_decay: 0.0,
            period: 2.0 * PI,
            initialization: InitRange::new(-0.5, 0.5),
            samples: None,
            sweep: QcbmSweepConfig::default(),
        }
    }
}

/// Pruning-percentage sweep for the QCBM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcbmSweepConfig {
    pub project: String,
    pub target: TargetDistribution,
    pub initialization: InitRange,
    pub percentages: Vec<f64>,
}

impl Default for QcbmSweepConfig {
    fn default() -> Self {
        Self {
            project: "QLT-QCBM-find-pruning-percentage-v0.1".to_string(),
            target: TargetDistribution::UniformRandom,
            initialization: InitRange::new(-1.0, 1.0),
            percentages: vec![0.05, 0.1, 0.15, 0.2, 0.4, 0.6, 0.8, 0.9, 0.95],
        }
    }
}

/// Two-qubit quantum compiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilingConfig {
    pub project: String,
    pub pruning: PruningRule,
    pub initialization: InitRange,
}

impl Default for CompilingConfig {
    fn default() -> Self {
        Self {
            project: "QLT-PoC-v0.2".to_string(),
            pruning: PruningRule::Cutoff { cutoff: 1e-2 },
            initialization: InitRange::new(-1.0, 1.0),
        }
    }
}

impl CompilingConfig {
    /// Period of every compiling parameter.
    pub fn period(&self) -> f64 {
        COMPILING_PARAMETER_PERIOD
    }
}

/// Unpruned training over growing depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverparamConfig {
    pub project: String,
}

impl Default for OverparamConfig {
    fn default() -> Self {
        Self {
            project: "VQE-overparameterization".to_string(),
        }
    }
}

/// Weight-decay hyperparameter sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightDecaySweepConfig {
    pub project: String,
    pub values: Vec<f64>,
}

impl Default for WeightDecaySweepConfig {
    fn default() -> Self {
        Self {
            project: "VQE-weight-decay".to_string(),
            values: vec![1e-8, 1e-7, 1e-6, 1e-5, 1e-4, 1e-3, 1e-2, 1e-1, 1e0, 1e1],
        }
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            runs_dir: PathBuf::from("runs"),
            tracking: true,
            trials: 10,
            optimizer: OptimizerConfig::default(),
            lottery: LotteryConfig::default(),
            vqe_j1j2: J1j2Config::default(),
            vqe_tfim: TfimConfig::default(),
            qcbm: QcbmConfig::default(),
            compiling: CompilingConfig::default(),
            overparam: OverparamConfig::default(),
            weight_decay_sweep: WeightDecaySweepConfig::default(),
        }
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn validate_period(name: &str, period: f64) -> Result<(), ConfigError> {
    if period.is_finite() && period > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{name}.period must be positive, got {period}"
        )))
    }
}

fn validate_weight_decay(name: &str, weight_decay: f64) -> Result<(), ConfigError> {
    if weight_decay.is_finite() && weight_decay >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{name}.weight_decay must be non-negative, got {weight_decay}"
        )))
    }
}

fn validate_pruning(name: &str, rule: &PruningRule) -> Result<(), ConfigError> {
    rule.validate()
        .map_err(|e| ConfigError::Validation(format!("{name}.pruning: {e}")))
}

impl ExperimentConfig {
    /// Default location, `~/.qlt/config.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".qlt").join("config.yaml"))
    }

    /// Parse a YAML file and validate it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config: ExperimentConfig = serde_yaml_ng::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, else the default file if it exists, else the defaults;
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => {
                    debug!("Loading configuration from {}", path.display());
                    Self::from_file(path)?
                }
                None => Self::default(),
            },
        };

        let config = config.merge_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `QLT_*` variables from the process environment.
    pub fn merge_env(self) -> Self {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up through `var`.
    pub fn merge_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = var(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = var(ENV_RUNS_DIR) {
            self.runs_dir = PathBuf::from(v);
        }
        if let Some(v) = var(ENV_TRACKING) {
            match parse_switch(&v) {
                Some(on) => self.tracking = on,
                None => warn!("Ignoring {}={:?}: expected a boolean", ENV_TRACKING, v),
            }
        }
        self
    }

    /// Render as YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trials == 0 {
            return Err(ConfigError::Validation(
                "trials must be greater than 0".to_string(),
            ));
        }

        if let Some(d) = self
            .lottery
            .displacements
            .iter()
            .find(|d| !(d.is_finite() && **d > 0.0))
        {
            return Err(ConfigError::Validation(format!(
                "lottery.displacements must be positive, got {d}"
            )));
        }

        let j1j2 = &self.vqe_j1j2;
        validate_period("vqe_j1j2", j1j2.period)?;
        validate_weight_decay("vqe_j1j2", j1j2.weight_decay)?;
        validate_pruning("vqe_j1j2", &j1j2.pruning)?;
        j1j2.initialization.validate("vqe_j1j2")?;

        let tfim = &self.vqe_tfim;
        validate_period("vqe_tfim", tfim.period)?;
        validate_weight_decay("vqe_tfim", tfim.weight_decay)?;
        validate_pruning("vqe_tfim", &tfim.pruning)?;
        tfim.initialization.validate("vqe_tfim")?;

        let qcbm = &self.qcbm;
        validate_period("qcbm", qcbm.period)?;
        validate_weight_decay("qcbm", qcbm.weight_decay)?;
        validate_pruning("qcbm", &qcbm.pruning)?;
        qcbm.initialization.validate("qcbm")?;
        qcbm.sweep.initialization.validate("qcbm.sweep")?;
        if qcbm.samples == Some(0) {
            return Err(ConfigError::Validation(
                "qcbm.samples must be greater than 0".to_string(),
            ));
        }
        for &fraction in &qcbm.sweep.percentages {
            validate_pruning("qcbm.sweep", &PruningRule::Percentage { fraction })?;
        }

        validate_pruning("compiling", &self.compiling.pruning)?;
        self.compiling.initialization.validate("compiling")?;

        for &value in &self.weight_decay_sweep.values {
            validate_weight_decay("weight_decay_sweep", value)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExperimentConfig::default();
        config.validate().unwrap();
        assert_eq!(config.trials, 10);
        assert_eq!(config.vqe_j1j2.j2, 1.25);
        assert_eq!(config.lottery.displacements.len(), 4);
        assert_eq!(config.qcbm.sweep.percentages.len(), 9);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = ExperimentConfig::default();
        let yaml = config.to_yaml().unwrap();
        let parsed: ExperimentConfig = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r"
trials: 3
vqe_j1j2:
  j2: 0.5
  pruning:
    rule: cutoff
    cutoff: 0.01
";
        let config: ExperimentConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.trials, 3);
        assert_eq!(config.vqe_j1j2.j2, 0.5);
        assert_eq!(config.vqe_j1j2.j1, 1.0);
        assert_eq!(
            config.vqe_j1j2.pruning,
            PruningRule::Cutoff { cutoff: 0.01 }
        );
        assert_eq!(config.qcbm, QcbmConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = ExperimentConfig::default().merge_vars(|key| match key {
            ENV_DATA_DIR => Some("/tmp/qlt-data".to_string()),
            ENV_TRACKING => Some("off".to_string()),
            _ => None,
        });
        assert_eq!(config.data_dir, PathBuf::from("/tmp/qlt-data"));
        assert_eq!(config.runs_dir, PathBuf::from("runs"));
        assert!(!config.tracking);
    }

    #[test]
    fn test_bad_tracking_value_is_ignored() {
        let config =
            ExperimentConfig::default().merge_vars(|key| (key == ENV_TRACKING).then(|| "maybe".into()));
        assert!(config.tracking);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ExperimentConfig::default();
        config.trials = 0;
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.vqe_tfim.period = -1.0;
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.qcbm.pruning = PruningRule::Percentage { fraction: 1.5 };
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.compiling.initialization = InitRange::new(1.0, -1.0);
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.lottery.displacements.push(0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "tracking: false\nqcbm:\n  samples: 1000\n").unwrap();
        let config = ExperimentConfig::from_file(&path).unwrap();
        assert!(!config.tracking);
        assert_eq!(config.qcbm.samples, Some(1000));

        fs::write(&path, "trials: [1, 2]\n").unwrap();
        assert!(matches!(
            ExperimentConfig::from_file(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_init_range_bounds() {
        let (lo, hi) = InitRange::new(-0.5, 0.5).bounds(2.0 * PI);
        assert_eq!(lo, -PI);
        assert_eq!(hi, PI);
    }
}
