//! JSON result caches.
//!
//! Every experiment keeps its results in one JSON file that is rewritten
//! after each finished optimization, so an interrupted run resumes where
//! it stopped. Writes go to a sibling temp file first and are renamed into
//! place.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHasher;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of one optimization stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Starting point, in unpruned coordinates of this stage.
    pub initial_parameters: Vec<f64>,
    /// Trial seed.
    pub seed: u64,
    /// Final cost.
    pub energy: f64,
    pub optimal_parameters: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pruned_indices: Option<Vec<usize>>,
    /// QCBM target drawn for the trial.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_distribution: Option<Vec<f64>>,
    /// Compiling target angles drawn for the trial.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_parameters: Option<Vec<f64>>,
    #[serde(default)]
    pub number_of_evaluations: usize,
}

/// A stage, or a named group of stages (pruning sweeps group by percentage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrialEntry {
    Stage(StageRecord),
    Group(BTreeMap<String, StageRecord>),
}

/// All stages of one trial, by stage key.
pub type Trial = BTreeMap<String, TrialEntry>;

/// Where a trial lives in a lottery cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialLocation {
    pub qubits: usize,
    pub layers: usize,
    pub trial: usize,
}

/// `{ "<qubits>": { "<layers>": [ trial, ... ] } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotteryData(pub BTreeMap<String, BTreeMap<String, Vec<Trial>>>);

impl LotteryData {
    /// Trials stored for `(qubits, layers)`.
    pub fn trials(&self, qubits: usize, layers: usize) -> &[Trial] {
        self.0
            .get(&qubits.to_string())
            .and_then(|by_layers| by_layers.get(&layers.to_string()))
            .map_or(&[], Vec::as_slice)
    }

    /// The trial at `at`, created empty (with any missing predecessors) if needed.
    pub fn trial_mut(&mut self, at: TrialLocation) -> &mut Trial {
        let trials = self
            .0
            .entry(at.qubits.to_string())
            .or_default()
            .entry(at.layers.to_string())
            .or_default();
        if trials.len() <= at.trial {
            trials.resize_with(at.trial + 1, Trial::new);
        }
        &mut trials[at.trial]
    }

    /// The stage `key` of the trial at `at`.
    pub fn stage(&self, at: TrialLocation, key: &str) -> Option<&StageRecord> {
        match self.trials(at.qubits, at.layers).get(at.trial)?.get(key)? {
            TrialEntry::Stage(record) => Some(record),
            TrialEntry::Group(_) => None,
        }
    }

    /// The stage `key` inside group `group` of the trial at `at`.
    pub fn group_stage(&self, at: TrialLocation, group: &str, key: &str) -> Option<&StageRecord> {
        match self.trials(at.qubits, at.layers).get(at.trial)?.get(group)? {
            TrialEntry::Group(stages) => stages.get(key),
            TrialEntry::Stage(_) => None,
        }
    }

    pub fn insert_stage(&mut self, at: TrialLocation, key: &str, record: StageRecord) {
        self.trial_mut(at)
            .insert(key.to_string(), TrialEntry::Stage(record));
    }

    /// Insert into a group, replacing a plain stage stored under `group`.
    pub fn insert_group_stage(
        &mut self,
        at: TrialLocation,
        group: &str,
        key: &str,
        record: StageRecord,
    ) {
        let entry = self
            .trial_mut(at)
            .entry(group.to_string())
            .or_insert_with(|| TrialEntry::Group(BTreeMap::new()));
        if let TrialEntry::Stage(_) = entry {
            *entry = TrialEntry::Group(BTreeMap::new());
        }
        if let TrialEntry::Group(stages) = entry {
            stages.insert(key.to_string(), record);
        }
    }
}

/// Repeated unpruned optimizations at one depth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverparamRecord {
    pub energies: Vec<f64>,
    pub optimal_parameter_vectors: Vec<Vec<f64>>,
}

/// Repeated optimizations at one weight decay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightDecayRecord {
    pub costs: Vec<f64>,
    pub optimal_parameter_vectors: Vec<Vec<f64>>,
    #[serde(default)]
    pub number_of_evaluations: Vec<usize>,
    /// Unpenalized energies, filled in by `add-energies`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub energies: Vec<f64>,
}

/// Per-qubit-count block: the exact ground energy plus one entry per key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QubitBlock<T> {
    /// Zero until a run recomputes it.
    #[serde(default)]
    pub ground_state_energy: f64,
    #[serde(flatten)]
    pub entries: BTreeMap<String, T>,
}

/// `{ "<qubits>": { "ground_state_energy": e0, "<layers>": record } }`.
pub type OverparamData = BTreeMap<String, QubitBlock<OverparamRecord>>;

/// `{ "<qubits>": { "ground_state_energy": e0, "<layers>": { "<wd>": record } } }`.
pub type WeightDecayData = BTreeMap<String, QubitBlock<BTreeMap<String, WeightDecayRecord>>>;

/// A JSON file holding `T`, loaded once and saved after each change.
#[derive(Debug)]
pub struct ResultCache<T> {
    path: PathBuf,
    data: T,
}

impl<T: Serialize + DeserializeOwned + Default> ResultCache<T> {
    /// Load `path`, or start empty if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read result cache: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Malformed result cache: {}", path.display()))?
        } else {
            debug!("Starting new result cache at {}", path.display());
            T::default()
        };
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    pub fn into_data(self) -> T {
        self.data
    }

    /// Write the cache to disk.
    pub fn save(&self) -> Result<()> {
        write_json_atomic(&self.path, &self.data)
    }
}

/// Serialize `value` to `path` through a temp file and a rename.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    let mut f = File::create(&tmp)
        .with_context(|| format!("Failed to create file: {}", tmp.display()))?;
    f.write_all(serde_json::to_string(value)?.as_bytes())?;
    f.flush()?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to write result cache: {}", path.display()))?;
    Ok(())
}

/// Seed of a lottery trial.
pub fn trial_seed(layers: usize, trial: usize) -> u64 {
    1234 + 17 * layers as u64 + 23 * trial as u64
}

/// Seed of an unpruned repetition in the depth and weight-decay studies.
pub fn repetition_seed(qubits: usize, layers: usize, trial: usize) -> u64 {
    123 * qubits as u64 + 97 * layers as u64 + trial as u64
}

/// Seed for stage `key` of the trial seeded with `seed`.
///
/// Each stage gets its own stream, so rerunning a single missing stage
/// draws the same numbers as a full run.
pub fn stage_seed(seed: u64, key: &str) -> u64 {
    let mut hasher = FxHasher::default();
    key.hash(&mut hasher);
    seed.wrapping_mul(0x9e37_79b9_7f4a_7c15) ^ hasher.finish()
}

/// RNG for stage `key` of the trial seeded with `seed`.
pub fn stage_rng(seed: u64, key: &str) -> StdRng {
    StdRng::seed_from_u64(stage_seed(seed, key))
}
