//! Per-evaluation run tracking.
//!
//! Every optimization is one run. A [`JsonlTracker`] writes the run as a
//! JSON Lines file: a header record with the run configuration, one record
//! per cost evaluation and a closing record.

use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::CostResult;
use crate::metrics::Metrics;

/// Receives the metrics of each cost evaluation.
pub trait Tracker {
    /// Record one evaluation.
    fn log(&mut self, metrics: &Metrics) -> CostResult<()>;

    /// Close the run.
    fn finish(&mut self) -> CostResult<()>;
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTracker;

impl Tracker for NullTracker {
    fn log(&mut self, _metrics: &Metrics) -> CostResult<()> {
        Ok(())
    }

    fn finish(&mut self) -> CostResult<()> {
        Ok(())
    }
}

impl<T: Tracker + ?Sized> Tracker for Box<T> {
    fn log(&mut self, metrics: &Metrics) -> CostResult<()> {
        (**self).log(metrics)
    }

    fn finish(&mut self) -> CostResult<()> {
        (**self).finish()
    }
}

#[derive(Debug, Default)]
struct MemoryLog {
    records: Vec<Metrics>,
    finished: bool,
}

/// Keeps logged metrics in memory.
///
/// Clones share the same log, so a clone handed to a cost function can be
/// inspected through the original.
#[derive(Debug, Clone, Default)]
pub struct MemoryTracker {
    log: Rc<RefCell<MemoryLog>>,
}

impl MemoryTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// All metrics logged so far.
    pub fn records(&self) -> Vec<Metrics> {
        self.log.borrow().records.clone()
    }

    /// Number of logged evaluations.
    pub fn len(&self) -> usize {
        self.log.borrow().records.len()
    }

    /// Whether nothing was logged.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether [`Tracker::finish`] was called.
    pub fn is_finished(&self) -> bool {
        self.log.borrow().finished
    }
}

impl Tracker for MemoryTracker {
    fn log(&mut self, metrics: &Metrics) -> CostResult<()> {
        self.log.borrow_mut().records.push(metrics.clone());
        Ok(())
    }

    fn finish(&mut self) -> CostResult<()> {
        self.log.borrow_mut().finished = true;
        Ok(())
    }
}

/// One line of a run file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunRecord {
    /// First line: who, when, and with which configuration.
    Run {
        /// Unique run identifier.
        run_id: Uuid,
        /// Project the run belongs to.
        project: String,
        /// Creation time.
        started_at: DateTime<Utc>,
        /// Free-form run configuration.
        config: serde_json::Value,
    },
    /// One cost evaluation.
    Log {
        /// Zero-based evaluation index.
        step: usize,
        /// Time of the evaluation.
        timestamp: DateTime<Utc>,
        /// Logged metrics.
        metrics: Metrics,
    },
    /// Last line.
    Finish {
        /// Completion time.
        finished_at: DateTime<Utc>,
        /// Number of logged evaluations.
        steps: usize,
    },
}

/// Writes a run to `<dir>/<project>/<run id>.jsonl`.
pub struct JsonlTracker {
    path: PathBuf,
    writer: BufWriter<File>,
    run_id: Uuid,
    steps: usize,
    finished: bool,
}

impl JsonlTracker {
    /// Start a new run and write its header.
    pub fn create(
        dir: impl AsRef<Path>,
        project: &str,
        config: serde_json::Value,
    ) -> CostResult<Self> {
        let project_dir = dir.as_ref().join(project);
        fs::create_dir_all(&project_dir)?;

        let run_id = Uuid::new_v4();
        let path = project_dir.join(format!("{run_id}.jsonl"));
        let writer = BufWriter::new(File::create(&path)?);

        let mut tracker = Self {
            path,
            writer,
            run_id,
            steps: 0,
            finished: false,
        };
        tracker.write(&RunRecord::Run {
            run_id,
            project: project.to_string(),
            started_at: Utc::now(),
            config,
        })?;
        debug!("Started run {} at {}", run_id, tracker.path.display());
        Ok(tracker)
    }

    /// Identifier of this run.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// File the run is written to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&mut self, record: &RunRecord) -> CostResult<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl Tracker for JsonlTracker {
    fn log(&mut self, metrics: &Metrics) -> CostResult<()> {
        self.write(&RunRecord::Log {
            step: self.steps,
            timestamp: Utc::now(),
            metrics: metrics.clone(),
        })?;
        self.steps += 1;
        Ok(())
    }

    fn finish(&mut self) -> CostResult<()> {
        if self.finished {
            return Ok(());
        }
        self.write(&RunRecord::Finish {
            finished_at: Utc::now(),
            steps: self.steps,
        })?;
        self.writer.flush()?;
        self.finished = true;
        debug!("Finished run {} after {} steps", self.run_id, self.steps);
        Ok(())
    }
}

/// Read every record of a run file.
pub fn read_run(path: impl AsRef<Path>) -> CostResult<Vec<RunRecord>> {
    let content = fs::read_to_string(path)?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| Ok(serde_json::from_str(line)?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_tracker_shares_log() {
        let tracker = MemoryTracker::new();
        let mut handle = tracker.clone();
        handle.log(&[("Energy", 1.0)].into_iter().collect()).unwrap();
        handle.finish().unwrap();
        assert_eq!(tracker.len(), 1);
        assert!(tracker.is_finished());
    }

    #[test]
    fn test_jsonl_tracker_writes_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker =
            JsonlTracker::create(dir.path(), "QLT-Test", serde_json::json!({"trial": 3})).unwrap();
        let run_id = tracker.run_id();
        tracker.log(&[("Cost", 0.5)].into_iter().collect()).unwrap();
        tracker.log(&[("Cost", 0.25)].into_iter().collect()).unwrap();
        tracker.finish().unwrap();
        tracker.finish().unwrap();

        let path = dir.path().join("QLT-Test").join(format!("{run_id}.jsonl"));
        assert_eq!(tracker.path(), path.as_path());

        let records = read_run(&path).unwrap();
        assert_eq!(records.len(), 4);
        match &records[0] {
            RunRecord::Run { project, config, .. } => {
                assert_eq!(project, "QLT-Test");
                assert_eq!(config["trial"], 3);
            }
            other => panic!("unexpected header {other:?}"),
        }
        match &records[2] {
            RunRecord::Log { step, metrics, .. } => {
                assert_eq!(*step, 1);
                assert_eq!(metrics.get("Cost"), Some(0.25));
            }
            other => panic!("unexpected record {other:?}"),
        }
        assert!(matches!(records[3], RunRecord::Finish { steps: 2, .. }));
    }
}
