//! Scalar telemetry
//!
//! The training loop reports named scalars keyed by the global step. Sinks
//! decide where they go: a JSON-lines file for real runs, memory for tests.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rlkit_core::Result;

/// Scalar names emitted once per step
pub mod keys {
    /// Smallest element of the clamped joint action
    pub const ACTION_MIN: &str = "action_min";
    /// Mean of the clamped joint action
    pub const ACTION_MEAN: &str = "action_mean";
    /// Largest element of the clamped joint action
    pub const ACTION_MAX: &str = "action_max";
    /// Wall-clock seconds spent in the step
    pub const STEP_TIME: &str = "step_time";
    /// Reward of this step
    pub const EPISODIC_REWARD: &str = "episodic_reward";
    /// Reward summed since the episode began
    pub const EPISODIC_SUM_REWARD: &str = "episodic_sum_reward";
    /// Local step counter
    pub const EPISODE_LENGTH: &str = "episode_length";

    /// All per-step keys, in emission order
    pub const STEP_KEYS: [&str; 7] = [
        ACTION_MIN,
        ACTION_MEAN,
        ACTION_MAX,
        STEP_TIME,
        EPISODIC_REWARD,
        EPISODIC_SUM_REWARD,
        EPISODE_LENGTH,
    ];
}

/// One recorded scalar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarRecord {
    /// Scalar name
    pub name: String,
    /// Value
    pub value: f64,
    /// Global step it belongs to
    pub step: u64,
    /// Seconds since the Unix epoch
    pub wall_time: f64,
}

impl ScalarRecord {
    fn now(name: &str, value: f64, step: u64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let wall_time = Utc::now().timestamp_micros() as f64 / 1e6;
        Self {
            name: name.to_string(),
            value,
            step,
            wall_time,
        }
    }
}

/// Destination for scalar telemetry
pub trait ScalarSink: Send {
    /// Record `value` under `name` at `step`
    fn add_scalar(&mut self, name: &str, value: f64, step: u64) -> Result<()>;

    /// Push buffered records to their destination
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: ScalarSink + ?Sized> ScalarSink for Box<S> {
    fn add_scalar(&mut self, name: &str, value: f64, step: u64) -> Result<()> {
        (**self).add_scalar(name, value, step)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Appends one JSON object per scalar to a file
#[derive(Debug)]
pub struct JsonlScalarWriter {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonlScalarWriter {
    /// Open `path` for appending, creating parent directories
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// File being written
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScalarSink for JsonlScalarWriter {
    fn add_scalar(&mut self, name: &str, value: f64, step: u64) -> Result<()> {
        let line = serde_json::to_string(&ScalarRecord::now(name, value, step))?;
        writeln!(self.writer, "{line}")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for JsonlScalarWriter {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Keeps every scalar in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Records in arrival order
    pub records: Vec<ScalarRecord>,
}

impl MemorySink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Values recorded under `name`, with their steps
    #[must_use]
    pub fn series(&self, name: &str) -> Vec<(u64, f64)> {
        self.records
            .iter()
            .filter(|r| r.name == name)
            .map(|r| (r.step, r.value))
            .collect()
    }
}

impl ScalarSink for MemorySink {
    fn add_scalar(&mut self, name: &str, value: f64, step: u64) -> Result<()> {
        self.records.push(ScalarRecord::now(name, value, step));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsonl_lines_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train_log").join("scalars.jsonl");

        let mut sink = JsonlScalarWriter::create(&path).unwrap();
        sink.add_scalar(keys::STEP_TIME, 0.25, 1).unwrap();
        sink.add_scalar(keys::EPISODE_LENGTH, 1.0, 1).unwrap();
        sink.flush().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let records: Vec<ScalarRecord> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "step_time");
        assert_eq!(records[1].step, 1);
        assert!(records[0].wall_time > 0.0);
    }

    #[test]
    fn test_jsonl_appends_across_writers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scalars.jsonl");
        for step in 0..2 {
            let mut sink = JsonlScalarWriter::create(&path).unwrap();
            sink.add_scalar("x", 1.0, step).unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_memory_series() {
        let mut sink = MemorySink::new();
        sink.add_scalar("a", 1.0, 1).unwrap();
        sink.add_scalar("b", 2.0, 1).unwrap();
        sink.add_scalar("a", 3.0, 2).unwrap();
        assert_eq!(sink.series("a"), vec![(1, 1.0), (2, 3.0)]);
    }
}
