//! Statistics tracking for training runs.

use crate::game::CrashCause;
use serde::{Deserialize, Serialize};

/// Outcome of one training attempt
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub epoch: u64,
    pub attempt: usize,
    /// Rank of the parent the candidate was mutated from, `None` for a
    /// fresh random controller
    pub parent_rank: Option<usize>,
    pub fitness: i64,
    pub ticks: u64,
    pub pipes: u32,
    /// `None` when the episode hit the tick limit
    pub crash: Option<CrashCause>,
    /// Rank the candidate took in the population, if it was kept
    pub inserted_at: Option<usize>,
}

/// Aggregate over the attempts of one epoch
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EpochSummary {
    pub epoch: u64,
    pub attempts: usize,
    pub best: i64,
    pub mean: f64,
    pub worst: i64,
    pub most_pipes: u32,
    /// Best fitness held by the population after the epoch
    pub population_best: i64,
    pub population_size: usize,
}

impl EpochSummary {
    pub fn from_records(epoch: u64, records: &[AttemptRecord], population_best: i64, population_size: usize) -> Self {
        if records.is_empty() {
            return Self {
                epoch,
                population_best,
                population_size,
                ..Self::default()
            };
        }
        let total: i64 = records.iter().map(|r| r.fitness).sum();
        Self {
            epoch,
            attempts: records.len(),
            best: records.iter().map(|r| r.fitness).max().unwrap_or(0),
            mean: total as f64 / records.len() as f64,
            worst: records.iter().map(|r| r.fitness).min().unwrap_or(0),
            most_pipes: records.iter().map(|r| r.pipes).max().unwrap_or(0),
            population_best,
            population_size,
        }
    }

    /// Format as a one-line summary
    pub fn summary(&self) -> String {
        format!(
            "Epoch:{:5} | Best:{:7} | Mean:{:9.1} | Worst:{:7} | Pipes:{:4} | Top:{:7} ({} kept)",
            self.epoch,
            self.best,
            self.mean,
            self.worst,
            self.most_pipes,
            self.population_best,
            self.population_size,
        )
    }
}

/// Historical record of a training session
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub attempts: Vec<AttemptRecord>,
    pub epochs: Vec<EpochSummary>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&mut self, record: AttemptRecord) {
        self.attempts.push(record);
    }

    pub fn record_epoch(&mut self, summary: EpochSummary) {
        self.epochs.push(summary);
    }

    /// Attempts belonging to one epoch
    pub fn attempts_in(&self, epoch: u64) -> impl Iterator<Item = &AttemptRecord> {
        self.attempts.iter().filter(move |r| r.epoch == epoch)
    }

    /// Best attempt fitness per epoch
    pub fn best_series(&self) -> Vec<(u64, i64)> {
        self.epochs.iter().map(|s| (s.epoch, s.best)).collect()
    }

    /// Mean attempt fitness per epoch
    pub fn mean_series(&self) -> Vec<(u64, f64)> {
        self.epochs.iter().map(|s| (s.epoch, s.mean)).collect()
    }

    /// How attempts ended, counted per cause (`None` = tick limit)
    pub fn crash_counts(&self) -> [(Option<CrashCause>, usize); 4] {
        let count = |cause: Option<CrashCause>| self.attempts.iter().filter(|r| r.crash == cause).count();
        [
            (Some(CrashCause::Pipe), count(Some(CrashCause::Pipe))),
            (Some(CrashCause::Floor), count(Some(CrashCause::Floor))),
            (Some(CrashCause::Ceiling), count(Some(CrashCause::Ceiling))),
            (None, count(None)),
        ]
    }

    /// Save history to file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Load history from file
    pub fn load(path: &str) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(epoch: u64, attempt: usize, fitness: i64, pipes: u32, crash: Option<CrashCause>) -> AttemptRecord {
        AttemptRecord {
            epoch,
            attempt,
            parent_rank: None,
            fitness,
            ticks: fitness.max(0) as u64,
            pipes,
            crash,
            inserted_at: None,
        }
    }

    #[test]
    fn test_epoch_summary() {
        let records = vec![
            record(1, 0, 40, 0, Some(CrashCause::Floor)),
            record(1, 1, 620, 1, Some(CrashCause::Pipe)),
            record(1, 2, 100, 0, Some(CrashCause::Ceiling)),
        ];
        let summary = EpochSummary::from_records(1, &records, 900, 8);
        assert_eq!(summary.best, 620);
        assert_eq!(summary.worst, 40);
        assert_eq!(summary.mean, 760.0 / 3.0);
        assert_eq!(summary.most_pipes, 1);
        assert!(summary.summary().contains("Best:    620"));
    }

    #[test]
    fn test_empty_epoch() {
        let summary = EpochSummary::from_records(3, &[], 10, 1);
        assert_eq!(summary.attempts, 0);
        assert_eq!(summary.mean, 0.0);
        assert_eq!(summary.population_best, 10);
    }

    #[test]
    fn test_history_series_and_counts() {
        let mut history = TrainingHistory::new();
        for epoch in 0..3 {
            let records: Vec<_> = (0..4)
                .map(|a| record(epoch, a, (epoch as i64 + 1) * 10 + a as i64, 0, Some(CrashCause::Floor)))
                .collect();
            for r in &records {
                history.record_attempt(r.clone());
            }
            history.record_epoch(EpochSummary::from_records(epoch, &records, 0, 4));
        }
        history.record_attempt(record(3, 0, 5000, 9, None));

        assert_eq!(history.best_series(), vec![(0, 13), (1, 23), (2, 33)]);
        assert_eq!(history.mean_series(), vec![(0, 11.5), (1, 21.5), (2, 31.5)]);
        assert_eq!(history.attempts_in(1).count(), 4);
        let counts = history.crash_counts();
        assert_eq!(counts[1], (Some(CrashCause::Floor), 12));
        assert_eq!(counts[3], (None, 1));
    }

    #[test]
    fn test_history_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let path = path.to_str().unwrap();

        let mut history = TrainingHistory::new();
        history.record_attempt(record(0, 0, 77, 0, Some(CrashCause::Pipe)));
        history.save(path).unwrap();

        let loaded = TrainingHistory::load(path).unwrap();
        assert_eq!(loaded.attempts, history.attempts);
    }
}
