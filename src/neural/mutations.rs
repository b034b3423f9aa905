//! Weight mutation for producing a candidate from a ranked parent.

use super::network::{standard_normal, Controller};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// What happens to an entry chosen for mutation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// Overwrite with a fresh value from U[0, 1)
    Replace,
    /// Overwrite with a fresh standard-normal value
    Resample,
    /// Add standard-normal noise scaled by `strength`
    Perturb { strength: f64 },
}

impl MutationKind {
    #[inline]
    fn apply<R: Rng + ?Sized>(self, value: f64, rng: &mut R) -> f64 {
        match self {
            MutationKind::Replace => rng.gen::<f64>(),
            MutationKind::Resample => standard_normal(rng),
            MutationKind::Perturb { strength } => value + standard_normal(rng) * strength,
        }
    }
}

/// Rate multiplier for parents scoring above `above`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateTier {
    pub above: i64,
    pub factor: f64,
}

/// Absolute mutation count for parents scoring above `above`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CountTier {
    pub above: i64,
    pub count: usize,
}

/// How many entries a parent of a given rank and fitness gets mutated
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationSchedule {
    /// Per array, `floor(size * rate)` entries where the rate comes from
    /// the parent's rank, scaled by the highest fitness tier it reaches
    RankTable {
        rates: Vec<f64>,
        fallback: f64,
        #[serde(default)]
        fitness_tiers: Vec<RateTier>,
    },
    /// A fixed number of entries across all mutable arrays, picked by
    /// the parent's fitness
    FitnessTiered {
        tiers: Vec<CountTier>,
        default_count: usize,
    },
    /// Per array, `floor(size * factor * rank)` entries.
    ///
    /// A factor of zero mutates nothing at any rank, so every candidate
    /// is an exact copy of its parent.
    RankScaled { factor: f64 },
}

impl MutationSchedule {
    /// True when the schedule can never modify an entry
    pub fn is_disabled(&self) -> bool {
        match self {
            MutationSchedule::RankTable {
                rates, fallback, ..
            } => rates.iter().all(|&r| r <= 0.0) && *fallback <= 0.0,
            MutationSchedule::FitnessTiered {
                tiers,
                default_count,
            } => *default_count == 0 && tiers.iter().all(|t| t.count == 0),
            MutationSchedule::RankScaled { factor } => *factor <= 0.0,
        }
    }

    fn rank_rate(&self, rank: usize, fitness: i64) -> f64 {
        match self {
            MutationSchedule::RankTable {
                rates,
                fallback,
                fitness_tiers,
            } => {
                let base = rates.get(rank).copied().unwrap_or(*fallback);
                let factor = fitness_tiers
                    .iter()
                    .filter(|t| fitness > t.above)
                    .max_by_key(|t| t.above)
                    .map_or(1.0, |t| t.factor);
                (base * factor).clamp(0.0, 1.0)
            }
            MutationSchedule::RankScaled { factor } => (factor * rank as f64).clamp(0.0, 1.0),
            MutationSchedule::FitnessTiered { .. } => 0.0,
        }
    }

    /// Entries to mutate in one array of `size` entries (per-array schedules)
    pub fn count_for(&self, size: usize, rank: usize, fitness: i64) -> usize {
        (size as f64 * self.rank_rate(rank, fitness)).floor() as usize
    }

    /// Entries to mutate across all arrays (fitness-tiered schedule)
    pub fn total_count(&self, fitness: i64) -> Option<usize> {
        match self {
            MutationSchedule::FitnessTiered {
                tiers,
                default_count,
            } => Some(
                tiers
                    .iter()
                    .filter(|t| fitness > t.above)
                    .max_by_key(|t| t.above)
                    .map_or(*default_count, |t| t.count),
            ),
            _ => None,
        }
    }
}

/// Configuration for mutation operations
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MutationConfig {
    pub kind: MutationKind,
    pub schedule: MutationSchedule,
    /// Also mutate bias vectors
    #[serde(default)]
    pub mutate_biases: bool,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            kind: MutationKind::Replace,
            schedule: MutationSchedule::RankTable {
                rates: vec![0.01, 0.05, 0.1],
                fallback: 0.05,
                fitness_tiers: Vec::new(),
            },
            mutate_biases: false,
        }
    }
}

impl MutationConfig {
    /// Resampling used by the parametric game: one entry per candidate
    /// whatever the parent's fitness
    pub fn classic() -> Self {
        Self {
            kind: MutationKind::Resample,
            schedule: MutationSchedule::FitnessTiered {
                tiers: Vec::new(),
                default_count: 1,
            },
            mutate_biases: false,
        }
    }

    /// Resampling of 8, 6 or 4 entries as the parent passes 1000 and 2000
    pub fn tiered() -> Self {
        Self {
            kind: MutationKind::Resample,
            schedule: MutationSchedule::FitnessTiered {
                tiers: vec![
                    CountTier {
                        above: 1000,
                        count: 6,
                    },
                    CountTier {
                        above: 2000,
                        count: 4,
                    },
                ],
                default_count: 8,
            },
            mutate_biases: false,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if let MutationSchedule::RankTable { rates, fallback, .. } = &self.schedule {
            if rates.iter().chain(std::iter::once(fallback)).any(|r| !(0.0..=1.0).contains(r)) {
                return Err("mutation rates must be within [0, 1]".to_string());
            }
        }
        if let MutationKind::Perturb { strength } = self.kind {
            if !strength.is_finite() || strength < 0.0 {
                return Err("perturbation strength must be finite and >= 0".to_string());
            }
        }
        Ok(())
    }
}

/// What a mutation pass did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MutationReport {
    /// Entries the schedule asked for
    pub requested: usize,
    /// Entries actually overwritten
    pub modified: usize,
}

/// Mutate `count` distinct entries, chosen uniformly without replacement
fn mutate_entries<R: Rng + ?Sized>(
    entries: &mut [&mut f64],
    count: usize,
    kind: MutationKind,
    rng: &mut R,
) -> usize {
    let count = count.min(entries.len());
    if count == 0 {
        return 0;
    }
    for i in index::sample(rng, entries.len(), count).iter() {
        let entry = &mut *entries[i];
        *entry = kind.apply(*entry, rng);
    }
    count
}

impl Controller {
    /// Mutate in place as a candidate derived from the parent at `rank`
    pub fn mutate<R: Rng + ?Sized>(
        &mut self,
        config: &MutationConfig,
        rank: usize,
        parent_fitness: i64,
        rng: &mut R,
    ) -> MutationReport {
        let mut groups: Vec<Vec<&mut f64>> = vec![
            self.hidden.weights.iter_mut().collect(),
            self.output.weights.iter_mut().collect(),
        ];
        if config.mutate_biases {
            groups.push(self.hidden.biases.iter_mut().collect());
            groups.push(self.output.biases.iter_mut().collect());
        }

        let mut report = MutationReport::default();
        match config.schedule.total_count(parent_fitness) {
            Some(count) => {
                let mut all: Vec<&mut f64> = groups.into_iter().flatten().collect();
                report.requested = count;
                report.modified = mutate_entries(&mut all, count, config.kind, rng);
            }
            None => {
                for mut group in groups {
                    let count = config.schedule.count_for(group.len(), rank, parent_fitness);
                    report.requested += count;
                    report.modified += mutate_entries(&mut group, count, config.kind, rng);
                }
            }
        }

        if report.modified == 0 {
            log::debug!("Mutation left rank {} parent unchanged", rank);
        }
        report
    }
}
