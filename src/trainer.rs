//! Training session: play episodes, score them, keep the best.
//!
//! Each attempt takes a parent from the population (or a fresh random
//! controller), mutates a copy, plays one episode and offers the scored
//! snapshot back to the population. All randomness comes from the
//! session seed, so the same seed and configuration replay the same run.

use crate::checkpoint::{Checkpoint, CheckpointError, CheckpointStore};
use crate::clock::FrameClock;
use crate::config::Config;
use crate::encoder::{Encoder, StateEncoder};
use crate::fitness::{FitnessScheme, FitnessTracker};
use crate::game::{CrashCause, Game, PhysicsConfig};
use crate::neural::{Controller, ControllerShape, ShapeError};
use crate::population::{Population, ThoughtProcess};
use crate::stats::{AttemptRecord, EpochSummary, TrainingHistory};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::fmt;

/// How an episode ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EpisodeEnd {
    Crashed(CrashCause),
    TimeLimit,
}

impl EpisodeEnd {
    pub fn crash(&self) -> Option<CrashCause> {
        match self {
            EpisodeEnd::Crashed(cause) => Some(*cause),
            EpisodeEnd::TimeLimit => None,
        }
    }
}

/// Result of playing one episode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EpisodeReport {
    pub fitness: i64,
    pub ticks: u64,
    pub pipes: u32,
    pub end: EpisodeEnd,
}

/// Plays single episodes with a fixed game and scoring setup
#[derive(Clone, Debug)]
pub struct EpisodeRunner {
    physics: PhysicsConfig,
    fitness: FitnessScheme,
    max_ticks: Option<u64>,
    encoder: Encoder,
    inputs: Vec<f64>,
}

impl EpisodeRunner {
    pub fn new(config: &Config) -> Self {
        let physics = config.game.clone();
        let encoder = Encoder::from_kind(&config.network.encoder, physics.win_width, physics.win_height);
        Self {
            inputs: Vec::with_capacity(encoder.input_size()),
            encoder,
            physics,
            fitness: config.fitness.clone(),
            max_ticks: config.training.max_ticks,
        }
    }

    pub fn input_size(&self) -> usize {
        self.encoder.input_size()
    }

    /// Play until the bird crashes or the tick limit is hit
    pub fn run(&mut self, controller: &Controller, game_seed: u64, clock: &mut FrameClock) -> EpisodeReport {
        let mut game = Game::new(self.physics.clone(), game_seed);
        let mut tracker = FitnessTracker::new(self.fitness.clone());

        let end = loop {
            if self.max_ticks.is_some_and(|limit| game.tick >= limit) {
                break EpisodeEnd::TimeLimit;
            }
            clock.tick();

            self.encoder.encode(&game, &mut self.inputs);
            let jump = controller.decide(&self.inputs);
            let outcome = game.step(jump);

            let distances = game.distances();
            tracker.record_tick(outcome.crash.is_none(), outcome.pipes_passed, distances.as_ref());

            if let Some(cause) = outcome.crash {
                break EpisodeEnd::Crashed(cause);
            }
        };

        EpisodeReport {
            fitness: tracker.finish(),
            ticks: game.tick,
            pipes: game.score,
            end,
        }
    }
}

/// Errors that can stop a training session
#[derive(Debug)]
pub enum TrainingError {
    Config(String),
    Checkpoint(CheckpointError),
    Io(std::io::Error),
}

impl fmt::Display for TrainingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            Self::Checkpoint(e) => write!(f, "Checkpoint error: {}", e),
            Self::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for TrainingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Checkpoint(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Config(_) => None,
        }
    }
}

impl From<CheckpointError> for TrainingError {
    fn from(e: CheckpointError) -> Self {
        Self::Checkpoint(e)
    }
}

impl From<ShapeError> for TrainingError {
    fn from(e: ShapeError) -> Self {
        Self::Checkpoint(CheckpointError::Shape(e))
    }
}

impl From<std::io::Error> for TrainingError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// RNG for one epoch, independent of how many draws earlier epochs made
fn epoch_rng(seed: u64, epoch: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(epoch);
    rng
}

/// Seed of the `index`-th episode derived from `seed`
pub fn episode_seed(seed: u64, index: u64) -> u64 {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0x5EED_B12D);
    rng.set_stream(index);
    rng.gen()
}

/// All state of a training run
pub struct TrainingSession {
    config: Config,
    shape: ControllerShape,
    population: Population,
    rng: ChaCha8Rng,
    seed: u64,
    /// Epochs completed
    epoch: u64,
    /// Attempts completed across all epochs
    attempts: u64,
    /// Attempt index within the running epoch
    attempt: usize,
    /// The running epoch started with an empty population
    exploring: bool,
    epoch_records: Vec<AttemptRecord>,
    history: TrainingHistory,
    runner: EpisodeRunner,
    store: Option<CheckpointStore>,
    clock: FrameClock,
}

impl TrainingSession {
    /// Fresh session with an empty population
    pub fn new(config: Config, seed: u64) -> Result<Self, TrainingError> {
        config.validate().map_err(TrainingError::Config)?;
        let shape = config.controller_shape();
        let runner = EpisodeRunner::new(&config);
        let clock = FrameClock::new(config.training.fps, config.training.realtime);

        Ok(Self {
            population: Population::new(config.evolution.capacity),
            rng: epoch_rng(seed, 0),
            seed,
            epoch: 0,
            attempts: 0,
            attempt: 0,
            exploring: true,
            epoch_records: Vec::new(),
            history: TrainingHistory::new(),
            runner,
            store: None,
            clock,
            shape,
            config,
        })
    }

    /// Continue from a checkpoint, restoring its seed, counters and members
    pub fn from_checkpoint(config: Config, checkpoint: Checkpoint) -> Result<Self, TrainingError> {
        let mut session = Self::new(config, checkpoint.seed)?;
        checkpoint.check_shape(session.shape)?;

        let capacity = session.config.evolution.capacity;
        if checkpoint.capacity != capacity {
            log::warn!(
                "Checkpoint capacity {} differs from configured {}; using {}",
                checkpoint.capacity,
                capacity,
                capacity
            );
        }
        session.population = Population::from_members(capacity, checkpoint.members);
        session.epoch = checkpoint.epoch;
        session.attempts = checkpoint.attempts;
        // Resuming inside the first epoch keeps exploring
        session.exploring = session.population.is_empty() || session.epoch == 0;
        session.rng = epoch_rng(session.seed, session.epoch);
        Ok(session)
    }

    /// Attach a store; resumes from its primary file when one exists
    pub fn with_store(config: Config, seed: u64, store: CheckpointStore, resume: bool) -> Result<Self, TrainingError> {
        let existing = if resume {
            store.load(config.controller_shape())?
        } else {
            None
        };
        let mut session = match existing {
            Some(checkpoint) => {
                log::info!(
                    "Resuming from {} at epoch {} ({} members)",
                    store.primary_path().display(),
                    checkpoint.epoch,
                    checkpoint.members.len()
                );
                Self::from_checkpoint(config, checkpoint)?
            }
            None => Self::new(config, seed)?,
        };
        session.store = Some(store);
        Ok(session)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shape(&self) -> ControllerShape {
        self.shape
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn history(&self) -> &TrainingHistory {
        &self.history
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Epochs completed
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn total_attempts(&self) -> u64 {
        self.attempts
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint::new(self.epoch, self.attempts, self.seed, &self.population)
    }

    /// Controller for the next attempt and the rank of its parent
    fn next_candidate(&mut self) -> Result<(Controller, Option<usize>), ShapeError> {
        let network = &self.config.network;
        let selected = if self.exploring {
            None
        } else {
            self.population
                .select(self.attempt, &self.config.evolution.selection)
        };

        match selected {
            Some((rank, parent)) => {
                let parent_fitness = parent.fitness_score;
                let mut candidate = Controller::from_thought_process(parent, network.activation, network.decision)?;
                let report = candidate.mutate(&self.config.evolution.mutation, rank, parent_fitness, &mut self.rng);
                log::debug!(
                    "Attempt {}: rank {} parent ({}), {} of {} requested entries mutated",
                    self.attempt,
                    rank,
                    parent_fitness,
                    report.modified,
                    report.requested
                );
                Ok((candidate, Some(rank)))
            }
            None => Ok((
                Controller::random(self.shape, network.activation, network.decision, &mut self.rng),
                None,
            )),
        }
    }

    /// Play one attempt of the running epoch and offer it to the population
    pub fn run_attempt(&mut self) -> Result<AttemptRecord, TrainingError> {
        let (candidate, parent_rank) = self.next_candidate()?;
        let game_seed: u64 = self.rng.gen();
        let report = self.runner.run(&candidate, game_seed, &mut self.clock);

        let inserted_at = self.population.insert(candidate.snapshot(report.fitness))?;
        if inserted_at.is_some() {
            if let Some(store) = &self.store {
                // Resume restarts the running epoch, so the count stays at its start
                let epoch_start = self.attempts - self.attempt as u64;
                store.save_primary(&Checkpoint::new(self.epoch, epoch_start, self.seed, &self.population))?;
            }
        }

        let record = AttemptRecord {
            epoch: self.epoch + 1,
            attempt: self.attempt,
            parent_rank,
            fitness: report.fitness,
            ticks: report.ticks,
            pipes: report.pipes,
            crash: report.end.crash(),
            inserted_at,
        };
        log::debug!(
            "Attempt {}: Score {} ({} ticks, {} pipes, {:?})",
            self.attempt + 1,
            report.fitness,
            report.ticks,
            report.pipes,
            report.end
        );

        self.attempt += 1;
        self.attempts += 1;
        self.epoch_records.push(record.clone());
        self.history.record_attempt(record.clone());
        Ok(record)
    }

    /// Close the running epoch: summarise, checkpoint, export history
    pub fn finish_epoch(&mut self) -> Result<EpochSummary, TrainingError> {
        self.epoch += 1;
        let summary = EpochSummary::from_records(
            self.epoch,
            &self.epoch_records,
            self.population.best().map_or(0, |b| b.fitness_score),
            self.population.len(),
        );
        log::info!("{}", summary.summary());

        if let Some(store) = &self.store {
            let path = store.save_epoch(&self.checkpoint())?;
            log::info!("Checkpoint saved: {}", path.display());
        }
        self.history.record_epoch(summary.clone());
        if let Some(path) = &self.config.logging.history_file {
            self.history.save(path)?;
        }

        self.attempt = 0;
        self.epoch_records.clear();
        self.exploring = self.population.is_empty();
        self.rng = epoch_rng(self.seed, self.epoch);
        Ok(summary)
    }

    /// Run every attempt of one epoch
    pub fn run_epoch(&mut self) -> Result<EpochSummary, TrainingError> {
        for _ in self.attempt..self.config.training.attempts {
            self.run_attempt()?;
        }
        self.finish_epoch()
    }

    /// Run `epochs` epochs, returning their summaries
    pub fn run(&mut self, epochs: usize) -> Result<Vec<EpochSummary>, TrainingError> {
        (0..epochs).map(|_| self.run_epoch()).collect()
    }

    /// True while every attempt of the running epoch gets a random controller
    pub fn is_exploring(&self) -> bool {
        self.exploring
    }
}

/// Replay a stored thought process over independent episodes.
///
/// Episodes run in parallel unless the configuration asks for real-time
/// pacing, in which case they play one after another.
pub fn replay(config: &Config, member: &ThoughtProcess, episodes: usize, seed: u64) -> Result<Vec<EpisodeReport>, ShapeError> {
    let controller = Controller::from_thought_process(member, config.network.activation, config.network.decision)?;
    let runner = EpisodeRunner::new(config);

    if config.training.realtime {
        let mut runner = runner;
        let mut clock = FrameClock::paced(config.training.fps);
        return Ok((0..episodes as u64)
            .map(|i| runner.run(&controller, episode_seed(seed, i), &mut clock))
            .collect());
    }

    Ok((0..episodes as u64)
        .into_par_iter()
        .map_init(
            || (runner.clone(), FrameClock::unpaced()),
            |(runner, clock), i| runner.run(&controller, episode_seed(seed, i), clock),
        )
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config() -> Config {
        let mut config = Config::classic();
        config.training.attempts = 6;
        config.training.max_ticks = Some(400);
        config
    }

    #[test]
    fn test_first_epoch_explores() {
        let mut session = TrainingSession::new(quick_config(), 1).unwrap();
        assert!(session.is_exploring());
        let summary = session.run_epoch().unwrap();
        assert_eq!(summary.attempts, 6);
        assert!(session
            .history()
            .attempts_in(1)
            .all(|r| r.parent_rank.is_none()));
        assert_eq!(session.population().len(), 6);
        assert!(!session.is_exploring());
    }

    #[test]
    fn test_later_epochs_use_parents() {
        let mut session = TrainingSession::new(quick_config(), 2).unwrap();
        session.run(2).unwrap();
        let ranks: Vec<Option<usize>> = session.history().attempts_in(2).map(|r| r.parent_rank).collect();
        // Six members, pool of eight without cycling: ranks 0..6 in order
        assert_eq!(ranks, (0..6).map(Some).collect::<Vec<_>>());
        assert!(session.population().len() <= 8);
        assert!(session.population().is_sorted());
        assert_eq!(session.epoch(), 2);
        assert_eq!(session.total_attempts(), 12);
    }

    #[test]
    fn test_seeded_session_is_reproducible() {
        let run = |seed| {
            let mut session = TrainingSession::new(quick_config(), seed).unwrap();
            session.run(3).unwrap();
            session
                .history()
                .attempts
                .iter()
                .map(|r| (r.fitness, r.ticks))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn test_time_limit_ends_episode() {
        let config = quick_config();
        let mut runner = EpisodeRunner::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let controller = Controller::random(
            config.controller_shape(),
            config.network.activation,
            config.network.decision,
            &mut rng,
        );
        let report = runner.run(&controller, 11, &mut FrameClock::unpaced());
        assert!(report.ticks <= 400);
        if report.end == EpisodeEnd::TimeLimit {
            assert_eq!(report.ticks, 400);
        }
    }

    #[test]
    fn test_pixel_episode_runs() {
        let mut config = Config::revisit();
        config.training.max_ticks = Some(50);
        let mut runner = EpisodeRunner::new(&config);
        assert_eq!(runner.input_size(), 4800);

        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let controller = Controller::random(
            config.controller_shape(),
            config.network.activation,
            config.network.decision,
            &mut rng,
        );
        let report = runner.run(&controller, 5, &mut FrameClock::unpaced());
        assert!(report.ticks > 0 && report.ticks <= 50);
    }

    #[test]
    fn test_replay_matches_sequential_runs() {
        let config = quick_config();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let controller = Controller::random(
            config.controller_shape(),
            config.network.activation,
            config.network.decision,
            &mut rng,
        );
        let member = controller.snapshot(0);

        let parallel = replay(&config, &member, 8, 99).unwrap();
        let mut runner = EpisodeRunner::new(&config);
        let sequential: Vec<_> = (0..8)
            .map(|i| runner.run(&controller, episode_seed(99, i), &mut FrameClock::unpaced()))
            .collect();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = quick_config();
        config.training.attempts = 0;
        assert!(matches!(
            TrainingSession::new(config, 1),
            Err(TrainingError::Config(_))
        ));
    }
}
