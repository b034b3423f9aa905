//! # smartbird
//!
//! Headless Flappy Bird with small feed-forward controllers trained by a
//! top-N retention evolution loop.
//!
//! ## Features
//!
//! - **Headless**: parameterised physics, axis-aligned collisions, no window
//! - **Two encoders**: three pipe distances, or a 4800-input grayscale frame
//! - **Configurable**: YAML configuration files with `classic` and `revisit` presets
//! - **Reproducible**: all randomness flows from one seed
//! - **Parallel replay**: stored controllers are evaluated across cores via Rayon
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smartbird::{Config, TrainingSession};
//!
//! let mut config = Config::classic();
//! config.training.max_ticks = Some(5_000);
//!
//! let mut session = TrainingSession::new(config, 42).unwrap();
//! for summary in session.run(10).unwrap() {
//!     println!("{}", summary.summary());
//! }
//!
//! let best = session.population().best().unwrap();
//! println!("Best fitness: {}", best.fitness_score);
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use smartbird::Config;
//! use smartbird::neural::MutationSchedule;
//!
//! let mut config = Config::default();
//! config.network.neurons = 16;
//! config.evolution.mutation.schedule = MutationSchedule::RankScaled { factor: 0.02 };
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Checkpoints
//!
//! ```rust,no_run
//! use smartbird::checkpoint::{Checkpoint, CheckpointStore};
//! use smartbird::{Config, TrainingSession};
//!
//! let config = Config::default();
//! let store = CheckpointStore::new("checkpoints", "population.bin", 5);
//! let mut session = TrainingSession::with_store(config.clone(), 7, store, true).unwrap();
//! session.run_epoch().unwrap();
//!
//! let loaded = Checkpoint::load_for("checkpoints/population.bin", config.controller_shape()).unwrap();
//! println!("Epoch {} with {} members", loaded.epoch, loaded.members.len());
//! ```

pub mod checkpoint;
pub mod clock;
pub mod config;
pub mod encoder;
pub mod fitness;
pub mod game;
pub mod menu;
pub mod neural;
pub mod population;
pub mod stats;
pub mod trainer;

// Re-export main types
pub use config::{Config, Preset};
pub use game::Game;
pub use neural::Controller;
pub use population::{Population, ThoughtProcess};
pub use trainer::{replay, EpisodeReport, TrainingSession};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tick cap applied to benchmark episodes
const BENCHMARK_MAX_TICKS: u64 = 2_000;

/// Play `episodes` episodes with random controllers in parallel
pub fn benchmark(episodes: u64, preset: Preset) -> BenchmarkResult {
    use clock::FrameClock;
    use std::time::Instant;
    use trainer::{episode_seed, EpisodeRunner};

    let mut config = Config::preset(preset);
    config.training.max_ticks = Some(BENCHMARK_MAX_TICKS);
    let shape = config.controller_shape();
    let runner = EpisodeRunner::new(&config);

    let start = Instant::now();
    let reports: Vec<EpisodeReport> = (0..episodes)
        .into_par_iter()
        .map_init(
            || (runner.clone(), FrameClock::unpaced()),
            |(runner, clock), i| {
                let mut rng = ChaCha8Rng::seed_from_u64(episode_seed(0, i));
                let controller = Controller::random(
                    shape,
                    config.network.activation,
                    config.network.decision,
                    &mut rng,
                );
                runner.run(&controller, episode_seed(1, i), clock)
            },
        )
        .collect();
    let elapsed = start.elapsed();

    let total_ticks: u64 = reports.iter().map(|r| r.ticks).sum();
    BenchmarkResult {
        preset,
        episodes,
        total_ticks,
        elapsed_secs: elapsed.as_secs_f64(),
        ticks_per_second: total_ticks as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        best_fitness: reports.iter().map(|r| r.fitness).max().unwrap_or(0),
        most_pipes: reports.iter().map(|r| r.pipes).max().unwrap_or(0),
    }
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub preset: Preset,
    pub episodes: u64,
    pub total_ticks: u64,
    pub elapsed_secs: f64,
    pub ticks_per_second: f64,
    pub best_fitness: i64,
    pub most_pipes: u32,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Preset: {:?}", self.preset)?;
        writeln!(f, "Episodes: {}", self.episodes)?;
        writeln!(f, "Ticks: {}", self.total_ticks)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} ticks/s", self.ticks_per_second)?;
        writeln!(f, "Best fitness: {} ({} pipes)", self.best_fitness, self.most_pipes)?;
        Ok(())
    }
}
