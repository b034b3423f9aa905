//! smartbird - CLI Entry Point
//!
//! Train, replay and inspect Flappy Bird controllers.

use clap::{Parser, Subcommand};
use smartbird::checkpoint::{Checkpoint, CheckpointStore};
use smartbird::menu;
use smartbird::{benchmark, replay, Config, Preset, TrainingSession};
use std::io;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "smartbird")]
#[command(version)]
#[command(about = "Headless Flappy Bird with evolved feed-forward controllers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train controllers, resuming from the stored population by default
    Train {
        /// Configuration file (YAML); the preset is used if absent
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Preset used when no configuration file is given
        #[arg(short, long, default_value = "revisit")]
        preset: Preset,

        /// Hidden layer width
        #[arg(short, long)]
        neurons: Option<usize>,

        /// Attempts per epoch
        #[arg(short, long)]
        attempts: Option<usize>,

        /// Epochs to run
        #[arg(short, long)]
        epochs: Option<usize>,

        /// Tick limit per episode
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Checkpoint directory (overrides the configuration)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Start from an empty population even if a checkpoint exists
        #[arg(long)]
        fresh: bool,

        /// Ask for neurons, attempts and epochs before starting
        #[arg(short, long)]
        interactive: bool,

        /// Pace ticks at the configured frame rate
        #[arg(long)]
        realtime: bool,

        /// Quiet mode (epoch summaries only)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Replay a stored thought process without evolving it
    Replay {
        /// Checkpoint file
        checkpoint: PathBuf,

        /// Configuration file the checkpoint was trained with
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long, default_value = "revisit")]
        preset: Preset,

        /// Rank of the member to replay (0 = best)
        #[arg(short, long, default_value = "0")]
        rank: usize,

        /// Episodes to play
        #[arg(short, long, default_value = "10")]
        attempts: usize,

        /// Tick limit per episode
        #[arg(long)]
        max_ticks: Option<u64>,

        #[arg(long, default_value = "0")]
        seed: u64,

        /// Pace ticks at the configured frame rate (runs sequentially)
        #[arg(long)]
        realtime: bool,
    },

    /// Print the top fitness scores of a checkpoint
    Show {
        /// Checkpoint file
        checkpoint: PathBuf,

        /// Number of members to list
        #[arg(short, long, default_value = "10")]
        top: usize,
    },

    /// Generate a configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,

        #[arg(short, long, default_value = "revisit")]
        preset: Preset,
    },

    /// Run performance benchmark
    Benchmark {
        /// Episodes to play
        #[arg(short, long, default_value = "64")]
        episodes: u64,

        #[arg(short, long, default_value = "revisit")]
        preset: Preset,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            config,
            preset,
            neurons,
            attempts,
            epochs,
            max_ticks,
            output,
            seed,
            fresh,
            interactive,
            realtime,
            quiet,
        } => {
            let mut config = load_config(config, preset)?;
            init_logging(&config.logging.log_level);

            if interactive {
                let stdin = io::stdin();
                let mut stdout = io::stdout();
                match menu::prompt(stdin.lock(), &mut stdout)? {
                    Some(values) => {
                        config.network.neurons = values.neurons;
                        config.training.attempts = values.attempts;
                        config.training.epochs = values.epochs;
                    }
                    None => {
                        println!("No values entered, exiting");
                        return Ok(());
                    }
                }
            }
            if let Some(n) = neurons {
                config.network.neurons = n;
            }
            if let Some(a) = attempts {
                config.training.attempts = a;
            }
            if let Some(e) = epochs {
                config.training.epochs = e;
            }
            if max_ticks.is_some() {
                config.training.max_ticks = max_ticks;
            }
            if let Some(dir) = output {
                config.checkpoint.dir = dir.to_string_lossy().into_owned();
            }
            config.training.realtime |= realtime;

            train(config, seed, !fresh, quiet)
        }

        Commands::Replay {
            checkpoint,
            config,
            preset,
            rank,
            attempts,
            max_ticks,
            seed,
            realtime,
        } => {
            let mut config = load_config(config, preset)?;
            init_logging(&config.logging.log_level);
            if max_ticks.is_some() {
                config.training.max_ticks = max_ticks;
            }
            config.training.realtime |= realtime;
            run_replay(config, checkpoint, rank, attempts, seed)
        }

        Commands::Show { checkpoint, top } => {
            init_logging("info");
            show_checkpoint(checkpoint, top)
        }

        Commands::Init { output, preset } => {
            init_logging("info");
            generate_config(output, preset)
        }

        Commands::Benchmark { episodes, preset } => {
            init_logging("info");
            run_benchmark(episodes, preset)
        }
    }
}

/// `RUST_LOG` wins over the configured level
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_config(path: Option<PathBuf>, preset: Preset) -> Result<Config, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            println!("Loading config from: {:?}", path);
            Config::from_file(&path)
        }
        None => Ok(Config::preset(preset)),
    }
}

fn train(mut config: Config, seed: Option<u64>, resume: bool, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    std::fs::create_dir_all(&config.checkpoint.dir)?;
    let output = PathBuf::from(&config.checkpoint.dir);
    if config.logging.history_file.is_none() {
        let path = output.join("training_history.json");
        config.logging.history_file = Some(path.to_string_lossy().into_owned());
    }

    let seed = seed.unwrap_or_else(rand::random);
    let store = CheckpointStore::new(&output, &config.checkpoint.file, config.checkpoint.keep_history);
    let attempts = config.training.attempts;
    let epochs = config.training.epochs;
    let mut session = TrainingSession::with_store(config, seed, store, resume)?;

    println!("Starting training");
    println!("  Network: {}", session.shape());
    println!("  Seed: {}", session.seed());
    println!("  Epochs: {} x {} attempts", epochs, attempts);
    println!("  Population: {}/{}", session.population().len(), session.population().capacity());
    println!();

    let start = Instant::now();
    for _ in 0..epochs {
        for _ in 0..attempts {
            let record = session.run_attempt()?;
            if !quiet {
                println!("Attempt {}: Score {}", record.attempt + 1, record.fitness);
            }
        }
        let summary = session.finish_epoch()?;
        println!("{}", summary.summary());
    }
    let elapsed = start.elapsed();

    println!();
    println!("=== Training Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Epochs: {}", session.epoch());
    println!("Attempts: {}", session.total_attempts());
    if let Some(best) = session.population().best() {
        println!("Best fitness: {}", best.fitness_score);
    }
    let means = session.history().mean_series();
    if let (Some(first), Some(last)) = (means.first(), means.last()) {
        println!("Mean fitness: {:.1} (epoch {}) -> {:.1} (epoch {})", first.1, first.0, last.1, last.0);
    }
    println!("Checkpoint: {:?}", output.join(&session.config().checkpoint.file));

    Ok(())
}

fn run_replay(
    config: Config,
    checkpoint_path: PathBuf,
    rank: usize,
    attempts: usize,
    seed: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    println!("Loading checkpoint: {:?}", checkpoint_path);
    let checkpoint = Checkpoint::load_for(&checkpoint_path, config.controller_shape())?;
    let member = checkpoint
        .members
        .get(rank)
        .ok_or_else(|| format!("rank {} not present ({} members)", rank, checkpoint.members.len()))?;

    println!("Replaying rank {} (fitness {}) for {} attempts", rank, member.fitness_score, attempts);
    println!();

    let reports = replay(&config, member, attempts, seed)?;
    for (i, report) in reports.iter().enumerate() {
        println!(
            "Attempt {}: Score {} ({} pipes, {} ticks, {:?})",
            i + 1,
            report.fitness,
            report.pipes,
            report.ticks,
            report.end
        );
    }

    if !reports.is_empty() {
        let mean = reports.iter().map(|r| r.fitness as f64).sum::<f64>() / reports.len() as f64;
        let best = reports.iter().map(|r| r.fitness).max().unwrap_or(0);
        println!();
        println!("Mean score: {:.1}", mean);
        println!("Best score: {}", best);
    }

    Ok(())
}

fn show_checkpoint(checkpoint_path: PathBuf, top: usize) -> Result<(), Box<dyn std::error::Error>> {
    let checkpoint = Checkpoint::load(&checkpoint_path)?;

    println!("=== Checkpoint ===");
    println!("File: {:?}", checkpoint_path);
    println!("Epoch: {}", checkpoint.epoch);
    println!("Attempts: {}", checkpoint.attempts);
    println!("Seed: {}", checkpoint.seed);
    println!("Members: {}/{}", checkpoint.members.len(), checkpoint.capacity);
    if let Some(first) = checkpoint.members.first() {
        println!("Network: {}", first.shape);
    }
    println!();

    for (rank, member) in checkpoint.members.iter().take(top).enumerate() {
        println!("{:3}. {}", rank + 1, member.fitness_score);
    }

    println!();
    println!("Checkpoint size: {:.2} MB", checkpoint.size_bytes() as f64 / 1_000_000.0);

    Ok(())
}

fn generate_config(output: PathBuf, preset: Preset) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::preset(preset);
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}

fn run_benchmark(episodes: u64, preset: Preset) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== smartbird Benchmark ===");
    println!("Episodes: {}", episodes);
    println!("Preset: {:?}", preset);
    println!();

    let result = benchmark(episodes, preset);
    println!("{}", result);

    Ok(())
}
