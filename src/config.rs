//! Configuration system for smartbird training runs.
//!
//! Supports YAML configuration files with sensible defaults. Two named
//! presets exist: `revisit` (the default, pixel inputs) and `classic`
//! (three distance inputs with shaped fitness).

use crate::encoder::EncoderKind;
use crate::fitness::FitnessScheme;
use crate::game::{PhysicsConfig, PhysicsPreset};
use crate::neural::{Activation, ControllerShape, DecisionRule, MutationConfig};
use crate::population::SelectionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub game: PhysicsConfig,
    pub network: NetworkConfig,
    pub evolution: EvolutionConfig,
    #[serde(default)]
    pub fitness: FitnessScheme,
    pub training: TrainingConfig,
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Named configuration presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Classic,
    Revisit,
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classic" => Ok(Preset::Classic),
            "revisit" => Ok(Preset::Revisit),
            other => Err(format!("unknown preset '{}' (expected classic or revisit)", other)),
        }
    }
}

/// Controller configuration; the input count follows from the encoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Hidden layer width
    pub neurons: usize,
    pub outputs: usize,
    pub encoder: EncoderKind,
    pub activation: Activation,
    pub decision: DecisionRule,
}

/// Population and mutation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Thought processes retained
    pub capacity: usize,
    pub selection: SelectionConfig,
    pub mutation: MutationConfig,
}

/// Episode and epoch limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Attempts per epoch
    pub attempts: usize,
    /// Epochs to run
    pub epochs: usize,
    /// Optional cap on ticks per episode
    #[serde(default)]
    pub max_ticks: Option<u64>,
    /// Ticks per second when paced in real time
    pub fps: u32,
    /// Pace ticks with the frame clock instead of running flat out
    #[serde(default)]
    pub realtime: bool,
}

/// Where the population is persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    pub dir: String,
    pub file: String,
    /// Epoch-stamped copies to keep, 0 disables history
    pub keep_history: usize,
}

/// Logging and history export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// JSON export of per-attempt records, if set
    #[serde(default)]
    pub history_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::revisit()
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            neurons: 10,
            outputs: 2,
            encoder: EncoderKind::default(),
            activation: Activation::LeakyRelu,
            decision: DecisionRule::Compare,
        }
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            capacity: 8,
            selection: SelectionConfig::default(),
            mutation: MutationConfig::default(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            attempts: 10,
            epochs: 10,
            max_ticks: None,
            fps: 30,
            realtime: false,
        }
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            dir: "checkpoints".to_string(),
            file: "population.bin".to_string(),
            keep_history: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            history_file: None,
        }
    }
}

impl Config {
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Classic => Self::classic(),
            Preset::Revisit => Self::revisit(),
        }
    }

    /// Pixel inputs, compare rule, top-3 round robin, counted fitness
    pub fn revisit() -> Self {
        Self {
            game: PhysicsConfig::preset(PhysicsPreset::Revisit),
            network: NetworkConfig::default(),
            evolution: EvolutionConfig::default(),
            fitness: FitnessScheme::default(),
            training: TrainingConfig::default(),
            checkpoint: CheckpointConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Distance inputs, sigmoid threshold, top 8 then explorers, shaped fitness
    pub fn classic() -> Self {
        Self {
            game: PhysicsConfig::preset(PhysicsPreset::Classic),
            network: NetworkConfig {
                neurons: 6,
                outputs: 1,
                encoder: EncoderKind::Distances,
                activation: Activation::Sigmoid,
                decision: DecisionRule::Threshold(0.5),
            },
            evolution: EvolutionConfig {
                capacity: 8,
                selection: SelectionConfig {
                    pool: 8,
                    cycle: false,
                },
                mutation: MutationConfig::classic(),
            },
            fitness: FitnessScheme::shaped(),
            training: TrainingConfig::default(),
            checkpoint: CheckpointConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Layer sizes implied by the encoder and network sections
    pub fn controller_shape(&self) -> ControllerShape {
        ControllerShape {
            inputs: self
                .network
                .encoder
                .input_size(self.game.win_width, self.game.win_height),
            neurons: self.network.neurons,
            outputs: self.network.outputs,
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        self.game.validate()?;
        self.evolution.mutation.validate()?;

        if self.controller_shape().inputs == 0 {
            return Err("encoder produces no inputs".to_string());
        }
        if self.network.neurons == 0 || self.network.outputs == 0 {
            return Err("network neurons/outputs must be > 0".to_string());
        }
        if self.network.outputs < self.network.decision.min_outputs() {
            return Err(format!(
                "decision rule needs at least {} outputs",
                self.network.decision.min_outputs()
            ));
        }
        if self.evolution.capacity == 0 {
            return Err("capacity must be > 0".to_string());
        }
        if self.evolution.selection.pool == 0 {
            return Err("selection pool must be > 0".to_string());
        }
        if self.training.attempts == 0 {
            return Err("attempts must be > 0".to_string());
        }
        if self.training.fps == 0 {
            return Err("fps must be > 0".to_string());
        }
        if self.checkpoint.file.is_empty() {
            return Err("checkpoint file name must not be empty".to_string());
        }

        if self.evolution.mutation.schedule.is_disabled() {
            log::warn!(
                "Mutation schedule {:?} never modifies a weight; candidates will be copies of their parents",
                self.evolution.mutation.schedule
            );
        }
        if self.evolution.selection.pool > self.evolution.capacity {
            log::warn!(
                "Selection pool {} exceeds capacity {}; only {} ranks can be selected",
                self.evolution.selection.pool,
                self.evolution.capacity,
                self.evolution.capacity
            );
        }
        Ok(())
    }
}
