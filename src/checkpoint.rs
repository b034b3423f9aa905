//! Checkpoint system for saving and loading the population.

use crate::neural::{ControllerShape, ShapeError};
use crate::population::{Population, ThoughtProcess};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

const MAGIC: &[u8; 4] = b"SBTP";

/// Complete training state for checkpointing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Version for compatibility checking
    pub version: u32,
    /// Epochs completed
    pub epoch: u64,
    /// Attempts completed across all epochs
    pub attempts: u64,
    /// Session seed (for reproducibility)
    pub seed: u64,
    pub capacity: usize,
    /// Best first
    pub members: Vec<ThoughtProcess>,
}

impl Checkpoint {
    /// Current checkpoint version
    pub const VERSION: u32 = 1;

    pub fn new(epoch: u64, attempts: u64, seed: u64, population: &Population) -> Self {
        Self {
            version: Self::VERSION,
            epoch,
            attempts,
            seed,
            capacity: population.capacity(),
            members: population.members().to_vec(),
        }
    }

    /// Save checkpoint to binary file.
    ///
    /// Writes a sibling temporary file first and renames it into place.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(MAGIC)?;
            bincode::serialize_into(&mut writer, self)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Load checkpoint from binary file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        // Check magic bytes
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(CheckpointError::InvalidFormat("Invalid magic bytes".to_string()));
        }

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        let checkpoint: Checkpoint = bincode::deserialize(&buffer)?;

        if checkpoint.version != Self::VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: Self::VERSION,
                found: checkpoint.version,
            });
        }
        if checkpoint.members.len() > checkpoint.capacity {
            return Err(CheckpointError::InvalidFormat(format!(
                "{} members exceed capacity {}",
                checkpoint.members.len(),
                checkpoint.capacity
            )));
        }
        for member in &checkpoint.members {
            member.validate()?;
        }

        Ok(checkpoint)
    }

    /// Load and require every member to match `shape`
    pub fn load_for<P: AsRef<Path>>(path: P, shape: ControllerShape) -> Result<Self, CheckpointError> {
        let checkpoint = Self::load(path)?;
        checkpoint.check_shape(shape)?;
        Ok(checkpoint)
    }

    pub fn check_shape(&self, shape: ControllerShape) -> Result<(), ShapeError> {
        for member in &self.members {
            member.hidden.check_shape("hidden", shape.inputs, shape.neurons)?;
            member.output.check_shape("output", shape.neurons, shape.outputs)?;
        }
        Ok(())
    }

    /// Rebuild the population, keeping the stored capacity
    pub fn population(&self) -> Population {
        Population::from_members(self.capacity, self.members.clone())
    }

    /// Get approximate size in bytes
    pub fn size_bytes(&self) -> usize {
        bincode::serialized_size(self).unwrap_or(0) as usize + MAGIC.len()
    }
}

/// Errors that can occur during checkpoint operations
#[derive(Debug)]
pub enum CheckpointError {
    Io(std::io::Error),
    Serialization(bincode::Error),
    InvalidFormat(String),
    VersionMismatch { expected: u32, found: u32 },
    Shape(ShapeError),
}

impl std::fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
            Self::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            Self::VersionMismatch { expected, found } => {
                write!(f, "Version mismatch: expected {}, found {}", expected, found)
            }
            Self::Shape(e) => write!(f, "Shape error: {}", e),
        }
    }
}

impl std::error::Error for CheckpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Serialization(e) => Some(e),
            Self::Shape(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CheckpointError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<bincode::Error> for CheckpointError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e)
    }
}

impl From<ShapeError> for CheckpointError {
    fn from(e: ShapeError) -> Self {
        Self::Shape(e)
    }
}

/// Primary checkpoint file plus a bounded history of per-epoch copies
pub struct CheckpointStore {
    /// Base directory for checkpoints
    pub base_dir: PathBuf,
    /// Name of the primary file inside `base_dir`
    pub file_name: String,
    /// Epoch copies to keep, 0 disables history
    pub keep_history: usize,
}

impl CheckpointStore {
    pub fn new<P: Into<PathBuf>>(base_dir: P, file_name: &str, keep_history: usize) -> Self {
        Self {
            base_dir: base_dir.into(),
            file_name: file_name.to_string(),
            keep_history,
        }
    }

    pub fn primary_path(&self) -> PathBuf {
        self.base_dir.join(&self.file_name)
    }

    /// Generate history filename
    pub fn epoch_path(&self, epoch: u64) -> PathBuf {
        self.base_dir.join(format!("epoch_{:08}.bin", epoch))
    }

    /// Overwrite the primary file only
    pub fn save_primary(&self, checkpoint: &Checkpoint) -> Result<PathBuf, CheckpointError> {
        let path = self.primary_path();
        checkpoint.save(&path)?;
        Ok(path)
    }

    /// Save the primary file and an epoch-stamped copy
    pub fn save_epoch(&self, checkpoint: &Checkpoint) -> Result<PathBuf, CheckpointError> {
        let path = self.save_primary(checkpoint)?;
        if self.keep_history > 0 {
            checkpoint.save(self.epoch_path(checkpoint.epoch))?;
            if let Err(e) = self.cleanup() {
                log::warn!("Failed to prune checkpoint history: {}", e);
            }
        }
        Ok(path)
    }

    fn history(&self) -> Vec<fs::DirEntry> {
        let Ok(entries) = fs::read_dir(&self.base_dir) else {
            return Vec::new();
        };
        let mut history: Vec<_> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                name.starts_with("epoch_") && name.ends_with(".bin")
            })
            .collect();
        // Zero-padded names sort by epoch
        history.sort_by_key(|e| e.file_name());
        history
    }

    /// Remove old epoch copies beyond `keep_history`
    fn cleanup(&self) -> Result<(), CheckpointError> {
        let history = self.history();
        if history.len() > self.keep_history {
            let to_remove = history.len() - self.keep_history;
            for entry in history.into_iter().take(to_remove) {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    /// Latest epoch copy in the directory
    pub fn find_latest(&self) -> Option<PathBuf> {
        self.history().pop().map(|e| e.path())
    }

    /// Load the primary file, or `None` if it does not exist yet
    pub fn load(&self, shape: ControllerShape) -> Result<Option<Checkpoint>, CheckpointError> {
        let path = self.primary_path();
        if !path.exists() {
            return Ok(None);
        }
        Checkpoint::load_for(path, shape).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::{Activation, Controller, DecisionRule};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const SHAPE: ControllerShape = ControllerShape {
        inputs: 3,
        neurons: 6,
        outputs: 1,
    };

    fn create_test_population(shape: ControllerShape) -> Population {
        let mut rng = ChaCha8Rng::seed_from_u64(30);
        let mut population = Population::new(8);
        for fitness in [120, -5, 3400, 77, 0] {
            let net = Controller::random(shape, Activation::Sigmoid, DecisionRule::Threshold(0.5), &mut rng);
            population.insert(net.snapshot(fitness)).unwrap();
        }
        population
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("population.bin");
        let population = create_test_population(SHAPE);
        let checkpoint = Checkpoint::new(12, 120, 12345, &population);

        checkpoint.save(&path).unwrap();
        let loaded = Checkpoint::load_for(&path, SHAPE).unwrap();

        assert_eq!(loaded.epoch, 12);
        assert_eq!(loaded.attempts, 120);
        assert_eq!(loaded.seed, 12345);
        assert_eq!(loaded.members, checkpoint.members);
        for (a, b) in loaded.members.iter().zip(checkpoint.members.iter()) {
            let bits = |tp: &ThoughtProcess| -> Vec<u64> {
                tp.hidden_weights().iter().map(|w| w.to_bits()).collect()
            };
            assert_eq!(bits(a), bits(b));
        }
        assert!(!dir.path().join("population.bin.tmp").exists());
    }

    #[test]
    fn test_shape_mismatch_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("population.bin");
        Checkpoint::new(1, 10, 1, &create_test_population(SHAPE))
            .save(&path)
            .unwrap();

        let wanted = ControllerShape { neurons: 10, ..SHAPE };
        match Checkpoint::load_for(&path, wanted) {
            Err(CheckpointError::Shape(e)) => {
                assert_eq!(e.expected, (3, 10));
                assert_eq!(e.found, (3, 6));
            }
            other => panic!("expected shape error, got {:?}", other.map(|c| c.epoch)),
        }
    }

    #[test]
    fn test_bad_magic_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.bin");
        fs::write(&path, b"PRMD0000").unwrap();
        assert!(matches!(
            Checkpoint::load(&path),
            Err(CheckpointError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_store_keeps_bounded_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path(), "population.bin", 3);
        let population = create_test_population(SHAPE);

        for epoch in 1..=5 {
            store
                .save_epoch(&Checkpoint::new(epoch, epoch * 10, 7, &population))
                .unwrap();
        }

        assert!(store.primary_path().exists());
        assert!(!store.epoch_path(2).exists());
        assert!(store.epoch_path(3).exists());
        assert_eq!(store.find_latest(), Some(store.epoch_path(5)));

        let loaded = store.load(SHAPE).unwrap().unwrap();
        assert_eq!(loaded.epoch, 5);
        assert_eq!(loaded.population().len(), 5);
    }

    #[test]
    fn test_store_missing_primary() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("fresh"), "population.bin", 0);
        assert!(store.load(SHAPE).unwrap().is_none());
        assert!(store.find_latest().is_none());
    }

    #[test]
    fn test_checkpoint_size() {
        let checkpoint = Checkpoint::new(1, 1, 1, &create_test_population(SHAPE));
        let size = checkpoint.size_bytes();
        assert!(size > 0);
        assert!(size < 10_000);
    }
}
