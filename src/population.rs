//! Thought processes and the fixed-capacity top-N population.

use crate::neural::{Activation, Controller, ControllerShape, DecisionRule, Layer, ShapeError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Snapshot of one controller's parameters and the score it earned
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThoughtProcess {
    pub fitness_score: i64,
    pub shape: ControllerShape,
    pub hidden: Layer,
    pub output: Layer,
}

impl ThoughtProcess {
    pub fn hidden_weights(&self) -> &Array2<f64> {
        &self.hidden.weights
    }

    pub fn hidden_biases(&self) -> &Array1<f64> {
        &self.hidden.biases
    }

    pub fn output_weights(&self) -> &Array2<f64> {
        &self.output.weights
    }

    pub fn output_biases(&self) -> &Array1<f64> {
        &self.output.biases
    }

    /// Verify every array against the recorded shape
    pub fn validate(&self) -> Result<(), ShapeError> {
        self.hidden
            .check_shape("hidden", self.shape.inputs, self.shape.neurons)?;
        self.output
            .check_shape("output", self.shape.neurons, self.shape.outputs)
    }

    /// Rebuild a controller from this snapshot
    pub fn to_controller(
        &self,
        activation: Activation,
        decision: DecisionRule,
    ) -> Result<Controller, ShapeError> {
        Controller::from_layers(
            self.shape,
            self.hidden.clone(),
            self.output.clone(),
            activation,
            decision,
        )
    }
}

impl Controller {
    /// Record this controller's parameters with the score it earned
    pub fn snapshot(&self, fitness_score: i64) -> ThoughtProcess {
        ThoughtProcess {
            fitness_score,
            shape: self.shape,
            hidden: self.hidden.clone(),
            output: self.output.clone(),
        }
    }

    pub fn from_thought_process(
        process: &ThoughtProcess,
        activation: Activation,
        decision: DecisionRule,
    ) -> Result<Self, ShapeError> {
        process.to_controller(activation, decision)
    }
}

/// Which ranked parent seeds each attempt of an epoch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Number of top ranks eligible as parents
    pub pool: usize,
    /// Round-robin over the pool for every attempt; otherwise walk the
    /// pool once and explore with random controllers afterwards
    pub cycle: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            pool: 3,
            cycle: true,
        }
    }
}

/// Top performers, best first, never more than `capacity`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Population {
    capacity: usize,
    members: Vec<ThoughtProcess>,
}

impl Population {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            members: Vec::with_capacity(capacity + 1),
        }
    }

    /// Rebuild from stored members, re-establishing order and capacity
    pub fn from_members(capacity: usize, members: Vec<ThoughtProcess>) -> Self {
        let mut population = Self::new(capacity);
        population.members = members;
        population.settle();
        population
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[ThoughtProcess] {
        &self.members
    }

    pub fn get(&self, rank: usize) -> Option<&ThoughtProcess> {
        self.members.get(rank)
    }

    pub fn best(&self) -> Option<&ThoughtProcess> {
        self.members.first()
    }

    /// Shape shared by all members, if any are present
    pub fn shape(&self) -> Option<ControllerShape> {
        self.members.first().map(|m| m.shape)
    }

    /// Insert a scored snapshot.
    ///
    /// Returns the rank it landed at, or `None` if it fell off the end.
    /// A newcomer never displaces an incumbent with an equal score.
    pub fn insert(&mut self, process: ThoughtProcess) -> Result<Option<usize>, ShapeError> {
        process.validate()?;
        if let Some(shape) = self.shape() {
            if shape != process.shape {
                return Err(ShapeError {
                    layer: "hidden",
                    part: "weights",
                    expected: (shape.inputs, shape.neurons),
                    found: (process.shape.inputs, process.shape.neurons),
                });
            }
        }

        let score = process.fitness_score;
        self.members.push(process);
        self.members
            .sort_by(|a, b| b.fitness_score.cmp(&a.fitness_score));

        // Stable sort leaves the newcomer last among equal scores
        let rank = self
            .members
            .iter()
            .rposition(|m| m.fitness_score == score)
            .filter(|&i| i < self.capacity);
        self.members.truncate(self.capacity);
        Ok(rank)
    }

    /// Stable sort best-first, then truncate to capacity
    fn settle(&mut self) {
        self.members
            .sort_by(|a, b| b.fitness_score.cmp(&a.fitness_score));
        self.members.truncate(self.capacity);
    }

    /// Parent for the given attempt of an epoch, with its rank.
    ///
    /// `None` means the attempt should start from a fresh random controller.
    pub fn select(&self, attempt: usize, selection: &SelectionConfig) -> Option<(usize, &ThoughtProcess)> {
        let pool = selection.pool.min(self.members.len());
        if pool == 0 {
            return None;
        }
        let rank = if selection.cycle {
            attempt % pool
        } else if attempt < pool {
            attempt
        } else {
            return None;
        };
        self.members.get(rank).map(|m| (rank, m))
    }

    /// Mean fitness across members
    pub fn mean_fitness(&self) -> f64 {
        if self.members.is_empty() {
            return 0.0;
        }
        self.members.iter().map(|m| m.fitness_score as f64).sum::<f64>() / self.members.len() as f64
    }

    pub fn is_sorted(&self) -> bool {
        self.members
            .windows(2)
            .all(|w| w[0].fitness_score >= w[1].fitness_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn shape() -> ControllerShape {
        ControllerShape {
            inputs: 3,
            neurons: 6,
            outputs: 1,
        }
    }

    fn process(rng: &mut ChaCha8Rng, fitness: i64) -> ThoughtProcess {
        Controller::random(shape(), Activation::Sigmoid, DecisionRule::Threshold(0.5), rng)
            .snapshot(fitness)
    }

    #[test]
    fn test_capacity_and_order_hold() {
        let mut rng = ChaCha8Rng::seed_from_u64(20);
        let mut population = Population::new(8);
        for _ in 0..200 {
            let fitness = rng.gen_range(-100..5000);
            let p = process(&mut rng, fitness);
            population.insert(p).unwrap();
            assert!(population.len() <= 8);
            assert!(population.is_sorted());
        }
        assert_eq!(population.len(), 8);
    }

    #[test]
    fn test_insert_reports_rank() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let mut population = Population::new(3);
        assert_eq!(population.insert(process(&mut rng, 10)).unwrap(), Some(0));
        assert_eq!(population.insert(process(&mut rng, 30)).unwrap(), Some(0));
        assert_eq!(population.insert(process(&mut rng, 20)).unwrap(), Some(1));
        assert_eq!(population.insert(process(&mut rng, 5)).unwrap(), None);
        assert_eq!(population.insert(process(&mut rng, 20)).unwrap(), Some(2));

        let scores: Vec<i64> = population.members().iter().map(|m| m.fitness_score).collect();
        assert_eq!(scores, vec![30, 20, 20]);
    }

    #[test]
    fn test_tie_keeps_incumbent() {
        let mut rng = ChaCha8Rng::seed_from_u64(22);
        let mut population = Population::new(1);
        let incumbent = process(&mut rng, 100);
        population.insert(incumbent.clone()).unwrap();
        assert_eq!(population.insert(process(&mut rng, 100)).unwrap(), None);
        assert_eq!(population.best(), Some(&incumbent));
    }

    #[test]
    fn test_mismatched_shape_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(23);
        let mut population = Population::new(4);
        population.insert(process(&mut rng, 1)).unwrap();

        let other = Controller::random(
            ControllerShape {
                inputs: 3,
                neurons: 9,
                outputs: 1,
            },
            Activation::Sigmoid,
            DecisionRule::Threshold(0.5),
            &mut rng,
        )
        .snapshot(50);
        assert!(population.insert(other).is_err());
        assert_eq!(population.len(), 1);
    }

    #[test]
    fn test_snapshot_round_trips_to_controller() {
        let mut rng = ChaCha8Rng::seed_from_u64(24);
        let net = Controller::random(shape(), Activation::LeakyRelu, DecisionRule::Threshold(0.0), &mut rng);
        let tp = net.snapshot(42);
        assert_eq!(tp.hidden_weights().dim(), (3, 6));
        assert_eq!(tp.hidden_biases().len(), 6);
        assert_eq!(tp.output_weights().dim(), (6, 1));
        assert_eq!(tp.output_biases().len(), 1);

        let rebuilt = tp.to_controller(Activation::LeakyRelu, DecisionRule::Threshold(0.0)).unwrap();
        let inputs = [10.0, -3.0, 7.5];
        assert_eq!(net.forward(&inputs), rebuilt.forward(&inputs));
    }

    #[test]
    fn test_round_robin_selection() {
        let mut rng = ChaCha8Rng::seed_from_u64(26);
        let mut population = Population::new(8);
        let selection = SelectionConfig::default();
        assert!(population.select(0, &selection).is_none());

        population.insert(process(&mut rng, 10)).unwrap();
        population.insert(process(&mut rng, 20)).unwrap();
        let ranks: Vec<usize> = (0..5)
            .map(|a| population.select(a, &selection).unwrap().0)
            .collect();
        assert_eq!(ranks, vec![0, 1, 0, 1, 0]);

        for i in 0..6 {
            population.insert(process(&mut rng, 30 + i)).unwrap();
        }
        let ranks: Vec<usize> = (0..6)
            .map(|a| population.select(a, &selection).unwrap().0)
            .collect();
        assert_eq!(ranks, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_walk_then_explore_selection() {
        let mut rng = ChaCha8Rng::seed_from_u64(27);
        let mut population = Population::new(8);
        for i in 0..8 {
            population.insert(process(&mut rng, i * 100)).unwrap();
        }
        let selection = SelectionConfig { pool: 8, cycle: false };
        for attempt in 0..8 {
            let (rank, parent) = population.select(attempt, &selection).unwrap();
            assert_eq!(rank, attempt);
            assert_eq!(parent.fitness_score, 700 - attempt as i64 * 100);
        }
        assert!(population.select(8, &selection).is_none());
        assert!(population.select(9, &selection).is_none());
    }

    #[test]
    fn test_from_members_truncates() {
        let mut rng = ChaCha8Rng::seed_from_u64(25);
        let members: Vec<_> = (0..10).map(|i| process(&mut rng, i)).collect();
        let population = Population::from_members(4, members);
        let scores: Vec<i64> = population.members().iter().map(|m| m.fitness_score).collect();
        assert_eq!(scores, vec![9, 8, 7, 6]);
        assert_eq!(population.mean_fitness(), 7.5);
    }
}
