//! Two-layer feed-forward controller and forward propagation.

use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single dense layer: `inputs x neurons` weights plus one bias per neuron
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub weights: Array2<f64>,
    pub biases: Array1<f64>,
}

impl Serialize for Layer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let shape = self.weights.shape();
        let weights_data: Vec<f64> = self.weights.iter().copied().collect();
        let biases_data: Vec<f64> = self.biases.iter().copied().collect();

        let mut state = serializer.serialize_struct("Layer", 3)?;
        state.serialize_field("shape", &[shape[0], shape[1]])?;
        state.serialize_field("weights", &weights_data)?;
        state.serialize_field("biases", &biases_data)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Layer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct LayerData {
            shape: [usize; 2],
            weights: Vec<f64>,
            biases: Vec<f64>,
        }

        let data = LayerData::deserialize(deserializer)?;
        let weights = Array2::from_shape_vec((data.shape[0], data.shape[1]), data.weights)
            .map_err(serde::de::Error::custom)?;
        let biases = Array1::from_vec(data.biases);

        Ok(Layer { weights, biases })
    }
}

impl Layer {
    /// Standard-normal weights, zero biases
    pub fn random<R: Rng + ?Sized>(inputs: usize, neurons: usize, rng: &mut R) -> Self {
        Self {
            weights: Array2::from_shape_fn((inputs, neurons), |_| standard_normal(rng)),
            biases: Array1::zeros(neurons),
        }
    }

    #[inline]
    pub fn forward(&self, inputs: &Array1<f64>, activation: Activation) -> Array1<f64> {
        let mut out = inputs.dot(&self.weights) + &self.biases;
        out.mapv_inplace(|x| activation.apply(x));
        out
    }

    /// Check the arrays against an expected `(inputs, neurons)` shape
    pub fn check_shape(&self, name: &'static str, inputs: usize, neurons: usize) -> Result<(), ShapeError> {
        let found = self.weights.dim();
        if found != (inputs, neurons) {
            return Err(ShapeError {
                layer: name,
                part: "weights",
                expected: (inputs, neurons),
                found,
            });
        }
        if self.biases.len() != neurons {
            return Err(ShapeError {
                layer: name,
                part: "biases",
                expected: (1, neurons),
                found: (1, self.biases.len()),
            });
        }
        Ok(())
    }

    pub fn is_finite(&self) -> bool {
        self.weights.iter().all(|w| w.is_finite()) && self.biases.iter().all(|b| b.is_finite())
    }
}

/// Standard normal sample via Box-Muller
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1 = rng.gen::<f64>().clamp(f64::MIN_POSITIVE, 1.0);
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Nonlinearity applied after both layers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Sigmoid,
    Relu,
    /// Negative inputs keep 1% of their value
    LeakyRelu,
}

impl Activation {
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Relu => x.max(0.0),
            Activation::LeakyRelu => x.max(0.01 * x),
        }
    }
}

/// How the output vector becomes a jump decision
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    /// Jump when the first output beats the second
    Compare,
    /// Jump when the first output exceeds the threshold
    Threshold(f64),
}

impl DecisionRule {
    /// Minimum number of outputs the rule reads
    pub fn min_outputs(&self) -> usize {
        match self {
            DecisionRule::Compare => 2,
            DecisionRule::Threshold(_) => 1,
        }
    }

    #[inline]
    pub fn decide(&self, outputs: &[f64]) -> bool {
        match *self {
            DecisionRule::Compare => outputs.len() >= 2 && outputs[0] > outputs[1],
            DecisionRule::Threshold(t) => outputs.first().is_some_and(|&o| o > t),
        }
    }
}

/// Layer sizes of a controller
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerShape {
    pub inputs: usize,
    pub neurons: usize,
    pub outputs: usize,
}

impl fmt::Display for ControllerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.inputs, self.neurons, self.outputs)
    }
}

/// A layer whose arrays disagree with the expected shape
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeError {
    pub layer: &'static str,
    pub part: &'static str,
    pub expected: (usize, usize),
    pub found: (usize, usize),
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} shape mismatch: expected {:?}, found {:?}",
            self.layer, self.part, self.expected, self.found
        )
    }
}

impl std::error::Error for ShapeError {}

/// Feed-forward controller: input -> hidden -> output
#[derive(Clone, Debug)]
pub struct Controller {
    pub shape: ControllerShape,
    pub hidden: Layer,
    pub output: Layer,
    pub activation: Activation,
    pub decision: DecisionRule,
}

impl Controller {
    /// Fresh controller with random weights
    pub fn random<R: Rng + ?Sized>(
        shape: ControllerShape,
        activation: Activation,
        decision: DecisionRule,
        rng: &mut R,
    ) -> Self {
        Self {
            shape,
            hidden: Layer::random(shape.inputs, shape.neurons, rng),
            output: Layer::random(shape.neurons, shape.outputs, rng),
            activation,
            decision,
        }
    }

    /// Build from explicit layers, verifying every dimension
    pub fn from_layers(
        shape: ControllerShape,
        hidden: Layer,
        output: Layer,
        activation: Activation,
        decision: DecisionRule,
    ) -> Result<Self, ShapeError> {
        hidden.check_shape("hidden", shape.inputs, shape.neurons)?;
        output.check_shape("output", shape.neurons, shape.outputs)?;
        Ok(Self {
            shape,
            hidden,
            output,
            activation,
            decision,
        })
    }

    /// Perform forward pass through both layers
    #[inline]
    pub fn forward(&self, inputs: &[f64]) -> Vec<f64> {
        debug_assert_eq!(inputs.len(), self.shape.inputs);

        let x = Array1::from_vec(inputs.to_vec());
        let hidden = self.hidden.forward(&x, self.activation);
        self.output.forward(&hidden, self.activation).to_vec()
    }

    /// Forward pass followed by the decision rule
    #[inline]
    pub fn decide(&self, inputs: &[f64]) -> bool {
        self.decision.decide(&self.forward(inputs))
    }

    /// Weights and biases across both layers
    pub fn parameter_count(&self) -> usize {
        [&self.hidden, &self.output]
            .iter()
            .map(|l| l.weights.len() + l.biases.len())
            .sum()
    }

    /// Check the network holds no NaN/Inf
    pub fn is_valid(&self) -> bool {
        self.hidden.is_finite() && self.output.is_finite()
    }
}
