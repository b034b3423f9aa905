//! Feed-forward controllers and their mutation.
//!
//! A controller is two dense layers (input -> hidden -> output) with one
//! activation applied after each, and a rule that turns the outputs into
//! a jump decision. Mutation works on a copy of a ranked parent.

mod mutations;
mod network;

pub use mutations::{
    CountTier, MutationConfig, MutationKind, MutationReport, MutationSchedule, RateTier,
};
pub use network::{
    standard_normal, Activation, Controller, ControllerShape, DecisionRule, Layer, ShapeError,
};
