//! Signal evaluation: EMA crossover and pre-alert detection.

pub mod crossover;
pub mod engine;

pub use crossover::*;
pub use engine::*;
