//! Preprocessing: imputation, logical correction and standardization.

mod config;
mod normalizer;
mod stats;

pub use config::NormalizerConfig;
pub use normalizer::{FittedNormalizerState, Normalizer, ScalingParams};
pub use stats::{mean, median, population_std};
