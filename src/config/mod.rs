//! Job configuration: problem parameters and run options.

pub mod options;

pub use options::{load_config, JobConfig, ProblemParams, RunOptions, Spacing};
