//! Shared helpers for the solver.

pub mod convergence;

pub use convergence::{Convergence, SolveStats};
