//! gwflow: distributed Jacobi relaxation for 1-D steady groundwater flow
//!
//! Solves `0 = d/dx[k(x) dh/dx]` with quadratic conductivity by splitting the
//! grid across ranks that trade halo values every iteration. Ranks run either
//! as threads in one process ([`parallel::ThreadComm`]) or as MPI processes
//! (`mpi` feature).

pub mod parallel;

pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod output;
pub mod solver;
pub mod utils;

// Re-exports for convenience
pub use config::*;
pub use context::*;
pub use domain::*;
pub use error::*;
pub use solver::*;

// Re-export SolveStats at the crate root for convenience
pub use utils::convergence::SolveStats;
