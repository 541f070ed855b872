//! The relaxation and its collectives.

pub mod direct;
pub mod gather;
pub mod halo;
pub mod jacobi;
pub mod reduce;
pub mod relax;

pub use direct::DirectReference;
pub use gather::{GatheredHead, ResultGatherer};
pub use halo::HaloExchanger;
pub use jacobi::{JacobiOutcome, JacobiSolver};
pub use reduce::{AnalyticHead, ErrorReducer};
pub use relax::{relax_sweep, BoundaryConditions, Relaxer};
