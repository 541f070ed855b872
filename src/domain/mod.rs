//! Process layout, grid partition and coefficient field.

pub mod coefficient;
pub mod partition;
pub mod topology;

pub use coefficient::{CoefficientField, Quadratic};
pub use partition::GridPartition;
pub use topology::{Boundary, ProcessTopology};
