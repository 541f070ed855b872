//! Run context: the explicit per-rank state handed to every component.
//!
//! Modules:
//! - [`run_context`]: Contains the `RunContext` struct, built once per rank by
//!   `RunContext::establish`.

pub mod run_context;
pub use run_context::RunContext;
