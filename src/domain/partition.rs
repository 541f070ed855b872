//! Even split of the global grid into per-rank segments.
//!
//! Each rank owns `n` interior points and carries two extra slots, one on
//! each side, for halo or boundary values. The requested point count is
//! rounded down to a multiple of the process count; the rounding is lossy but
//! deterministic, and is reported rather than treated as an error.

use crate::config::Spacing;
use crate::error::{GwError, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct GridPartition {
    /// Interior points asked for
    pub requested: usize,
    /// Number of processes
    pub procs: usize,
    /// Interior points per process
    pub n_local: usize,
    /// Adjusted global interior point count, `n_local * procs`
    pub n_global: usize,
    pub spacing: Spacing,
    /// Grid spacing
    pub delx: f64,
}

impl GridPartition {
    pub fn new(requested: usize, procs: usize, x0: f64, xl: f64, spacing: Spacing) -> Result<Self> {
        if procs == 0 {
            return Err(GwError::NoProcesses);
        }
        let n_local = requested / procs;
        if n_local == 0 {
            return Err(GwError::EmptyPartition { requested, procs });
        }
        let n_global = n_local * procs;
        let cells = match spacing {
            Spacing::Legacy => n_global + 2 * procs - 1,
            Spacing::Uniform => n_global + 1,
        };
        let delx = (xl - x0) / cells as f64;
        if !(delx.is_finite() && delx > 0.0) {
            return Err(GwError::InvalidParameter(format!(
                "grid spacing {delx} over [{x0}, {xl}]"
            )));
        }
        Ok(Self { requested, procs, n_local, n_global, spacing, delx })
    }

    /// Length of a local segment including both halo slots.
    pub fn segment_len(&self) -> usize {
        self.n_local + 2
    }

    /// Whether the requested count had to be rounded down.
    pub fn truncated(&self) -> bool {
        self.n_global != self.requested
    }

    /// Physical coordinate of local index `i` on `rank`.
    pub fn x(&self, rank: usize, i: usize) -> f64 {
        (rank * self.n_local + i) as f64 * self.delx
    }

    /// Coordinates of every slot of `rank`'s segment, halos included.
    pub fn coordinates(&self, rank: usize) -> Vec<f64> {
        (0..self.segment_len()).map(|i| self.x(rank, i)).collect()
    }
}
