//! Early-exit test & run statistics for the relaxation.

use std::time::Duration;

/// Optional stopping rule on the global update norm.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Convergence {
    pub tol: f64,
    /// Iterations between two checks; each check is a global all-reduce
    pub check_every: usize,
}

impl Convergence {
    /// A `check_every` of 0 is read as 1.
    pub fn new(tol: f64, check_every: usize) -> Self {
        Self { tol, check_every: check_every.max(1) }
    }

    /// Whether iteration `i` (1-based) is a check point.
    pub fn due(&self, i: usize) -> bool {
        i % self.check_every.max(1) == 0
    }

    /// Returns true once the L2 norm of the last update is within `tol`.
    pub fn check(&self, update_norm: f64) -> bool {
        update_norm <= self.tol
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SolveStats {
    pub iterations: usize,
    /// Wall time of the iteration loop only
    pub elapsed: Duration,
    /// True when the loop stopped on the tolerance before the iteration cap
    pub converged: bool,
    /// Global L2 norm of the update at the last check, if any
    pub final_update: Option<f64>,
    /// RMS error against the analytical head; rank 0 only
    pub rms_error: Option<f64>,
    /// `(iteration, rms error)` samples; rank 0 only
    pub history: Vec<(usize, f64)>,
}

impl SolveStats {
    /// Millions of floating-point operations per second, counting nine per
    /// point update.
    pub fn mflops(&self, n_global: usize) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            9.0 * self.iterations as f64 * n_global as f64 * 1e-6 / secs
        } else {
            0.0
        }
    }
}
