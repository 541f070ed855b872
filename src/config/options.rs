//! Problem and run options for a groundwater-flow job.
//!
//! This module provides the `ProblemParams` struct describing the physics and
//! grid of the 1-D flow problem, and the `RunOptions` struct controlling how the
//! relaxation is driven. Both deserialize from TOML with every field optional;
//! missing fields fall back to the reference scenario (a = 0.007, b = -0.07,
//! c = 0.2, h0 = 1, hL = 0 on [0, 10] with 100 points and 10000 iterations).

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{GwError, Result};

/// Rule used to derive the grid spacing from the extent and point count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Spacing {
    /// `delx = (xL - x0) / (N + 2P - 1)`; every process reserves spacing for
    /// its own two halo slots, so the physical grid depends on P.
    #[default]
    Legacy,
    /// `delx = (xL - x0) / (N + 1)`; the legacy rule at P = 1, identical for
    /// every process count.
    Uniform,
}

/// Physics and grid of the flow problem.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProblemParams {
    /// Head at the global left end
    pub h0: f64,
    /// Head at the global right end
    pub hl: f64,
    /// Left end of the physical domain
    pub x0: f64,
    /// Right end of the physical domain
    pub xl: f64,
    /// Conductivity k(x) = a x² + b x + c
    pub a: f64,
    pub b: f64,
    pub c: f64,
    /// Integration constants of the analytical solution
    pub c0: f64,
    pub c1: f64,
    /// Requested number of interior points (shrunk to a multiple of P)
    pub points: usize,
}

impl Default for ProblemParams {
    fn default() -> Self {
        Self {
            h0: 1.0,
            hl: 0.0,
            x0: 0.0,
            xl: 10.0,
            a: 0.007,
            b: -0.07,
            c: 0.2,
            c0: -0.0055,
            c1: 0.5,
            points: 100,
        }
    }
}

impl ProblemParams {
    /// Reject non-finite values and an empty extent.
    ///
    /// Conductivity and analytical-solution checks live with the types that
    /// depend on them (`Quadratic`, `AnalyticHead`).
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("h0", self.h0),
            ("hl", self.hl),
            ("x0", self.x0),
            ("xl", self.xl),
            ("a", self.a),
            ("b", self.b),
            ("c", self.c),
            ("c0", self.c0),
            ("c1", self.c1),
        ];
        if let Some((name, v)) = named.iter().find(|(_, v)| !v.is_finite()) {
            return Err(GwError::InvalidParameter(format!("{name} = {v} is not finite")));
        }
        if self.xl <= self.x0 {
            return Err(GwError::InvalidParameter(format!(
                "domain [{}, {}] is empty",
                self.x0, self.xl
            )));
        }
        Ok(())
    }
}

/// How the relaxation is driven.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Ranks for the thread runtime; MPI runs take the launcher's count
    pub procs: usize,
    /// Number of Jacobi iterations (the upper bound when `tol` is set)
    pub iterations: usize,
    pub spacing: Spacing,
    /// Stop early once the global L2 norm of one update drops below this
    pub tol: Option<f64>,
    /// Iterations between two early-exit checks
    pub check_every: usize,
    /// Record the RMS error every this many iterations
    pub history_every: Option<usize>,
    /// Where rank 0 writes the gathered `x,H` rows
    pub output: PathBuf,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            procs: 4,
            iterations: 10_000,
            spacing: Spacing::Legacy,
            tol: None,
            check_every: 100,
            history_every: None,
            output: PathBuf::from("head.out"),
        }
    }
}

impl RunOptions {
    pub fn validate(&self) -> Result<()> {
        if self.procs == 0 {
            return Err(GwError::NoProcesses);
        }
        if self.check_every == 0 {
            return Err(GwError::InvalidParameter("check_every must be positive".into()));
        }
        if self.history_every == Some(0) {
            return Err(GwError::InvalidParameter("history_every must be positive".into()));
        }
        match self.tol {
            Some(t) if !(t.is_finite() && t > 0.0) => Err(GwError::InvalidParameter(format!(
                "tolerance {t} must be positive and finite"
            ))),
            _ => Ok(()),
        }
    }
}

/// Top-level job file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub problem: ProblemParams,
    pub run: RunOptions,
}

impl JobConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| GwError::Config(e.to_string()))
    }
}

/// Read a TOML job file.
pub fn load_config(path: &Path) -> Result<JobConfig> {
    let content = std::fs::read_to_string(path)?;
    JobConfig::from_toml(&content)
}
