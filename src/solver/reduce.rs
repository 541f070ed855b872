//! RMS error of the relaxed head against the closed-form solution.
//!
//! For `k(x) = a x² + b x + c` with `4ac > b²` the flow equation integrates to
//!
//! ```text
//! h(x) = c0 · coef · atan((2a x + b) · coef / 2) + c1,   coef = 2 / sqrt(4ac - b²)
//! ```

use crate::config::ProblemParams;
use crate::domain::{GridPartition, Quadratic};
use crate::error::{GwError, Result};
use crate::parallel::Comm;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalyticHead {
    k: Quadratic<f64>,
    c0: f64,
    c1: f64,
    coef: f64,
}

impl AnalyticHead {
    pub fn new(k: Quadratic<f64>, c0: f64, c1: f64) -> Result<Self> {
        let disc = k.discriminant();
        if !(disc > 0.0) {
            return Err(GwError::IllPosedAnalytic(disc));
        }
        Ok(Self { k, c0, c1, coef: 2.0 / disc.sqrt() })
    }

    pub fn from_params(params: &ProblemParams) -> Result<Self> {
        Self::new(Quadratic::new(params.a, params.b, params.c), params.c0, params.c1)
    }

    pub fn head(&self, x: f64) -> f64 {
        let Quadratic { a, b, .. } = self.k;
        self.c0 * (self.coef * ((2.0 * a * x + b) * self.coef / 2.0).atan()) + self.c1
    }
}

/// Measures one rank's owned points and combines the ranks at rank 0.
#[derive(Clone, Copy, Debug)]
pub struct ErrorReducer<'a> {
    analytic: AnalyticHead,
    partition: &'a GridPartition,
    rank: usize,
}

impl<'a> ErrorReducer<'a> {
    pub fn new(analytic: AnalyticHead, partition: &'a GridPartition, rank: usize) -> Self {
        Self { analytic, partition, rank }
    }

    /// Sum of squared errors over `h[1..=n]`; halo slots are not ours.
    pub fn local_sq_error(&self, h: &[f64]) -> f64 {
        let n = self.partition.n_local;
        (1..=n)
            .map(|i| {
                let d = self.analytic.head(self.partition.x(self.rank, i)) - h[i];
                d * d
            })
            .sum()
    }

    /// Collective: every rank must call it. Rank 0 gets `sqrt(sum) / N`.
    pub fn reduce<C: Comm>(&self, comm: &C, h: &[f64]) -> Result<Option<f64>> {
        let total = comm.reduce_sum(self.local_sq_error(h), 0)?;
        Ok(total.map(|s| s.sqrt() / self.partition.n_global as f64))
    }
}
