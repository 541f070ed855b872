//! Direct reference solve of the discrete flow equations using Faer.
//!
//! The relaxation converges to the solution of a tridiagonal system: for every
//! global interior point j,
//!
//! ```text
//! (kE + 2 kC + kW) h[j] - (kE + kC) h[j+1] - (kC + kW) h[j-1] = 0
//! ```
//!
//! with the boundary heads moved to the right-hand side. Solving it directly
//! (dense LU with partial pivoting; N is small) gives the fixed point the
//! Jacobi iterate is heading for, independent of discretization error.
//!
//! # References
//! - Faer documentation: https://github.com/sarah-ek/faer-rs

use faer::linalg::solvers::{PartialPivLu, Solve};
use faer::Mat;

use crate::config::ProblemParams;
use crate::domain::{GridPartition, Quadratic};
use crate::error::{GwError, Result};

/// Dense LU solver for the global discrete system.
///
/// Stores the factorization so repeated solves (other boundary heads) reuse it.
pub struct DirectReference {
    /// Conductivity at global grid points `0..=N+1`
    k: Vec<f64>,
    factor: Option<PartialPivLu<f64>>,
}

impl DirectReference {
    /// Sample k(x) at every global grid point `x = j * delx`.
    pub fn new(params: &ProblemParams, partition: &GridPartition) -> Self {
        let quad = Quadratic::new(params.a, params.b, params.c);
        let k = (0..partition.n_global + 2)
            .map(|j| quad.eval(j as f64 * partition.delx))
            .collect();
        Self { k, factor: None }
    }

    fn assemble(&self) -> Mat<f64> {
        let n = self.k.len() - 2;
        let k = &self.k;
        let mut a = Mat::<f64>::zeros(n, n);
        for row in 0..n {
            let j = row + 1;
            let east = k[j + 1] + k[j];
            let west = k[j] + k[j - 1];
            a[(row, row)] = east + west;
            if row > 0 {
                a[(row, row - 1)] = -west;
            }
            if row + 1 < n {
                a[(row, row + 1)] = -east;
            }
        }
        a
    }

    /// Global head profile of length `N + 2`, boundary heads included.
    pub fn solve(&mut self, h0: f64, hl: f64) -> Result<Vec<f64>> {
        let n = self.k.len() - 2;
        if self.factor.is_none() {
            let a = self.assemble();
            self.factor = Some(a.partial_piv_lu());
        }
        let factor = self
            .factor
            .as_ref()
            .ok_or_else(|| GwError::Factor("missing LU factorization".into()))?;
        let k = &self.k;
        let mut rhs = Mat::<f64>::zeros(n, 1);
        rhs[(0, 0)] += (k[1] + k[0]) * h0;
        rhs[(n - 1, 0)] += (k[n + 1] + k[n]) * hl;
        let sol = factor.solve(&rhs);
        let x: Vec<f64> = (0..n).map(|i| sol[(i, 0)]).collect();
        if let Some((i, v)) = x.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(GwError::Factor(format!("h[{}] = {v} after LU solve", i + 1)));
        }
        let mut profile = Vec::with_capacity(n + 2);
        profile.push(h0);
        profile.extend(x);
        profile.push(hl);
        Ok(profile)
    }
}
