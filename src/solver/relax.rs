//! Flux-weighted Jacobi relaxation of the interior points.
//!
//! Discretizes `d/dx[k(x) dh/dx] = 0` by a finite-volume stencil: each
//! neighbor is weighted by the mean conductivity of the face between it and
//! the centre point,
//!
//! ```text
//! hnew[i] = ((k[i+1] + k[i]) h[i+1] + (k[i] + k[i-1]) h[i-1])
//!           / (k[i+1] + 2 k[i] + k[i-1])
//! ```
//!
//! All new values are computed from the previous iterate and only then copied
//! back, so the result does not depend on traversal order.

use num_traits::Float;

use crate::domain::{Boundary, CoefficientField, ProcessTopology};

/// One Jacobi sweep over `1..=n`, writing into `hnew`.
///
/// Halo slots of `hnew` are left as they are. Returns the sum of squared
/// changes over the interior.
pub fn relax_sweep<T: Float>(h: &[T], k: &[T], hnew: &mut [T]) -> T {
    assert_eq!(h.len(), k.len());
    assert_eq!(h.len(), hnew.len());
    let n = h.len() - 2;
    let two = T::one() + T::one();
    let mut change = T::zero();
    for i in 1..=n {
        let east = k[i + 1] + k[i];
        let west = k[i] + k[i - 1];
        let v = (east * h[i + 1] + west * h[i - 1]) / (k[i + 1] + two * k[i] + k[i - 1]);
        let d = v - h[i];
        change = change + d * d;
        hnew[i] = v;
    }
    change
}

/// Dirichlet heads at the global domain ends.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryConditions {
    pub h0: f64,
    pub hl: f64,
    /// Ends owned by this rank
    pub sides: Boundary,
}

impl BoundaryConditions {
    pub fn new(h0: f64, hl: f64, topology: &ProcessTopology) -> Self {
        Self { h0, hl, sides: topology.boundaries() }
    }

    pub fn apply(&self, h: &mut [f64]) {
        if self.sides.contains(Boundary::LEFT) {
            h[0] = self.h0;
        }
        if self.sides.contains(Boundary::RIGHT) {
            if let Some(last) = h.last_mut() {
                *last = self.hl;
            }
        }
    }
}

/// Per-rank relaxation state: just the scratch buffer for the new iterate.
#[derive(Clone, Debug)]
pub struct Relaxer {
    scratch: Vec<f64>,
    bc: BoundaryConditions,
}

impl Relaxer {
    pub fn new(segment_len: usize, bc: BoundaryConditions) -> Self {
        Self { scratch: vec![0.0; segment_len], bc }
    }

    /// Update the interior of `h` from its current values, then reassert
    /// the boundary heads. Returns the local sum of squared changes.
    pub fn step(&mut self, h: &mut [f64], k: &CoefficientField) -> f64 {
        let n = h.len() - 2;
        let change = relax_sweep(&*h, k.as_slice(), &mut self.scratch);
        h[1..=n].copy_from_slice(&self.scratch[1..=n]);
        self.bc.apply(h);
        change
    }
}
