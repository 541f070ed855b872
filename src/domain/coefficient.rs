//! Hydraulic conductivity k(x) sampled on a local segment.

use num_traits::Float;

use crate::domain::partition::GridPartition;
use crate::error::{GwError, Result};

/// `a x² + b x + c`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quadratic<T> {
    pub a: T,
    pub b: T,
    pub c: T,
}

impl<T: Float> Quadratic<T> {
    pub fn new(a: T, b: T, c: T) -> Self {
        Self { a, b, c }
    }

    pub fn eval(&self, x: T) -> T {
        self.a * x * x + self.b * x + self.c
    }

    /// `4ac - b²`; positive means no real roots.
    pub fn discriminant(&self) -> T {
        let two = T::one() + T::one();
        two * two * self.a * self.c - self.b * self.b
    }

    /// Where the quadratic is smallest on `[lo, hi]`: an end or the vertex.
    pub fn argmin_on(&self, lo: T, hi: T) -> T {
        let mut at = if self.eval(lo) <= self.eval(hi) { lo } else { hi };
        if self.a != T::zero() {
            let two = T::one() + T::one();
            let vertex = -self.b / (two * self.a);
            if vertex > lo && vertex < hi && self.eval(vertex) < self.eval(at) {
                at = vertex;
            }
        }
        at
    }
}

/// Conductivity at every slot of one rank's segment, halos included.
#[derive(Clone, Debug, PartialEq)]
pub struct CoefficientField {
    values: Vec<f64>,
}

impl CoefficientField {
    pub fn new(k: &Quadratic<f64>, partition: &GridPartition, rank: usize) -> Result<Self> {
        Self::from_values(partition.coordinates(rank).into_iter().map(|x| k.eval(x)).collect())
    }

    /// Wrap precomputed values; they must all be finite.
    pub fn from_values(values: Vec<f64>) -> Result<Self> {
        if values.len() < 3 {
            return Err(GwError::InvalidParameter(format!(
                "segment of {} slots has no interior",
                values.len()
            )));
        }
        if let Some((i, v)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(GwError::InvalidParameter(format!("k[{i}] = {v} is not finite")));
        }
        Ok(Self { values })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Spacing;
    use approx::assert_relative_eq;

    #[test]
    fn samples_quadratic_at_local_coordinates() {
        let k = Quadratic::new(0.007, -0.07, 0.2);
        let p = GridPartition::new(8, 2, 0.0, 10.0, Spacing::Legacy).unwrap();
        let field = CoefficientField::new(&k, &p, 1).unwrap();
        assert_eq!(field.as_slice().len(), 6);
        for (i, &v) in field.as_slice().iter().enumerate() {
            let x = p.x(1, i);
            assert_relative_eq!(v, 0.007 * x * x - 0.07 * x + 0.2, epsilon = 1e-15);
        }
    }

    #[test]
    fn discriminant_and_minimum() {
        let k = Quadratic::new(0.007, -0.07, 0.2);
        assert_relative_eq!(k.discriminant(), 0.0007, epsilon = 1e-15);
        // Vertex at x = 5 gives k = 0.025.
        assert_relative_eq!(k.argmin_on(0.0, 10.0), 5.0, epsilon = 1e-12);
        assert_relative_eq!(k.eval(5.0), 0.025, epsilon = 1e-12);
        assert_eq!(k.argmin_on(6.0, 10.0), 6.0);
        let falling = Quadratic::new(0.0, -1.0, 3.0);
        assert_eq!(falling.argmin_on(0.0, 2.0), 2.0);
    }

    #[test]
    fn rejects_non_finite_values() {
        assert!(CoefficientField::from_values(vec![1.0, f64::INFINITY, 1.0]).is_err());
        assert!(CoefficientField::from_values(vec![1.0, 1.0]).is_err());
    }
}
