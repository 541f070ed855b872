//! Paired halo exchange with the left and right neighbor.

use crate::domain::ProcessTopology;
use crate::error::Result;
use crate::parallel::{Comm, Tag};

/// Tag for values travelling left (our `h[1]` becomes the left neighbor's
/// right halo).
pub const LEFTWARD: Tag = 1;
/// Tag for values travelling right (our `h[n]` becomes the right neighbor's
/// left halo).
pub const RIGHTWARD: Tag = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HaloExchanger {
    left: Option<usize>,
    right: Option<usize>,
}

impl HaloExchanger {
    pub fn new(topology: &ProcessTopology) -> Self {
        Self { left: topology.left, right: topology.right }
    }

    /// Refresh both halo slots of `h` from the neighbors.
    ///
    /// Only the interior values `h[1]` and `h[n]` are sent, and only the halo
    /// slots `h[0]` and `h[n+1]` are written, so both halos end up holding
    /// neighbor values from the same iteration. A missing neighbor leaves the
    /// corresponding slot untouched.
    pub fn exchange<C: Comm>(&self, comm: &C, h: &mut [f64]) -> Result<()> {
        let n = h.len() - 2;
        if let Some(v) = comm.send_recv(h[1], self.left, self.right, LEFTWARD)? {
            h[n + 1] = v;
        }
        if let Some(v) = comm.send_recv(h[n], self.right, self.left, RIGHTWARD)? {
            h[0] = v;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::run_threaded;

    #[test]
    fn halos_pick_up_neighbor_edges() {
        let n = 3;
        let out = run_threaded(3, |comm| {
            let topo = ProcessTopology::from_comm(comm)?;
            let r = comm.rank() as f64;
            // Interior i holds 100r + i; halos start as sentinels.
            let mut h: Vec<f64> = (0..n + 2).map(|i| 100.0 * r + i as f64).collect();
            h[0] = -1.0;
            h[n + 1] = -2.0;
            HaloExchanger::new(&topo).exchange(comm, &mut h)?;
            Ok(h)
        })
        .unwrap();
        assert_eq!(out[0], vec![-1.0, 1.0, 2.0, 3.0, 101.0]);
        assert_eq!(out[1], vec![3.0, 101.0, 102.0, 103.0, 201.0]);
        assert_eq!(out[2], vec![103.0, 201.0, 202.0, 203.0, -2.0]);
    }

    #[test]
    fn single_rank_exchange_is_noop() {
        let out = run_threaded(1, |comm| {
            let topo = ProcessTopology::from_comm(comm)?;
            let mut h = vec![7.0, 1.0, 9.0];
            HaloExchanger::new(&topo).exchange(comm, &mut h)?;
            Ok(h)
        })
        .unwrap();
        assert_eq!(out[0], vec![7.0, 1.0, 9.0]);
    }
}
