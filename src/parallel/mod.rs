//! Message-passing runtimes for the distributed relaxation.
//!
//! Every rank owns its segment exclusively; the only coordination is the
//! paired point-to-point exchange and a handful of rooted collectives.

use crate::error::Result;

/// Message tag for point-to-point exchanges.
pub type Tag = i32;

pub trait Comm {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Left and right neighbor of this rank in a 1-D non-periodic
    /// arrangement, `None` past either end.
    fn neighbors(&self) -> (Option<usize>, Option<usize>) {
        let rank = self.rank();
        let left = rank.checked_sub(1);
        let right = (rank + 1 < self.size()).then_some(rank + 1);
        (left, right)
    }

    fn barrier(&self) -> Result<()>;

    /// Send `value` to `dest` and receive one value from `source` as a single
    /// combined operation. A `None` endpoint skips that half; the return is
    /// `None` exactly when `source` is `None`.
    fn send_recv(
        &self,
        value: f64,
        dest: Option<usize>,
        source: Option<usize>,
        tag: Tag,
    ) -> Result<Option<f64>>;

    /// Sum `x` over all ranks; only `root` gets `Some`.
    fn reduce_sum(&self, x: f64, root: usize) -> Result<Option<f64>>;

    /// Sum `x` over all ranks; every rank gets the total.
    fn all_reduce(&self, x: f64) -> Result<f64>;

    /// Concatenate every rank's `local` in rank order at `root`. All ranks
    /// must pass slices of the same length.
    fn gather(&self, local: &[f64], root: usize) -> Result<Option<Vec<f64>>>;

    /// Tear down the whole group. Peers blocked in communication must not
    /// wait forever.
    fn abort(&self, code: i32);
}

#[cfg(feature = "mpi")]
pub mod mpi_comm;
#[cfg(feature = "mpi")]
pub use mpi_comm::MpiComm;

pub mod thread_comm;
pub use thread_comm::{run_threaded, ThreadComm};
