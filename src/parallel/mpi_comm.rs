//! MPI-based parallel communication module.
//!
//! This module provides an implementation of the `Comm` trait on top of a
//! 1-D non-periodic Cartesian communicator, so neighbor lookup comes from the
//! MPI topology (`shift`) rather than rank arithmetic. It is only available
//! when the `mpi` feature is enabled.
//!
//! # Usage
//!
//! - `MpiComm::new()` initializes MPI; dropping it finalizes MPI.
//! - The paired halo exchange maps onto `MPI_Sendrecv`, which is what keeps
//!   the ring exchange free of the send-then-receive deadlock.
//!
//! # Example
//! ```no_run
//! # #[cfg(feature = "mpi")]
//! # {
//! use gwflow::parallel::{Comm, MpiComm};
//! let comm = MpiComm::new().unwrap();
//! println!("Rank: {} / {}", comm.rank(), comm.size());
//! # }
//! ```

use mpi::collective::SystemOperation;
use mpi::environment::Universe;
use mpi::point_to_point::send_receive_into_with_tags;
use mpi::topology::CartesianCommunicator;
use mpi::traits::*;

use super::{Comm, Tag};
use crate::error::{GwError, Result};

/// MPI communicator wrapper for distributed runs.
pub struct MpiComm {
    /// 1-D non-periodic Cartesian communicator over all processes.
    pub grid: CartesianCommunicator,
    /// The rank (ID) of this process within `grid`.
    pub rank: usize,
    /// The total number of processes.
    pub size: usize,
    // Declared last: MPI is finalized when this drops.
    _universe: Universe,
}

impl MpiComm {
    /// Initializes MPI and lays every process of the world out on a line.
    pub fn new() -> Result<Self> {
        let universe = mpi::initialize()
            .ok_or_else(|| GwError::Comm("MPI was already initialized".into()))?;
        let world = universe.world();
        let size = world.size();
        if size < 1 {
            return Err(GwError::NoProcesses);
        }
        let grid = world
            .create_cartesian_communicator(&[size], &[false], false)
            .ok_or_else(|| GwError::Comm("process left out of the Cartesian grid".into()))?;
        let rank = grid.rank() as usize;
        Ok(MpiComm {
            grid,
            rank,
            size: size as usize,
            _universe: universe,
        })
    }
}

impl Comm for MpiComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn neighbors(&self) -> (Option<usize>, Option<usize>) {
        let (left, right) = self.grid.shift(0, 1);
        (left.map(|r| r as usize), right.map(|r| r as usize))
    }

    fn barrier(&self) -> Result<()> {
        self.grid.barrier();
        Ok(())
    }

    fn send_recv(
        &self,
        value: f64,
        dest: Option<usize>,
        source: Option<usize>,
        tag: Tag,
    ) -> Result<Option<f64>> {
        match (dest, source) {
            (Some(d), Some(s)) => {
                let mut received = 0.0f64;
                let dest_proc = self.grid.process_at_rank(d as i32);
                let source_proc = self.grid.process_at_rank(s as i32);
                send_receive_into_with_tags(&value, &dest_proc, tag, &mut received, &source_proc, tag);
                Ok(Some(received))
            }
            (Some(d), None) => {
                self.grid.process_at_rank(d as i32).send_with_tag(&value, tag);
                Ok(None)
            }
            (None, Some(s)) => {
                let (received, _status) = self.grid.process_at_rank(s as i32).receive_with_tag::<f64>(tag);
                Ok(Some(received))
            }
            (None, None) => Ok(None),
        }
    }

    fn reduce_sum(&self, x: f64, root: usize) -> Result<Option<f64>> {
        let root_proc = self.grid.process_at_rank(root as i32);
        if self.rank == root {
            let mut sum = 0.0f64;
            root_proc.reduce_into_root(&x, &mut sum, SystemOperation::sum());
            Ok(Some(sum))
        } else {
            root_proc.reduce_into(&x, SystemOperation::sum());
            Ok(None)
        }
    }

    fn all_reduce(&self, x: f64) -> Result<f64> {
        let mut y = x;
        self.grid.all_reduce_into(&x, &mut y, SystemOperation::sum());
        Ok(y)
    }

    fn gather(&self, local: &[f64], root: usize) -> Result<Option<Vec<f64>>> {
        let root_proc = self.grid.process_at_rank(root as i32);
        if self.rank == root {
            // Only the root allocates the receive buffer.
            let mut recvbuf = vec![0.0f64; local.len() * self.size];
            root_proc.gather_into_root(local, &mut recvbuf[..]);
            Ok(Some(recvbuf))
        } else {
            root_proc.gather_into(local);
            Ok(None)
        }
    }

    fn abort(&self, code: i32) {
        tracing::error!(rank = self.rank, code, "aborting MPI job");
        self.grid.abort(code)
    }
}
