//! 1-D process arrangement: who sits left and right of each rank.

use bitflags::bitflags;

use crate::error::{GwError, Result};
use crate::parallel::Comm;

bitflags! {
    /// Global domain ends held by a rank.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct Boundary: u8 {
        const LEFT  = 0b01;
        const RIGHT = 0b10;
        const BOTH  = Self::LEFT.bits() | Self::RIGHT.bits();
    }
}

/// Position of one rank on a non-periodic line of `size` ranks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessTopology {
    pub rank: usize,
    pub size: usize,
    /// `None` past the global left end
    pub left: Option<usize>,
    /// `None` past the global right end
    pub right: Option<usize>,
}

impl ProcessTopology {
    pub fn new(rank: usize, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(GwError::NoProcesses);
        }
        if rank >= size {
            return Err(GwError::InvalidParameter(format!(
                "rank {rank} outside {size} processes"
            )));
        }
        Ok(Self {
            rank,
            size,
            left: rank.checked_sub(1),
            right: (rank + 1 < size).then_some(rank + 1),
        })
    }

    /// Ask the runtime for this rank's neighbors.
    pub fn from_comm<C: Comm>(comm: &C) -> Result<Self> {
        let size = comm.size();
        if size == 0 {
            return Err(GwError::NoProcesses);
        }
        let (left, right) = comm.neighbors();
        Ok(Self { rank: comm.rank(), size, left, right })
    }

    pub fn boundaries(&self) -> Boundary {
        let mut sides = Boundary::empty();
        if self.left.is_none() {
            sides |= Boundary::LEFT;
        }
        if self.right.is_none() {
            sides |= Boundary::RIGHT;
        }
        sides
    }

    pub fn is_root(&self) -> bool {
        self.rank == 0
    }
}
