//! Assemble every rank's segment at rank 0.

use crate::domain::GridPartition;
use crate::error::{GwError, Result};
use crate::parallel::Comm;

/// All segments side by side in rank order, halo slots included.
///
/// Adjacent segments overlap: rank r's right halo duplicates rank r+1's first
/// interior point and rank r+1's left halo duplicates rank r's last one. The
/// duplicates are kept so that row j always sits at `x = j * delx`; that
/// coordinate is physical only for rows that are not duplicates.
#[derive(Clone, Debug, PartialEq)]
pub struct GatheredHead {
    pub values: Vec<f64>,
    pub segment_len: usize,
    pub delx: f64,
}

impl GatheredHead {
    pub fn procs(&self) -> usize {
        self.values.len() / self.segment_len
    }

    pub fn segments(&self) -> std::slice::ChunksExact<'_, f64> {
        self.values.chunks_exact(self.segment_len)
    }

    /// `(x, h)` rows as written to the output file.
    pub fn rows(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values.iter().enumerate().map(move |(j, &h)| (j as f64 * self.delx, h))
    }

    /// The `N + 2` values of the global grid: left boundary, every owned
    /// point in order, right boundary.
    pub fn global_profile(&self) -> Vec<f64> {
        let n = self.segment_len - 2;
        let mut out = Vec::with_capacity(n * self.procs() + 2);
        if let Some(first) = self.values.first() {
            out.push(*first);
        }
        for seg in self.segments() {
            out.extend_from_slice(&seg[1..=n]);
        }
        if let Some(last) = self.values.last() {
            out.push(*last);
        }
        out
    }

    /// Largest difference between a halo slot and the interior value it
    /// duplicates. Zero for a single segment.
    pub fn max_overlap_gap(&self) -> f64 {
        let n = self.segment_len - 2;
        let segs: Vec<&[f64]> = self.segments().collect();
        segs.windows(2)
            .map(|w| {
                let (lo, hi) = (w[0], w[1]);
                (lo[n + 1] - hi[1]).abs().max((hi[0] - lo[n]).abs())
            })
            .fold(0.0, f64::max)
    }
}

pub struct ResultGatherer;

impl ResultGatherer {
    /// Collective: every rank must call it with its full segment.
    pub fn gather<C: Comm>(comm: &C, h: &[f64], partition: &GridPartition) -> Result<Option<GatheredHead>> {
        if h.len() != partition.segment_len() {
            return Err(GwError::InvalidParameter(format!(
                "segment of {} slots, partition expects {}",
                h.len(),
                partition.segment_len()
            )));
        }
        Ok(comm.gather(h, 0)?.map(|values| GatheredHead {
            values,
            segment_len: partition.segment_len(),
            delx: partition.delx,
        }))
    }
}
