//! Everything a rank needs to run, established once at startup.
//!
//! `RunContext` bundles the communicator with the topology, partition and
//! validated parameters, and is handed to every component. Building it is
//! also where configuration errors are caught: a rank that finds one aborts
//! the whole group before anyone enters the halo exchange.

use crate::config::{JobConfig, ProblemParams, RunOptions};
use crate::domain::{GridPartition, ProcessTopology, Quadratic};
use crate::error::{GwError, Result};
use crate::parallel::Comm;
use crate::solver::reduce::AnalyticHead;

pub struct RunContext<'c, C: Comm> {
    pub comm: &'c C,
    pub topology: ProcessTopology,
    pub partition: GridPartition,
    pub params: ProblemParams,
    pub options: RunOptions,
    /// k(x)
    pub conductivity: Quadratic<f64>,
    pub analytic: AnalyticHead,
}

impl<'c, C: Comm> RunContext<'c, C> {
    /// Validate `job` and lay out the grid for this rank.
    ///
    /// On failure the communicator is aborted before the error is returned.
    pub fn establish(comm: &'c C, job: &JobConfig) -> Result<Self> {
        match Self::build(comm, job) {
            Ok(ctx) => Ok(ctx),
            Err(e) => {
                tracing::error!(rank = comm.rank(), error = %e, "invalid configuration");
                comm.abort(1);
                Err(e)
            }
        }
    }

    fn build(comm: &'c C, job: &JobConfig) -> Result<Self> {
        let params = job.problem.clone();
        let options = job.run.clone();
        params.validate()?;
        options.validate()?;

        let topology = ProcessTopology::from_comm(comm)?;
        let partition = GridPartition::new(params.points, topology.size, params.x0, params.xl, options.spacing)?;
        if partition.truncated() && topology.is_root() {
            tracing::warn!(
                requested = partition.requested,
                adjusted = partition.n_global,
                procs = partition.procs,
                "point count rounded down to a multiple of the process count"
            );
        }

        let conductivity = Quadratic::new(params.a, params.b, params.c);
        // Every coordinate any rank samples, halos included.
        let lo = params.x0.min(0.0);
        let hi = params.xl.max(partition.x(topology.size - 1, partition.n_local + 1));
        let x = conductivity.argmin_on(lo, hi);
        let k = conductivity.eval(x);
        if !(k > 0.0) {
            return Err(GwError::NonPositiveConductivity { x, k });
        }
        let analytic = AnalyticHead::new(conductivity, params.c0, params.c1)?;

        Ok(Self { comm, topology, partition, params, options, conductivity, analytic })
    }

    pub fn rank(&self) -> usize {
        self.topology.rank
    }
}
