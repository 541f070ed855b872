//! Distributed Jacobi driver.
//!
//! Per iteration, on every rank: exchange halos, relax the interior, reassert
//! the boundary heads. After the loop the RMS error is reduced and the
//! segments are gathered at rank 0. Every rank runs the same number of
//! iterations; with a tolerance set they also all stop together, because the
//! stopping decision is taken on an all-reduced norm.

use std::time::Instant;

use crate::config::RunOptions;
use crate::context::RunContext;
use crate::domain::CoefficientField;
use crate::error::Result;
use crate::parallel::Comm;
use crate::solver::gather::{GatheredHead, ResultGatherer};
use crate::solver::halo::HaloExchanger;
use crate::solver::reduce::ErrorReducer;
use crate::solver::relax::{BoundaryConditions, Relaxer};
use crate::utils::convergence::{Convergence, SolveStats};

/// What one rank gets back from a run.
#[derive(Clone, Debug)]
pub struct JacobiOutcome {
    pub stats: SolveStats,
    /// The gathered head; rank 0 only
    pub head: Option<GatheredHead>,
    /// This rank's final segment, halos included
    pub local: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct JacobiSolver {
    pub iterations: usize,
    pub conv: Option<Convergence>,
    pub history_every: Option<usize>,
}

impl JacobiSolver {
    /// Fixed iteration count, no early exit, no history.
    pub fn new(iterations: usize) -> Self {
        Self { iterations, conv: None, history_every: None }
    }

    pub fn from_options(options: &RunOptions) -> Self {
        Self {
            iterations: options.iterations,
            conv: options.tol.map(|tol| Convergence::new(tol, options.check_every)),
            history_every: options.history_every.map(|every| every.max(1)),
        }
    }

    pub fn with_tolerance(mut self, tol: f64, check_every: usize) -> Self {
        self.conv = Some(Convergence::new(tol, check_every));
        self
    }

    pub fn with_history(mut self, every: usize) -> Self {
        self.history_every = Some(every.max(1));
        self
    }

    /// Collective: every rank of `ctx.comm` must call it.
    pub fn solve<C: Comm>(&self, ctx: &RunContext<'_, C>) -> Result<JacobiOutcome> {
        let comm = ctx.comm;
        let rank = ctx.rank();
        let partition = &ctx.partition;
        let n = partition.n_local;
        let _span = tracing::info_span!("jacobi", rank, n_local = n).entered();

        let k = CoefficientField::new(&ctx.conductivity, partition, rank)?;
        let bc = BoundaryConditions::new(ctx.params.h0, ctx.params.hl, &ctx.topology);
        let mut h = vec![0.0; partition.segment_len()];
        bc.apply(&mut h);

        let halo = HaloExchanger::new(&ctx.topology);
        let mut relaxer = Relaxer::new(partition.segment_len(), bc);
        let reducer = ErrorReducer::new(ctx.analytic, partition, rank);

        let mut iterations = 0;
        let mut converged = false;
        let mut final_update = None;
        let mut history = Vec::new();

        // Every rank starts the clock together.
        comm.barrier()?;
        let start = Instant::now();
        for it in 1..=self.iterations {
            halo.exchange(comm, &mut h)?;
            let change = relaxer.step(&mut h, &k);
            iterations = it;

            if let Some(every) = self.history_every {
                if it % every == 0 {
                    if let Some(err) = reducer.reduce(comm, &h)? {
                        tracing::debug!(iteration = it, rms = err, "checkpoint");
                        history.push((it, err));
                    }
                }
            }

            if let Some(conv) = &self.conv {
                if conv.due(it) {
                    let norm = comm.all_reduce(change)?.sqrt();
                    final_update = Some(norm);
                    if conv.check(norm) {
                        converged = true;
                        break;
                    }
                }
            }
        }
        let elapsed = start.elapsed();

        let rms_error = reducer.reduce(comm, &h)?;
        let head = ResultGatherer::gather(comm, &h, partition)?;
        if let Some(err) = rms_error {
            tracing::info!(iterations, converged, rms = err, secs = elapsed.as_secs_f64(), "relaxation finished");
        }

        Ok(JacobiOutcome {
            stats: SolveStats { iterations, elapsed, converged, final_update, rms_error, history },
            head,
            local: h,
        })
    }
}
