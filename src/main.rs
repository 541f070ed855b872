//! gwflow command-line interface.
//!
//! ```sh
//! gwflow --procs 4 --iterations 10000
//! gwflow --config job.toml --output head.out
//! mpirun -n 4 gwflow --mpi          # with the `mpi` feature
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use gwflow::config::{load_config, JobConfig, Spacing};
use gwflow::context::RunContext;
use gwflow::output::{write_head_file, Report};
use gwflow::parallel::{run_threaded, Comm};
use gwflow::solver::{DirectReference, JacobiOutcome, JacobiSolver};

/// Distributed Jacobi solver for 1-D steady groundwater flow
#[derive(Parser)]
#[command(name = "gwflow", version)]
struct Cli {
    /// TOML job file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ranks to run as threads (default 4)
    #[arg(short = 'p', long)]
    procs: Option<usize>,

    /// Requested number of interior points
    #[arg(short = 'n', long)]
    points: Option<usize>,

    /// Number of Jacobi iterations
    #[arg(short, long)]
    iterations: Option<usize>,

    /// Use the P-independent grid spacing (xL - x0) / (N + 1)
    #[arg(long)]
    uniform_spacing: bool,

    /// Stop once the global update norm falls below this value
    #[arg(long)]
    tol: Option<f64>,

    /// Record the RMS error every this many iterations
    #[arg(long)]
    history_every: Option<usize>,

    /// Output file for the gathered `x,H` rows
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also solve the discrete system directly and report the distance to it
    #[arg(long)]
    verify: bool,

    /// Run under MPI instead of threads (requires the `mpi` feature)
    #[arg(long)]
    mpi: bool,
}

impl Cli {
    fn job(&self) -> anyhow::Result<JobConfig> {
        let mut job = match &self.config {
            Some(path) => load_config(path).with_context(|| format!("reading {}", path.display()))?,
            None => JobConfig::default(),
        };
        if let Some(procs) = self.procs {
            job.run.procs = procs;
        }
        if let Some(points) = self.points {
            job.problem.points = points;
        }
        if let Some(iterations) = self.iterations {
            job.run.iterations = iterations;
        }
        if self.uniform_spacing {
            job.run.spacing = Spacing::Uniform;
        }
        if self.tol.is_some() {
            job.run.tol = self.tol;
        }
        if self.history_every.is_some() {
            job.run.history_every = self.history_every;
        }
        if let Some(output) = &self.output {
            job.run.output = output.clone();
        }
        Ok(job)
    }
}

fn run_rank<C: Comm>(comm: &C, job: &JobConfig) -> gwflow::Result<(JacobiOutcome, usize)> {
    let ctx = RunContext::establish(comm, job)?;
    let outcome = JacobiSolver::from_options(&ctx.options).solve(&ctx)?;
    Ok((outcome, ctx.partition.n_global))
}

fn report(job: &JobConfig, outcome: &JacobiOutcome, n_global: usize, procs: usize, verify: bool) -> anyhow::Result<()> {
    println!("{}", Report::new(&outcome.stats, n_global));
    for (it, err) in &outcome.stats.history {
        println!("  iteration {it:>8}: error {err:.16}");
    }
    if let Some(head) = &outcome.head {
        write_head_file(head, &job.run.output)
            .with_context(|| format!("writing {}", job.run.output.display()))?;
        if verify {
            let partition = gwflow::GridPartition::new(
                job.problem.points,
                procs,
                job.problem.x0,
                job.problem.xl,
                job.run.spacing,
            )?;
            let direct = DirectReference::new(&job.problem, &partition).solve(job.problem.h0, job.problem.hl)?;
            let gap = head
                .global_profile()
                .iter()
                .zip(&direct)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            println!("Direct gap        = {gap:.3e}");
        }
    }
    Ok(())
}

#[cfg(feature = "mpi")]
fn run_mpi(cli: &Cli, job: &JobConfig) -> anyhow::Result<()> {
    let comm = gwflow::parallel::MpiComm::new()?;
    let (outcome, n_global) = run_rank(&comm, job)?;
    if comm.rank() == 0 {
        report(job, &outcome, n_global, comm.size(), cli.verify)?;
    }
    Ok(())
}

#[cfg(not(feature = "mpi"))]
fn run_mpi(_cli: &Cli, _job: &JobConfig) -> anyhow::Result<()> {
    anyhow::bail!("gwflow was built without the `mpi` feature")
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let job = cli.job()?;
    if cli.mpi {
        return run_mpi(&cli, &job);
    }

    let procs = job.run.procs;
    let cpus = num_cpus::get();
    if procs > cpus {
        tracing::warn!(procs, cpus, "more ranks than CPUs; ranks will share cores");
    }
    let mut ranks = run_threaded(procs, |comm| run_rank(comm, &job))?;
    if ranks.is_empty() {
        anyhow::bail!("no ranks ran");
    }
    let (outcome, n_global) = ranks.swap_remove(0);
    report(&job, &outcome, n_global, procs, cli.verify)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_count_does_not_depend_on_the_machine() {
        let job = Cli::parse_from(["gwflow"]).job().unwrap();
        assert_eq!(job.run.procs, 4);
        assert_eq!(job.problem.points, 100);
        let job = Cli::parse_from(["gwflow", "--procs", "3", "-n", "64"]).job().unwrap();
        assert_eq!(job.run.procs, 3);
        assert_eq!(job.problem.points, 64);
    }
}
