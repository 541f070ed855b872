//! End-to-end runs of the distributed relaxation on the reference problem.
//!
//! The reference problem is k(x) = 0.007x² - 0.07x + 0.2 on [0, 10] with
//! h(0) = 1 and h(10) = 0. All runs use the in-process thread runtime.

use approx::assert_abs_diff_eq;
use gwflow::config::{JobConfig, Spacing};
use gwflow::context::RunContext;
use gwflow::parallel::run_threaded;
use gwflow::solver::{DirectReference, GatheredHead, JacobiOutcome, JacobiSolver};
use gwflow::GridPartition;

fn job(points: usize, iterations: usize, spacing: Spacing) -> JobConfig {
    let mut job = JobConfig::default();
    job.problem.points = points;
    job.run.iterations = iterations;
    job.run.spacing = spacing;
    job
}

fn run(job: &JobConfig, procs: usize, solver: &JacobiSolver) -> JacobiOutcome {
    let mut out = run_threaded(procs, |comm| {
        let ctx = RunContext::establish(comm, job)?;
        solver.solve(&ctx)
    })
    .unwrap();
    out.swap_remove(0)
}

fn head(outcome: &JacobiOutcome) -> &GatheredHead {
    outcome.head.as_ref().unwrap()
}

/// Reference scenario: 100 points, 10000 iterations, one rank.
#[test]
fn reference_scenario_reaches_small_rms_error() {
    let job = job(100, 10_000, Spacing::Legacy);
    let outcome = run(&job, 1, &JacobiSolver::from_options(&job.run));
    let err = outcome.stats.rms_error.unwrap();
    assert!(err < 1e-3, "rms error = {err}");
    assert_eq!(outcome.stats.iterations, 10_000);
    assert!(!outcome.stats.converged);
}

/// Four ranks with the default spacing still land under the tolerance.
#[test]
fn reference_scenario_on_four_ranks() {
    let job = job(100, 10_000, Spacing::Legacy);
    let outcome = run(&job, 4, &JacobiSolver::from_options(&job.run));
    let err = outcome.stats.rms_error.unwrap();
    assert!(err < 1e-3, "rms error = {err}");
}

/// Error sampled every 1000 iterations never goes up.
#[test]
fn error_decreases_at_checkpoints() {
    let job = job(100, 10_000, Spacing::Legacy);
    let outcome = run(&job, 2, &JacobiSolver::new(10_000).with_history(1000));
    let history = &outcome.stats.history;
    assert_eq!(history.len(), 10);
    assert_eq!(history[0].0, 1000);
    for w in history.windows(2) {
        assert!(w[1].1 <= w[0].1, "error rose from {:?} to {:?}", w[0], w[1]);
    }
    assert_abs_diff_eq!(history[9].1, outcome.stats.rms_error.unwrap(), epsilon = 1e-15);
}

/// With P-independent spacing the decomposition does not change the answer.
#[test]
fn one_and_four_ranks_agree() {
    let job = job(100, 3000, Spacing::Uniform);
    let solver = JacobiSolver::from_options(&job.run);
    let one = run(&job, 1, &solver);
    let four = run(&job, 4, &solver);
    let p1 = head(&one).global_profile();
    let p4 = head(&four).global_profile();
    assert_eq!(p1.len(), 102);
    assert_eq!(p4.len(), 102);
    for (a, b) in p1.iter().zip(&p4) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-12);
    }
    assert_abs_diff_eq!(
        one.stats.rms_error.unwrap(),
        four.stats.rms_error.unwrap(),
        epsilon = 1e-12
    );
}

/// Gathered layout: (n+2)·P values, duplicated overlaps nearly equal.
#[test]
fn gathered_segments_overlap_consistently() {
    let job = job(100, 10_000, Spacing::Legacy);
    let outcome = run(&job, 4, &JacobiSolver::from_options(&job.run));
    let gathered = head(&outcome);
    assert_eq!(gathered.values.len(), 27 * 4);
    assert_eq!(gathered.procs(), 4);
    assert!(gathered.max_overlap_gap() < 1e-6, "gap = {}", gathered.max_overlap_gap());
    assert_eq!(gathered.values[0], 1.0);
    assert_eq!(*gathered.values.last().unwrap(), 0.0);
}

/// The requested count shrinks to a multiple of P, and everything downstream
/// uses the shrunk value.
#[test]
fn adjusted_point_count_is_consistent() {
    for procs in [1, 3, 6, 7] {
        let job = job(100, 10, Spacing::Legacy);
        let outcome = run(&job, procs, &JacobiSolver::from_options(&job.run));
        let n = 100 / procs;
        let gathered = head(&outcome);
        assert_eq!(gathered.values.len(), (n + 2) * procs);
        assert_eq!(gathered.global_profile().len(), n * procs + 2);
        let partition = GridPartition::new(100, procs, 0.0, 10.0, Spacing::Legacy).unwrap();
        assert_eq!(partition.n_global, n * procs);
    }
}

/// Long enough runs reach the fixed point of the discrete system.
#[test]
fn relaxation_converges_to_direct_solution() {
    let job = job(40, 20_000, Spacing::Legacy);
    let outcome = run(&job, 4, &JacobiSolver::from_options(&job.run));
    let partition = GridPartition::new(40, 4, 0.0, 10.0, Spacing::Legacy).unwrap();
    let direct = DirectReference::new(&job.problem, &partition).solve(1.0, 0.0).unwrap();
    let profile = head(&outcome).global_profile();
    assert_eq!(profile.len(), direct.len());
    for (a, b) in profile.iter().zip(&direct) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-9);
    }
}

/// One interior point per rank: every update leans on both halos.
#[test]
fn single_point_segments() {
    let job = job(4, 2000, Spacing::Legacy);
    let outcome = run(&job, 4, &JacobiSolver::from_options(&job.run));
    let gathered = head(&outcome);
    assert_eq!(gathered.values.len(), 12);
    let partition = GridPartition::new(4, 4, 0.0, 10.0, Spacing::Legacy).unwrap();
    let direct = DirectReference::new(&job.problem, &partition).solve(1.0, 0.0).unwrap();
    for (a, b) in gathered.global_profile().iter().zip(&direct) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-12);
    }
    assert!(gathered.values.iter().all(|v| v.is_finite()));
}

/// Early exit stops well before the cap and still matches the fixed point.
#[test]
fn tolerance_mode_stops_early() {
    let job = job(40, 200_000, Spacing::Uniform);
    let solver = JacobiSolver::from_options(&job.run).with_tolerance(1e-12, 50);
    let outcome = run(&job, 4, &solver);
    assert!(outcome.stats.converged);
    assert!(outcome.stats.iterations < 200_000);
    let partition = GridPartition::new(40, 4, 0.0, 10.0, Spacing::Uniform).unwrap();
    let direct = DirectReference::new(&job.problem, &partition).solve(1.0, 0.0).unwrap();
    for (a, b) in head(&outcome).global_profile().iter().zip(&direct) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-8);
    }
}

/// At the reference resolution the iterate settles on the discrete fixed point.
#[test]
fn reference_resolution_matches_direct_solution() {
    let job = job(100, 100_000, Spacing::Uniform);
    let solver = JacobiSolver::from_options(&job.run).with_tolerance(1e-12, 100);
    let outcome = run(&job, 4, &solver);
    assert!(outcome.stats.converged);
    assert!(outcome.stats.iterations < 100_000);
    let partition = GridPartition::new(100, 4, 0.0, 10.0, Spacing::Uniform).unwrap();
    let direct = DirectReference::new(&job.problem, &partition).solve(1.0, 0.0).unwrap();
    let profile = head(&outcome).global_profile();
    assert_eq!(profile.len(), 102);
    for (a, b) in profile.iter().zip(&direct) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-8);
    }
}
