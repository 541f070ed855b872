//! Halo exchange and boundary handling driven step by step.
//!
//! These tests run the components by hand instead of through `JacobiSolver`
//! so the state can be inspected between iterations.

use gwflow::config::JobConfig;
use gwflow::context::RunContext;
use gwflow::domain::{CoefficientField, ProcessTopology};
use gwflow::parallel::{run_threaded, Comm};
use gwflow::solver::{BoundaryConditions, HaloExchanger, Relaxer};
use gwflow::GwError;
use rand::Rng;

/// After one exchange, rank r's right halo holds rank r+1's old `h[1]` and
/// rank r's left halo holds rank r-1's old `h[n]`; outer halos stay put.
#[test]
fn halos_match_neighbor_edges_for_random_segments() {
    let mut rng = rand::thread_rng();
    for procs in 1..=5 {
        for n in 1..=4 {
            let before: Vec<Vec<f64>> = (0..procs)
                .map(|_| (0..n + 2).map(|_| rng.gen_range(-1.0..1.0)).collect())
                .collect();
            let after = run_threaded(procs, |comm| {
                let topo = ProcessTopology::from_comm(comm)?;
                let mut h = before[comm.rank()].clone();
                HaloExchanger::new(&topo).exchange(comm, &mut h)?;
                Ok(h)
            })
            .unwrap();
            for r in 0..procs {
                let (old, new) = (&before[r], &after[r]);
                assert_eq!(&new[1..=n], &old[1..=n], "interior changed on rank {r}");
                if r + 1 < procs {
                    assert_eq!(new[n + 1], before[r + 1][1]);
                } else {
                    assert_eq!(new[n + 1], old[n + 1]);
                }
                if r > 0 {
                    assert_eq!(new[0], before[r - 1][n]);
                } else {
                    assert_eq!(new[0], old[0]);
                }
            }
        }
    }
}

/// Boundary heads hold on the end ranks after every single iteration.
#[test]
fn boundary_heads_hold_every_iteration() {
    let mut job = JobConfig::default();
    job.problem.points = 12;
    job.problem.h0 = 0.75;
    job.problem.hl = 0.25;
    let violations = run_threaded(3, |comm| {
        let ctx = RunContext::establish(comm, &job)?;
        let n = ctx.partition.n_local;
        let k = CoefficientField::new(&ctx.conductivity, &ctx.partition, ctx.rank())?;
        let bc = BoundaryConditions::new(0.75, 0.25, &ctx.topology);
        let mut h = vec![0.5; n + 2];
        bc.apply(&mut h);
        let halo = HaloExchanger::new(&ctx.topology);
        let mut relaxer = Relaxer::new(n + 2, bc);
        let mut bad = 0;
        for _ in 0..500 {
            halo.exchange(comm, &mut h)?;
            relaxer.step(&mut h, &k);
            if comm.rank() == 0 && h[0] != 0.75 {
                bad += 1;
            }
            if comm.rank() == comm.size() - 1 && h[n + 1] != 0.25 {
                bad += 1;
            }
        }
        Ok(bad)
    })
    .unwrap();
    assert_eq!(violations, vec![0, 0, 0]);
}

/// A rank that fails validation must not leave its peers blocked.
#[test]
fn bad_configuration_aborts_every_rank() {
    let mut job = JobConfig::default();
    // Positive on [0, 10] but 4ac = 0.0028 < b² = 0.0049.
    job.problem.b = 0.07;
    job.problem.c = 0.1;
    let err = run_threaded(4, |comm| RunContext::establish(comm, &job).map(|_| ())).unwrap_err();
    assert!(matches!(err, GwError::IllPosedAnalytic(_)));
}
