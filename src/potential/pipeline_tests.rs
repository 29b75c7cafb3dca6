use approx::assert_relative_eq;
use crate::comm::{Communicator, GravityRequest, MessageTag, SingleProcess, ThreadCluster};
use crate::cosmology::Cosmology;
use crate::particles::{scatter_particles, split_into_shards, Particle};
use crate::potential::{
    apply_potential_corrections, direct_potential, BarnesHutTree, ExportFlags, GravityParameters, OpeningCriterion,
    PotentialPipeline, PotentialReport, PotentialTree, RemoteDomain, SofteningParameters,
};
use crate::utils::GravityError;

const ALWAYS_OPEN: OpeningCriterion<f64> = OpeningCriterion::Geometric { theta: 0.0 };

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn isolated_params(bunch_size: usize) -> GravityParameters<f64> {
    let cosmology = Cosmology::new(None, Some(0.0), None, None);
    GravityParameters::new(
        Some(cosmology),
        Some(1.0),
        Some(false),
        Some(false),
        Some(SofteningParameters::uniform(0.05)),
        Some(bunch_size),
    )
}

fn domains_of(shards: &[Vec<Particle<f64>>]) -> Vec<RemoteDomain<f64>> {
    shards
        .iter()
        .enumerate()
        .filter_map(|(rank, shard)| RemoteDomain::summarize(rank, shard))
        .collect()
}

/// Runs the pipeline on one thread per shard and returns each task's shard and report.
fn run_distributed(
    shards: &[Vec<Particle<f64>>],
    params: &GravityParameters<f64>,
    criterion: OpeningCriterion<f64>,
) -> Vec<(Vec<Particle<f64>>, PotentialReport)> {
    let domains = domains_of(shards);
    ThreadCluster::run(shards.len(), |comm| {
        let mut local = shards[comm.rank()].clone();
        let tree = BarnesHutTree::build(&local, comm.rank(), criterion).with_domains(domains.clone());
        let pipeline = PotentialPipeline::new(params, comm, &tree)?;
        let report = pipeline.compute_potential(&mut local, 1.0)?;
        Ok((local, report))
    })
    .into_iter()
    .map(|result| result.expect("Distributed potential failed"))
    .collect()
}

fn reference(shards: &[Vec<Particle<f64>>], params: &GravityParameters<f64>) -> Vec<Particle<f64>> {
    let mut all: Vec<_> = shards.concat();
    direct_potential(params, &mut all, 1.0).expect("Direct summation failed");
    all
}

fn assert_matches_reference(results: &[(Vec<Particle<f64>>, PotentialReport)], expected: &[Particle<f64>]) {
    let computed: Vec<_> = results.iter().flat_map(|(shard, _)| shard.iter().copied()).collect();
    assert_eq!(computed.len(), expected.len());
    for (got, want) in computed.iter().zip(expected) {
        assert_eq!(got.position, want.position);
        assert_relative_eq!(got.potential, want.potential, max_relative = 1e-9);
    }
}

#[test]
fn test_single_task_matches_local_evaluation() {
    init_logger();
    let params = isolated_params(64);
    let mut particles = scatter_particles(100, 1.0, 0.01, 1).expect("Failed to scatter particles");
    let tree = BarnesHutTree::build(&particles, 0, OpeningCriterion::Geometric { theta: 0.6 });

    let mut expected = particles.clone();
    for p in expected.iter_mut() {
        p.potential = tree.walk(&p.position, 0.05, p.old_acc);
    }
    apply_potential_corrections(&params, &params.softening_table(1.0), &mut expected).expect("Corrections failed");

    let comm = SingleProcess;
    let pipeline = PotentialPipeline::new(&params, &comm, &tree).expect("Valid pipeline");
    let report = pipeline.compute_potential(&mut particles, 1.0).expect("Potential failed");

    for (got, want) in particles.iter().zip(&expected) {
        assert_eq!(got.potential, want.potential);
    }
    assert_eq!(report.exported, 0);
    assert_eq!(report.imported, 0);
    assert_eq!(report.exchange_batches, 0);
    assert_eq!(report.passes, 1);
}

#[test]
fn test_two_tasks_see_each_other_symmetrically() {
    init_logger();
    let params = isolated_params(16);
    let shards = vec![
        vec![Particle::new([-1.0, 0.0, 0.0], 1.0, 1).expect("Failed to create particle")],
        vec![Particle::new([1.0, 0.0, 0.0], 1.0, 1).expect("Failed to create particle")],
    ];
    let results = run_distributed(&shards, &params, ALWAYS_OPEN);

    let (left, left_report) = &results[0];
    let (right, right_report) = &results[1];
    assert_relative_eq!(left[0].potential, -0.5, max_relative = 1e-14);
    assert_eq!(left[0].potential, right[0].potential);
    for report in [left_report, right_report] {
        assert_eq!(report.passes, 1);
        assert_eq!(report.exported, 1);
        assert_eq!(report.imported, 1);
        assert_eq!(report.exchange_batches, 1);
    }
}

#[test]
fn test_many_tasks_match_direct_summation() {
    init_logger();
    let params = isolated_params(4096);
    let particles = scatter_particles(90, 1.0, 0.02, 1).expect("Failed to scatter particles");
    for tasks in [3, 4] {
        let shards = split_into_shards(&particles, tasks);
        let results = run_distributed(&shards, &params, ALWAYS_OPEN);
        assert_matches_reference(&results, &reference(&shards, &params));
    }
}

#[test]
fn test_empty_shard_still_serves_requests() {
    init_logger();
    let params = isolated_params(4096);
    let particles = scatter_particles(12, 1.0, 0.1, 1).expect("Failed to scatter particles");
    let shards = vec![particles[..8].to_vec(), Vec::new(), particles[8..].to_vec()];
    let results = run_distributed(&shards, &params, ALWAYS_OPEN);
    assert_matches_reference(&results, &reference(&shards, &params));
    assert_eq!(results[1].1.imported, 0);
}

#[test]
fn test_distant_clusters_need_no_exports() {
    init_logger();
    let params = isolated_params(4096);
    let mut left = scatter_particles(30, 0.5, 0.01, 1).expect("Failed to scatter particles");
    let mut right = scatter_particles(30, 0.5, 0.01, 1).expect("Failed to scatter particles");
    for p in left.iter_mut() {
        p.position[0] -= 100.0;
    }
    for p in right.iter_mut() {
        p.position[0] += 100.0;
    }
    let shards = vec![left, right];
    let results = run_distributed(&shards, &params, OpeningCriterion::Geometric { theta: 0.5 });
    for (_, report) in &results {
        assert_eq!(report.exported, 0);
        assert_eq!(report.imported, 0);
    }

    let expected = reference(&shards, &params);
    let computed: Vec<_> = results.iter().flat_map(|(shard, _)| shard.iter().copied()).collect();
    for (got, want) in computed.iter().zip(&expected) {
        assert_relative_eq!(got.potential, want.potential, max_relative = 1e-2);
    }
}

#[test]
fn test_small_bunch_size_spreads_work_over_passes() {
    init_logger();
    let particles = scatter_particles(40, 1.0, 0.05, 1).expect("Failed to scatter particles");
    let shards = split_into_shards(&particles, 2);

    let roomy = run_distributed(&shards, &isolated_params(1000), ALWAYS_OPEN);
    let tight = run_distributed(&shards, &isolated_params(5), ALWAYS_OPEN);

    for ((roomy_shard, roomy_report), (tight_shard, tight_report)) in roomy.iter().zip(&tight) {
        assert_eq!(roomy_report.passes, 1);
        // Scanning stops at 5 - 2 = 3 exports, one per particle.
        assert_eq!(tight_report.passes, 7);
        assert_eq!(tight_report.max_exports_per_pass, 3);
        assert_eq!(tight_report.exported, 20);
        assert_eq!(tight_report.imported, 20);
        for (a, b) in roomy_shard.iter().zip(tight_shard) {
            assert_relative_eq!(a.potential, b.potential, max_relative = 1e-12);
        }
    }
}

#[test]
fn test_export_count_stays_below_threshold_with_three_tasks() {
    init_logger();
    let particles = scatter_particles(30, 1.0, 0.05, 1).expect("Failed to scatter particles");
    let shards = split_into_shards(&particles, 3);
    let params = isolated_params(5);
    let results = run_distributed(&shards, &params, ALWAYS_OPEN);
    for (_, report) in &results {
        assert!(report.max_exports_per_pass <= 2, "{:?}", report);
        assert_eq!(report.passes, 10);
    }
    assert_matches_reference(&results, &reference(&shards, &params));
}

#[test]
fn test_adaptive_gas_softening_travels_with_request() {
    init_logger();
    let mut params = isolated_params(64);
    params.adaptive_gas_softening = true;
    let gas = Particle::new([0.0, 0.0, 0.0], 1.0, 0)
        .expect("Failed to create particle")
        .with_smoothing_length(0.5);
    let star = Particle::new([0.3, 0.0, 0.0], 2.0, 4).expect("Failed to create particle");
    let shards = vec![vec![gas], vec![star]];

    let results = run_distributed(&shards, &params, ALWAYS_OPEN);
    assert_matches_reference(&results, &reference(&shards, &params));
}

#[test]
fn test_bunch_size_must_exceed_task_count() {
    let params = isolated_params(1);
    let particles: Vec<Particle<f64>> = Vec::new();
    let tree = BarnesHutTree::build(&particles, 0, ALWAYS_OPEN);
    let comm = SingleProcess;
    assert!(matches!(
        PotentialPipeline::new(&params, &comm, &tree),
        Err(GravityError::InvalidParameter(_))
    ));
}

#[test]
fn test_isolated_particle_sees_only_background() {
    let cosmology = Cosmology::new(None, Some(0.7), Some(0.1), None);
    let params = GravityParameters::new(
        Some(cosmology),
        None,
        Some(false),
        Some(false),
        Some(SofteningParameters::uniform(0.05)),
        None,
    );
    let mut particles = vec![Particle::new([1.0, 2.0, 2.0], 1.0, 1).expect("Failed to create particle")];
    let tree = BarnesHutTree::build(&particles, 0, ALWAYS_OPEN);
    let comm = SingleProcess;
    let pipeline = PotentialPipeline::new(&params, &comm, &tree).expect("Valid pipeline");
    pipeline.compute_potential(&mut particles, 1.0).expect("Potential failed");

    assert_eq!(particles[0].potential, -0.5 * 0.7 * (0.1 * 0.1) * 9.0);
}

/// Transport that misreports the number of tasks on one rank.
struct MisreportedSize<'a, C> {
    inner: &'a C,
    size: usize,
}

impl<C: Communicator> Communicator for MisreportedSize<'_, C> {
    fn rank(&self) -> usize {
        self.inner.rank()
    }

    fn size(&self) -> usize {
        self.size
    }

    fn all_gather(&self, local: &[u64]) -> Result<Vec<u64>, GravityError> {
        self.inner.all_gather(local)
    }

    fn sendrecv(&self, partner: usize, tag: MessageTag, send: &[u8], recv: &mut [u8]) -> Result<(), GravityError> {
        self.inner.sendrecv(partner, tag, send, recv)
    }
}

#[test]
fn test_inconsistent_task_count_is_fatal() {
    init_logger();
    let params = isolated_params(64);
    let results = ThreadCluster::run(2, |comm| {
        let liar = MisreportedSize { inner: comm, size: if comm.rank() == 1 { 3 } else { 2 } };
        let mut particles = vec![Particle::new([comm.rank() as f64, 0.0, 0.0], 1.0, 1)?];
        let tree = BarnesHutTree::build(&particles, comm.rank(), ALWAYS_OPEN);
        let pipeline = PotentialPipeline::new(&params, &liar, &tree)?;
        pipeline.compute_potential(&mut particles, 1.0)
    });

    assert_eq!(
        results[0],
        Err(GravityError::InconsistentTopology { rank: 1, expected: 2, reported: 3 })
    );
    assert_eq!(
        results[1],
        Err(GravityError::InconsistentTopology { rank: 1, expected: 3, reported: 2 })
    );
}

/// Tree that needs rank 0 for every particle and answers requests with the requester's x.
struct RankZeroOnly;

impl PotentialTree<f64> for RankZeroOnly {
    fn evaluate_local(&self, _particle: &Particle<f64>, _softening: f64, exports: &mut ExportFlags) -> f64 {
        exports.set(0);
        0.0
    }

    fn evaluate_remote(&self, request: &GravityRequest<f64>, _softening: f64) -> f64 {
        request.position[0]
    }
}

#[test]
fn test_results_route_back_across_several_batches_per_pass() {
    init_logger();
    let params = isolated_params(6);
    let results = ThreadCluster::run(4, |comm| {
        let rank = comm.rank();
        let mut local = (0..10)
            .map(|i| Particle::new([(100 * rank + i + 1) as f64, 0.0, 0.0], 1.0, 1))
            .collect::<Result<Vec<_>, _>>()?;
        for p in local.iter_mut() {
            // Left over from an earlier step; the local evaluation replaces it.
            p.potential = 1.0e6;
        }
        let pipeline = PotentialPipeline::new(&params, comm, &RankZeroOnly)?;
        let report = pipeline.compute_potential(&mut local, 1.0)?;
        Ok((local, report))
    });

    for (rank, result) in results.into_iter().enumerate() {
        let (local, report) = result.expect("Distributed potential failed");
        // Two exports per pass on ranks 1-3; rank 0 imports 2 + 2 at levels 1-2,
        // and level 3 would fill its 6 slots, so it goes in a second batch.
        assert_eq!(report.passes, 5, "rank {}", rank);
        assert_eq!(report.exchange_batches, 10, "rank {}", rank);
        assert!(report.exchange_batches > report.passes);
        if rank == 0 {
            assert_eq!(report.exported, 0);
            assert_eq!(report.imported, 30);
        } else {
            assert_eq!(report.exported, 10);
            assert_eq!(report.imported, 0);
        }
        for p in &local {
            let remote = if rank == 0 { 0.0 } else { p.position[0] };
            assert_relative_eq!(p.potential, remote + 1.0 / 0.05, max_relative = 1e-14);
        }
    }
}

#[test]
fn test_unknown_particle_type_aborts_computation() {
    let params = isolated_params(64);
    let mut particles = vec![Particle::new([0.0, 0.0, 0.0], 1.0, 1).expect("Failed to create particle")];
    particles[0].ptype = 6;
    let comm = SingleProcess;
    let pipeline = PotentialPipeline::new(&params, &comm, &RankZeroOnly).expect("Valid pipeline");
    assert_eq!(
        pipeline.compute_potential(&mut particles, 1.0),
        Err(GravityError::InvalidParticleType(6))
    );
}
