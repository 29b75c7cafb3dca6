// demos/distributed_potential.rs

use log::info;
use rs_gravity::comm::{Communicator, ThreadCluster};
use rs_gravity::cosmology::{CosmologicalFactorCache, Cosmology, TimelineParameters};
use rs_gravity::particles::{scatter_particles, split_into_shards};
use rs_gravity::potential::{
    BarnesHutTree, GravityParameters, OpeningCriterion, PotentialPipeline, RemoteDomain, SofteningParameters,
};
use rs_gravity::utils::{endrun, GravityError, TIMEBASE};

const TASKS: usize = 4;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        endrun(0, &err);
    }
}

fn run() -> Result<(), GravityError> {
    let cosmology = Cosmology::default();
    let timeline = TimelineParameters::<f64>::comoving(0.02, 1.0)?;
    let cache = CosmologicalFactorCache::init(&cosmology, &timeline)?;
    let ti_half = TIMEBASE / 2;
    println!("Drift factor over the first half of the timeline: {}", cache.drift_factor(0, ti_half));
    println!("Gravkick factor over the second half: {}", cache.gravkick_factor(ti_half, TIMEBASE));

    let params = GravityParameters::new(
        Some(cosmology),
        None,
        Some(true),
        Some(false),
        Some(SofteningParameters::uniform(0.02)),
        Some(256),
    );
    let scale_factor = 0.5;

    let particles = scatter_particles(4000, 10.0, 1e-3, 1)?;
    let shards = split_into_shards(&particles, TASKS);
    let domains: Vec<_> = shards
        .iter()
        .enumerate()
        .filter_map(|(rank, shard)| RemoteDomain::summarize(rank, shard))
        .collect();
    let criterion = OpeningCriterion::Relative { tolerance: 0.005, theta: 0.7 };

    let results = ThreadCluster::run(TASKS, |comm| {
        let mut local = shards[comm.rank()].clone();
        let tree = BarnesHutTree::build(&local, comm.rank(), criterion).with_domains(domains.clone());
        let pipeline = PotentialPipeline::new(&params, comm, &tree)?;
        let report = pipeline.compute_potential(&mut local, scale_factor)?;
        let mean = local.iter().map(|p| p.potential).sum::<f64>() / local.len().max(1) as f64;
        Ok((report, mean))
    });

    for (rank, result) in results.into_iter().enumerate() {
        match result {
            Ok((report, mean)) => {
                info!("task {}: {:?}", rank, report);
                println!(
                    "Task {}: mean potential {:.6}, {} passes, {} exported, {} imported",
                    rank, mean, report.passes, report.exported, report.imported
                );
            }
            Err(err) => endrun(rank, &err),
        }
    }
    Ok(())
}
