use rayon::prelude::*;
use crate::particles::Particle;
use crate::potential::{apply_potential_corrections, softened_potential, GravityParameters};
use crate::utils::{GravityError, HighPrecision};

/// Exact O(N²) potential of a particle set held in one process.
///
/// Uses the same softening rules and final corrections as the distributed
/// pipeline, so with an always-opening tree both give the same result up to
/// summation order.
///
/// # Errors
/// Returns `GravityError::InvalidParticleType` for particles whose type has
/// no softening-table entry.
pub fn direct_potential<T: HighPrecision>(
    params: &GravityParameters<T>,
    particles: &mut [Particle<T>],
    time: T,
) -> Result<(), GravityError> {
    let table = params.softening_table(time);
    let sources: &[Particle<T>] = particles;

    let sums: Vec<T> = sources
        .par_iter()
        .map(|target| {
            let own = if target.ptype == 0 { target.hsml } else { T::zero() };
            let softening = params.interaction_softening(&table, target.ptype, own)?;
            Ok(sources.iter().fold(T::zero(), |acc, source| {
                acc + softened_potential(source.mass, target.distance_squared_to(&source.position).sqrt(), softening)
            }))
        })
        .collect::<Result<_, GravityError>>()?;

    for (p, sum) in particles.iter_mut().zip(sums) {
        p.potential = sum;
    }
    apply_potential_corrections(params, &table, particles)
}
