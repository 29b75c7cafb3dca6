use std::f64::consts::PI;
use rayon::prelude::*;
use crate::particles::Particle;
use crate::potential::{table_softening, GravityParameters};
use crate::utils::{GravityError, HighPrecision, NUM_PARTICLE_TYPES, PERIODIC_SELF_ENERGY};

/// Turns accumulated tree sums into final potentials.
///
/// For every particle, in order: removes the self-interaction
/// (`+ mass / softening`), subtracts the periodic self-energy in comoving
/// periodic runs, multiplies by `G`, and adds the background term
/// `-½ Ω H² r²`. The background uses Ω_m for comoving non-periodic runs and
/// Ω_Λ for non-comoving runs; comoving periodic runs have none.
///
/// # Errors
/// Returns `GravityError::InvalidParticleType` if a particle's type has no
/// softening-table entry.
pub fn apply_potential_corrections<T: HighPrecision>(
    params: &GravityParameters<T>,
    softening_table: &[T; NUM_PARTICLE_TYPES],
    particles: &mut [Particle<T>],
) -> Result<(), GravityError> {
    let cosmology = &params.cosmology;
    let hubble2 = cosmology.hubble * cosmology.hubble;
    let periodic_term = params.comoving_integration && params.periodic_boundaries;

    let mean_density = (T::from_approx(cosmology.omega0 * 3.0 * hubble2 / (8.0 * PI)) / params.gravity)
        .powf(T::from_approx(1.0 / 3.0));
    let background = if params.comoving_integration {
        (!params.periodic_boundaries).then(|| T::from_approx(-0.5 * cosmology.omega0 * hubble2))
    } else {
        let fac = T::from_approx(-0.5 * cosmology.omega_lambda * hubble2);
        (fac != T::zero()).then_some(fac)
    };

    particles.par_iter_mut().try_for_each(|p| {
        let softening = table_softening(softening_table, p.ptype)?;
        p.potential += p.mass / softening;
        if periodic_term {
            p.potential -= T::from_approx(PERIODIC_SELF_ENERGY)
                * p.mass.powf(T::from_approx(2.0 / 3.0))
                * mean_density;
        }
        p.potential *= params.gravity;
        if let Some(fac) = background {
            p.potential += fac * p.radius_squared();
        }
        Ok(())
    })
}
