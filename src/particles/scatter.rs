use crate::particles::Particle;
use crate::utils::GravityError;

/// Scatters `count` equal-mass particles uniformly in the cube `[-half_size, half_size)³`.
pub fn scatter_particles(count: usize, half_size: f64, mass: f64, ptype: u32) -> Result<Vec<Particle<f64>>, GravityError> {
    if !(half_size > 0.0) {
        return Err(GravityError::InvalidParameter(format!("half_size must be positive, got {}", half_size)));
    }
    (0..count)
        .map(|_| {
            let position = [
                half_size * (2.0 * rand::random::<f64>() - 1.0),
                half_size * (2.0 * rand::random::<f64>() - 1.0),
                half_size * (2.0 * rand::random::<f64>() - 1.0),
            ];
            Particle::new(position, mass, ptype)
        })
        .collect()
}

/// Splits a particle set into `tasks` contiguous, nearly equal shards.
pub fn split_into_shards<T: Clone>(particles: &[T], tasks: usize) -> Vec<Vec<T>> {
    let tasks = tasks.max(1);
    let base = particles.len() / tasks;
    let extra = particles.len() % tasks;
    let mut shards = Vec::with_capacity(tasks);
    let mut start = 0;
    for rank in 0..tasks {
        let len = base + usize::from(rank < extra);
        shards.push(particles[start..start + len].to_vec());
        start += len;
    }
    shards
}
