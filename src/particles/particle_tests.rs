use crate::particles::{scatter_particles, split_into_shards, Particle};
use crate::utils::GravityError;

#[test]
fn test_new_valid() {
    let particle = Particle::new([1.0, -2.0, 3.0], 2.5, 4)
        .expect("Failed to create particle with valid parameters");
    assert_eq!(particle.potential, 0.0);
    assert_eq!(particle.old_acc, 0.0);
    assert_eq!(particle.radius_squared(), 14.0);
}

#[test]
fn test_new_invalid_mass() {
    let result = Particle::new([0.0; 3], 0.0, 1);
    match result {
        Err(GravityError::InvalidMass) => (),
        other => panic!("Unexpected result for invalid mass: {:?}", other),
    }
    assert!(Particle::new([0.0; 3], f64::NAN, 1).is_err());
}

#[test]
fn test_new_invalid_type() {
    let result = Particle::new([0.0; 3], 1.0, 6);
    assert_eq!(result, Err(GravityError::InvalidParticleType(6)));
}

#[test]
fn test_builders_and_distance() {
    let particle = Particle::new([0.0, 0.0, 0.0], 1.0, 0)
        .expect("Failed to create particle")
        .with_old_acc(3.0)
        .with_smoothing_length(0.2);
    assert_eq!(particle.old_acc, 3.0);
    assert_eq!(particle.hsml, 0.2);
    assert_eq!(particle.distance_squared_to(&[3.0, 4.0, 0.0]), 25.0);
}

#[test]
fn test_scatter_particles_stay_in_cube() {
    let particles = scatter_particles(200, 5.0, 0.1, 1).expect("Failed to scatter particles");
    assert_eq!(particles.len(), 200);
    for p in &particles {
        for x in p.position {
            assert!((-5.0..5.0).contains(&x), "Coordinate {} outside the cube", x);
        }
        assert_eq!(p.mass, 0.1);
    }
    assert!(scatter_particles(10, 0.0, 1.0, 1).is_err());
}

#[test]
fn test_split_into_shards() {
    let values: Vec<usize> = (0..10).collect();
    let shards = split_into_shards(&values, 3);
    assert_eq!(shards.len(), 3);
    assert_eq!(shards[0], vec![0, 1, 2, 3]);
    assert_eq!(shards[1], vec![4, 5, 6]);
    assert_eq!(shards[2], vec![7, 8, 9]);

    let shards = split_into_shards(&values[..1], 4);
    assert_eq!(shards.iter().map(Vec::len).collect::<Vec<_>>(), vec![1, 0, 0, 0]);
}
