mod particle;
mod scatter;

pub use particle::*;
pub use scatter::*;

#[cfg(test)]
mod particle_tests;
