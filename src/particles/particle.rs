use crate::utils::{GravityError, HighPrecision, NUM_PARTICLE_TYPES};

/// One entry of the shared particle store.
///
/// `potential` is the only field written during a potential computation: the
/// local evaluation sets it and remote results are then only added to it.
/// `old_acc` (the previous step's acceleration magnitude) and `hsml` (gas
/// smoothing length) are read-only here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle<T> {
    pub position: [T; 3],
    pub mass: T,
    /// Type tag in `0..NUM_PARTICLE_TYPES`; 0 is gas.
    pub ptype: u32,
    pub potential: T,
    pub old_acc: T,
    pub hsml: T,
}

impl<T: HighPrecision> Particle<T> {
    /// Creates a particle with zero potential, acceleration and smoothing length.
    ///
    /// # Errors
    /// Returns `GravityError::InvalidMass` for non-positive or non-finite
    /// masses and `GravityError::InvalidParticleType` for unknown type tags.
    ///
    /// # Example
    /// ```
    /// use rs_gravity::particles::Particle;
    ///
    /// let p = Particle::new([1.0, 2.0, 2.0], 0.5, 1).expect("valid particle");
    /// assert_eq!(p.radius_squared(), 9.0);
    /// assert!(Particle::new([0.0; 3], -1.0, 1).is_err());
    /// ```
    pub fn new(position: [T; 3], mass: T, ptype: u32) -> Result<Self, GravityError> {
        if !(mass > T::zero()) || !mass.is_finite() {
            return Err(GravityError::InvalidMass);
        }
        if ptype as usize >= NUM_PARTICLE_TYPES {
            return Err(GravityError::InvalidParticleType(ptype));
        }
        Ok(Self {
            position,
            mass,
            ptype,
            potential: T::zero(),
            old_acc: T::zero(),
            hsml: T::zero(),
        })
    }

    pub fn with_old_acc(mut self, old_acc: T) -> Self {
        self.old_acc = old_acc;
        self
    }

    pub fn with_smoothing_length(mut self, hsml: T) -> Self {
        self.hsml = hsml;
        self
    }

    /// Squared distance from the coordinate origin.
    pub fn radius_squared(&self) -> T {
        self.position
            .iter()
            .fold(T::zero(), |acc, &x| acc + x * x)
    }

    pub fn distance_squared_to(&self, point: &[T; 3]) -> T {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        let dz = self.position[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}
