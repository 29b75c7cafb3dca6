use crate::cosmology::Cosmology;
use crate::utils::{GravityError, HighPrecision, DEFAULT_BUNCH_SIZE, DEFAULT_GRAVITY, NUM_PARTICLE_TYPES};

/// Per-type softening lengths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SofteningParameters<T> {
    /// Softening in comoving units, used as-is in non-comoving runs.
    pub comoving: [T; NUM_PARTICLE_TYPES],
    /// Upper limit on the physical softening in comoving runs.
    pub max_physical: [T; NUM_PARTICLE_TYPES],
}

impl<T: HighPrecision> SofteningParameters<T> {
    pub fn uniform(length: T) -> Self {
        Self {
            comoving: [length; NUM_PARTICLE_TYPES],
            max_physical: [length; NUM_PARTICLE_TYPES],
        }
    }
}

/// Immutable run parameters read by the potential pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityParameters<T> {
    pub cosmology: Cosmology,
    /// Gravitational constant.
    pub gravity: T,
    pub comoving_integration: bool,
    pub periodic_boundaries: bool,
    pub softening: SofteningParameters<T>,
    /// Gas particles soften with their smoothing length when it is larger.
    pub adaptive_gas_softening: bool,
    /// Export records per batch; bounds every communication buffer.
    pub bunch_size: usize,
}

impl<T: HighPrecision> Default for GravityParameters<T> {
    fn default() -> Self {
        Self {
            cosmology: Cosmology::default(),
            gravity: T::from_approx(DEFAULT_GRAVITY),
            comoving_integration: false,
            periodic_boundaries: false,
            softening: SofteningParameters::uniform(T::from_approx(0.05)),
            adaptive_gas_softening: false,
            bunch_size: DEFAULT_BUNCH_SIZE,
        }
    }
}

impl<T: HighPrecision> GravityParameters<T> {
    /// Builds a parameter set, falling back to the defaults for every `None`.
    pub fn new(
        cosmology: Option<Cosmology>,
        gravity: Option<T>,
        comoving_integration: Option<bool>,
        periodic_boundaries: Option<bool>,
        softening: Option<SofteningParameters<T>>,
        bunch_size: Option<usize>,
    ) -> Self {
        let default = Self::default();
        Self {
            cosmology: cosmology.unwrap_or(default.cosmology),
            gravity: gravity.unwrap_or(default.gravity),
            comoving_integration: comoving_integration.unwrap_or(default.comoving_integration),
            periodic_boundaries: periodic_boundaries.unwrap_or(default.periodic_boundaries),
            softening: softening.unwrap_or(default.softening),
            adaptive_gas_softening: default.adaptive_gas_softening,
            bunch_size: bunch_size.unwrap_or(default.bunch_size),
        }
    }

    pub fn validate(&self) -> Result<(), GravityError> {
        self.cosmology.validate()?;
        if !(self.gravity > T::zero()) || !self.gravity.is_finite() {
            return Err(GravityError::InvalidParameter(format!("gravity must be positive, got {:?}", self.gravity)));
        }
        let lengths = self.softening.comoving.iter().chain(self.softening.max_physical.iter());
        for &length in lengths {
            if !(length > T::zero()) || !length.is_finite() {
                return Err(GravityError::InvalidParameter(format!(
                    "softening lengths must be positive, got {:?}",
                    length
                )));
            }
        }
        if self.bunch_size == 0 {
            return Err(GravityError::InvalidParameter("bunch_size must be positive".to_string()));
        }
        Ok(())
    }

    /// Softening per type at scale factor `time`.
    ///
    /// Comoving runs cap the physical softening: once `comoving * time`
    /// exceeds `max_physical`, the table holds `max_physical / time`.
    pub fn softening_table(&self, time: T) -> [T; NUM_PARTICLE_TYPES] {
        let mut table = self.softening.comoving;
        if self.comoving_integration {
            for (k, entry) in table.iter_mut().enumerate() {
                let max_physical = self.softening.max_physical[k];
                if self.softening.comoving[k] * time > max_physical {
                    *entry = max_physical / time;
                }
            }
        }
        table
    }

    /// Softening used when evaluating the potential at a particle of `ptype`.
    ///
    /// `adaptive` is the particle's own softening (its smoothing length for
    /// gas, zero otherwise); it only takes effect for gas with adaptive
    /// softening enabled and when it exceeds the table value.
    ///
    /// # Errors
    /// Returns `GravityError::InvalidParticleType` for tags outside the table.
    pub fn interaction_softening(&self, table: &[T; NUM_PARTICLE_TYPES], ptype: u32, adaptive: T) -> Result<T, GravityError> {
        let base = table_softening(table, ptype)?;
        if self.adaptive_gas_softening && ptype == 0 && adaptive > base {
            Ok(adaptive)
        } else {
            Ok(base)
        }
    }
}

/// Softening-table entry for `ptype`.
pub fn table_softening<T: HighPrecision>(table: &[T; NUM_PARTICLE_TYPES], ptype: u32) -> Result<T, GravityError> {
    table
        .get(ptype as usize)
        .copied()
        .ok_or(GravityError::InvalidParticleType(ptype))
}
