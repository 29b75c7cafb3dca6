/// Number of particle type tags (gas, halo, disk, bulge, stars, boundary).
pub const NUM_PARTICLE_TYPES: usize = 6;

/// Number of bins in the drift/kick lookup tables.
pub const DRIFT_TABLE_LENGTH: usize = 1000;

/// Integer timeline resolution; the full run spans `TIMEBASE` ticks.
pub const TIMEBASE: i64 = 1 << 28;

/// Absolute tolerance for the table quadratures.
pub const QUADRATURE_ABS_TOLERANCE: f64 = 1.0e-8;

/// Maximum number of subintervals the adaptive quadrature may hold.
pub const QUADRATURE_WORKSPACE: usize = 100_000;

/// Gravitational constant in internal units (kpc, 1e10 Msun, km/s).
pub const DEFAULT_GRAVITY: f64 = 43007.1;

/// Hubble constant in internal units.
pub const DEFAULT_HUBBLE: f64 = 0.1;

/// Default number of export records per batch.
pub const DEFAULT_BUNCH_SIZE: usize = 4096;

/// Madelung-like constant of the periodic background correction.
pub const PERIODIC_SELF_ENERGY: f64 = 2.8372975;

/// Ratio between the spline kernel support and the Plummer-equivalent softening.
pub const SPLINE_SUPPORT_FACTOR: f64 = 2.8;
