use std::fmt;
use std::error::Error;

/// Represents errors that can occur while building cosmological tables or
/// evaluating the distributed potential.
///
/// Every variant is fatal for the run: the exchange protocol is a blocking
/// rendezvous, so a process that stops early leaves its partners waiting.
#[derive(Debug, Clone, PartialEq)]
pub enum GravityError {
    /// A configuration value is outside its valid range.
    InvalidParameter(String),
    /// Indicates an invalid (non-positive or non-finite) mass value.
    InvalidMass,
    /// Particle type tag outside `0..NUM_PARTICLE_TYPES`.
    InvalidParticleType(u32),
    /// The adaptive quadrature could not reach the requested tolerance.
    QuadratureDidNotConverge {
        lower: f64,
        upper: f64,
        abs_error: f64,
        subintervals: usize,
    },
    /// A communication buffer was addressed past its capacity.
    SlotOutOfRange { slot: usize, capacity: usize },
    /// A byte range handed to the transport has the wrong length.
    BufferLengthMismatch { expected: usize, actual: usize },
    /// A single hypercube level needs more import slots than the batch capacity.
    CapacityExceeded { level: usize, required: usize, capacity: usize },
    /// A peer exchange did not complete.
    Transport { partner: usize, reason: String },
    /// Processes disagree on the number of tasks.
    InconsistentTopology { rank: usize, expected: usize, reported: usize },
}

impl GravityError {
    /// Process exit code used by [`crate::utils::endrun`].
    pub fn exit_code(&self) -> i32 {
        match self {
            GravityError::InvalidParameter(_) => 1,
            GravityError::InvalidMass | GravityError::InvalidParticleType(_) => 2,
            GravityError::QuadratureDidNotConverge { .. } => 3,
            GravityError::SlotOutOfRange { .. } | GravityError::BufferLengthMismatch { .. } => 4,
            GravityError::CapacityExceeded { .. } => 5,
            GravityError::Transport { .. } => 6,
            GravityError::InconsistentTopology { .. } => 7,
        }
    }
}

impl fmt::Display for GravityError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GravityError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            GravityError::InvalidMass => write!(f, "Invalid mass value"),
            GravityError::InvalidParticleType(t) => write!(f, "Invalid particle type {}", t),
            GravityError::QuadratureDidNotConverge { lower, upper, abs_error, subintervals } => write!(
                f,
                "Integration over [{}, {}] did not converge (error estimate {:e} after {} subintervals)",
                lower, upper, abs_error, subintervals
            ),
            GravityError::SlotOutOfRange { slot, capacity } => {
                write!(f, "Buffer slot {} out of range (capacity {})", slot, capacity)
            }
            GravityError::BufferLengthMismatch { expected, actual } => {
                write!(f, "Buffer length mismatch: expected {} bytes, got {}", expected, actual)
            }
            GravityError::CapacityExceeded { level, required, capacity } => write!(
                f,
                "Hypercube level {} needs {} import slots but the batch capacity is {}",
                level, required, capacity
            ),
            GravityError::Transport { partner, reason } => {
                write!(f, "Exchange with task {} failed: {}", partner, reason)
            }
            GravityError::InconsistentTopology { rank, expected, reported } => write!(
                f,
                "Task {} reports {} tasks, expected {}",
                rank, reported, expected
            ),
        }
    }
}

impl Error for GravityError {}
