pub mod errors;
mod constants;
mod high_precision;
mod quadrature;

pub use constants::*;
pub use errors::GravityError;
pub use high_precision::*;
pub use quadrature::*;

use log::error;

/// Terminates the whole process after a fatal error.
///
/// Partners blocked in a rendezvous with this task cannot make progress once
/// it fails, so orchestration code calls this instead of unwinding quietly.
pub fn endrun(rank: usize, err: &GravityError) -> ! {
    error!("task {}: endrun called with an error level of {}: {}", rank, err.exit_code(), err);
    log::logger().flush();
    std::process::exit(err.exit_code())
}

#[cfg(test)]
mod quadrature_tests;
