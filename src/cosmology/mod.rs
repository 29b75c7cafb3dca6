#[cfg(feature = "cosmology")]
mod parameters;
#[cfg(feature = "cosmology")]
mod kernels;
#[cfg(feature = "cosmology")]
mod factor_cache;
#[cfg(feature = "cosmology")]
mod growth;

#[cfg(feature = "cosmology")]
pub use parameters::*;
#[cfg(feature = "cosmology")]
pub use kernels::*;
#[cfg(feature = "cosmology")]
pub use factor_cache::*;
#[cfg(feature = "cosmology")]
pub use growth::*;

#[cfg(test)]
#[cfg(feature = "cosmology")]
mod kernels_tests;
