#[cfg(feature = "potential")]
mod parameters;
#[cfg(feature = "potential")]
mod kernel;
#[cfg(feature = "potential")]
mod tree;
#[cfg(feature = "potential")]
mod octree;
#[cfg(feature = "potential")]
mod hypercube;
#[cfg(feature = "potential")]
mod corrections;
#[cfg(feature = "potential")]
mod direct;
#[cfg(feature = "potential")]
mod pipeline;

#[cfg(feature = "potential")]
pub use parameters::*;
#[cfg(feature = "potential")]
pub use kernel::*;
#[cfg(feature = "potential")]
pub use tree::*;
#[cfg(feature = "potential")]
pub use octree::*;
#[cfg(feature = "potential")]
pub use hypercube::*;
#[cfg(feature = "potential")]
pub use corrections::*;
#[cfg(feature = "potential")]
pub use direct::*;
#[cfg(feature = "potential")]
pub use pipeline::*;

#[cfg(test)]
#[cfg(feature = "potential")]
mod kernel_tests;
#[cfg(test)]
#[cfg(feature = "potential")]
mod pipeline_tests;
