pub mod utils;
pub mod cosmology;
pub mod comm;
pub mod particles;
pub mod potential;
