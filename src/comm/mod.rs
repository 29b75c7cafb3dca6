mod records;
mod buffer;
mod export_index;
mod communicator;
mod thread_cluster;

pub use records::*;
pub use buffer::*;
pub use export_index::*;
pub use communicator::*;
pub use thread_cluster::*;
