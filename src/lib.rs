pub mod error;
pub mod matrix;
pub mod partition;
pub mod transport;
pub mod protocol;
pub mod execution;

// Re-export commonly used types
pub use error::{Error, Result};
pub use matrix::{Element, Matrix};
pub use partition::{Block, Dimensions, PartitionPlan, Scheme, Topology, COORDINATOR};
pub use transport::{Communicator, LocalCommunicator, MessageKind};
pub use protocol::{gather, scatter, GlobalMatrices, LocalBlocks, Participant};
pub use execution::{run_local, run_rank, run_serial, RunOptions, RunReport, Variant};
