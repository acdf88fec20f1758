//! Point-to-point messaging between the processes of one run.
//!
//! A [`Communicator`] is one rank's endpoint. Transfers are blocking and
//! carry fixed-length [`Element`] sequences addressed by
//! `(rank, MessageKind)`. Messages between one ordered pair of ranks with
//! one kind arrive in send order; nothing else is ordered.

pub mod local;
#[cfg(feature = "mpi")]
pub mod mpi_world;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::Result;
use crate::matrix::Element;
use crate::partition::Topology;

pub use local::{launch, LocalCommunicator};
#[cfg(feature = "mpi")]
pub use mpi_world::MpiCommunicator;

/// Kind of a row transfer. The discriminant is the wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[repr(i32)]
pub enum MessageKind {
    /// A row of the A block, coordinator to worker
    #[strum(serialize = "A-row")]
    ARow = 0,
    /// A row segment of the B block, coordinator to worker
    #[strum(serialize = "B-row")]
    BRow = 1,
    /// A row of the C block, worker to coordinator
    #[strum(serialize = "C-row")]
    CRow = 2,
}

impl MessageKind {
    pub fn tag(self) -> i32 {
        self as i32
    }
}

/// One rank's endpoint into the process group.
pub trait Communicator {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    fn topology(&self) -> Result<Topology> {
        Topology::new(self.rank(), self.size())
    }

    /// Send `payload` to `dest`, blocking until the transport accepts it.
    fn send(&self, dest: usize, kind: MessageKind, payload: &[Element]) -> Result<()>;

    /// Block until the next `kind` message from `source` arrives and copy it
    /// into `buffer`. The message must have exactly `buffer.len()` elements.
    fn receive_into(&self, source: usize, kind: MessageKind, buffer: &mut [Element]) -> Result<()>;

    /// Monotonic wall clock in seconds
    fn wall_time(&self) -> f64;
}
