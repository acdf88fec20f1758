//! MPI process group (enabled with the `mpi` feature, launched with
//! `mpirun -n P blockmm M N Q`).

use mpi::environment::Universe;
use mpi::topology::SimpleCommunicator;
use mpi::traits::{Communicator as _, Destination as _, Equivalence as _, Source as _};

use crate::error::{Error, Result};
use crate::matrix::Element;

use super::{Communicator, MessageKind};

/// `MPI_COMM_WORLD` endpoint. MPI is finalized when this is dropped.
pub struct MpiCommunicator {
    world: SimpleCommunicator,
    _universe: Universe,
}

impl MpiCommunicator {
    /// Initialize MPI for this process
    pub fn initialize() -> Result<Self> {
        let universe = mpi::initialize()
            .ok_or_else(|| Error::Transport("MPI has already been initialized".to_string()))?;
        let world = universe.world();
        Ok(Self {
            world,
            _universe: universe,
        })
    }

    /// Terminate every process of the group with `code`
    pub fn abort(&self, code: i32) -> ! {
        self.world.abort(code)
    }
}

impl Communicator for MpiCommunicator {
    fn rank(&self) -> usize {
        self.world.rank() as usize
    }

    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn send(&self, dest: usize, kind: MessageKind, payload: &[Element]) -> Result<()> {
        if dest >= self.size() || dest == self.rank() {
            return Err(Error::Transport(format!(
                "rank {} cannot send {} to rank {}",
                self.rank(),
                kind,
                dest
            )));
        }
        self.world
            .process_at_rank(dest as i32)
            .send_with_tag(payload, kind.tag());
        Ok(())
    }

    fn receive_into(&self, source: usize, kind: MessageKind, buffer: &mut [Element]) -> Result<()> {
        if source >= self.size() || source == self.rank() {
            return Err(Error::Transport(format!(
                "rank {} cannot receive from rank {}",
                self.rank(),
                source
            )));
        }
        let status = self
            .world
            .process_at_rank(source as i32)
            .receive_into_with_tag(buffer, kind.tag());
        let count = status.count(Element::equivalent_datatype()) as usize;
        if count != buffer.len() {
            return Err(Error::Transport(format!(
                "rank {} expected {} of {} elements from rank {}, got {}",
                self.rank(),
                kind,
                buffer.len(),
                source,
                count
            )));
        }
        Ok(())
    }

    fn wall_time(&self) -> f64 {
        mpi::time()
    }
}
