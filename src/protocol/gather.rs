use log::{debug, info};

use crate::error::Result;
use crate::partition::{PartitionPlan, COORDINATOR};
use crate::transport::{Communicator, MessageKind};

use super::Participant;

/// Collect every rank's C block into the coordinator's global C.
///
/// Workers send their C rows (`C-row`) in row order. The coordinator places
/// its own block locally, then receives in ascending rank order, writing each
/// row straight into global C at the block's row offset and column offset.
pub fn gather<C>(comm: &C, plan: &dyn PartitionPlan, participant: &mut Participant) -> Result<()>
where
    C: Communicator + ?Sized,
{
    match participant {
        Participant::Coordinator { globals, local } => {
            let (row, col) = local.block.offset();
            globals.c.place_block(&local.c, row, col)?;

            for rank in (0..plan.size()).filter(|&rank| rank != COORDINATOR) {
                let block = plan.block(rank);
                let width = block.cols.len();
                for i in block.rows.clone() {
                    let target = globals.c.row_segment_mut(i, block.cols.start, width)?;
                    comm.receive_into(rank, MessageKind::CRow, target)?;
                }
                debug!("gathered {}x{} block from rank {}", block.rows.len(), width, rank);
            }
            info!("gathered result blocks from {} workers", plan.size() - 1);
            Ok(())
        }
        Participant::Worker { local } => {
            for i in 0..local.c.rows() {
                comm.send(COORDINATOR, MessageKind::CRow, local.c.row(i))?;
            }
            Ok(())
        }
    }
}
