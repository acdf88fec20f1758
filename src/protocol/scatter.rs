use log::{debug, info};

use crate::error::{Error, Result};
use crate::partition::{Block, PartitionPlan, COORDINATOR};
use crate::transport::{Communicator, MessageKind};

use super::{GlobalMatrices, LocalBlocks, Participant};

/// Distribute the A and B blocks of every rank.
///
/// The coordinator visits workers in ascending rank order and sends each one
/// its A rows (`A-row`) followed by the `n` row segments of its B columns
/// (`B-row`). Its own block is copied locally. Workers receive the same rows
/// in the same order.
pub fn scatter<C>(comm: &C, plan: &dyn PartitionPlan, participant: &mut Participant) -> Result<()>
where
    C: Communicator + ?Sized,
{
    match participant {
        Participant::Coordinator { globals, local } => {
            for rank in (0..plan.size()).filter(|&rank| rank != COORDINATOR) {
                send_blocks(comm, globals, &plan.block(rank))?;
            }
            copy_own_blocks(globals, local)?;
            info!("scattered blocks to {} workers", plan.size() - 1);
            Ok(())
        }
        Participant::Worker { local } => receive_blocks(comm, local),
    }
}

fn send_blocks<C>(comm: &C, globals: &GlobalMatrices, block: &Block) -> Result<()>
where
    C: Communicator + ?Sized,
{
    debug!(
        "sending rank {}: A rows {:?}, B columns {:?}",
        block.rank, block.rows, block.cols
    );
    for i in block.rows.clone() {
        comm.send(block.rank, MessageKind::ARow, globals.a.row(i))?;
    }
    let width = block.cols.len();
    for k in 0..globals.b.rows() {
        let segment = globals.b.row_segment(k, block.cols.start, width)?;
        comm.send(block.rank, MessageKind::BRow, segment)?;
    }
    Ok(())
}

fn copy_own_blocks(globals: &GlobalMatrices, local: &mut LocalBlocks) -> Result<()> {
    let (row, col) = local.block.offset();
    local.a.copy_region_from(&globals.a, row, 0)?;
    local.b.copy_region_from(&globals.b, 0, col)?;
    Ok(())
}

fn receive_blocks<C>(comm: &C, local: &mut LocalBlocks) -> Result<()>
where
    C: Communicator + ?Sized,
{
    if local.block.rank == COORDINATOR {
        return Err(Error::Transport(
            "the coordinator block cannot be received as a worker".to_string(),
        ));
    }
    for i in 0..local.a.rows() {
        comm.receive_into(COORDINATOR, MessageKind::ARow, local.a.row_mut(i))?;
    }
    for k in 0..local.b.rows() {
        comm.receive_into(COORDINATOR, MessageKind::BRow, local.b.row_mut(k))?;
    }
    debug!(
        "rank {} received {}x{} A block and {}x{} B block",
        local.block.rank,
        local.a.rows(),
        local.a.cols(),
        local.b.rows(),
        local.b.cols()
    );
    Ok(())
}
