//! Partition planning: which block of C each rank owns, and therefore which
//! rows of A and which columns of B it needs.
//!
//! Both schemes produce the same [`Block`] contract, so distribution, compute
//! and collection consume a [`PartitionPlan`] without knowing which scheme
//! produced it.

pub mod grid;
pub mod row_strip;

use std::fmt::Debug;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{Error, Result};

pub use grid::GridPlan;
pub use row_strip::RowStripPlan;

/// Rank of the process that owns the global matrices.
pub const COORDINATOR: usize = 0;

/// Global problem size: `A` is `m x n`, `B` is `n x q`, `C` is `m x q`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub m: usize,
    pub n: usize,
    pub q: usize,
}

impl Dimensions {
    pub fn new(m: usize, n: usize, q: usize) -> Result<Self> {
        if m == 0 || n == 0 || q == 0 {
            return Err(Error::Configuration("Invalid matrix dimensions.".to_string()));
        }
        Ok(Self { m, n, q })
    }
}

/// Identity of one process inside the process group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub rank: usize,
    pub size: usize,
}

impl Topology {
    pub fn new(rank: usize, size: usize) -> Result<Self> {
        if size == 0 || rank >= size {
            return Err(Error::Configuration(format!(
                "rank {} is not valid in a group of {} processes",
                rank, size
            )));
        }
        Ok(Self { rank, size })
    }

    pub fn is_coordinator(&self) -> bool {
        self.rank == COORDINATOR
    }
}

/// Decomposition scheme selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Scheme {
    /// 1-D decomposition into contiguous row ranges of C.
    RowStrip,
    /// 2-D decomposition over a `sqrt(P) x sqrt(P)` process grid.
    Grid,
}

impl Scheme {
    /// Validate the constraints of this scheme and build its plan.
    ///
    /// Every rank calls this with the same inputs and so reaches the same
    /// verdict without talking to anyone.
    pub fn plan(self, dims: Dimensions, size: usize) -> Result<Box<dyn PartitionPlan>> {
        let plan: Box<dyn PartitionPlan> = match self {
            Scheme::RowStrip => Box::new(RowStripPlan::new(dims, size)?),
            Scheme::Grid => Box::new(GridPlan::new(dims, size)?),
        };
        check_coverage(plan.as_ref())?;
        Ok(plan)
    }
}

/// The block of C owned by one rank.
///
/// The rank needs rows `rows` of A (all `n` columns) and columns `cols` of B
/// (all `n` rows). For the row-strip scheme `cols` is the whole column range,
/// so the B block is all of B.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub rank: usize,
    pub rows: Range<usize>,
    pub cols: Range<usize>,
}

impl Block {
    /// Top-left corner of the block inside C
    pub fn offset(&self) -> (usize, usize) {
        (self.rows.start, self.cols.start)
    }

    /// Shape of the local C block
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.cols.len())
    }

    /// Shape of the local A block
    pub fn a_shape(&self, dims: &Dimensions) -> (usize, usize) {
        (self.rows.len(), dims.n)
    }

    /// Shape of the local B block
    pub fn b_shape(&self, dims: &Dimensions) -> (usize, usize) {
        (dims.n, self.cols.len())
    }

    pub fn area(&self) -> usize {
        self.rows.len() * self.cols.len()
    }

    fn overlaps(&self, other: &Block) -> bool {
        self.rows.start < other.rows.end
            && other.rows.start < self.rows.end
            && self.cols.start < other.cols.end
            && other.cols.start < self.cols.end
    }
}

/// Assignment of C blocks to ranks.
pub trait PartitionPlan: Debug + Send + Sync {
    fn scheme(&self) -> Scheme;

    fn dimensions(&self) -> Dimensions;

    /// Number of processes the plan was built for
    fn size(&self) -> usize;

    /// Block owned by `rank`; `rank` must be below [`PartitionPlan::size`].
    fn block(&self, rank: usize) -> Block;

    /// Blocks of every rank in ascending rank order
    fn blocks(&self) -> Vec<Block> {
        (0..self.size()).map(|rank| self.block(rank)).collect()
    }
}

/// Verify that the blocks of `plan` tile `[0, m) x [0, q)` exactly.
pub fn check_coverage(plan: &dyn PartitionPlan) -> Result<()> {
    let dims = plan.dimensions();
    let blocks = plan.blocks();

    for block in &blocks {
        if block.rows.end > dims.m || block.cols.end > dims.q || block.area() == 0 {
            return Err(Error::Configuration(format!(
                "{} block of rank {} ({:?} x {:?}) is empty or outside {}x{}",
                plan.scheme(),
                block.rank,
                block.rows,
                block.cols,
                dims.m,
                dims.q
            )));
        }
    }

    for (i, a) in blocks.iter().enumerate() {
        if let Some(b) = blocks[i + 1..].iter().find(|b| a.overlaps(b)) {
            return Err(Error::Configuration(format!(
                "{} blocks of ranks {} and {} overlap",
                plan.scheme(),
                a.rank,
                b.rank
            )));
        }
    }

    let covered: usize = blocks.iter().map(Block::area).sum();
    if covered != dims.m * dims.q {
        return Err(Error::Configuration(format!(
            "{} blocks cover {} of {} elements",
            plan.scheme(),
            covered,
            dims.m * dims.q
        )));
    }
    Ok(())
}
