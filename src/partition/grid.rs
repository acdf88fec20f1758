use crate::error::{Error, Result};

use super::{Block, Dimensions, PartitionPlan, Scheme};

/// Processes form a `g x g` grid (`g = sqrt(P)`); rank `p` sits at grid row
/// `p / g`, grid column `p % g` and owns the matching `(m/g) x (q/g)` block
/// of C. It needs the matching `m/g` rows of A and `q/g` columns of B.
#[derive(Debug, Clone)]
pub struct GridPlan {
    dims: Dimensions,
    side: usize,
    block_rows: usize,
    block_cols: usize,
}

/// Integer square root, `None` unless `n` is a perfect square.
pub fn exact_sqrt(n: usize) -> Option<usize> {
    let mut root = (n as f64).sqrt() as usize;
    // Correct float rounding in either direction.
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    (root * root == n).then_some(root)
}

impl GridPlan {
    pub fn new(dims: Dimensions, size: usize) -> Result<Self> {
        let side = exact_sqrt(size)
            .filter(|&g| g > 0 && dims.m % g == 0 && dims.q % g == 0)
            .ok_or_else(|| {
                Error::Configuration(
                    "Processes must be perfect square, and M, Q divisible by sqrt(P).".to_string(),
                )
            })?;
        Ok(Self {
            dims,
            side,
            block_rows: dims.m / side,
            block_cols: dims.q / side,
        })
    }

    /// Side length of the process grid
    pub fn side(&self) -> usize {
        self.side
    }

    /// `(grid row, grid column)` of `rank`
    pub fn coordinates(&self, rank: usize) -> (usize, usize) {
        (rank / self.side, rank % self.side)
    }
}

impl PartitionPlan for GridPlan {
    fn scheme(&self) -> Scheme {
        Scheme::Grid
    }

    fn dimensions(&self) -> Dimensions {
        self.dims
    }

    fn size(&self) -> usize {
        self.side * self.side
    }

    fn block(&self, rank: usize) -> Block {
        let (row_block, col_block) = self.coordinates(rank);
        let row = row_block * self.block_rows;
        let col = col_block * self.block_cols;
        Block {
            rank,
            rows: row..row + self.block_rows,
            cols: col..col + self.block_cols,
        }
    }
}
