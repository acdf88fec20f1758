use crate::error::{Error, Result};

use super::{Block, Dimensions, PartitionPlan, Scheme};

/// Each rank owns `m / P` contiguous rows of C across all `q` columns and
/// needs all of B.
#[derive(Debug, Clone)]
pub struct RowStripPlan {
    dims: Dimensions,
    size: usize,
    rows_per_rank: usize,
}

impl RowStripPlan {
    pub fn new(dims: Dimensions, size: usize) -> Result<Self> {
        if size == 0 || dims.m % size != 0 {
            return Err(Error::Configuration(format!(
                "Error: Rows ({}) must be divisible by processes ({})",
                dims.m, size
            )));
        }
        Ok(Self {
            dims,
            size,
            rows_per_rank: dims.m / size,
        })
    }

    pub fn rows_per_rank(&self) -> usize {
        self.rows_per_rank
    }
}

impl PartitionPlan for RowStripPlan {
    fn scheme(&self) -> Scheme {
        Scheme::RowStrip
    }

    fn dimensions(&self) -> Dimensions {
        self.dims
    }

    fn size(&self) -> usize {
        self.size
    }

    fn block(&self, rank: usize) -> Block {
        let start = rank * self.rows_per_rank;
        Block {
            rank,
            rows: start..start + self.rows_per_rank,
            cols: 0..self.dims.q,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_indivisible_rows() {
        let dims = Dimensions::new(7, 3, 3).unwrap();
        let err = RowStripPlan::new(dims, 2).unwrap_err();
        assert_eq!(err.to_string(), "Error: Rows (7) must be divisible by processes (2)");
    }

    #[test]
    fn test_blocks_are_contiguous_strips() {
        let dims = Dimensions::new(6, 2, 5).unwrap();
        let plan = RowStripPlan::new(dims, 3).unwrap();
        assert_eq!(plan.rows_per_rank(), 2);
        let rows: Vec<_> = plan.blocks().into_iter().map(|b| b.rows).collect();
        assert_eq!(rows, vec![0..2, 2..4, 4..6]);
        assert!(plan.blocks().iter().all(|b| b.cols == (0..5)));
    }

    #[test]
    fn test_single_process_owns_everything() {
        let dims = Dimensions::new(3, 3, 3).unwrap();
        let plan = RowStripPlan::new(dims, 1).unwrap();
        assert_eq!(plan.block(0), Block { rank: 0, rows: 0..3, cols: 0..3 });
    }
}
