//! Scatter and gather choreography between the coordinator and the workers.
//!
//! A run goes through three phases: [`scatter`] hands every rank its A and B
//! blocks, every rank multiplies locally, and [`gather`] reassembles the C
//! blocks on the coordinator. Only the coordinator ever holds the global
//! matrices; that ownership is carried by [`Participant`].

pub mod gather;
pub mod scatter;

use crate::error::{Error, Result};
use crate::matrix::Matrix;
use crate::partition::{Block, Dimensions};

pub use gather::gather;
pub use scatter::scatter;

/// Full `A`, `B` and `C`, owned by the coordinator alone.
#[derive(Debug, Clone)]
pub struct GlobalMatrices {
    pub a: Matrix,
    pub b: Matrix,
    pub c: Matrix,
}

impl GlobalMatrices {
    /// Take ownership of the inputs and allocate a zeroed `C`.
    pub fn new(dims: &Dimensions, a: Matrix, b: Matrix) -> Result<Self> {
        Self::check_inputs(dims, &a, &b)?;
        Ok(Self {
            a,
            b,
            c: Matrix::zeros(dims.m, dims.q),
        })
    }

    /// `a` must be `m x n` and `b` must be `n x q`.
    pub fn check_inputs(dims: &Dimensions, a: &Matrix, b: &Matrix) -> Result<()> {
        if a.shape() != (dims.m, dims.n) || b.shape() != (dims.n, dims.q) {
            return Err(Error::Shape(format!(
                "inputs are {}x{} and {}x{}, expected {}x{} and {}x{}",
                a.rows(),
                a.cols(),
                b.rows(),
                b.cols(),
                dims.m,
                dims.n,
                dims.n,
                dims.q
            )));
        }
        Ok(())
    }
}

/// The blocks one rank computes with.
#[derive(Debug, Clone)]
pub struct LocalBlocks {
    pub block: Block,
    pub a: Matrix,
    pub b: Matrix,
    pub c: Matrix,
}

impl LocalBlocks {
    /// Allocate zeroed blocks shaped for `block`
    pub fn allocate(dims: &Dimensions, block: Block) -> Self {
        let (a_rows, a_cols) = block.a_shape(dims);
        let (b_rows, b_cols) = block.b_shape(dims);
        let (c_rows, c_cols) = block.shape();
        Self {
            a: Matrix::zeros(a_rows, a_cols),
            b: Matrix::zeros(b_rows, b_cols),
            c: Matrix::zeros(c_rows, c_cols),
            block,
        }
    }
}

/// Role-tagged data ownership of one rank.
#[derive(Debug, Clone)]
pub enum Participant {
    Coordinator {
        globals: GlobalMatrices,
        local: LocalBlocks,
    },
    Worker {
        local: LocalBlocks,
    },
}

impl Participant {
    pub fn local(&self) -> &LocalBlocks {
        match self {
            Participant::Coordinator { local, .. } | Participant::Worker { local } => local,
        }
    }

    pub fn local_mut(&mut self) -> &mut LocalBlocks {
        match self {
            Participant::Coordinator { local, .. } | Participant::Worker { local } => local,
        }
    }

    pub fn globals(&self) -> Option<&GlobalMatrices> {
        match self {
            Participant::Coordinator { globals, .. } => Some(globals),
            Participant::Worker { .. } => None,
        }
    }

    pub fn is_coordinator(&self) -> bool {
        matches!(self, Participant::Coordinator { .. })
    }

    /// Consume the participant, keeping the global matrices if it has them.
    pub fn into_globals(self) -> Option<GlobalMatrices> {
        match self {
            Participant::Coordinator { globals, .. } => Some(globals),
            Participant::Worker { .. } => None,
        }
    }
}
