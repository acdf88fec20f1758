use serde::{Deserialize, Serialize};

use crate::partition::{Dimensions, Scheme};

/// Options for one multiplication run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Global problem size
    pub dimensions: Dimensions,
    /// Decomposition used by the distributed run
    pub scheme: Scheme,
    /// Seed for the input generator (`None` = seeded from entropy)
    pub seed: Option<u64>,
    /// Recompute the product on the coordinator and compare
    pub verify: bool,
}

impl RunOptions {
    /// Create options for `dimensions` with the row-strip scheme
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            scheme: Scheme::RowStrip,
            seed: None,
            verify: false,
        }
    }

    /// Set the decomposition scheme
    pub fn set_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Set or clear the input seed
    pub fn set_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable verification against the reference product
    pub fn enable_verification(mut self, enable: bool) -> Self {
        self.verify = enable;
        self
    }
}
