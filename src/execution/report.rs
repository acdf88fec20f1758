use serde::Serialize;
use strum::Display;

use crate::error::Result;
use crate::matrix::{Element, Matrix};
use crate::partition::{Dimensions, Scheme};

/// Which implementation produced a report. Displays as the headline title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    #[strum(serialize = "Serial Matrix Multiplication")]
    Serial,
    #[strum(serialize = "MPI 1D Matrix Multiplication (Rectangular)")]
    RowStrip,
    #[strum(serialize = "2D MPI")]
    Grid,
}

impl From<Scheme> for Variant {
    fn from(scheme: Scheme) -> Self {
        match scheme {
            Scheme::RowStrip => Variant::RowStrip,
            Scheme::Grid => Variant::Grid,
        }
    }
}

/// Outcome of a run as seen by the coordinator
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub variant: Variant,
    pub dimensions: Dimensions,
    pub processes: usize,
    /// Seconds spent in the coordinator's local multiply only
    pub compute_seconds: f64,
    /// Whether the product was checked against the reference
    pub verified: bool,
    /// Top-left corner of C
    pub sample: Vec<Vec<Element>>,
    /// Full product
    #[serde(skip)]
    pub product: Matrix,
}

impl RunReport {
    pub(crate) fn new(
        variant: Variant,
        dimensions: Dimensions,
        processes: usize,
        compute_seconds: f64,
        verified: bool,
        product: Matrix,
    ) -> Self {
        Self {
            variant,
            dimensions,
            processes,
            compute_seconds,
            verified,
            sample: product.sample(),
            product,
        }
    }

    pub fn headline(&self) -> String {
        format!(
            "{} completed in {:.4} seconds.",
            self.variant, self.compute_seconds
        )
    }

    /// Human-readable report: headline, then the sample one row per line.
    pub fn render_text(&self) -> String {
        let mut lines = vec![self.headline(), "First few elements of matrix C:".to_string()];
        lines.extend(self.product.sample_lines());
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    pub fn render_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
