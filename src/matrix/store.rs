use std::fmt;
use std::ops::{Index, IndexMut};

use ndarray::{ArrayView2, ArrayViewMut2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Scalar stored in every matrix and carried by every message.
///
/// Inputs are single digits, so a 64-bit accumulator cannot overflow for any
/// shape that fits in memory.
pub type Element = i64;

/// Exclusive upper bound of randomly filled values.
pub const FILL_BOUND: Element = 10;

/// Maximum number of rows shown by [`Matrix::sample`].
pub const SAMPLE_ROWS: usize = 2;

/// Maximum number of columns shown by [`Matrix::sample`].
pub const SAMPLE_COLS: usize = 10;

/// Dense `rows x cols` integer matrix in one contiguous row-major buffer.
///
/// Every row is a contiguous slice, so a row (or a run of columns inside a
/// row) can be handed to the transport as a single message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<Element>,
}

impl Matrix {
    /// Allocate a zero-filled matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0; rows * cols],
        }
    }

    /// Wrap an existing row-major buffer
    pub fn from_vec(rows: usize, cols: usize, data: Vec<Element>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::Shape(format!(
                "buffer of {} elements cannot back a {}x{} matrix",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build a matrix from nested rows. All rows must have the same length.
    pub fn from_rows(rows: &[Vec<Element>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::Shape(format!(
                    "row {} has {} elements, expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Allocate a matrix filled with uniform values in `0..FILL_BOUND`
    pub fn random<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let mut matrix = Self::zeros(rows, cols);
        matrix.fill_random(rng);
        matrix
    }

    /// Overwrite every element with a uniform value in `0..FILL_BOUND`
    pub fn fill_random<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for value in self.data.iter_mut() {
            *value = rng.gen_range(0..FILL_BOUND);
        }
    }

    /// Reset every element to zero
    pub fn zero(&mut self) {
        self.data.fill(0);
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn as_slice(&self) -> &[Element] {
        &self.data
    }

    /// Row `i` as one contiguous slice
    pub fn row(&self, i: usize) -> &[Element] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [Element] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Columns `[col, col + len)` of row `i`
    pub fn row_segment(&self, i: usize, col: usize, len: usize) -> Result<&[Element]> {
        let range = self.segment_range(i, col, len)?;
        Ok(&self.data[range])
    }

    pub fn row_segment_mut(&mut self, i: usize, col: usize, len: usize) -> Result<&mut [Element]> {
        let range = self.segment_range(i, col, len)?;
        Ok(&mut self.data[range])
    }

    fn segment_range(&self, i: usize, col: usize, len: usize) -> Result<std::ops::Range<usize>> {
        if i >= self.rows || col + len > self.cols {
            return Err(Error::Shape(format!(
                "segment row {} cols [{}, {}) is outside a {}x{} matrix",
                i,
                col,
                col + len,
                self.rows,
                self.cols
            )));
        }
        let start = i * self.cols + col;
        Ok(start..start + len)
    }

    /// Copy the `self.rows() x self.cols()` region of `source` whose top-left
    /// corner is `(row, col)` into `self`.
    pub fn copy_region_from(&mut self, source: &Matrix, row: usize, col: usize) -> Result<()> {
        if row + self.rows > source.rows || col + self.cols > source.cols {
            return Err(Error::Shape(format!(
                "{}x{} region at ({}, {}) is outside a {}x{} matrix",
                self.rows, self.cols, row, col, source.rows, source.cols
            )));
        }
        for i in 0..self.rows {
            let segment = source.row_segment(row + i, col, self.cols)?;
            self.row_mut(i).copy_from_slice(segment);
        }
        Ok(())
    }

    /// Write `block` into `self` with its top-left corner at `(row, col)`.
    pub fn place_block(&mut self, block: &Matrix, row: usize, col: usize) -> Result<()> {
        if row + block.rows > self.rows || col + block.cols > self.cols {
            return Err(Error::Shape(format!(
                "{}x{} block at ({}, {}) does not fit a {}x{} matrix",
                block.rows, block.cols, row, col, self.rows, self.cols
            )));
        }
        for i in 0..block.rows {
            self.row_segment_mut(row + i, col, block.cols)?
                .copy_from_slice(block.row(i));
        }
        Ok(())
    }

    /// Borrow as an ndarray view
    pub fn view(&self) -> Result<ArrayView2<'_, Element>> {
        Ok(ArrayView2::from_shape((self.rows, self.cols), &self.data)?)
    }

    pub fn view_mut(&mut self) -> Result<ArrayViewMut2<'_, Element>> {
        Ok(ArrayViewMut2::from_shape((self.rows, self.cols), &mut self.data)?)
    }

    /// Top-left `min(rows, 2) x min(cols, 10)` corner, one `Vec` per row.
    pub fn sample(&self) -> Vec<Vec<Element>> {
        let rows = self.rows.min(SAMPLE_ROWS);
        let cols = self.cols.min(SAMPLE_COLS);
        (0..rows).map(|i| self.row(i)[..cols].to_vec()).collect()
    }

    /// The sample rendered as space-separated lines.
    pub fn sample_lines(&self) -> Vec<String> {
        self.sample()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|value| value.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = Element;

    fn index(&self, (i, j): (usize, usize)) -> &Element {
        assert!(j < self.cols, "column {} out of bounds for {} columns", j, self.cols);
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Element {
        assert!(j < self.cols, "column {} out of bounds for {} columns", j, self.cols);
        &mut self.data[i * self.cols + j]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            let line = self
                .row(i)
                .iter()
                .map(|value| value.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
