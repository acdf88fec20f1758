use crate::error::{Error, Result};

use super::store::Matrix;

/// Check that `a (r x n) * b (n x c)` is defined and return `(r, c)`.
pub fn validate_product_shapes(a: &Matrix, b: &Matrix) -> Result<(usize, usize)> {
    if a.cols() != b.rows() {
        return Err(Error::Shape(format!(
            "incompatible operands for multiplication: {}x{} and {}x{}",
            a.rows(),
            a.cols(),
            b.rows(),
            b.cols()
        )));
    }
    Ok((a.rows(), b.cols()))
}

/// Local compute kernel: `c[i][j] += sum_k a[i][k] * b[k][j]`.
///
/// Plain i-j-k triple loop, identical for every decomposition scheme; only the
/// operand shapes differ. `c` must be zeroed by the caller beforehand to get
/// the product rather than an accumulation.
pub fn multiply_accumulate(a: &Matrix, b: &Matrix, c: &mut Matrix) -> Result<()> {
    let output = validate_product_shapes(a, b)?;
    if c.shape() != output {
        return Err(Error::Shape(format!(
            "result block is {}x{}, expected {}x{}",
            c.rows(),
            c.cols(),
            output.0,
            output.1
        )));
    }

    let inner = a.cols();
    for i in 0..a.rows() {
        let a_row = a.row(i);
        let c_row = c.row_mut(i);
        for (j, c_value) in c_row.iter_mut().enumerate() {
            let mut sum = *c_value;
            for k in 0..inner {
                sum += a_row[k] * b[(k, j)];
            }
            *c_value = sum;
        }
    }
    Ok(())
}

/// Zero-initialize a fresh block and multiply into it.
pub fn multiply(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    let (rows, cols) = validate_product_shapes(a, b)?;
    let mut c = Matrix::zeros(rows, cols);
    multiply_accumulate(a, b, &mut c)?;
    Ok(c)
}

/// Single-process reference product computed with ndarray.
///
/// Independent of [`multiply_accumulate`], so it can be used to check the
/// distributed result.
pub fn reference_multiply(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    let (rows, cols) = validate_product_shapes(a, b)?;
    let product = a.view()?.dot(&b.view()?);
    let data = product.iter().copied().collect();
    Matrix::from_vec(rows, cols, data)
}
