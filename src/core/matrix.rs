//! Small dense matrix helpers on top of `ndarray`

use crate::types::{SarError, SarResult, Vec3};
use ndarray::{array, concatenate, Array2, ArrayView2, Axis};

/// Inverse of a 2x2 matrix
///
/// Singular or non-finite input is reported as degenerate geometry.
pub fn inv2(m: &Array2<f64>, what: &str) -> SarResult<Array2<f64>> {
    check_shape(what, m, (2, 2))?;
    let det = m[[0, 0]] * m[[1, 1]] - m[[0, 1]] * m[[1, 0]];
    if det == 0.0 || !det.is_finite() {
        return Err(SarError::DegenerateGeometry(format!(
            "{} is singular (det = {})",
            what, det
        )));
    }
    Ok(array![[m[[1, 1]], -m[[0, 1]]], [-m[[1, 0]], m[[0, 0]]]] / det)
}

/// `m * c * m^T`
pub fn sandwich(m: &Array2<f64>, c: &Array2<f64>) -> Array2<f64> {
    m.dot(c).dot(&m.t())
}

/// Stack 3-vectors as the rows of a matrix
pub fn from_rows(rows: &[Vec3]) -> Array2<f64> {
    Array2::from_shape_fn((rows.len(), 3), |(i, j)| rows[i][j])
}

/// Stack 3-vectors as the columns of a matrix
pub fn from_cols(cols: &[Vec3]) -> Array2<f64> {
    Array2::from_shape_fn((3, cols.len()), |(i, j)| cols[j][i])
}

/// Concatenate matrices left to right
pub fn hstack(blocks: &[ArrayView2<f64>]) -> SarResult<Array2<f64>> {
    Ok(concatenate(Axis(1), blocks)?)
}

/// Assemble `[[a, b], [c, d]]`
pub fn block2(
    a: &Array2<f64>,
    b: &Array2<f64>,
    c: &Array2<f64>,
    d: &Array2<f64>,
) -> SarResult<Array2<f64>> {
    let top = concatenate(Axis(1), &[a.view(), b.view()])?;
    let bottom = concatenate(Axis(1), &[c.view(), d.view()])?;
    Ok(concatenate(Axis(0), &[top.view(), bottom.view()])?)
}

/// Fail with `InvalidShape` unless `m` has the expected shape
pub fn check_shape(name: &str, m: &Array2<f64>, expected: (usize, usize)) -> SarResult<()> {
    if m.dim() != expected {
        return Err(SarError::InvalidShape(format!(
            "{} must be {}x{}, got {}x{}",
            name,
            expected.0,
            expected.1,
            m.nrows(),
            m.ncols()
        )));
    }
    Ok(())
}

pub fn all_finite(m: &Array2<f64>) -> bool {
    m.iter().all(|v| v.is_finite())
}
