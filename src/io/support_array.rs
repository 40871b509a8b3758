//! Support array lookup
//!
//! Support arrays are regularly sampled 2-D grids of a parameter. Values are
//! read by bilinear interpolation with a data-valid mask carried alongside.

use crate::core::batch::map_batch2;
use crate::core::poly::Poly2d;
use crate::types::{SarError, SarResult};
use ndarray::{Array2, ArrayD};
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Origin and sample spacing of a support array
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupportArrayGrid {
    pub x0: f64,
    pub y0: f64,
    pub x_ss: f64,
    pub y_ss: f64,
}

impl SupportArrayGrid {
    pub fn new(x0: f64, y0: f64, x_ss: f64, y_ss: f64) -> SarResult<Self> {
        if !(x_ss > 0.0 && y_ss > 0.0) {
            return Err(SarError::InvalidParameter(format!(
                "support array sample spacing must be positive, got ({}, {})",
                x_ss, y_ss
            )));
        }
        Ok(Self { x0, y0, x_ss, y_ss })
    }
}

fn interpolate_point<T: Float>(
    x: f64,
    y: f64,
    grid: &SupportArrayGrid,
    sa: &Array2<T>,
    dv_sa: Option<&Array2<bool>>,
) -> (f64, bool) {
    let (num_rows, num_cols) = sa.dim();
    let m = (x - grid.x0) / grid.x_ss;
    let n = (y - grid.y0) / grid.y_ss;
    if !(m.is_finite() && n.is_finite()) {
        return (f64::NAN, false);
    }

    let m0 = m.floor();
    let n0 = n.floor();
    // both neighbors must lie inside the array
    if m0 < 0.0 || m0 + 1.0 > (num_rows as f64 - 1.0) || n0 < 0.0 || n0 + 1.0 > (num_cols as f64 - 1.0) {
        return (f64::NAN, false);
    }
    let (m0, n0) = (m0 as usize, n0 as usize);
    let (m1, n1) = (m0 + 1, n0 + 1);

    if let Some(dv) = dv_sa {
        if !(dv[[m0, n0]] && dv[[m0, n1]] && dv[[m1, n0]] && dv[[m1, n1]]) {
            return (f64::NAN, false);
        }
    }

    let value = |i: usize, j: usize| sa[[i, j]].to_f64().unwrap_or(f64::NAN);
    let dm = m - m0 as f64;
    let dn = n - n0 as f64;
    let interpolated = value(m0, n0) * (1.0 - dm) * (1.0 - dn)
        + value(m0, n1) * (1.0 - dm) * dn
        + value(m1, n0) * dm * (1.0 - dn)
        + value(m1, n1) * dm * dn;
    (interpolated, true)
}

/// Bilinear interpolation of a support array at `(x, y)`
///
/// Returns the values and a data-valid flag per point. Points whose
/// neighborhood leaves the array or touches an invalid sample are NaN with
/// `dv = false`.
pub fn interpolate_support_array<T: Float + Sync>(
    x: &ArrayD<f64>,
    y: &ArrayD<f64>,
    grid: &SupportArrayGrid,
    sa: &Array2<T>,
    dv_sa: Option<&Array2<bool>>,
) -> SarResult<(ArrayD<f64>, ArrayD<bool>)> {
    if let Some(dv) = dv_sa {
        if dv.dim() != sa.dim() {
            return Err(SarError::InvalidShape(format!(
                "data valid mask {:?} does not match support array {:?}",
                dv.dim(),
                sa.dim()
            )));
        }
    }

    let results = map_batch2(x, &y.view(), |&xi, &yi| interpolate_point(xi, yi, grid, sa, dv_sa))?;
    Ok((results.map(|r| r.0), results.map(|r| r.1)))
}

/// Center of dwell and dwell time arrays sharing one grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DwellTimeArray {
    pub grid: SupportArrayGrid,
    /// Center of dwell time (s)
    pub cod: Array2<f64>,
    /// Dwell time (s)
    pub dt: Array2<f64>,
    /// Sample value marking missing data
    pub nodata: Option<f64>,
}

impl DwellTimeArray {
    pub fn new(grid: SupportArrayGrid, cod: Array2<f64>, dt: Array2<f64>, nodata: Option<f64>) -> SarResult<Self> {
        if cod.dim() != dt.dim() {
            return Err(SarError::InvalidShape(format!(
                "COD array {:?} and DT array {:?} differ in shape",
                cod.dim(),
                dt.dim()
            )));
        }
        Ok(Self { grid, cod, dt, nodata })
    }

    fn valid_mask(&self, sa: &Array2<f64>) -> Option<Array2<bool>> {
        self.nodata.map(|nodata| sa.map(|&v| v != nodata))
    }
}

/// Center of dwell and dwell times from image area polynomials
pub fn compute_dwelltimes_using_poly(
    iax: &ArrayD<f64>,
    iay: &ArrayD<f64>,
    cod_poly: &Poly2d,
    dwell_poly: &Poly2d,
) -> SarResult<(ArrayD<f64>, ArrayD<f64>)> {
    let t_cod = map_batch2(iax, &iay.view(), |&x, &y| cod_poly.eval(x, y))?;
    let t_dwell = map_batch2(iax, &iay.view(), |&x, &y| dwell_poly.eval(x, y))?;
    Ok((t_cod, t_dwell))
}

/// Center of dwell and dwell times from a dwell time array
///
/// Samples equal to the array's NODATA value are excluded from the
/// interpolation; affected points come back as NaN.
pub fn compute_dwelltimes_using_dta(
    iax: &ArrayD<f64>,
    iay: &ArrayD<f64>,
    dta: &DwellTimeArray,
) -> SarResult<(ArrayD<f64>, ArrayD<f64>)> {
    let cod_dv = dta.valid_mask(&dta.cod);
    let dt_dv = dta.valid_mask(&dta.dt);
    let (t_cod, _) = interpolate_support_array(iax, iay, &dta.grid, &dta.cod, cod_dv.as_ref())?;
    let (t_dwell, _) = interpolate_support_array(iax, iay, &dta.grid, &dta.dt, dt_dv.as_ref())?;
    Ok((t_cod, t_dwell))
}
