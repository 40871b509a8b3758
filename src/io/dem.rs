//! DEM height providers for DEM surface projection

use crate::core::wgs84;
use crate::types::{SarError, SarResult, Vec3};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Height above the WGS-84 ellipsoid of the terrain below an ECEF point
///
/// Implementations return NaN where the terrain height is unknown.
pub trait DemHeight {
    fn hae_at(&self, point: &Vec3) -> f64;
}

impl<F> DemHeight for F
where
    F: Fn(&Vec3) -> f64,
{
    fn hae_at(&self, point: &Vec3) -> f64 {
        self(point)
    }
}

/// Affine lat/lon geotransform of a gridded DEM (GDAL ordering)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// Longitude of the first column (degrees)
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    /// Latitude of the first row (degrees)
    pub top_left_y: f64,
    pub rotation_y: f64,
    /// Usually negative: latitude decreases with row
    pub pixel_height: f64,
}

/// Heights on a regular lat/lon grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GriddedDem {
    pub heights: Array2<f32>,
    pub transform: GeoTransform,
    pub nodata: f32,
    /// Constant added to grid heights to reach HAE (geoid undulation)
    pub geoid_offset: f64,
}

impl GriddedDem {
    pub fn new(heights: Array2<f32>, transform: GeoTransform, nodata: f32) -> SarResult<Self> {
        let (rows, cols) = heights.dim();
        if rows < 2 || cols < 2 {
            return Err(SarError::InvalidShape(format!(
                "DEM must be at least 2x2, got {}x{}",
                rows, cols
            )));
        }
        if transform.pixel_width == 0.0 || transform.pixel_height == 0.0 {
            return Err(SarError::InvalidParameter(
                "DEM pixel size must be non-zero".to_string(),
            ));
        }
        if transform.rotation_x != 0.0 || transform.rotation_y != 0.0 {
            log::warn!("DEM geotransform rotation terms are ignored");
        }
        log::debug!(
            "DEM {}x{} at ({}, {}), pixel {} x {} deg",
            rows,
            cols,
            transform.top_left_y,
            transform.top_left_x,
            transform.pixel_height,
            transform.pixel_width
        );
        Ok(Self {
            heights,
            transform,
            nodata,
            geoid_offset: 0.0,
        })
    }

    pub fn with_geoid_offset(mut self, geoid_offset: f64) -> Self {
        self.geoid_offset = geoid_offset;
        self
    }

    /// Bilinearly interpolated grid height, `None` outside the grid or next to nodata
    pub fn elevation_at_latlon(&self, lat: f64, lon: f64) -> Option<f64> {
        let (rows, cols) = self.heights.dim();
        let col = (lon - self.transform.top_left_x) / self.transform.pixel_width;
        let row = (lat - self.transform.top_left_y) / self.transform.pixel_height;

        if !(col >= 0.0 && row >= 0.0 && col <= (cols - 1) as f64 && row <= (rows - 1) as f64) {
            return None;
        }

        let x1 = (col.floor() as usize).min(cols - 2);
        let y1 = (row.floor() as usize).min(rows - 2);
        let (x2, y2) = (x1 + 1, y1 + 1);
        let dx = col - x1 as f64;
        let dy = row - y1 as f64;

        let corners = [
            self.heights[[y1, x1]],
            self.heights[[y2, x1]],
            self.heights[[y1, x2]],
            self.heights[[y2, x2]],
        ];
        if corners.iter().any(|&v| v == self.nodata || !v.is_finite()) {
            return None;
        }
        let [v11, v12, v21, v22] = corners.map(f64::from);

        Some(
            v11 * (1.0 - dx) * (1.0 - dy)
                + v21 * dx * (1.0 - dy)
                + v12 * (1.0 - dx) * dy
                + v22 * dx * dy,
        )
    }
}

impl DemHeight for GriddedDem {
    fn hae_at(&self, point: &Vec3) -> f64 {
        let llh = wgs84::cartesian_to_geodetic(point);
        self.elevation_at_latlon(llh[0], llh[1])
            .map_or(f64::NAN, |h| h + self.geoid_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn create_test_dem() -> GriddedDem {
        let heights = Array2::from_shape_fn((3, 3), |(i, j)| (100 * i + 10 * j) as f32);
        let transform = GeoTransform {
            top_left_x: 10.0,
            pixel_width: 0.5,
            rotation_x: 0.0,
            top_left_y: 45.0,
            rotation_y: 0.0,
            pixel_height: -0.5,
        };
        GriddedDem::new(heights, transform, -9999.0).unwrap()
    }

    #[test]
    fn test_bilinear_elevation() {
        let dem = create_test_dem();
        assert_abs_diff_eq!(dem.elevation_at_latlon(45.0, 10.0).unwrap(), 0.0);
        assert_abs_diff_eq!(dem.elevation_at_latlon(44.5, 10.5).unwrap(), 110.0, epsilon = 1e-9);
        assert_abs_diff_eq!(dem.elevation_at_latlon(44.75, 10.25).unwrap(), 55.0, epsilon = 1e-9);
        // last row and column are inside the grid
        assert_abs_diff_eq!(dem.elevation_at_latlon(44.0, 11.0).unwrap(), 220.0, epsilon = 1e-9);
        assert!(dem.elevation_at_latlon(45.1, 10.0).is_none());
    }

    #[test]
    fn test_nodata_and_geoid_offset() {
        let mut dem = create_test_dem().with_geoid_offset(30.0);
        let point = wgs84::geodetic_to_cartesian(&[44.5, 10.5, 0.0]);
        assert_abs_diff_eq!(dem.hae_at(&point), 140.0, epsilon = 1e-6);

        dem.heights[[1, 1]] = -9999.0;
        assert!(dem.hae_at(&point).is_nan());
    }

    #[test]
    fn test_closure_provider() {
        let flat = |_: &Vec3| 12.5;
        assert_eq!(flat.hae_at(&[0.0, 0.0, 0.0]), 12.5);
    }
}
