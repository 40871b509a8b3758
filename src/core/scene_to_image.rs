//! Scene points to image grid locations

use crate::core::batch::try_map_batch;
use crate::core::coa::ipp_to_image_grid;
use crate::core::metadata::{MetadataParams, RRdotMethod};
use crate::core::projection::project_location;
use crate::core::surface::{ground_plane_point, SurfaceProjectionParams};
use crate::core::vector::{add, add_scaled, dot, norm, sub};
use crate::core::wgs84;
use crate::types::{EcefPoints, ImageGridLocation, ImageGridLocations, SarError, SarResult, Vec3};
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneToImageParams {
    /// Ground plane distance that ends the iteration (m)
    pub delta_gp_s2i: f64,
    pub max_iterations: usize,
    /// Parameters of the ground plane projection run each iteration
    #[serde(default)]
    pub ground_plane: SurfaceProjectionParams,
}

impl Default for SceneToImageParams {
    fn default() -> Self {
        Self {
            delta_gp_s2i: 0.001,
            max_iterations: 10,
            ground_plane: SurfaceProjectionParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneToImage {
    pub image_grid_locations: ImageGridLocations,
    /// Distance between the scene point and the projection of the final
    /// image location onto the ground plane (m)
    pub delta_gp: ArrayD<f64>,
    pub success: ArrayD<bool>,
}

impl SceneToImage {
    pub fn all_converged(&self) -> bool {
        self.success.iter().all(|&ok| ok)
    }
}

fn scene_point_to_image(
    meta: &MetadataParams,
    method: &RRdotMethod,
    u_ipn: &Vec3,
    scene_point: &Vec3,
    params: &SceneToImageParams,
) -> SarResult<(ImageGridLocation, f64, bool)> {
    let look = meta.look();
    let u_gpn = wgs84::up_at(scene_point);
    let gpn_dot_ipn = dot(&u_gpn, u_ipn);

    // start from the scene point projected along the ETP normal into the image plane
    let mut ipp = add_scaled(
        scene_point,
        -dot(&sub(scene_point, &meta.scp), u_ipn) / gpn_dot_ipn,
        &u_gpn,
    );
    let mut il = [f64::NAN; 2];
    let mut delta_gp = f64::NAN;

    for _ in 0..params.max_iterations {
        il = ipp_to_image_grid(&meta.scp, &meta.u_row, &meta.u_col, &ipp)?;
        let set = project_location(meta, method, &il)?;
        let (gpp, _, ok) =
            ground_plane_point(look, &meta.scp, &set, scene_point, &u_gpn, &params.ground_plane);
        if !ok {
            return Ok((il, f64::NAN, false));
        }

        let delta = sub(scene_point, &gpp);
        delta_gp = norm(&delta);
        if delta_gp <= params.delta_gp_s2i {
            return Ok((il, delta_gp, true));
        }
        ipp = add_scaled(&add(&ipp, &delta), -dot(&delta, u_ipn) / gpn_dot_ipn, &u_gpn);
    }
    Ok((il, delta_gp, false))
}

/// Image grid locations of ECEF scene points
///
/// Iterates image plane point, R/Rdot contour and ground plane projection
/// until the projected point lands within `delta_gp_s2i` of the scene point.
pub fn scene_to_image(
    meta: &MetadataParams,
    scene_points: &EcefPoints,
    params: &SceneToImageParams,
) -> SarResult<SceneToImage> {
    if !(params.delta_gp_s2i > 0.0) || params.max_iterations == 0 {
        return Err(SarError::InvalidParameter(format!(
            "invalid scene to image parameters: delta_gp_s2i={}, max_iterations={}",
            params.delta_gp_s2i, params.max_iterations
        )));
    }
    params.ground_plane.validate()?;

    let method = meta.r_rdot_method()?;
    let u_ipn = meta.image_plane_normal();

    let results = try_map_batch(scene_points, |pt| {
        scene_point_to_image(meta, &method, &u_ipn, pt, params)
    })?;

    let projection = SceneToImage {
        image_grid_locations: results.map(|r| r.0),
        delta_gp: results.map(|r| r.1),
        success: results.map(|r| r.2),
    };

    let failed = projection.success.iter().filter(|&&ok| !ok).count();
    if failed > 0 {
        log::warn!(
            "scene to image: {} of {} points did not converge",
            failed,
            projection.success.len()
        );
    } else {
        log::info!("scene to image: {} points converged", projection.success.len());
    }
    Ok(projection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = SceneToImageParams::default();
        assert_eq!(params.delta_gp_s2i, 0.001);
        assert_eq!(params.max_iterations, 10);
    }
}
