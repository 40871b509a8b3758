//! Pixel and image-level projections built from the lower level steps
//!
//! These combine projection set computation with a surface intersection so a
//! caller only needs the metadata and image coordinates.

use crate::core::batch::{map_batch, try_map_batch};
use crate::core::metadata::MetadataParams;
use crate::core::projection::compute_projection_sets;
use crate::core::surface::{
    r_rdot_to_constant_hae_surface, r_rdot_to_dem_surface, r_rdot_to_ground_plane,
    SurfaceProjection, SurfaceProjectionParams,
};
use crate::core::wgs84;
use crate::io::dem::DemHeight;
use crate::types::{ImageGridLocations, SarResult, Vec3};
use ndarray::{ArrayD, Dimension};

pub use crate::core::scene_to_image::{scene_to_image, SceneToImage, SceneToImageParams};

/// Pixel `[row, col]` indices to image grid locations in meters
pub fn pixel_to_image_grid(meta: &MetadataParams, rowcol: &ArrayD<[f64; 2]>) -> ImageGridLocations {
    let [scp_row, scp_col] = meta.scp_pixel;
    rowcol.map(|rc| [(rc[0] - scp_row) * meta.row_ss, (rc[1] - scp_col) * meta.col_ss])
}

/// Image grid locations to fractional pixel `[row, col]` indices
pub fn image_grid_to_pixel(meta: &MetadataParams, il: &ImageGridLocations) -> ArrayD<[f64; 2]> {
    let [scp_row, scp_col] = meta.scp_pixel;
    il.map(|il| [il[0] / meta.row_ss + scp_row, il[1] / meta.col_ss + scp_col])
}

/// Image grid locations to a ground plane
///
/// The plane defaults to the one through the SCP with the ETP normal there.
pub fn image_to_ground_plane(
    meta: &MetadataParams,
    il: &ImageGridLocations,
    gref: Option<Vec3>,
    ugpn: Option<Vec3>,
    params: &SurfaceProjectionParams,
) -> SarResult<SurfaceProjection> {
    let gref = gref.unwrap_or(meta.scp);
    let ugpn = ugpn.unwrap_or_else(|| wgs84::up_at(&meta.scp));
    let sets = compute_projection_sets(meta, il)?;
    let projection = r_rdot_to_ground_plane(meta.look(), &meta.scp, &sets, &gref, &ugpn, params)?;
    log::info!(
        "Projected {} image locations to the ground plane ({} failed)",
        il.len(),
        projection.num_failed()
    );
    Ok(projection)
}

/// Image grid locations to the surface `HAE = hae0`
pub fn image_to_constant_hae_surface(
    meta: &MetadataParams,
    il: &ImageGridLocations,
    hae0: &ArrayD<f64>,
    params: &SurfaceProjectionParams,
) -> SarResult<SurfaceProjection> {
    let sets = compute_projection_sets(meta, il)?;
    let projection = r_rdot_to_constant_hae_surface(meta.look(), &meta.scp, &sets, hae0, params)?;
    log::info!(
        "Projected {} image locations to constant HAE ({} failed)",
        il.len(),
        projection.num_failed()
    );
    Ok(projection)
}

/// Image grid locations to a DEM
///
/// Each entry holds every intersection of that location's R/Rdot contour with
/// the DEM, highest first; an empty list means no intersection was found.
pub fn image_to_dem_surface<D: DemHeight + Sync + ?Sized>(
    meta: &MetadataParams,
    il: &ImageGridLocations,
    dem: &D,
    hae_min: f64,
    hae_max: f64,
    params: &SurfaceProjectionParams,
) -> SarResult<ArrayD<Vec<Vec3>>> {
    let sets = compute_projection_sets(meta, il)?;
    let shape = sets.shape().to_vec();
    let indices = ArrayD::from_shape_fn(shape, |idx| idx.slice().to_vec());

    let intersections = try_map_batch(&indices, |idx| match sets.get(idx) {
        Some(set) => r_rdot_to_dem_surface(meta.look(), &meta.scp, &set, dem, hae_min, hae_max, params),
        None => Ok(Vec::new()),
    })?;

    let misses = intersections.iter().filter(|points| points.is_empty()).count();
    log::info!("Projected {} image locations to the DEM", intersections.len());
    if misses > 0 {
        log::warn!("{} of {} image locations have no DEM intersection", misses, intersections.len());
    }
    Ok(intersections)
}

/// First (visible) DEM intersection of each contour, NaN where there is none
pub fn visible_dem_points(intersections: &ArrayD<Vec<Vec3>>) -> ArrayD<Vec3> {
    map_batch(intersections, |points| points.first().copied().unwrap_or([f64::NAN; 3]))
}
