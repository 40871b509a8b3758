//! sicdproj: SICD image projection and error propagation
//!
//! Converts between SICD image grid locations, R/Rdot contours and ECEF scene
//! points (ground plane, constant height and DEM surfaces), and propagates
//! the error statistics of a product into scene and image space.
//!
//! Batched operations take `ndarray` arrays of any shape whose elements are
//! image grid locations `[xrow, ycol]` or ECEF points `[x, y, z]`. With the
//! default `parallel` feature the per-point kernels run on the rayon pool.

pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{
    CollectType, EcefPoints, GridType, ImageFormationAlgorithm, ImageGridLocation,
    ImageGridLocations, SarError, SarResult, SideOfTrack, Vec3, SPEED_OF_LIGHT,
};

pub use crate::core::derived::{
    image_grid_to_pixel, image_to_constant_hae_surface, image_to_dem_surface,
    image_to_ground_plane, pixel_to_image_grid,
};
pub use crate::core::{
    apply_apos, compute_projection_sets, compute_sensitivity_matrices, scene_to_image,
    MetadataParams, ProjectionSets, SurfaceProjection, SurfaceProjectionParams,
};
pub use io::{DemHeight, GriddedDem};
