//! Core projection modules

pub mod apo;
pub mod batch;
pub mod coa;
pub mod derived;
pub mod errorprop;
pub mod geometry;
pub mod matrix;
pub mod metadata;
pub mod poly;
pub mod projection;
pub mod scene_to_image;
pub mod sensitivity;
pub mod surface;
pub mod vector;
pub mod wgs84;

// Re-export main types
pub use apo::{
    apply_apos, AdjustableParameterOffsets, AdjustableParameterOffsetsBi,
    AdjustableParameterOffsetsMono, ApoPlatform,
};
pub use coa::{
    compute_coa_pos_vel, compute_coa_time, image_grid_to_image_plane_point,
    image_plane_point_to_image_grid, CoaPosVel, CoaPosVels,
};
pub use errorprop::{
    compute_composite_error_apo_bi, compute_composite_error_apo_mono,
    compute_composite_error_no_apo_bi, compute_composite_error_no_apo_mono, compute_i2s_error,
    compute_s2i_error, ApoErrorParams, ComponentErrorStatBi, ComponentErrorStatMono,
    ErrorStatParams,
};
pub use geometry::{
    compute_apc_to_pt_geometry_parameters, compute_ecef_pv_transformation,
    compute_ref_point_parameters, compute_ric_basis_vectors, ReferenceFrame,
};
pub use metadata::{
    BistaticParams, CollectionGeometry, IncaParams, MetadataParams, MonostaticParams, PfaParams,
    RRdotMethod,
};
pub use poly::{Poly1d, Poly2d, XyzPoly};
pub use projection::{
    compute_coa_r_rdot, compute_projection_set, compute_projection_sets,
    compute_scp_coa_r_rdot, compute_scp_coa_slant_plane_normal, ProjectionSet, ProjectionSetBi,
    ProjectionSetMono, ProjectionSets,
};
pub use scene_to_image::{scene_to_image, SceneToImage, SceneToImageParams};
pub use sensitivity::{
    compute_image_location_sensitivity_matrices, compute_sensitivity_matrices,
    compute_slant_plane_sensitivity_matrices, SensitivityMatrices, SensitivityOptions,
};
pub use surface::{
    r_rdot_to_constant_hae_surface, r_rdot_to_dem_surface, r_rdot_to_ground_plane,
    r_rdot_to_ground_plane_bi, r_rdot_to_ground_plane_mono, SurfaceProjection,
    SurfaceProjectionParams,
};
