//! Inputs consumed at the boundary of the projection engine

pub mod dem;
pub mod support_array;

// Re-export main types
pub use dem::{DemHeight, GeoTransform, GriddedDem};
pub use support_array::{
    compute_dwelltimes_using_dta, compute_dwelltimes_using_poly, interpolate_support_array,
    DwellTimeArray, SupportArrayGrid,
};
