//! Image grid to center-of-aperture time, position and velocity

use crate::core::batch::try_map_batch;
use crate::core::metadata::{BistaticParams, CollectionGeometry, MetadataParams};
use crate::core::poly::{Poly2d, XyzPoly};
use crate::core::vector::{add_scaled, distance, dot, sub};
use crate::types::{
    EcefPoints, ImageGridLocation, ImageGridLocations, SarError, SarResult, Vec3, SPEED_OF_LIGHT,
};
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

/// Tolerance on the bistatic transmit/receive time solution (s)
pub const BISTATIC_TIME_TOLERANCE: f64 = 1e-10;
/// Iteration cap on the bistatic transmit/receive time solution
pub const BISTATIC_TIME_MAX_ITERATIONS: usize = 10;

/// COA aperture reference point state for a monostatic image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoaPosVelMono {
    pub arp_coa: Vec3,
    pub varp_coa: Vec3,
}

/// COA platform states for a bistatic image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoaPosVelBi {
    pub grp_coa: Vec3,
    pub tx_coa: f64,
    pub tr_coa: f64,
    pub xmt_coa: Vec3,
    pub vxmt_coa: Vec3,
    pub rcv_coa: Vec3,
    pub vrcv_coa: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CoaPosVel {
    Mono(CoaPosVelMono),
    Bi(CoaPosVelBi),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoaPosVels {
    Mono(ArrayD<CoaPosVelMono>),
    Bi(ArrayD<CoaPosVelBi>),
}

impl CoaPosVels {
    pub fn shape(&self) -> &[usize] {
        match self {
            CoaPosVels::Mono(a) => a.shape(),
            CoaPosVels::Bi(a) => a.shape(),
        }
    }
}

/// Image plane point for a single image grid location
pub fn image_grid_to_ipp(scp: &Vec3, u_row: &Vec3, u_col: &Vec3, il: &ImageGridLocation) -> Vec3 {
    add_scaled(&add_scaled(scp, il[0], u_row), il[1], u_col)
}

/// `IPP = SCP + xrow * uRow + ycol * uCol`
pub fn image_grid_to_image_plane_point(
    scp: &Vec3,
    u_row: &Vec3,
    u_col: &Vec3,
    image_grid_locations: &ImageGridLocations,
) -> EcefPoints {
    image_grid_locations.map(|il| image_grid_to_ipp(scp, u_row, u_col, il))
}

/// Solve the row/column Gram system for a single image plane point
pub fn ipp_to_image_grid(
    scp: &Vec3,
    u_row: &Vec3,
    u_col: &Vec3,
    ipp: &Vec3,
) -> SarResult<ImageGridLocation> {
    let d = sub(ipp, scp);
    let g11 = dot(u_row, u_row);
    let g12 = dot(u_row, u_col);
    let g22 = dot(u_col, u_col);
    let det = g11 * g22 - g12 * g12;
    if det == 0.0 {
        return Err(SarError::InvalidParameter(
            "uRow and uCol do not span a plane".to_string(),
        ));
    }
    let dr = dot(&d, u_row);
    let dc = dot(&d, u_col);
    Ok([(g22 * dr - g12 * dc) / det, (g11 * dc - g12 * dr) / det])
}

/// Inverse of [`image_grid_to_image_plane_point`] for points in the image plane
pub fn image_plane_point_to_image_grid(
    scp: &Vec3,
    u_row: &Vec3,
    u_col: &Vec3,
    image_plane_points: &EcefPoints,
) -> SarResult<ImageGridLocations> {
    try_map_batch(image_plane_points, |ipp| {
        ipp_to_image_grid(scp, u_row, u_col, ipp)
    })
}

/// COA time for each image grid location
pub fn compute_coa_time(t_coa_poly: &Poly2d, image_grid_locations: &ImageGridLocations) -> ArrayD<f64> {
    image_grid_locations.map(|il| t_coa_poly.eval(il[0], il[1]))
}

/// COA platform state at a single COA time
pub fn compute_coa_pos_vel_at(meta: &MetadataParams, t_coa: f64) -> SarResult<CoaPosVel> {
    match &meta.geometry {
        CollectionGeometry::Monostatic(mono) => {
            let (arp_coa, varp_coa) = mono.arp_poly.eval_pos_vel(t_coa);
            Ok(CoaPosVel::Mono(CoaPosVelMono { arp_coa, varp_coa }))
        }
        CollectionGeometry::Bistatic(bi) => compute_coa_pos_vel_bi(bi, t_coa).map(CoaPosVel::Bi),
    }
}

/// COA platform states for every COA time
pub fn compute_coa_pos_vel(meta: &MetadataParams, t_coa: &ArrayD<f64>) -> SarResult<CoaPosVels> {
    match &meta.geometry {
        CollectionGeometry::Monostatic(mono) => Ok(CoaPosVels::Mono(t_coa.map(|&t| {
            let (arp_coa, varp_coa) = mono.arp_poly.eval_pos_vel(t);
            CoaPosVelMono { arp_coa, varp_coa }
        }))),
        CollectionGeometry::Bistatic(bi) => Ok(CoaPosVels::Bi(try_map_batch(t_coa, |&t| {
            compute_coa_pos_vel_bi(bi, t)
        })?)),
    }
}

fn compute_coa_pos_vel_bi(bi: &BistaticParams, t_coa: f64) -> SarResult<CoaPosVelBi> {
    let grp_coa = bi.grp_poly.eval(t_coa);

    // signal left the transmitter before, and reached the receiver after, t_coa
    let tx_coa = solve_apc_time(&bi.xmt_poly, &grp_coa, t_coa, -1.0, "transmit")?;
    let tr_coa = solve_apc_time(&bi.rcv_poly, &grp_coa, t_coa, 1.0, "receive")?;

    let (xmt_coa, vxmt_coa) = bi.xmt_poly.eval_pos_vel(tx_coa);
    let (rcv_coa, vrcv_coa) = bi.rcv_poly.eval_pos_vel(tr_coa);

    Ok(CoaPosVelBi {
        grp_coa,
        tx_coa,
        tr_coa,
        xmt_coa,
        vxmt_coa,
        rcv_coa,
        vrcv_coa,
    })
}

/// Fixed point solve of `t = t_coa + sign * |APC(t) - GRP| / c`
fn solve_apc_time(
    apc_poly: &XyzPoly,
    grp: &Vec3,
    t_coa: f64,
    sign: f64,
    which: &str,
) -> SarResult<f64> {
    let mut t = t_coa;
    for _ in 0..BISTATIC_TIME_MAX_ITERATIONS {
        let next = t_coa + sign * distance(&apc_poly.eval(t), grp) / SPEED_OF_LIGHT;
        let step = (next - t).abs();
        t = next;
        if step < BISTATIC_TIME_TOLERANCE {
            return Ok(t);
        }
    }
    Err(SarError::Convergence(format!(
        "{} time for t_COA={} did not converge in {} iterations",
        which, t_coa, BISTATIC_TIME_MAX_ITERATIONS
    )))
}
