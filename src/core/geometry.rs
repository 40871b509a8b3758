//! Reference frames and platform-to-point geometry
//!
//! RIC frames are used to express platform position/velocity error covariances,
//! the ENU basis and APC geometry parameters describe a collection relative to
//! a reference point on the ground.

use crate::core::matrix::{block2, from_cols};
use crate::core::vector::{cross, dot, norm, scale, sub, unit};
use crate::core::wgs84::{self, NOMINAL_MEAN_ANGULAR_VELOCITY};
use crate::types::{SarError, SarResult, SideOfTrack, Vec3};
use ndarray::{array, Array2};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Coordinate frame in which a 6-element position/velocity error is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceFrame {
    /// Earth centered fixed
    Ecf,
    /// Radial / in-track / cross-track, earth fixed
    Ricf,
    /// Radial / in-track / cross-track, inertial
    Rici,
}

impl FromStr for ReferenceFrame {
    type Err = SarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ECF" => Ok(ReferenceFrame::Ecf),
            "RICF" => Ok(ReferenceFrame::Ricf),
            "RICI" => Ok(ReferenceFrame::Rici),
            other => Err(SarError::InvalidParameter(format!(
                "Unknown reference frame {:?}, expected ECF, RICF or RICI",
                other
            ))),
        }
    }
}

/// Radial, in-track and cross-track unit vectors for a position and velocity
pub fn compute_ric_basis_vectors(p: &Vec3, v: &Vec3) -> (Vec3, Vec3, Vec3) {
    let u_r = unit(p);
    let u_c = unit(&cross(&u_r, v));
    let u_i = cross(&u_c, &u_r);
    (u_r, u_i, u_c)
}

fn ric_rotation(p: &Vec3, v: &Vec3) -> Array2<f64> {
    let (u_r, u_i, u_c) = compute_ric_basis_vectors(p, v);
    from_cols(&[u_r, u_i, u_c])
}

/// 6x6 transformation from `frame` to ECEF for a position/velocity pair
pub fn compute_ecef_pv_transformation(
    p_ecef: &Vec3,
    v_ecef: &Vec3,
    frame: ReferenceFrame,
) -> SarResult<Array2<f64>> {
    let zero = Array2::<f64>::zeros((3, 3));
    match frame {
        ReferenceFrame::Ecf => Ok(Array2::eye(6)),
        ReferenceFrame::Ricf => {
            let t = ric_rotation(p_ecef, v_ecef);
            block2(&t, &zero, &zero, &t)
        }
        ReferenceFrame::Rici => {
            let w = NOMINAL_MEAN_ANGULAR_VELOCITY;
            let earth_rate = cross(&[0.0, 0.0, w], p_ecef);
            let v_eci = [
                v_ecef[0] + earth_rate[0],
                v_ecef[1] + earth_rate[1],
                v_ecef[2] + earth_rate[2],
            ];
            let t = ric_rotation(p_ecef, &v_eci);
            let omega = array![[0.0, w, 0.0], [-w, 0.0, 0.0], [0.0, 0.0, 0.0]];
            block2(&t, &zero, &omega.dot(&t), &t)
        }
    }
}

/// Reference point location and its local east/north/up basis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefPointParams {
    /// `[lat_deg, lon_deg, hae_m]`
    pub llh: Vec3,
    pub u_east: Vec3,
    pub u_north: Vec3,
    pub u_up: Vec3,
}

pub fn compute_ref_point_parameters(rpt: &Vec3) -> RefPointParams {
    let llh = wgs84::cartesian_to_geodetic(rpt);
    let (sin_lat, cos_lat) = llh[0].to_radians().sin_cos();
    let (sin_lon, cos_lon) = llh[1].to_radians().sin_cos();

    RefPointParams {
        llh,
        u_east: [-sin_lon, cos_lon, 0.0],
        u_north: [-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat],
        u_up: [cos_lat * cos_lon, cos_lat * sin_lon, sin_lat],
    }
}

/// Geometry of an antenna phase center relative to a scene point
///
/// Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApcGeometry {
    pub slant_range: f64,
    pub range_rate: f64,
    /// Great-circle distance from the point to the APC nadir
    pub ground_range: f64,
    pub side_of_track: SideOfTrack,
    pub u_apc: Vec3,
    pub u_apc_dot: Vec3,
    pub doppler_cone_angle: f64,
    pub squint_angle: f64,
    /// Azimuth of the APC seen from the point, clockwise from north in [0, 360)
    pub azimuth_angle: f64,
    pub graze_angle: f64,
    pub incidence_angle: f64,
}

pub fn compute_apc_to_pt_geometry_parameters(
    apc: &Vec3,
    vapc: &Vec3,
    pt: &Vec3,
    basis: &RefPointParams,
) -> ApcGeometry {
    let r_apc_pt = norm(&sub(apc, pt));
    let u_apc = scale(&sub(apc, pt), 1.0 / r_apc_pt);
    let rdot_apc_pt = dot(vapc, &u_apc);
    let u_apc_dot = scale(&sub(vapc, &scale(&u_apc, rdot_apc_pt)), 1.0 / r_apc_pt);

    let pt_dec = norm(pt);
    let uec_pt = scale(pt, 1.0 / pt_dec);

    let uec_apc = unit(apc);
    let ag = scale(&uec_apc, pt_dec);

    let earth_angle = dot(&uec_apc, &uec_pt).clamp(-1.0, 1.0).acos();
    let ground_range = pt_dec * earth_angle;

    // along-track velocity and the left-pointing horizontal direction
    let vat = sub(vapc, &scale(&uec_apc, dot(vapc, &uec_apc)));
    let vat_m = norm(&vat);
    let u_at = scale(&vat, 1.0 / vat_m);
    let u_left = cross(&uec_apc, &u_at);

    let is_left = vat_m == 0.0 || ground_range == 0.0 || dot(&u_left, &u_apc) < 0.0;
    let side_of_track = if is_left {
        SideOfTrack::Left
    } else {
        SideOfTrack::Right
    };

    let vapc_m = norm(vapc);
    let doppler_cone_angle = if vapc_m == 0.0 {
        90.0
    } else {
        (-rdot_apc_pt / vapc_m).clamp(-1.0, 1.0).acos().to_degrees()
    };

    let pt_ag = sub(pt, &ag);
    let pt_at = dot(&u_at, &pt_ag);
    let pt_ct = dot(&u_left, &pt_ag).abs();
    let squint_angle = pt_at.atan2(pt_ct).to_degrees();

    let e = dot(&basis.u_east, &u_apc);
    let n = dot(&basis.u_north, &u_apc);
    let up = dot(&basis.u_up, &u_apc);

    let azimuth_angle = if ground_range == 0.0 {
        0.0
    } else {
        e.atan2(n).to_degrees().rem_euclid(360.0)
    };

    let incidence_angle = up.clamp(-1.0, 1.0).acos().to_degrees();

    ApcGeometry {
        slant_range: r_apc_pt,
        range_rate: rdot_apc_pt,
        ground_range,
        side_of_track,
        u_apc,
        u_apc_dot,
        doppler_cone_angle,
        squint_angle,
        azimuth_angle,
        graze_angle: 90.0 - incidence_angle,
        incidence_angle,
    }
}
