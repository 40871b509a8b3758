//! WGS-84 ellipsoid conversions
//!
//! Geodetic coordinates are `[latitude_deg, longitude_deg, hae_m]`.

use crate::core::vector::scale;
use crate::types::Vec3;
use ndarray::ArrayD;

/// Semi-major axis (m)
pub const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
/// Inverse flattening
pub const INV_FLATTENING: f64 = 298.257_223_563;
/// Flattening
pub const FLATTENING: f64 = 1.0 / INV_FLATTENING;
/// Semi-minor axis (m)
pub const SEMI_MINOR_AXIS: f64 = SEMI_MAJOR_AXIS * (1.0 - FLATTENING);
/// First eccentricity squared
pub const FIRST_ECCENTRICITY_SQUARED: f64 = FLATTENING * (2.0 - FLATTENING);
/// Second eccentricity squared
pub const SECOND_ECCENTRICITY_SQUARED: f64 =
    FIRST_ECCENTRICITY_SQUARED / (1.0 - FIRST_ECCENTRICITY_SQUARED);
/// Nominal mean angular velocity of the Earth (rad/s)
pub const NOMINAL_MEAN_ANGULAR_VELOCITY: f64 = 7.292_115e-5;

const MAX_BOWRING_ITERATIONS: usize = 5;

/// Radius of curvature in the prime vertical
fn prime_vertical_radius(sin_lat: f64) -> f64 {
    SEMI_MAJOR_AXIS / (1.0 - FIRST_ECCENTRICITY_SQUARED * sin_lat * sin_lat).sqrt()
}

/// Convert geodetic `[lat_deg, lon_deg, hae_m]` to ECEF
pub fn geodetic_to_cartesian(llh: &Vec3) -> Vec3 {
    let lat = llh[0].to_radians();
    let lon = llh[1].to_radians();
    let hae = llh[2];

    let n = prime_vertical_radius(lat.sin());

    [
        (n + hae) * lat.cos() * lon.cos(),
        (n + hae) * lat.cos() * lon.sin(),
        (n * (1.0 - FIRST_ECCENTRICITY_SQUARED) + hae) * lat.sin(),
    ]
}

/// Convert ECEF to geodetic `[lat_deg, lon_deg, hae_m]`
///
/// Bowring's method, iterated until the latitude stops changing.
pub fn cartesian_to_geodetic(xyz: &Vec3) -> Vec3 {
    let [x, y, z] = *xyz;
    let a = SEMI_MAJOR_AXIS;
    let b = SEMI_MINOR_AXIS;
    let e2 = FIRST_ECCENTRICITY_SQUARED;
    let ep2 = SECOND_ECCENTRICITY_SQUARED;

    let p = x.hypot(y);
    let lon = y.atan2(x);

    // parametric latitude seed
    let mut beta = (a * z).atan2(b * p);
    let mut lat = (z + ep2 * b * beta.sin().powi(3)).atan2(p - e2 * a * beta.cos().powi(3));

    for _ in 0..MAX_BOWRING_ITERATIONS {
        beta = ((1.0 - FLATTENING) * lat.sin()).atan2(lat.cos());
        let next = (z + ep2 * b * beta.sin().powi(3)).atan2(p - e2 * a * beta.cos().powi(3));
        let done = (next - lat).abs() < 1e-15;
        lat = next;
        if done {
            break;
        }
    }

    let (sin_lat, cos_lat) = lat.sin_cos();
    let hae = p * cos_lat + z * sin_lat - a * (1.0 - e2 * sin_lat * sin_lat).sqrt();

    [lat.to_degrees(), lon.to_degrees(), hae]
}

/// Unit normal to the Earth tangent plane at geodetic `lat`/`lon` (degrees)
pub fn up_vector(lat_deg: f64, lon_deg: f64) -> Vec3 {
    let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();
    [cos_lat * cos_lon, cos_lat * sin_lon, sin_lat]
}

/// ETP normal at an ECEF point
pub fn up_at(xyz: &Vec3) -> Vec3 {
    let llh = cartesian_to_geodetic(xyz);
    up_vector(llh[0], llh[1])
}

/// Height above the ellipsoid of an ECEF point
pub fn hae_of(xyz: &Vec3) -> f64 {
    cartesian_to_geodetic(xyz)[2]
}

/// Move an ECEF point along its ETP normal by `dh` meters
pub fn offset_up(xyz: &Vec3, dh: f64) -> Vec3 {
    let up = up_at(xyz);
    let shift = scale(&up, dh);
    [xyz[0] + shift[0], xyz[1] + shift[1], xyz[2] + shift[2]]
}

/// Batched [`cartesian_to_geodetic`]
pub fn cartesian_to_geodetic_array(points: &ArrayD<Vec3>) -> ArrayD<Vec3> {
    points.map(cartesian_to_geodetic)
}

/// Batched [`geodetic_to_cartesian`]
pub fn geodetic_to_cartesian_array(llh: &ArrayD<Vec3>) -> ArrayD<Vec3> {
    llh.map(geodetic_to_cartesian)
}
