//! R/Rdot contour to scene surface intersection
//!
//! Three surfaces are supported: an arbitrary plane, a surface of constant
//! height above the ellipsoid and a DEM. Solvers never fail on a per-point
//! basis: points that do not converge are reported through `success` and
//! `delta`, points with no solution are NaN.

use crate::core::batch::{broadcast_to, map_batch, map_batch2};
use crate::core::projection::{
    compute_gp_xy_parameters, compute_pt_r_rdot_parameters, ProjectionSet,
    ProjectionSetBi, ProjectionSetMono, ProjectionSets,
};
use crate::core::vector::{add_scaled, cross, dot, is_finite, nan3, norm, scale, sub, unit};
use crate::core::wgs84;
use crate::io::dem::DemHeight;
use crate::types::{SarError, SarResult, Vec3};
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

/// Surface projection solver parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceProjectionParams {
    /// Ground plane step size that ends the bistatic iteration (m)
    pub delta_gp_gpp: f64,
    pub gpp_max_iterations: usize,
    /// Height tolerance for constant HAE projection (m)
    pub delta_hae_max: f64,
    /// Iteration cap for each constant HAE stage
    pub hae_max_iterations: usize,
    /// Sample spacing along the R/Rdot contour for DEM projection (m)
    pub delta_dist_rrc: f64,
    /// Height-above-DEM tolerance (m)
    pub delta_hd_lim: f64,
    pub dem_max_iterations: usize,
}

impl Default for SurfaceProjectionParams {
    fn default() -> Self {
        Self {
            delta_gp_gpp: 0.010,
            gpp_max_iterations: 10,
            delta_hae_max: 1e-6,
            hae_max_iterations: 10,
            delta_dist_rrc: 10.0,
            delta_hd_lim: 0.001,
            dem_max_iterations: 20,
        }
    }
}

impl SurfaceProjectionParams {
    pub fn validate(&self) -> SarResult<()> {
        let tolerances = [
            ("delta_gp_gpp", self.delta_gp_gpp),
            ("delta_hae_max", self.delta_hae_max),
            ("delta_dist_rrc", self.delta_dist_rrc),
            ("delta_hd_lim", self.delta_hd_lim),
        ];
        for (name, value) in tolerances {
            if !(value > 0.0 && value.is_finite()) {
                return Err(SarError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        let limits = [
            ("gpp_max_iterations", self.gpp_max_iterations),
            ("hae_max_iterations", self.hae_max_iterations),
            ("dem_max_iterations", self.dem_max_iterations),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(SarError::InvalidParameter(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Per-point result of a surface projection
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceProjection {
    /// ECEF scene points, NaN where there is no solution
    pub points: ArrayD<Vec3>,
    /// Final step size or height residual of each point (m)
    pub delta: ArrayD<f64>,
    pub success: ArrayD<bool>,
}

impl SurfaceProjection {
    fn from_results(results: ArrayD<(Vec3, f64, bool)>, what: &str) -> Self {
        let projection = Self {
            points: results.map(|r| r.0),
            delta: results.map(|r| r.1),
            success: results.map(|r| r.2),
        };
        let failed = projection.num_failed();
        if failed > 0 {
            log::warn!(
                "{}: {} of {} points did not converge",
                what,
                failed,
                projection.success.len()
            );
        }
        projection
    }

    pub fn all_converged(&self) -> bool {
        self.success.iter().all(|&ok| ok)
    }

    pub fn num_failed(&self) -> usize {
        self.success.iter().filter(|&&ok| !ok).count()
    }
}

/// Closed form monostatic intersection with the plane through `gref` with normal `ugpn`
pub fn ground_plane_mono_point(look: f64, set: &ProjectionSetMono, gref: &Vec3, ugpn: &Vec3) -> Vec3 {
    let u_z = unit(ugpn);
    let r = set.r_coa;

    // ARP height above the plane and its nadir in the plane
    let arp_z = dot(&sub(&set.arp_coa, gref), &u_z);
    if !(arp_z.abs() <= r) {
        return nan3();
    }
    let agpn = add_scaled(&set.arp_coa, -arp_z, &u_z);

    let ground_range = (r * r - arp_z * arp_z).sqrt();
    let cos_graz = ground_range / r;
    let sin_graz = arp_z / r;

    let v_z = dot(&set.varp_coa, &u_z);
    let v_horizontal = add_scaled(&set.varp_coa, -v_z, &u_z);
    let v_x = norm(&v_horizontal);
    let u_x = scale(&v_horizontal, 1.0 / v_x);
    let u_y = cross(&u_z, &u_x);

    let cos_az = (v_z * sin_graz - set.rdot_coa) / (v_x * cos_graz);
    if !(cos_az.abs() <= 1.0) {
        return nan3();
    }
    let sin_az = look * (1.0 - cos_az * cos_az).sqrt();

    let gpp = add_scaled(&agpn, ground_range * cos_az, &u_x);
    add_scaled(&gpp, ground_range * sin_az, &u_y)
}

/// Iterative intersection with a plane for a single transmit/receive geometry
pub fn ground_plane_bi_point(
    look: f64,
    scp: &Vec3,
    set: &ProjectionSetBi,
    gref: &Vec3,
    ugpn: &Vec3,
    params: &SurfaceProjectionParams,
) -> (Vec3, f64, bool) {
    let u_z = unit(ugpn);
    let apcs = set.apcs();

    // start from the SCP projected into the plane
    let mut g = add_scaled(scp, -dot(&sub(scp, gref), &u_z), &u_z);
    let mut delta = f64::NAN;

    for _ in 0..params.gpp_max_iterations {
        let pt = compute_pt_r_rdot_parameters(look, &apcs, &g);

        let bp_in_plane = add_scaled(&pt.bp_pt, -dot(&pt.bp_pt, &u_z), &u_z);
        let u_gpx = unit(&bp_in_plane);
        let u_gpy = cross(&u_z, &u_gpx);
        let m = compute_gp_xy_parameters(&u_gpx, &u_gpy, &pt.bp_pt, &pt.bp_dot_pt).m_gpxy_rrdot;

        let dr = set.r_avg_coa - pt.r_avg_pt;
        let drdot = set.rdot_avg_coa - pt.rdot_avg_pt;
        let dgx = m[0][0] * dr + m[0][1] * drdot;
        let dgy = m[1][0] * dr + m[1][1] * drdot;

        g = add_scaled(&add_scaled(&g, dgx, &u_gpx), dgy, &u_gpy);
        delta = dgx.hypot(dgy);

        if !delta.is_finite() || !is_finite(&g) {
            return (nan3(), f64::NAN, false);
        }
        if delta < params.delta_gp_gpp {
            return (g, delta, true);
        }
    }
    (g, delta, false)
}

/// Intersection of one projection set with a plane, dispatching on collection type
pub fn ground_plane_point(
    look: f64,
    scp: &Vec3,
    set: &ProjectionSet,
    gref: &Vec3,
    ugpn: &Vec3,
    params: &SurfaceProjectionParams,
) -> (Vec3, f64, bool) {
    match set {
        ProjectionSet::Mono(mono) => {
            let gpp = ground_plane_mono_point(look, mono, gref, ugpn);
            let ok = is_finite(&gpp);
            (gpp, if ok { 0.0 } else { f64::NAN }, ok)
        }
        ProjectionSet::Bi(bi) => ground_plane_bi_point(look, scp, bi, gref, ugpn, params),
    }
}

/// Monostatic R/Rdot contours to a ground plane
pub fn r_rdot_to_ground_plane_mono(
    look: f64,
    sets: &ArrayD<ProjectionSetMono>,
    gref: &Vec3,
    ugpn: &Vec3,
) -> ArrayD<Vec3> {
    map_batch(sets, |set| ground_plane_mono_point(look, set, gref, ugpn))
}

/// Bistatic R/Rdot contours to a ground plane
///
/// Also valid for monostatic sets expressed with
/// [`ProjectionSetMono::as_bistatic`].
pub fn r_rdot_to_ground_plane_bi(
    look: f64,
    scp: &Vec3,
    sets: &ArrayD<ProjectionSetBi>,
    gref: &Vec3,
    ugpn: &Vec3,
    params: &SurfaceProjectionParams,
) -> SarResult<SurfaceProjection> {
    params.validate()?;
    let results = map_batch(sets, |set| ground_plane_bi_point(look, scp, set, gref, ugpn, params));
    Ok(SurfaceProjection::from_results(results, "ground plane projection"))
}

/// R/Rdot contours to a ground plane for either collection type
pub fn r_rdot_to_ground_plane(
    look: f64,
    scp: &Vec3,
    sets: &ProjectionSets,
    gref: &Vec3,
    ugpn: &Vec3,
    params: &SurfaceProjectionParams,
) -> SarResult<SurfaceProjection> {
    match sets {
        ProjectionSets::Mono(mono) => {
            let points = r_rdot_to_ground_plane_mono(look, mono, gref, ugpn);
            let results = points.map(|p| {
                let ok = is_finite(p);
                (*p, if ok { 0.0 } else { f64::NAN }, ok)
            });
            Ok(SurfaceProjection::from_results(results, "ground plane projection"))
        }
        ProjectionSets::Bi(bi) => r_rdot_to_ground_plane_bi(look, scp, bi, gref, ugpn, params),
    }
}

/// Intersection of one projection set with the surface `HAE = hae0`
pub fn constant_hae_point(
    look: f64,
    scp: &Vec3,
    set: &ProjectionSet,
    hae0: f64,
    params: &SurfaceProjectionParams,
) -> (Vec3, f64, bool) {
    let scp_llh = wgs84::cartesian_to_geodetic(scp);
    let mut u_gpn = wgs84::up_vector(scp_llh[0], scp_llh[1]);
    let mut gref = add_scaled(scp, hae0 - scp_llh[2], &u_gpn);

    // ground planes tangent to the HAE surface at the current estimate
    let mut gpp = nan3();
    for _ in 0..params.hae_max_iterations {
        let (point, _, ok) = ground_plane_point(look, scp, set, &gref, &u_gpn, params);
        if !ok {
            return (nan3(), f64::NAN, false);
        }
        gpp = point;
        let llh = wgs84::cartesian_to_geodetic(&gpp);
        u_gpn = wgs84::up_vector(llh[0], llh[1]);
        let delta_hae = llh[2] - hae0;
        gref = add_scaled(&gpp, -delta_hae, &u_gpn);
        if delta_hae.abs() <= params.delta_hae_max {
            break;
        }
    }

    // slide along the contour in the slant plane
    let u_spn = compute_pt_r_rdot_parameters(look, &set.apcs(), &gpp).u_spn_pt;
    let mut slp = gpp;
    for _ in 0..params.hae_max_iterations {
        let llh = wgs84::cartesian_to_geodetic(&slp);
        let delta_hae = llh[2] - hae0;
        if delta_hae.abs() <= params.delta_hae_max {
            return (slp, delta_hae.abs(), true);
        }
        let u_up = wgs84::up_vector(llh[0], llh[1]);
        slp = add_scaled(&slp, -delta_hae / dot(&u_up, &u_spn), &u_spn);
    }

    let delta_hae = (wgs84::hae_of(&slp) - hae0).abs();
    let ok = delta_hae <= params.delta_hae_max;
    (slp, delta_hae, ok)
}

/// R/Rdot contours to a constant HAE surface
///
/// `hae0` broadcasts against the projection set shape (a 0-d array applies
/// one height to every point).
pub fn r_rdot_to_constant_hae_surface(
    look: f64,
    scp: &Vec3,
    sets: &ProjectionSets,
    hae0: &ArrayD<f64>,
    params: &SurfaceProjectionParams,
) -> SarResult<SurfaceProjection> {
    params.validate()?;
    let hae0 = broadcast_to(hae0, sets.shape(), "hae0")?;

    let results = match sets {
        ProjectionSets::Mono(mono) => map_batch2(mono, &hae0, |set, &h| {
            constant_hae_point(look, scp, &ProjectionSet::Mono(*set), h, params)
        })?,
        ProjectionSets::Bi(bi) => map_batch2(bi, &hae0, |set, &h| {
            constant_hae_point(look, scp, &ProjectionSet::Bi(*set), h, params)
        })?,
    };

    Ok(SurfaceProjection::from_results(results, "constant HAE projection"))
}

#[derive(Debug, Clone, Copy)]
struct ContourSample {
    hae: f64,
    height_above_dem: f64,
    point: Vec3,
}

/// All intersections of one R/Rdot contour with a DEM
///
/// The contour is sampled between its `hae_max` and `hae_min` crossings and
/// every bracketed intersection is refined by regula falsi. Intersections are
/// ordered from highest to lowest HAE, so the first one is the visible point.
pub fn r_rdot_to_dem_surface<D: DemHeight + ?Sized>(
    look: f64,
    scp: &Vec3,
    set: &ProjectionSet,
    dem: &D,
    hae_min: f64,
    hae_max: f64,
    params: &SurfaceProjectionParams,
) -> SarResult<Vec<Vec3>> {
    params.validate()?;
    if !(hae_min < hae_max) {
        return Err(SarError::InvalidParameter(format!(
            "hae_min ({}) must be less than hae_max ({})",
            hae_min, hae_max
        )));
    }

    let sample_at = |hae: f64| -> Option<ContourSample> {
        let (point, _, ok) = constant_hae_point(look, scp, set, hae, params);
        let height_above_dem = hae - dem.hae_at(&point);
        if ok && height_above_dem.is_finite() {
            Some(ContourSample {
                hae,
                height_above_dem,
                point,
            })
        } else {
            None
        }
    };

    let (Some(top), Some(bottom)) = (sample_at(hae_max), sample_at(hae_min)) else {
        log::warn!(
            "R/Rdot contour at t_COA={} could not be projected to HAE [{}, {}]",
            set.t_coa(),
            hae_min,
            hae_max
        );
        return Ok(Vec::new());
    };

    let contour_length = norm(&sub(&top.point, &bottom.point));
    let num_steps = ((contour_length / params.delta_dist_rrc).ceil() as usize).max(1);
    let hae_step = (hae_max - hae_min) / num_steps as f64;
    log::debug!(
        "Sampling {:.1} m of contour in {} steps for DEM projection",
        contour_length,
        num_steps
    );

    let mut samples = Vec::with_capacity(num_steps + 1);
    samples.push(Some(top));
    for k in 1..num_steps {
        samples.push(sample_at(hae_max - k as f64 * hae_step));
    }
    samples.push(Some(bottom));

    let mut intersections = Vec::new();
    for pair in samples.windows(2) {
        let (Some(upper), Some(lower)) = (pair[0], pair[1]) else {
            continue;
        };
        if upper.height_above_dem == 0.0 {
            intersections.push(upper.point);
        } else if upper.height_above_dem * lower.height_above_dem < 0.0 {
            match refine_dem_intersection(upper, lower, &sample_at, params) {
                Some(point) => intersections.push(point),
                None => log::warn!(
                    "DEM intersection between HAE {} and {} did not converge",
                    upper.hae,
                    lower.hae
                ),
            }
        }
    }
    if let Some(Some(last)) = samples.last() {
        if last.height_above_dem == 0.0 {
            intersections.push(last.point);
        }
    }

    Ok(intersections)
}

fn refine_dem_intersection<F>(
    mut a: ContourSample,
    mut b: ContourSample,
    sample_at: &F,
    params: &SurfaceProjectionParams,
) -> Option<Vec3>
where
    F: Fn(f64) -> Option<ContourSample>,
{
    for _ in 0..params.dem_max_iterations {
        let hae = a.hae
            - a.height_above_dem * (b.hae - a.hae) / (b.height_above_dem - a.height_above_dem);
        let c = sample_at(hae)?;
        if c.height_above_dem.abs() <= params.delta_hd_lim {
            return Some(c.point);
        }
        if c.height_above_dem.signum() == a.height_above_dem.signum() {
            a = c;
        } else {
            b = c;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn create_test_set() -> (Vec3, ProjectionSetMono) {
        let gref = wgs84::geodetic_to_cartesian(&[0.0, 0.0, 0.0]);
        let up = wgs84::up_vector(0.0, 0.0);
        // platform 8 km up and 12 km west, flying north
        let arp = add_scaled(&add_scaled(&gref, 8000.0, &up), -12_000.0, &[0.0, 1.0, 0.0]);
        let varp = [0.0, 0.0, 150.0];
        let target = add_scaled(&gref, 300.0, &[0.0, 0.0, 1.0]);
        let los = sub(&arp, &target);
        let r = norm(&los);
        let set = ProjectionSetMono {
            t_coa: 0.0,
            arp_coa: arp,
            varp_coa: varp,
            r_coa: r,
            rdot_coa: dot(&varp, &los) / r,
        };
        (target, set)
    }

    #[test]
    fn test_mono_closed_form_recovers_point() {
        let (target, set) = create_test_set();
        let gref = wgs84::geodetic_to_cartesian(&[0.0, 0.0, 0.0]);
        let up = wgs84::up_vector(0.0, 0.0);
        // point is east of a north-bound platform: right looking
        let gpp = ground_plane_mono_point(-1.0, &set, &gref, &up);
        for i in 0..3 {
            assert_abs_diff_eq!(gpp[i], target[i], epsilon = 1e-6);
        }

        let mut unreachable = set;
        unreachable.r_coa = 10.0;
        assert!(!is_finite(&ground_plane_mono_point(-1.0, &unreachable, &gref, &up)));
    }

    #[test]
    fn test_bi_iteration_matches_closed_form() {
        let (target, set) = create_test_set();
        let gref = wgs84::geodetic_to_cartesian(&[0.0, 0.0, 0.0]);
        let up = wgs84::up_vector(0.0, 0.0);
        let params = SurfaceProjectionParams::default();
        let (gpp, delta, ok) =
            ground_plane_bi_point(-1.0, &gref, &set.as_bistatic(), &gref, &up, &params);
        assert!(ok);
        assert!(delta < params.delta_gp_gpp);
        for i in 0..3 {
            assert_abs_diff_eq!(gpp[i], target[i], epsilon = 1e-3);
        }
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = SurfaceProjectionParams {
            delta_hae_max: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
        assert!(SurfaceProjectionParams::default().validate().is_ok());
    }

    #[test]
    fn test_zero_iteration_limits_rejected() {
        for params in [
            SurfaceProjectionParams { gpp_max_iterations: 0, ..Default::default() },
            SurfaceProjectionParams { hae_max_iterations: 0, ..Default::default() },
            SurfaceProjectionParams { dem_max_iterations: 0, ..Default::default() },
        ] {
            assert!(matches!(params.validate(), Err(SarError::InvalidParameter(_))));
        }
    }
}
