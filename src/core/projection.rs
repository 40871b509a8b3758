//! Image grid locations to COA projection sets
//!
//! A projection set is the COA time, the COA platform state(s) and the
//! range / range-rate contour an image location lies on.

use crate::core::batch::{broadcast_to, try_map_batch};
use crate::core::coa::{compute_coa_pos_vel_at, image_grid_to_ipp, CoaPosVel, CoaPosVels};
use crate::core::metadata::{CollectionGeometry, MetadataParams, RRdotMethod};
use crate::core::vector::{add, cross, dot, norm, scale, sub, unit};
use crate::types::{ImageGridLocation, ImageGridLocations, SarError, SarResult, Vec3};
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSetMono {
    pub t_coa: f64,
    pub arp_coa: Vec3,
    pub varp_coa: Vec3,
    pub r_coa: f64,
    pub rdot_coa: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSetBi {
    pub t_coa: f64,
    pub tx_coa: f64,
    pub tr_coa: f64,
    pub xmt_coa: Vec3,
    pub vxmt_coa: Vec3,
    pub rcv_coa: Vec3,
    pub vrcv_coa: Vec3,
    pub r_avg_coa: f64,
    pub rdot_avg_coa: f64,
}

impl ProjectionSetMono {
    /// Express a monostatic set as a bistatic one with Xmt = Rcv = ARP
    pub fn as_bistatic(&self) -> ProjectionSetBi {
        ProjectionSetBi {
            t_coa: self.t_coa,
            tx_coa: self.t_coa,
            tr_coa: self.t_coa,
            xmt_coa: self.arp_coa,
            vxmt_coa: self.varp_coa,
            rcv_coa: self.arp_coa,
            vrcv_coa: self.varp_coa,
            r_avg_coa: self.r_coa,
            rdot_avg_coa: self.rdot_coa,
        }
    }
}

impl ProjectionSetBi {
    pub fn apcs(&self) -> ApcStates {
        ApcStates::bistatic(&self.xmt_coa, &self.vxmt_coa, &self.rcv_coa, &self.vrcv_coa)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectionSet {
    Mono(ProjectionSetMono),
    Bi(ProjectionSetBi),
}

impl ProjectionSet {
    pub fn t_coa(&self) -> f64 {
        match self {
            ProjectionSet::Mono(s) => s.t_coa,
            ProjectionSet::Bi(s) => s.t_coa,
        }
    }

    /// `(R, Rdot)` of the contour; averaged for bistatic sets
    pub fn r_rdot(&self) -> (f64, f64) {
        match self {
            ProjectionSet::Mono(s) => (s.r_coa, s.rdot_coa),
            ProjectionSet::Bi(s) => (s.r_avg_coa, s.rdot_avg_coa),
        }
    }

    pub fn apcs(&self) -> ApcStates {
        match self {
            ProjectionSet::Mono(s) => ApcStates::monostatic(&s.arp_coa, &s.varp_coa),
            ProjectionSet::Bi(s) => s.apcs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionSets {
    Mono(ArrayD<ProjectionSetMono>),
    Bi(ArrayD<ProjectionSetBi>),
}

impl ProjectionSets {
    pub fn shape(&self) -> &[usize] {
        match self {
            ProjectionSets::Mono(a) => a.shape(),
            ProjectionSets::Bi(a) => a.shape(),
        }
    }

    pub fn is_monostatic(&self) -> bool {
        matches!(self, ProjectionSets::Mono(_))
    }

    /// Single set at a multi-dimensional index
    pub fn get(&self, index: &[usize]) -> Option<ProjectionSet> {
        match self {
            ProjectionSets::Mono(a) => a.get(index).copied().map(ProjectionSet::Mono),
            ProjectionSets::Bi(a) => a.get(index).copied().map(ProjectionSet::Bi),
        }
    }
}

/// Transmit and receive APC positions and velocities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApcStates {
    pub xmt: Vec3,
    pub vxmt: Vec3,
    pub rcv: Vec3,
    pub vrcv: Vec3,
}

impl ApcStates {
    pub fn bistatic(xmt: &Vec3, vxmt: &Vec3, rcv: &Vec3, vrcv: &Vec3) -> Self {
        Self {
            xmt: *xmt,
            vxmt: *vxmt,
            rcv: *rcv,
            vrcv: *vrcv,
        }
    }

    /// Monostatic collections use the ARP as both transmit and receive APC
    pub fn monostatic(arp: &Vec3, varp: &Vec3) -> Self {
        Self::bistatic(arp, varp, arp, varp)
    }
}

impl From<&CoaPosVel> for ApcStates {
    fn from(pos_vel: &CoaPosVel) -> Self {
        match pos_vel {
            CoaPosVel::Mono(pv) => ApcStates::monostatic(&pv.arp_coa, &pv.varp_coa),
            CoaPosVel::Bi(pv) => ApcStates::bistatic(&pv.xmt_coa, &pv.vxmt_coa, &pv.rcv_coa, &pv.vrcv_coa),
        }
    }
}

/// Range and range-rate parameters of a scene point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenePointRRdotParams {
    pub r_xmt_pt: f64,
    pub rdot_xmt_pt: f64,
    pub u_xmt_pt: Vec3,
    pub u_xmt_dot_pt: Vec3,
    pub r_rcv_pt: f64,
    pub rdot_rcv_pt: f64,
    pub u_rcv_pt: Vec3,
    pub u_rcv_dot_pt: Vec3,
    pub r_avg_pt: f64,
    pub rdot_avg_pt: f64,
    /// Bistatic pointing vector
    pub bp_pt: Vec3,
    pub bp_dot_pt: Vec3,
    /// Slant plane unit normal
    pub u_spn_pt: Vec3,
}

/// Ground plane XY sensitivity parameters of a scene point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenePointGpXyParams {
    pub m_rrdot_gpxy: [[f64; 2]; 2],
    /// Inverse of `m_rrdot_gpxy`; NaN when it is singular
    pub m_gpxy_rrdot: [[f64; 2]; 2],
}

fn apc_range_params(apc: &Vec3, vapc: &Vec3, pt: &Vec3) -> (f64, f64, Vec3, Vec3) {
    let los = sub(apc, pt);
    let r = norm(&los);
    let u = scale(&los, 1.0 / r);
    let rdot = dot(vapc, &u);
    let u_dot = scale(&sub(vapc, &scale(&u, rdot)), 1.0 / r);
    (r, rdot, u, u_dot)
}

/// R/Rdot of the transmit and receive APCs relative to a scene point
pub fn compute_pt_r_rdot_parameters(look: f64, apcs: &ApcStates, pt: &Vec3) -> ScenePointRRdotParams {
    let (r_xmt_pt, rdot_xmt_pt, u_xmt_pt, u_xmt_dot_pt) = apc_range_params(&apcs.xmt, &apcs.vxmt, pt);
    let (r_rcv_pt, rdot_rcv_pt, u_rcv_pt, u_rcv_dot_pt) = apc_range_params(&apcs.rcv, &apcs.vrcv, pt);

    let bp_pt = scale(&add(&u_xmt_pt, &u_rcv_pt), 0.5);
    let bp_dot_pt = scale(&add(&u_xmt_dot_pt, &u_rcv_dot_pt), 0.5);
    let u_spn_pt = unit(&scale(&cross(&bp_pt, &bp_dot_pt), look));

    ScenePointRRdotParams {
        r_xmt_pt,
        rdot_xmt_pt,
        u_xmt_pt,
        u_xmt_dot_pt,
        r_rcv_pt,
        rdot_rcv_pt,
        u_rcv_pt,
        u_rcv_dot_pt,
        r_avg_pt: 0.5 * (r_xmt_pt + r_rcv_pt),
        rdot_avg_pt: 0.5 * (rdot_xmt_pt + rdot_rcv_pt),
        bp_pt,
        bp_dot_pt,
        u_spn_pt,
    }
}

/// Sensitivity of R/Rdot to displacements along two ground plane axes
pub fn compute_gp_xy_parameters(
    u_gpx: &Vec3,
    u_gpy: &Vec3,
    bp: &Vec3,
    bp_dot: &Vec3,
) -> ScenePointGpXyParams {
    let m = [
        [-dot(bp, u_gpx), -dot(bp, u_gpy)],
        [-dot(bp_dot, u_gpx), -dot(bp_dot, u_gpy)],
    ];
    let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
    let inv = if det == 0.0 {
        [[f64::NAN; 2]; 2]
    } else {
        [
            [m[1][1] / det, -m[0][1] / det],
            [-m[1][0] / det, m[0][0] / det],
        ]
    };
    ScenePointGpXyParams {
        m_rrdot_gpxy: m,
        m_gpxy_rrdot: inv,
    }
}

/// COA platform states at the SCP as stored in the metadata
pub fn scp_coa_apcs(meta: &MetadataParams) -> ApcStates {
    match &meta.geometry {
        CollectionGeometry::Monostatic(mono) => {
            ApcStates::monostatic(&mono.arp_scp_coa, &mono.varp_scp_coa)
        }
        CollectionGeometry::Bistatic(bi) => {
            ApcStates::bistatic(&bi.xmt_scp_coa, &bi.vxmt_scp_coa, &bi.rcv_scp_coa, &bi.vrcv_scp_coa)
        }
    }
}

/// R and Rdot of the SCP at the SCP COA time
pub fn compute_scp_coa_r_rdot(meta: &MetadataParams) -> (f64, f64) {
    let params = compute_pt_r_rdot_parameters(meta.look(), &scp_coa_apcs(meta), &meta.scp);
    (params.r_avg_pt, params.rdot_avg_pt)
}

/// Slant plane unit normal at the SCP COA, pointing away from the earth
pub fn compute_scp_coa_slant_plane_normal(meta: &MetadataParams) -> Vec3 {
    match &meta.geometry {
        CollectionGeometry::Monostatic(mono) => {
            let spn = cross(&sub(&mono.arp_scp_coa, &meta.scp), &mono.varp_scp_coa);
            unit(&scale(&spn, meta.look()))
        }
        CollectionGeometry::Bistatic(_) => {
            compute_pt_r_rdot_parameters(meta.look(), &scp_coa_apcs(meta), &meta.scp).u_spn_pt
        }
    }
}

/// R/Rdot of one image location given its COA time and platform state
pub fn r_rdot_at(
    meta: &MetadataParams,
    method: &RRdotMethod,
    il: &ImageGridLocation,
    t_coa: f64,
    pos_vel: &CoaPosVel,
) -> SarResult<(f64, f64)> {
    let [xrow, ycol] = *il;
    let apcs = ApcStates::from(pos_vel);
    let scp_r_rdot = || {
        let params = compute_pt_r_rdot_parameters(meta.look(), &apcs, &meta.scp);
        (params.r_avg_pt, params.rdot_avg_pt)
    };

    match method {
        RRdotMethod::RgazimPfa(pfa) => {
            let (r_scp, rdot_scp) = scp_r_rdot();
            let theta = pfa.polar_ang_poly.eval(t_coa);
            let dtheta_dt = pfa.polar_ang_poly.eval_derivative(t_coa);
            let ksf = pfa.spatial_freq_sf_poly.eval(theta);
            let dksf_dtheta = pfa.spatial_freq_sf_poly.eval_derivative(theta);

            let (sin_t, cos_t) = theta.sin_cos();
            let dphi_dka = xrow * cos_t + ycol * sin_t;
            let dphi_dkc = -xrow * sin_t + ycol * cos_t;

            let delta_r = ksf * dphi_dka;
            let delta_rdot = (dksf_dtheta * dphi_dka + ksf * dphi_dkc) * dtheta_dt;
            Ok((r_scp + delta_r, rdot_scp + delta_rdot))
        }
        RRdotMethod::RgazimRgazcomp { az_sf } => {
            let CoaPosVel::Mono(pv) = pos_vel else {
                return Err(SarError::Metadata(
                    "RGAZIM/RGAZCOMP is only defined for monostatic collections".to_string(),
                ));
            };
            let (r_scp, rdot_scp) = scp_r_rdot();
            Ok((r_scp + xrow, rdot_scp - norm(&pv.varp_coa) * az_sf * ycol))
        }
        RRdotMethod::RgzeroInca(inca) => {
            let Some(mono) = meta.monostatic() else {
                return Err(SarError::Metadata(
                    "RGZERO/INCA is only defined for monostatic collections".to_string(),
                ));
            };
            let t_ca = inca.time_ca_poly.eval(xrow);
            let r_ca = inca.r_ca_scp + xrow;
            let vm_ca = norm(&mono.arp_poly.eval_velocity(t_ca));
            let drsf = inca.drate_sf_poly.eval(xrow, ycol);
            let dt = t_coa - t_ca;
            let r = (r_ca * r_ca + drsf * vm_ca * vm_ca * dt * dt).sqrt();
            Ok((r, drsf * vm_ca * vm_ca * dt / r))
        }
        RRdotMethod::Xrgycr | RRdotMethod::Xctyat | RRdotMethod::Plane => {
            let ipp = image_grid_to_ipp(&meta.scp, &meta.u_row, &meta.u_col, il);
            let params = compute_pt_r_rdot_parameters(meta.look(), &apcs, &ipp);
            Ok((params.r_avg_pt, params.rdot_avg_pt))
        }
    }
}

/// R/Rdot for every image location from precomputed COA times and states
///
/// `t_coa` and `coa_pos_vels` broadcast against the image grid locations, so a
/// single COA time/state may be shared by the whole batch.
pub fn compute_coa_r_rdot(
    meta: &MetadataParams,
    image_grid_locations: &ImageGridLocations,
    t_coa: &ArrayD<f64>,
    coa_pos_vels: &CoaPosVels,
) -> SarResult<(ArrayD<f64>, ArrayD<f64>)> {
    let method = meta.r_rdot_method()?;
    let shape = image_grid_locations.shape();
    let t_coa = broadcast_to(t_coa, shape, "t_COA")?;

    let pos_vels: ArrayD<CoaPosVel> = match coa_pos_vels {
        CoaPosVels::Mono(a) => broadcast_to(a, shape, "COA positions")?
            .map(|pv| CoaPosVel::Mono(*pv)),
        CoaPosVels::Bi(a) => broadcast_to(a, shape, "COA positions")?
            .map(|pv| CoaPosVel::Bi(*pv)),
    };

    let mut r = ArrayD::<f64>::zeros(image_grid_locations.raw_dim());
    let mut rdot = ArrayD::<f64>::zeros(image_grid_locations.raw_dim());
    for ((((il, t), pv), r_out), rdot_out) in image_grid_locations
        .iter()
        .zip(t_coa.iter())
        .zip(pos_vels.iter())
        .zip(r.iter_mut())
        .zip(rdot.iter_mut())
    {
        let (r_i, rdot_i) = r_rdot_at(meta, &method, il, *t, pv)?;
        *r_out = r_i;
        *rdot_out = rdot_i;
    }
    Ok((r, rdot))
}

pub(crate) fn project_location(
    meta: &MetadataParams,
    method: &RRdotMethod,
    il: &ImageGridLocation,
) -> SarResult<ProjectionSet> {
    let t_coa = meta.t_coa_poly.eval(il[0], il[1]);
    let pos_vel = compute_coa_pos_vel_at(meta, t_coa)?;
    let (r, rdot) = r_rdot_at(meta, method, il, t_coa, &pos_vel)?;

    Ok(match pos_vel {
        CoaPosVel::Mono(pv) => ProjectionSet::Mono(ProjectionSetMono {
            t_coa,
            arp_coa: pv.arp_coa,
            varp_coa: pv.varp_coa,
            r_coa: r,
            rdot_coa: rdot,
        }),
        CoaPosVel::Bi(pv) => ProjectionSet::Bi(ProjectionSetBi {
            t_coa,
            tx_coa: pv.tx_coa,
            tr_coa: pv.tr_coa,
            xmt_coa: pv.xmt_coa,
            vxmt_coa: pv.vxmt_coa,
            rcv_coa: pv.rcv_coa,
            vrcv_coa: pv.vrcv_coa,
            r_avg_coa: r,
            rdot_avg_coa: rdot,
        }),
    })
}

/// Projection set for a single image grid location
pub fn compute_projection_set(meta: &MetadataParams, il: &ImageGridLocation) -> SarResult<ProjectionSet> {
    let method = meta.r_rdot_method()?;
    project_location(meta, &method, il)
}

/// Projection sets for a batch of image grid locations
pub fn compute_projection_sets(
    meta: &MetadataParams,
    image_grid_locations: &ImageGridLocations,
) -> SarResult<ProjectionSets> {
    let method = meta.r_rdot_method()?;
    log::debug!(
        "Computing {} projection sets ({} / {}, {:?})",
        image_grid_locations.len(),
        meta.grid_type,
        meta.ifa,
        meta.collect_type()
    );

    match meta.geometry {
        CollectionGeometry::Monostatic(_) => {
            let sets = try_map_batch(image_grid_locations, |il| {
                match project_location(meta, &method, il)? {
                    ProjectionSet::Mono(set) => Ok(set),
                    ProjectionSet::Bi(_) => Err(SarError::Metadata(
                        "bistatic projection set from monostatic metadata".to_string(),
                    )),
                }
            })?;
            Ok(ProjectionSets::Mono(sets))
        }
        CollectionGeometry::Bistatic(_) => {
            let sets = try_map_batch(image_grid_locations, |il| {
                match project_location(meta, &method, il)? {
                    ProjectionSet::Bi(set) => Ok(set),
                    ProjectionSet::Mono(_) => Err(SarError::Metadata(
                        "monostatic projection set from bistatic metadata".to_string(),
                    )),
                }
            })?;
            Ok(ProjectionSets::Bi(sets))
        }
    }
}
