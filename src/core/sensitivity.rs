//! Sensitivity matrices for a projection pair
//!
//! A projection pair is a scene point `pt0` and the image grid location
//! `il0` it maps to. The matrices linearize the relations between scene
//! displacements, slant and ground plane coordinates, image location, R/Rdot
//! and platform position/velocity around that pair.

use crate::core::coa::ipp_to_image_grid;
use crate::core::matrix::{all_finite, check_shape, from_cols, from_rows, inv2};
use crate::core::metadata::{MetadataParams, RRdotMethod};
use crate::core::projection::{
    compute_pt_r_rdot_parameters, project_location, ProjectionSet, ProjectionSetBi,
    ProjectionSetMono,
};
use crate::core::scene_to_image::{scene_to_image, SceneToImageParams};
use crate::core::vector::{cross, dot, norm, scale, sub, unit};
use crate::core::wgs84;
use crate::types::{ImageGridLocation, SarError, SarResult, Vec3};
use ndarray::{arr0, array, Array2};
use serde::{Deserialize, Serialize};

/// Linearization point and finite difference steps
///
/// Unset fields take their documented defaults: the SCP, the ETP normal at
/// `pt0` and `min(1.0, Row_SS)` / `min(1.0, Col_SS)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensitivityOptions {
    pub pt0: Option<Vec3>,
    pub u_gpn0: Option<Vec3>,
    pub delta_xrow: Option<f64>,
    pub delta_ycol: Option<f64>,
}

impl SensitivityOptions {
    pub fn at_point(mut self, pt0: Vec3) -> Self {
        self.pt0 = Some(pt0);
        self
    }

    pub fn with_surface_normal(mut self, u_gpn0: Vec3) -> Self {
        self.u_gpn0 = Some(u_gpn0);
        self
    }

    pub fn with_steps(mut self, delta_xrow: f64, delta_ycol: f64) -> Self {
        self.delta_xrow = Some(delta_xrow);
        self.delta_ycol = Some(delta_ycol);
        self
    }
}

/// Projection geometry at `pt0` for a monostatic collection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjGeomParamsMono {
    pub u_pt: Vec3,
    pub u_pt_dot: Vec3,
    pub vm0: f64,
    pub cos_dca: f64,
    pub sin_dca: f64,
    pub tan_dca: f64,
}

/// Projection geometry at `pt0` for a bistatic collection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjGeomParamsBi {
    pub r_xmt_0coa: f64,
    pub rdot_xmt_0coa: f64,
    pub r_rcv_0coa: f64,
    pub rdot_rcv_0coa: f64,
    pub u_xmt: Vec3,
    pub u_xmt_dot: Vec3,
    pub u_rcv: Vec3,
    pub u_rcv_dot: Vec3,
    pub bp: Vec3,
    pub bp_dot: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjGeomParams {
    Mono(ProjGeomParamsMono),
    Bi(ProjGeomParamsBi),
}

impl ProjGeomParams {
    /// Pointing vector and its rate: `uPT`/`uPTDot` or `bP`/`bPDot`
    pub fn pointing(&self) -> (Vec3, Vec3) {
        match self {
            ProjGeomParams::Mono(g) => (g.u_pt, g.u_pt_dot),
            ProjGeomParams::Bi(g) => (g.bp, g.bp_dot),
        }
    }
}

pub fn compute_proj_geom_params_mono(set0: &ProjectionSetMono, pt0: &Vec3) -> ProjGeomParamsMono {
    let u_pt = scale(&sub(&set0.arp_coa, pt0), 1.0 / set0.r_coa);
    let u_pt_dot = scale(
        &sub(&set0.varp_coa, &scale(&u_pt, set0.rdot_coa)),
        1.0 / set0.r_coa,
    );
    let vm0 = norm(&set0.varp_coa);
    let cos_dca = -set0.rdot_coa / vm0;
    let sin_dca = (1.0 - cos_dca * cos_dca).sqrt();
    ProjGeomParamsMono {
        u_pt,
        u_pt_dot,
        vm0,
        cos_dca,
        sin_dca,
        tan_dca: sin_dca / cos_dca,
    }
}

pub fn compute_proj_geom_params_bi(set0: &ProjectionSetBi, pt0: &Vec3) -> ProjGeomParamsBi {
    // LOOK only orients the slant plane normal, which is not used here
    let pt = compute_pt_r_rdot_parameters(1.0, &set0.apcs(), pt0);
    ProjGeomParamsBi {
        r_xmt_0coa: pt.r_xmt_pt,
        rdot_xmt_0coa: pt.rdot_xmt_pt,
        r_rcv_0coa: pt.r_rcv_pt,
        rdot_rcv_0coa: pt.rdot_rcv_pt,
        u_xmt: pt.u_xmt_pt,
        u_xmt_dot: pt.u_xmt_dot_pt,
        u_rcv: pt.u_rcv_pt,
        u_rcv_dot: pt.u_rcv_dot_pt,
        bp: pt.bp_pt,
        bp_dot: pt.bp_dot_pt,
    }
}

pub fn compute_proj_geom_params(set0: &ProjectionSet, pt0: &Vec3) -> ProjGeomParams {
    match set0 {
        ProjectionSet::Mono(s) => ProjGeomParams::Mono(compute_proj_geom_params_mono(s, pt0)),
        ProjectionSet::Bi(s) => ProjGeomParams::Bi(compute_proj_geom_params_bi(s, pt0)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlantPlaneSensitivityMatrices {
    /// 2x3
    pub m_spxy_pt: Array2<f64>,
    pub m_spxy_gpxy: Array2<f64>,
    pub m_gpxy_spxy: Array2<f64>,
    /// 3x2
    pub m_pt_gpxy: Array2<f64>,
    pub m_rrdot_spxy: Array2<f64>,
    pub m_spxy_rrdot: Array2<f64>,
    /// Scene displacement per unit of surface height error (3x1)
    pub mil_pt_hae: Array2<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageLocationSensitivityMatrices {
    /// 2x3
    pub m_il_pt: Array2<f64>,
    pub m_gpxy_il: Array2<f64>,
    pub m_spxy_il: Array2<f64>,
    pub m_il_spxy: Array2<f64>,
    pub m_rrdot_il: Array2<f64>,
    pub m_il_rrdot: Array2<f64>,
}

/// R/Rdot sensitivity to ARP position and velocity errors (2x3 each)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvtSensitivityMatricesMono {
    pub m_rrdot_delta_arp: Array2<f64>,
    pub m_rrdot_delta_varp: Array2<f64>,
}

/// Averaged R/Rdot sensitivity to transmit and receive APC errors (2x3 each)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvtSensitivityMatricesBi {
    pub m_rrdot_delta_xmt: Array2<f64>,
    pub m_rrdot_delta_vxmt: Array2<f64>,
    pub m_rrdot_delta_rcv: Array2<f64>,
    pub m_rrdot_delta_vrcv: Array2<f64>,
}

impl SlantPlaneSensitivityMatrices {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        m_spxy_pt: Array2<f64>,
        m_spxy_gpxy: Array2<f64>,
        m_gpxy_spxy: Array2<f64>,
        m_pt_gpxy: Array2<f64>,
        m_rrdot_spxy: Array2<f64>,
        m_spxy_rrdot: Array2<f64>,
        mil_pt_hae: Array2<f64>,
    ) -> SarResult<Self> {
        let matrices = Self {
            m_spxy_pt,
            m_spxy_gpxy,
            m_gpxy_spxy,
            m_pt_gpxy,
            m_rrdot_spxy,
            m_spxy_rrdot,
            mil_pt_hae,
        };
        matrices.validate()?;
        Ok(matrices)
    }

    pub fn validate(&self) -> SarResult<()> {
        check_shape("M_SPXY_PT", &self.m_spxy_pt, (2, 3))?;
        check_shape("M_SPXY_GPXY", &self.m_spxy_gpxy, (2, 2))?;
        check_shape("M_GPXY_SPXY", &self.m_gpxy_spxy, (2, 2))?;
        check_shape("M_PT_GPXY", &self.m_pt_gpxy, (3, 2))?;
        check_shape("M_RRdot_SPXY", &self.m_rrdot_spxy, (2, 2))?;
        check_shape("M_SPXY_RRdot", &self.m_spxy_rrdot, (2, 2))?;
        check_shape("MIL_PT_HAE", &self.mil_pt_hae, (3, 1))
    }
}

impl ImageLocationSensitivityMatrices {
    pub fn new(
        m_il_pt: Array2<f64>,
        m_gpxy_il: Array2<f64>,
        m_spxy_il: Array2<f64>,
        m_il_spxy: Array2<f64>,
        m_rrdot_il: Array2<f64>,
        m_il_rrdot: Array2<f64>,
    ) -> SarResult<Self> {
        let matrices = Self {
            m_il_pt,
            m_gpxy_il,
            m_spxy_il,
            m_il_spxy,
            m_rrdot_il,
            m_il_rrdot,
        };
        matrices.validate()?;
        Ok(matrices)
    }

    pub fn validate(&self) -> SarResult<()> {
        check_shape("M_IL_PT", &self.m_il_pt, (2, 3))?;
        check_shape("M_GPXY_IL", &self.m_gpxy_il, (2, 2))?;
        check_shape("M_SPXY_IL", &self.m_spxy_il, (2, 2))?;
        check_shape("M_IL_SPXY", &self.m_il_spxy, (2, 2))?;
        check_shape("M_RRdot_IL", &self.m_rrdot_il, (2, 2))?;
        check_shape("M_IL_RRdot", &self.m_il_rrdot, (2, 2))
    }
}

impl PvtSensitivityMatricesMono {
    pub fn new(m_rrdot_delta_arp: Array2<f64>, m_rrdot_delta_varp: Array2<f64>) -> SarResult<Self> {
        let matrices = Self {
            m_rrdot_delta_arp,
            m_rrdot_delta_varp,
        };
        matrices.validate()?;
        Ok(matrices)
    }

    pub fn validate(&self) -> SarResult<()> {
        check_shape("M_RRdot_delta_ARP", &self.m_rrdot_delta_arp, (2, 3))?;
        check_shape("M_RRdot_delta_VARP", &self.m_rrdot_delta_varp, (2, 3))
    }
}

impl PvtSensitivityMatricesBi {
    pub fn new(
        m_rrdot_delta_xmt: Array2<f64>,
        m_rrdot_delta_vxmt: Array2<f64>,
        m_rrdot_delta_rcv: Array2<f64>,
        m_rrdot_delta_vrcv: Array2<f64>,
    ) -> SarResult<Self> {
        let matrices = Self {
            m_rrdot_delta_xmt,
            m_rrdot_delta_vxmt,
            m_rrdot_delta_rcv,
            m_rrdot_delta_vrcv,
        };
        matrices.validate()?;
        Ok(matrices)
    }

    pub fn validate(&self) -> SarResult<()> {
        check_shape("M_RRdot_delta_Xmt", &self.m_rrdot_delta_xmt, (2, 3))?;
        check_shape("M_RRdot_delta_VXmt", &self.m_rrdot_delta_vxmt, (2, 3))?;
        check_shape("M_RRdot_delta_Rcv", &self.m_rrdot_delta_rcv, (2, 3))?;
        check_shape("M_RRdot_delta_VRcv", &self.m_rrdot_delta_vrcv, (2, 3))
    }
}

pub fn compute_pvt_sensitivity_matrices_mono(geom: &ProjGeomParamsMono) -> PvtSensitivityMatricesMono {
    PvtSensitivityMatricesMono {
        m_rrdot_delta_arp: from_rows(&[geom.u_pt, geom.u_pt_dot]),
        m_rrdot_delta_varp: from_rows(&[[0.0; 3], geom.u_pt]),
    }
}

pub fn compute_pvt_sensitivity_matrices_bi(geom: &ProjGeomParamsBi) -> PvtSensitivityMatricesBi {
    PvtSensitivityMatricesBi {
        m_rrdot_delta_xmt: from_rows(&[geom.u_xmt, geom.u_xmt_dot]) * 0.5,
        m_rrdot_delta_vxmt: from_rows(&[[0.0; 3], geom.u_xmt]) * 0.5,
        m_rrdot_delta_rcv: from_rows(&[geom.u_rcv, geom.u_rcv_dot]) * 0.5,
        m_rrdot_delta_vrcv: from_rows(&[[0.0; 3], geom.u_rcv]) * 0.5,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityMatricesMono {
    pub pt0: Vec3,
    pub il0: ImageGridLocation,
    pub set0: ProjectionSetMono,
    pub slant_plane: SlantPlaneSensitivityMatrices,
    pub image_location: ImageLocationSensitivityMatrices,
    pub pvt: PvtSensitivityMatricesMono,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityMatricesBi {
    pub pt0: Vec3,
    pub il0: ImageGridLocation,
    pub set0: ProjectionSetBi,
    pub slant_plane: SlantPlaneSensitivityMatrices,
    pub image_location: ImageLocationSensitivityMatrices,
    pub pvt: PvtSensitivityMatricesBi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SensitivityMatrices {
    Mono(SensitivityMatricesMono),
    Bi(SensitivityMatricesBi),
}

impl SensitivityMatricesMono {
    /// Check every matrix against its expected shape
    pub fn validate(&self) -> SarResult<()> {
        self.slant_plane.validate()?;
        self.image_location.validate()?;
        self.pvt.validate()
    }
}

impl SensitivityMatricesBi {
    /// Check every matrix against its expected shape
    pub fn validate(&self) -> SarResult<()> {
        self.slant_plane.validate()?;
        self.image_location.validate()?;
        self.pvt.validate()
    }
}

impl SensitivityMatrices {
    pub fn validate(&self) -> SarResult<()> {
        match self {
            SensitivityMatrices::Mono(s) => s.validate(),
            SensitivityMatrices::Bi(s) => s.validate(),
        }
    }

    pub fn slant_plane(&self) -> &SlantPlaneSensitivityMatrices {
        match self {
            SensitivityMatrices::Mono(s) => &s.slant_plane,
            SensitivityMatrices::Bi(s) => &s.slant_plane,
        }
    }

    pub fn image_location(&self) -> &ImageLocationSensitivityMatrices {
        match self {
            SensitivityMatrices::Mono(s) => &s.image_location,
            SensitivityMatrices::Bi(s) => &s.image_location,
        }
    }

    pub fn il0(&self) -> ImageGridLocation {
        match self {
            SensitivityMatrices::Mono(s) => s.il0,
            SensitivityMatrices::Bi(s) => s.il0,
        }
    }

    pub fn projection_set(&self) -> ProjectionSet {
        match self {
            SensitivityMatrices::Mono(s) => ProjectionSet::Mono(s.set0),
            SensitivityMatrices::Bi(s) => ProjectionSet::Bi(s.set0),
        }
    }
}

/// Resolved linearization point
struct ProjectionPair {
    pt0: Vec3,
    u_gpn0: Vec3,
    u_up0: Vec3,
    il0: ImageGridLocation,
    set0: ProjectionSet,
    method: RRdotMethod,
}

fn resolve_projection_pair(
    meta: &MetadataParams,
    pt0: Option<Vec3>,
    u_gpn0: Option<Vec3>,
) -> SarResult<ProjectionPair> {
    let pt0 = pt0.unwrap_or(meta.scp);
    let u_up0 = wgs84::up_at(&pt0);
    let u_gpn0 = unit(&u_gpn0.unwrap_or(u_up0));
    if !(dot(&u_gpn0, &u_up0) > 0.0) {
        return Err(SarError::InvalidParameter(format!(
            "surface normal {:?} does not point away from the earth at {:?}",
            u_gpn0, pt0
        )));
    }

    let method = meta.r_rdot_method()?;
    let il0 = if pt0 == meta.scp {
        // the SCP lies in the image plane at the grid origin
        ipp_to_image_grid(&meta.scp, &meta.u_row, &meta.u_col, &pt0)?
    } else {
        let s2i = scene_to_image(meta, &arr0(pt0).into_dyn(), &SceneToImageParams::default())?;
        let converged = s2i.success.iter().all(|&ok| ok);
        match s2i.image_grid_locations.iter().next() {
            Some(il) if converged => *il,
            _ => {
                return Err(SarError::Convergence(format!(
                    "scene to image did not converge at {:?}",
                    pt0
                )))
            }
        }
    };
    let set0 = project_location(meta, &method, &il0)?;
    log::debug!("Linearizing at pt0={:?}, il0={:?}", pt0, il0);

    Ok(ProjectionPair {
        pt0,
        u_gpn0,
        u_up0,
        il0,
        set0,
        method,
    })
}

fn check_finite(name: &str, m: &Array2<f64>) -> SarResult<()> {
    if all_finite(m) {
        Ok(())
    } else {
        Err(SarError::DegenerateGeometry(format!("{} is not finite", name)))
    }
}

fn slant_plane_matrices(look: f64, pair: &ProjectionPair) -> SarResult<SlantPlaneSensitivityMatrices> {
    let geom = compute_proj_geom_params(&pair.set0, &pair.pt0);
    let (p, p_dot) = geom.pointing();

    let u_spx = unit(&p);
    let u_spz = unit(&scale(&cross(&p, &p_dot), look));
    let u_spy = cross(&u_spz, &u_spx);

    let u_gpz = pair.u_gpn0;
    let u_gpy = unit(&cross(&u_gpz, &u_spx));
    let u_gpx = cross(&u_gpy, &u_gpz);

    let cos_graz = dot(&u_spx, &u_gpx);
    let sin_graz = dot(&u_spx, &u_gpz);
    let cos_twst = dot(&u_spy, &u_gpy);
    let sin_twst = -dot(&u_spz, &u_gpy);
    let tan_graz = sin_graz / cos_graz;
    let tan_twst = sin_twst / cos_twst;

    let m_rrdot_spxy = -array![
        [dot(&p, &u_spx), 0.0],
        [dot(&p_dot, &u_spx), dot(&p_dot, &u_spy)]
    ];
    let m_spxy_rrdot = inv2(&m_rrdot_spxy, "M_RRdot_SPXY")?;

    let up_dot_spz = dot(&pair.u_up0, &u_spz);
    let matrices = SlantPlaneSensitivityMatrices::new(
        from_rows(&[u_spx, u_spy]),
        array![[cos_graz, 0.0], [-sin_graz * sin_twst, cos_twst]],
        array![[1.0 / cos_graz, 0.0], [tan_graz * tan_twst, 1.0 / cos_twst]],
        from_cols(&[u_gpx, u_gpy]),
        m_rrdot_spxy,
        m_spxy_rrdot,
        from_cols(&[scale(&u_spz, 1.0 / up_dot_spz)]),
    )?;

    check_finite("M_SPXY_PT", &matrices.m_spxy_pt)?;
    check_finite("M_GPXY_SPXY", &matrices.m_gpxy_spxy)?;
    check_finite("M_PT_GPXY", &matrices.m_pt_gpxy)?;
    check_finite("MIL_PT_HAE", &matrices.mil_pt_hae)?;
    Ok(matrices)
}

/// Change in R/Rdot between two projection sets with the platform motion removed
fn compensated_r_rdot_delta(geom: &ProjGeomParams, set0: &ProjectionSet, set1: &ProjectionSet) -> (f64, f64) {
    let (r0, rdot0) = set0.r_rdot();
    let (r1, rdot1) = set1.r_rdot();
    let a0 = set0.apcs();
    let a1 = set1.apcs();
    let d_xmt = sub(&a1.xmt, &a0.xmt);
    let d_vxmt = sub(&a1.vxmt, &a0.vxmt);

    match geom {
        ProjGeomParams::Mono(g) => (
            r1 - r0 - dot(&d_xmt, &g.u_pt),
            rdot1 - rdot0 - (dot(&d_xmt, &g.u_pt_dot) + dot(&d_vxmt, &g.u_pt)),
        ),
        ProjGeomParams::Bi(g) => {
            let d_rcv = sub(&a1.rcv, &a0.rcv);
            let d_vrcv = sub(&a1.vrcv, &a0.vrcv);
            (
                r1 - r0 - 0.5 * (dot(&d_xmt, &g.u_xmt) + dot(&d_rcv, &g.u_rcv)),
                rdot1
                    - rdot0
                    - 0.5 * (dot(&d_xmt, &g.u_xmt_dot) + dot(&d_vxmt, &g.u_xmt))
                    - 0.5 * (dot(&d_rcv, &g.u_rcv_dot) + dot(&d_vrcv, &g.u_rcv)),
            )
        }
    }
}

fn finite_difference_steps(meta: &MetadataParams, delta_xrow: Option<f64>, delta_ycol: Option<f64>) -> SarResult<(f64, f64)> {
    let dx = delta_xrow.unwrap_or_else(|| meta.row_ss.min(1.0));
    let dy = delta_ycol.unwrap_or_else(|| meta.col_ss.min(1.0));
    if !(dx > 0.0 && dy > 0.0) {
        return Err(SarError::InvalidParameter(format!(
            "finite difference steps must be positive, got ({}, {})",
            dx, dy
        )));
    }
    Ok((dx, dy))
}

fn image_location_matrices(
    meta: &MetadataParams,
    pair: &ProjectionPair,
    slant_plane: &SlantPlaneSensitivityMatrices,
    dx: f64,
    dy: f64,
) -> SarResult<ImageLocationSensitivityMatrices> {
    let geom = compute_proj_geom_params(&pair.set0, &pair.pt0);
    let il1x = [pair.il0[0] + dx, pair.il0[1]];
    let il1y = [pair.il0[0], pair.il0[1] + dy];
    let set1x = project_location(meta, &pair.method, &il1x)?;
    let set1y = project_location(meta, &pair.method, &il1y)?;

    let (dr_x, drdot_x) = compensated_r_rdot_delta(&geom, &pair.set0, &set1x);
    let (dr_y, drdot_y) = compensated_r_rdot_delta(&geom, &pair.set0, &set1y);

    let m_rrdot_il = array![[dr_x / dx, dr_y / dy], [drdot_x / dx, drdot_y / dy]];
    let m_il_rrdot = inv2(&m_rrdot_il, "M_RRdot_IL")?;

    let m_spxy_il = slant_plane.m_spxy_rrdot.dot(&m_rrdot_il);
    let m_il_spxy = m_il_rrdot.dot(&slant_plane.m_rrdot_spxy);
    let m_gpxy_il = slant_plane.m_gpxy_spxy.dot(&m_spxy_il);
    let m_il_pt = m_il_spxy.dot(&slant_plane.m_spxy_pt);

    check_finite("M_IL_PT", &m_il_pt)?;
    check_finite("M_GPXY_IL", &m_gpxy_il)?;
    ImageLocationSensitivityMatrices::new(m_il_pt, m_gpxy_il, m_spxy_il, m_il_spxy, m_rrdot_il, m_il_rrdot)
}

/// Slant plane sensitivity matrices at `pt0` (default SCP)
pub fn compute_slant_plane_sensitivity_matrices(
    meta: &MetadataParams,
    pt0: Option<Vec3>,
    u_gpn0: Option<Vec3>,
) -> SarResult<SlantPlaneSensitivityMatrices> {
    let pair = resolve_projection_pair(meta, pt0, u_gpn0)?;
    slant_plane_matrices(meta.look(), &pair)
}

/// Image location sensitivity matrices at `pt0` (default SCP)
pub fn compute_image_location_sensitivity_matrices(
    meta: &MetadataParams,
    pt0: Option<Vec3>,
    u_gpn0: Option<Vec3>,
    delta_xrow: Option<f64>,
    delta_ycol: Option<f64>,
) -> SarResult<ImageLocationSensitivityMatrices> {
    let (dx, dy) = finite_difference_steps(meta, delta_xrow, delta_ycol)?;
    let pair = resolve_projection_pair(meta, pt0, u_gpn0)?;
    let slant_plane = slant_plane_matrices(meta.look(), &pair)?;
    image_location_matrices(meta, &pair, &slant_plane, dx, dy)
}

/// All sensitivity matrices for one projection pair
pub fn compute_sensitivity_matrices(
    meta: &MetadataParams,
    options: &SensitivityOptions,
) -> SarResult<SensitivityMatrices> {
    let (dx, dy) = finite_difference_steps(meta, options.delta_xrow, options.delta_ycol)?;
    let pair = resolve_projection_pair(meta, options.pt0, options.u_gpn0)?;
    let slant_plane = slant_plane_matrices(meta.look(), &pair)?;
    let image_location = image_location_matrices(meta, &pair, &slant_plane, dx, dy)?;

    Ok(match pair.set0 {
        ProjectionSet::Mono(set0) => SensitivityMatrices::Mono(SensitivityMatricesMono {
            pt0: pair.pt0,
            il0: pair.il0,
            set0,
            pvt: compute_pvt_sensitivity_matrices_mono(&compute_proj_geom_params_mono(&set0, &pair.pt0)),
            slant_plane,
            image_location,
        }),
        ProjectionSet::Bi(set0) => SensitivityMatrices::Bi(SensitivityMatricesBi {
            pt0: pair.pt0,
            il0: pair.il0,
            set0,
            pvt: compute_pvt_sensitivity_matrices_bi(&compute_proj_geom_params_bi(&set0, &pair.pt0)),
            slant_plane,
            image_location,
        }),
    })
}
