//! Error covariance propagation
//!
//! Composite RGAZ error covariances are assembled from the error statistics
//! of a product, with or without adjustable parameter offsets, and carried
//! into scene or image space through the sensitivity matrices.

use crate::core::matrix::{block2, check_shape, hstack, sandwich};
use crate::core::projection::{ProjectionSetBi, ProjectionSetMono};
use crate::core::sensitivity::{SensitivityMatrices, SensitivityMatricesBi, SensitivityMatricesMono};
use crate::types::{SarResult, SPEED_OF_LIGHT};
use ndarray::{array, Array2};
use serde::{Deserialize, Serialize};

pub use crate::core::geometry::{compute_ecef_pv_transformation, compute_ric_basis_vectors, ReferenceFrame};

/// Monostatic error components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentErrorStatMono {
    /// ARP position/velocity covariance in frame `aif` (6x6)
    pub c_aif_apv: Array2<f64>,
    pub aif: ReferenceFrame,
    /// Range bias variance (m^2)
    pub var_rb: f64,
    /// Clock frequency scale factor variance
    pub var_clk_sf: f64,
    pub var_trop: f64,
    pub var_iono: f64,
}

/// Bistatic error components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentErrorStatBi {
    /// Transmit APC position/velocity covariance in frame `xif` (6x6)
    pub c_xif_xpv: Array2<f64>,
    pub xif: ReferenceFrame,
    /// Receive APC position/velocity covariance in frame `rif` (6x6)
    pub c_rif_rpv: Array2<f64>,
    pub rif: ReferenceFrame,
    /// Transmit/receive cross covariance (6x6)
    pub cc_xif_rif_xpv_rpv: Array2<f64>,
    /// Transmit and receive time and clock frequency covariance (4x4)
    pub c_xrtf: Array2<f64>,
    /// Atmospheric delay covariance (2x2)
    pub c_atm: Array2<f64>,
}

/// Error statistics of a product; every part is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorStatParams {
    pub c_scp_rgaz: Option<Array2<f64>>,
    pub c_scp_rrdot: Option<Array2<f64>>,
    pub component_mono: Option<ComponentErrorStatMono>,
    pub component_bi: Option<ComponentErrorStatBi>,
    /// Unmodeled image location error (2x2); absent means zero
    pub c_ui: Option<Array2<f64>>,
}

/// Error statistics of the adjustable parameter offsets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApoErrorParams {
    pub c_scpapo_rgaz: Option<Array2<f64>>,
    /// Monostatic APO covariance (8x8)
    pub c_apom: Option<Array2<f64>>,
    pub c_scpapo_rrdot: Option<Array2<f64>>,
    /// Bistatic APO covariance (16x16)
    pub c_apoxr: Option<Array2<f64>>,
}

fn range_only(var: f64) -> Array2<f64> {
    array![[var, 0.0], [0.0, 0.0]]
}

fn unmodeled_image_rrdot(
    c_ui: &Option<Array2<f64>>,
    m_rrdot_il: &Array2<f64>,
) -> SarResult<Array2<f64>> {
    match c_ui {
        Some(c_ui) => {
            check_shape("C_UI", c_ui, (2, 2))?;
            Ok(sandwich(m_rrdot_il, c_ui))
        }
        None => Ok(Array2::zeros((2, 2))),
    }
}

/// Composite RGAZ covariance, monostatic, without APOs
pub fn compute_composite_error_no_apo_mono(
    set0: &ProjectionSetMono,
    sens: &SensitivityMatricesMono,
    errstat: &ErrorStatParams,
) -> SarResult<Option<Array2<f64>>> {
    sens.validate()?;
    let Some(comps) = &errstat.component_mono else {
        if let Some(c) = &errstat.c_scp_rgaz {
            check_shape("C_SCP_RGAZ", c, (2, 2))?;
        }
        return Ok(errstat.c_scp_rgaz.clone());
    };
    check_shape("C_AIF_APV", &comps.c_aif_apv, (6, 6))?;

    let m_rrdot_apv = hstack(&[
        sens.pvt.m_rrdot_delta_arp.view(),
        sens.pvt.m_rrdot_delta_varp.view(),
    ])?;
    let t_ecef_aif = compute_ecef_pv_transformation(&set0.arp_coa, &set0.varp_coa, comps.aif)?;
    let c_apv = sandwich(&m_rrdot_apv.dot(&t_ecef_aif), &comps.c_aif_apv);

    let r_sf = -set0.r_coa;
    let rdot_sf = -set0.rdot_coa;
    let c_clk_sf = array![
        [r_sf * r_sf, r_sf * rdot_sf],
        [r_sf * rdot_sf, rdot_sf * rdot_sf]
    ] * comps.var_clk_sf;

    let c_ui = unmodeled_image_rrdot(&errstat.c_ui, &sens.image_location.m_rrdot_il)?;

    let c_ilpt_rrdot = c_apv
        + range_only(comps.var_rb)
        + c_clk_sf
        + range_only(comps.var_trop)
        + range_only(comps.var_iono)
        + c_ui;

    let m_rgaz_rrdot = -&sens.slant_plane.m_spxy_rrdot;
    Ok(Some(sandwich(&m_rgaz_rrdot, &c_ilpt_rrdot)))
}

/// Composite RGAZ covariance, monostatic, with APOs
pub fn compute_composite_error_apo_mono(
    set0: &ProjectionSetMono,
    sens: &SensitivityMatricesMono,
    apo_err: &ApoErrorParams,
) -> SarResult<Option<Array2<f64>>> {
    sens.validate()?;
    let Some(c_apom) = &apo_err.c_apom else {
        if let Some(c) = &apo_err.c_scpapo_rgaz {
            check_shape("C_SCPAPO_RGAZ", c, (2, 2))?;
        }
        return Ok(apo_err.c_scpapo_rgaz.clone());
    };
    check_shape("C_APOM", c_apom, (8, 8))?;
    log::debug!("Monostatic APO error at t_COA={}", set0.t_coa);

    let m_rrdot_xrt = array![[-1.0, 1.0], [0.0, 0.0]] * (SPEED_OF_LIGHT / 2.0);
    let m_rrdot_apom = hstack(&[
        sens.pvt.m_rrdot_delta_arp.view(),
        sens.pvt.m_rrdot_delta_varp.view(),
        m_rrdot_xrt.view(),
    ])?;
    let c_ilpt_rrdot = sandwich(&m_rrdot_apom, c_apom);

    let m_rgaz_rrdot = -&sens.slant_plane.m_spxy_rrdot;
    Ok(Some(sandwich(&m_rgaz_rrdot, &c_ilpt_rrdot)))
}

struct BistaticErrorMaps {
    m_rgaz_rrdot: Array2<f64>,
    m_rrdot_xpv: Array2<f64>,
    m_rrdot_rpv: Array2<f64>,
    m_rrdot_xtf: Array2<f64>,
    m_rrdot_rtf: Array2<f64>,
}

fn bistatic_error_maps(
    set0: &ProjectionSetBi,
    sens: &SensitivityMatricesBi,
    t_scp_coa: f64,
) -> SarResult<BistaticErrorMaps> {
    sens.validate()?;
    let half_c = SPEED_OF_LIGHT / 2.0;
    Ok(BistaticErrorMaps {
        m_rgaz_rrdot: -&sens.slant_plane.m_spxy_rrdot,
        m_rrdot_xpv: hstack(&[
            sens.pvt.m_rrdot_delta_xmt.view(),
            sens.pvt.m_rrdot_delta_vxmt.view(),
        ])?,
        m_rrdot_rpv: hstack(&[
            sens.pvt.m_rrdot_delta_rcv.view(),
            sens.pvt.m_rrdot_delta_vrcv.view(),
        ])?,
        m_rrdot_xtf: array![[-1.0, set0.tx_coa - t_scp_coa], [0.0, 1.0]] * half_c,
        m_rrdot_rtf: array![[1.0, -(set0.tr_coa - t_scp_coa)], [0.0, -1.0]] * half_c,
    })
}

/// Composite RGAZ covariance, bistatic, without APOs
pub fn compute_composite_error_no_apo_bi(
    set0: &ProjectionSetBi,
    sens: &SensitivityMatricesBi,
    errstat: &ErrorStatParams,
    t_scp_coa: f64,
) -> SarResult<Option<Array2<f64>>> {
    let maps = bistatic_error_maps(set0, sens, t_scp_coa)?;

    let Some(comps) = &errstat.component_bi else {
        return match &errstat.c_scp_rrdot {
            Some(c) => {
                check_shape("C_SCP_RRdot", c, (2, 2))?;
                Ok(Some(sandwich(&maps.m_rgaz_rrdot, c)))
            }
            None => Ok(None),
        };
    };
    check_shape("C_XIF_XPV", &comps.c_xif_xpv, (6, 6))?;
    check_shape("C_RIF_RPV", &comps.c_rif_rpv, (6, 6))?;
    check_shape("CC_XIF_RIF_XPV_RPV", &comps.cc_xif_rif_xpv_rpv, (6, 6))?;
    check_shape("C_XRTF", &comps.c_xrtf, (4, 4))?;
    check_shape("C_ATM", &comps.c_atm, (2, 2))?;

    let t_ecef_xif = compute_ecef_pv_transformation(&set0.xmt_coa, &set0.vxmt_coa, comps.xif)?;
    let t_ecef_rif = compute_ecef_pv_transformation(&set0.rcv_coa, &set0.vrcv_coa, comps.rif)?;

    let c_ecef_xpv = sandwich(&t_ecef_xif, &comps.c_xif_xpv);
    let c_ecef_rpv = sandwich(&t_ecef_rif, &comps.c_rif_rpv);
    let cc_ecef_xpv_rpv = t_ecef_xif.dot(&comps.cc_xif_rif_xpv_rpv).dot(&t_ecef_rif.t());
    let c_ecef_xpv_rpv = block2(
        &c_ecef_xpv,
        &cc_ecef_xpv_rpv,
        &cc_ecef_xpv_rpv.t().to_owned(),
        &c_ecef_rpv,
    )?;

    let m_rrdot_xpv_rpv = hstack(&[maps.m_rrdot_xpv.view(), maps.m_rrdot_rpv.view()])?;
    let c_xpv_rpv = sandwich(&m_rrdot_xpv_rpv, &c_ecef_xpv_rpv);

    let m_rrdot_xrtf = hstack(&[maps.m_rrdot_xtf.view(), maps.m_rrdot_rtf.view()])?;
    let c_xrtf = sandwich(&m_rrdot_xrtf, &comps.c_xrtf);

    let m_rrdot_atm = array![[1.0, 1.0], [0.0, 0.0]] * (SPEED_OF_LIGHT / 2.0);
    let c_atm = sandwich(&m_rrdot_atm, &comps.c_atm);

    let c_ui = unmodeled_image_rrdot(&errstat.c_ui, &sens.image_location.m_rrdot_il)?;

    let c_ilpt_rrdot = c_xpv_rpv + c_xrtf + c_atm + c_ui;
    Ok(Some(sandwich(&maps.m_rgaz_rrdot, &c_ilpt_rrdot)))
}

/// Composite RGAZ covariance, bistatic, with APOs
pub fn compute_composite_error_apo_bi(
    set0: &ProjectionSetBi,
    sens: &SensitivityMatricesBi,
    apo_err: &ApoErrorParams,
    t_scp_coa: f64,
) -> SarResult<Option<Array2<f64>>> {
    let maps = bistatic_error_maps(set0, sens, t_scp_coa)?;

    let Some(c_apoxr) = &apo_err.c_apoxr else {
        return match &apo_err.c_scpapo_rrdot {
            Some(c) => {
                check_shape("C_SCPAPO_RRdot", c, (2, 2))?;
                Ok(Some(sandwich(&maps.m_rgaz_rrdot, c)))
            }
            None => Ok(None),
        };
    };
    check_shape("C_APOXR", c_apoxr, (16, 16))?;

    let m_rrdot_apoxr = hstack(&[
        maps.m_rrdot_xpv.view(),
        maps.m_rrdot_xtf.view(),
        maps.m_rrdot_rpv.view(),
        maps.m_rrdot_rtf.view(),
    ])?;
    let c_ilpt_rrdot = sandwich(&m_rrdot_apoxr, c_apoxr);
    Ok(Some(sandwich(&maps.m_rgaz_rrdot, &c_ilpt_rrdot)))
}

/// Image-to-scene ECEF error covariance (3x3) at `pt0`
///
/// Sums the composite RGAZ error, the image location selection error and the
/// surface height error, each carried into the scene.
pub fn compute_i2s_error(
    c_ilpt_rgaz: &Array2<f64>,
    c_il_sel: &Array2<f64>,
    var_hae: f64,
    sens: &SensitivityMatrices,
) -> SarResult<Array2<f64>> {
    check_shape("C_ILPT_RGAZ", c_ilpt_rgaz, (2, 2))?;
    check_shape("C_IL_SEL", c_il_sel, (2, 2))?;
    sens.validate()?;
    let sp = sens.slant_plane();
    let il = sens.image_location();

    let mil_spxy_rgaz = -Array2::<f64>::eye(2);
    let c_rgaz_gpxy = sandwich(&sp.m_gpxy_spxy.dot(&mil_spxy_rgaz), c_ilpt_rgaz);
    let c_rgaz_pt = sandwich(&sp.m_pt_gpxy, &c_rgaz_gpxy);

    let c_il_sel_gpxy = sandwich(&il.m_gpxy_il, c_il_sel);
    let c_il_sel_pt = sandwich(&sp.m_pt_gpxy, &c_il_sel_gpxy);

    let c_hae_pt = sp.mil_pt_hae.dot(&sp.mil_pt_hae.t()) * var_hae;

    Ok(c_rgaz_pt + c_il_sel_pt + c_hae_pt)
}

/// Scene-to-image error covariance (2x2) in image grid coordinates
///
/// Scene point error `c_pt` (3x3) and the composite RGAZ error are carried
/// into image location space.
pub fn compute_s2i_error(
    c_ilpt_rgaz: &Array2<f64>,
    c_pt: &Array2<f64>,
    sens: &SensitivityMatrices,
) -> SarResult<Array2<f64>> {
    check_shape("C_ILPT_RGAZ", c_ilpt_rgaz, (2, 2))?;
    check_shape("C_PT", c_pt, (3, 3))?;
    sens.validate()?;
    let il = sens.image_location();

    let c_pt_il = sandwich(&il.m_il_pt, c_pt);
    let m_il_rgaz = -&il.m_il_spxy;
    let c_rgaz_il = sandwich(&m_il_rgaz, c_ilpt_rgaz);
    Ok(c_pt_il + c_rgaz_il)
}
