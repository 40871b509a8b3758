//! Adjustable parameter offsets
//!
//! APOs are corrections to the platform states and timing applied to
//! projection sets before they are intersected with a surface.

use crate::core::batch::map_batch;
use crate::core::metadata::{CollectionGeometry, MetadataParams};
use crate::core::projection::{ProjectionSetBi, ProjectionSetMono, ProjectionSets};
use crate::core::vector::{add, add_scaled};
use crate::types::{SarError, SarResult, Vec3, SPEED_OF_LIGHT};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AdjustableParameterOffsetsMono {
    pub delta_arp_scp_coa: Vec3,
    pub delta_varp: Vec3,
    /// Transmit time offset (s)
    pub delta_tx_scp_coa: f64,
    /// Receive time offset (s)
    pub delta_tr_scp_coa: f64,
}

/// Offsets for one platform of a bistatic collection
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ApoPlatform {
    pub delta_apc_scp_coa: Vec3,
    pub delta_vapc: Vec3,
    /// Clock frequency scale factor
    pub f_clk_sf: f64,
    /// Time offset at the SCP COA (s)
    pub delta_t_scp_coa: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AdjustableParameterOffsetsBi {
    pub xmt: ApoPlatform,
    pub rcv: ApoPlatform,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AdjustableParameterOffsets {
    Mono(AdjustableParameterOffsetsMono),
    Bi(AdjustableParameterOffsetsBi),
}

fn apply_mono(
    t_scp_coa: f64,
    set: &ProjectionSetMono,
    apo: &AdjustableParameterOffsetsMono,
) -> ProjectionSetMono {
    let dt = set.t_coa - t_scp_coa;
    ProjectionSetMono {
        arp_coa: add_scaled(&add(&set.arp_coa, &apo.delta_arp_scp_coa), dt, &apo.delta_varp),
        varp_coa: add(&set.varp_coa, &apo.delta_varp),
        r_coa: set.r_coa
            + SPEED_OF_LIGHT / 2.0 * (apo.delta_tr_scp_coa - apo.delta_tx_scp_coa),
        ..*set
    }
}

fn apply_bi(
    t_scp_coa: f64,
    tx_scp_coa: f64,
    tr_scp_coa: f64,
    set: &ProjectionSetBi,
    apo: &AdjustableParameterOffsetsBi,
) -> ProjectionSetBi {
    let (xmt, rcv) = (&apo.xmt, &apo.rcv);
    let tx = set.tx_coa + xmt.delta_t_scp_coa - xmt.f_clk_sf * (set.tx_coa - t_scp_coa);
    let tr = set.tr_coa + rcv.delta_t_scp_coa - rcv.f_clk_sf * (set.tr_coa - t_scp_coa);

    let xmt_coa = add_scaled(
        &add(&set.xmt_coa, &xmt.delta_apc_scp_coa),
        set.tx_coa - tx_scp_coa,
        &xmt.delta_vapc,
    );
    let rcv_coa = add_scaled(
        &add(&set.rcv_coa, &rcv.delta_apc_scp_coa),
        set.tr_coa - tr_scp_coa,
        &rcv.delta_vapc,
    );

    ProjectionSetBi {
        t_coa: set.t_coa,
        tx_coa: tx,
        tr_coa: tr,
        xmt_coa,
        vxmt_coa: add(&set.vxmt_coa, &xmt.delta_vapc),
        rcv_coa,
        vrcv_coa: add(&set.vrcv_coa, &rcv.delta_vapc),
        r_avg_coa: set.r_avg_coa
            + SPEED_OF_LIGHT / 2.0 * ((tr - set.tr_coa) - (tx - set.tx_coa)),
        rdot_avg_coa: set.rdot_avg_coa + SPEED_OF_LIGHT / 2.0 * (xmt.f_clk_sf - rcv.f_clk_sf),
    }
}

/// Apply adjustable parameter offsets to every projection set
pub fn apply_apos(
    meta: &MetadataParams,
    sets: &ProjectionSets,
    apos: &AdjustableParameterOffsets,
) -> SarResult<ProjectionSets> {
    match (&meta.geometry, sets, apos) {
        (
            CollectionGeometry::Monostatic(_),
            ProjectionSets::Mono(mono),
            AdjustableParameterOffsets::Mono(apo),
        ) => {
            log::debug!("Applying monostatic APOs to {} projection sets", mono.len());
            Ok(ProjectionSets::Mono(map_batch(mono, |set| {
                apply_mono(meta.t_scp_coa, set, apo)
            })))
        }
        (
            CollectionGeometry::Bistatic(bi),
            ProjectionSets::Bi(sets),
            AdjustableParameterOffsets::Bi(apo),
        ) => {
            log::debug!("Applying bistatic APOs to {} projection sets", sets.len());
            Ok(ProjectionSets::Bi(map_batch(sets, |set| {
                apply_bi(meta.t_scp_coa, bi.tx_scp_coa, bi.tr_scp_coa, set, apo)
            })))
        }
        _ => Err(SarError::InvalidParameter(format!(
            "APOs, projection sets and metadata disagree on collection type ({:?})",
            meta.collect_type()
        ))),
    }
}
