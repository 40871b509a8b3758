//! Per-image projection metadata
//!
//! `MetadataParams` collects the handful of SICD fields the projection
//! kernels need. It is plain data: reading it out of SICD XML is left to the
//! caller. Scenario variants are derived with the consuming `with_*` builders.

use crate::core::poly::{Poly1d, Poly2d, XyzPoly};
use crate::core::vector::{cross, norm};
use crate::core::wgs84;
use crate::types::{
    CollectType, GridType, ImageFormationAlgorithm, SarError, SarResult, SideOfTrack, Vec3,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Monostatic collection: a single aperture reference point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonostaticParams {
    /// ARP position polynomial, seconds since collection start
    pub arp_poly: XyzPoly,
    pub arp_scp_coa: Vec3,
    pub varp_scp_coa: Vec3,
}

/// Bistatic collection: separate transmit and receive platforms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BistaticParams {
    /// Ground reference point polynomial used for COA timing
    pub grp_poly: XyzPoly,
    pub xmt_poly: XyzPoly,
    pub rcv_poly: XyzPoly,
    pub tx_scp_coa: f64,
    pub tr_scp_coa: f64,
    pub xmt_scp_coa: Vec3,
    pub vxmt_scp_coa: Vec3,
    pub rcv_scp_coa: Vec3,
    pub vrcv_scp_coa: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CollectionGeometry {
    Monostatic(MonostaticParams),
    Bistatic(BistaticParams),
}

/// Polar format parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PfaParams {
    /// Polar angle as a function of COA time
    pub polar_ang_poly: Poly1d,
    /// Spatial frequency scale factor as a function of polar angle
    pub spatial_freq_sf_poly: Poly1d,
}

/// Range migration (INCA) parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncaParams {
    /// Time of closest approach as a function of xrow
    pub time_ca_poly: Poly1d,
    /// Range at closest approach for the SCP
    pub r_ca_scp: f64,
    /// Doppler rate scale factor as a function of (xrow, ycol)
    pub drate_sf_poly: Poly2d,
}

/// R/Rdot contour formula for an image, chosen from the grid type and the
/// image formation algorithm
#[derive(Debug, Clone, PartialEq)]
pub enum RRdotMethod {
    RgazimPfa(PfaParams),
    RgazimRgazcomp { az_sf: f64 },
    RgzeroInca(IncaParams),
    Xrgycr,
    Xctyat,
    Plane,
}

/// Metadata parameters relevant to projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataParams {
    /// Scene center point (ECEF)
    pub scp: Vec3,
    pub u_row: Vec3,
    pub u_col: Vec3,
    pub row_ss: f64,
    pub col_ss: f64,
    /// Full-image (row, col) of the SCP pixel
    pub scp_pixel: [f64; 2],
    pub grid_type: GridType,
    pub ifa: ImageFormationAlgorithm,
    /// COA time as a function of (xrow, ycol)
    pub t_coa_poly: Poly2d,
    pub t_scp_coa: f64,
    pub side_of_track: SideOfTrack,
    pub collect_start: Option<DateTime<Utc>>,
    pub geometry: CollectionGeometry,
    pub pfa: Option<PfaParams>,
    pub az_sf: Option<f64>,
    pub inca: Option<IncaParams>,
}

impl MetadataParams {
    /// Create a bundle with a PLANE grid and no IFA specific parameters
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scp: Vec3,
        u_row: Vec3,
        u_col: Vec3,
        row_ss: f64,
        col_ss: f64,
        t_coa_poly: Poly2d,
        t_scp_coa: f64,
        side_of_track: SideOfTrack,
        geometry: CollectionGeometry,
    ) -> SarResult<Self> {
        let meta = Self {
            scp,
            u_row,
            u_col,
            row_ss,
            col_ss,
            scp_pixel: [0.0, 0.0],
            grid_type: GridType::Plane,
            ifa: ImageFormationAlgorithm::Other,
            t_coa_poly,
            t_scp_coa,
            side_of_track,
            collect_start: None,
            geometry,
            pfa: None,
            az_sf: None,
            inca: None,
        };
        meta.validate()?;
        Ok(meta)
    }

    /// Check the structural consistency of the bundle
    pub fn validate(&self) -> SarResult<()> {
        if !(self.row_ss > 0.0 && self.col_ss > 0.0) {
            return Err(SarError::Metadata(format!(
                "Sample spacings must be positive, got Row_SS={} Col_SS={}",
                self.row_ss, self.col_ss
            )));
        }
        if norm(&cross(&self.u_row, &self.u_col)) == 0.0 {
            return Err(SarError::Metadata(
                "uRow and uCol must not be parallel".to_string(),
            ));
        }
        if norm(&self.scp) == 0.0 {
            return Err(SarError::Metadata("SCP must not be the origin".to_string()));
        }
        Ok(())
    }

    pub fn with_grid(mut self, grid_type: GridType, ifa: ImageFormationAlgorithm) -> Self {
        self.grid_type = grid_type;
        self.ifa = ifa;
        self
    }

    pub fn with_pfa(mut self, pfa: PfaParams) -> Self {
        self.pfa = Some(pfa);
        self
    }

    pub fn with_rgazcomp(mut self, az_sf: f64) -> Self {
        self.az_sf = Some(az_sf);
        self
    }

    pub fn with_inca(mut self, inca: IncaParams) -> Self {
        self.inca = Some(inca);
        self
    }

    pub fn with_scp_pixel(mut self, scp_pixel: [f64; 2]) -> Self {
        self.scp_pixel = scp_pixel;
        self
    }

    pub fn with_collect_start(mut self, collect_start: DateTime<Utc>) -> Self {
        self.collect_start = Some(collect_start);
        self
    }

    pub fn collect_type(&self) -> CollectType {
        match self.geometry {
            CollectionGeometry::Monostatic(_) => CollectType::Monostatic,
            CollectionGeometry::Bistatic(_) => CollectType::Bistatic,
        }
    }

    pub fn is_monostatic(&self) -> bool {
        self.collect_type() == CollectType::Monostatic
    }

    pub fn is_bistatic(&self) -> bool {
        !self.is_monostatic()
    }

    /// +1 for left looking, -1 for right looking
    pub fn look(&self) -> f64 {
        self.side_of_track.look()
    }

    /// SCP as `[lat_deg, lon_deg, hae_m]`
    pub fn scp_llh(&self) -> Vec3 {
        wgs84::cartesian_to_geodetic(&self.scp)
    }

    pub fn scp_hae(&self) -> f64 {
        self.scp_llh()[2]
    }

    /// Absolute time of a COA time given in seconds since collection start
    pub fn coa_datetime(&self, t_coa: f64) -> Option<DateTime<Utc>> {
        let start = self.collect_start?;
        if !t_coa.is_finite() {
            return None;
        }
        start.checked_add_signed(Duration::nanoseconds((t_coa * 1e9).round() as i64))
    }

    /// Select the R/Rdot formula for this image
    pub fn r_rdot_method(&self) -> SarResult<RRdotMethod> {
        use ImageFormationAlgorithm as Ifa;

        match (self.grid_type, self.ifa) {
            (GridType::Rgazim, Ifa::Pfa) => self
                .pfa
                .clone()
                .map(RRdotMethod::RgazimPfa)
                .ok_or_else(|| {
                    SarError::Metadata("RGAZIM/PFA requires polar format parameters".to_string())
                }),
            (GridType::Rgazim, Ifa::Rgazcomp) => {
                self.require_monostatic("RGAZIM/RGAZCOMP")?;
                self.az_sf
                    .map(|az_sf| RRdotMethod::RgazimRgazcomp { az_sf })
                    .ok_or_else(|| {
                        SarError::Metadata("RGAZIM/RGAZCOMP requires AzSF".to_string())
                    })
            }
            (GridType::Rgazim, ifa) => Err(SarError::Metadata(format!(
                "RGAZIM grid is not supported for image formation algorithm {}",
                ifa
            ))),
            (GridType::Rgzero, Ifa::Rma) => {
                self.require_monostatic("RGZERO/INCA")?;
                self.inca
                    .clone()
                    .map(RRdotMethod::RgzeroInca)
                    .ok_or_else(|| {
                        SarError::Metadata("RGZERO/INCA requires INCA parameters".to_string())
                    })
            }
            (GridType::Rgzero, ifa) => Err(SarError::Metadata(format!(
                "RGZERO grid requires RMA image formation, got {}",
                ifa
            ))),
            (GridType::Xrgycr, _) => Ok(RRdotMethod::Xrgycr),
            (GridType::Xctyat, _) => Ok(RRdotMethod::Xctyat),
            (GridType::Plane, _) => Ok(RRdotMethod::Plane),
        }
    }

    fn require_monostatic(&self, method: &str) -> SarResult<()> {
        if self.is_monostatic() {
            Ok(())
        } else {
            Err(SarError::Metadata(format!(
                "{} is only defined for monostatic collections",
                method
            )))
        }
    }

    pub fn monostatic(&self) -> Option<&MonostaticParams> {
        match &self.geometry {
            CollectionGeometry::Monostatic(mono) => Some(mono),
            CollectionGeometry::Bistatic(_) => None,
        }
    }

    pub fn bistatic(&self) -> Option<&BistaticParams> {
        match &self.geometry {
            CollectionGeometry::Monostatic(_) => None,
            CollectionGeometry::Bistatic(bi) => Some(bi),
        }
    }

    /// Image plane unit normal, `uRow x uCol` normalized
    pub fn image_plane_normal(&self) -> Vec3 {
        let n = cross(&self.u_row, &self.u_col);
        let mag = norm(&n);
        [n[0] / mag, n[1] / mag, n[2] / mag]
    }
}
