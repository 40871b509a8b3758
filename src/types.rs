use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// ECEF (WGS-84 cartesian) vector in meters or meters/second
pub type Vec3 = [f64; 3];

/// Image grid location (xrow, ycol) in meters relative to the SCP
pub type ImageGridLocation = [f64; 2];

/// Batch of image grid locations with arbitrary leading shape
pub type ImageGridLocations = ArrayD<ImageGridLocation>;

/// Batch of ECEF points with arbitrary leading shape
pub type EcefPoints = ArrayD<Vec3>;

/// Speed of light (m/s)
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Collection type of a SICD image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectType {
    Monostatic,
    Bistatic,
}

impl FromStr for CollectType {
    type Err = SarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MONOSTATIC" => Ok(CollectType::Monostatic),
            "BISTATIC" => Ok(CollectType::Bistatic),
            other => Err(SarError::Metadata(format!(
                "Collect_Type must be MONOSTATIC or BISTATIC, got {:?}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for CollectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectType::Monostatic => write!(f, "MONOSTATIC"),
            CollectType::Bistatic => write!(f, "BISTATIC"),
        }
    }
}

/// Side of track of the imaged scene relative to the platform velocity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SideOfTrack {
    Left,
    Right,
}

impl SideOfTrack {
    /// LOOK sign: +1 for left looking, -1 for right looking
    pub fn look(&self) -> f64 {
        match self {
            SideOfTrack::Left => 1.0,
            SideOfTrack::Right => -1.0,
        }
    }
}

impl FromStr for SideOfTrack {
    type Err = SarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "L" => Ok(SideOfTrack::Left),
            "R" => Ok(SideOfTrack::Right),
            other => Err(SarError::Metadata(format!(
                "SideOfTrack must be L or R, got {:?}",
                other
            ))),
        }
    }
}

/// Image grid type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridType {
    /// Range / azimuth
    Rgazim,
    /// Range / zero Doppler
    Rgzero,
    /// Cross range / cross range
    Xrgycr,
    /// Cross track / along track
    Xctyat,
    /// Arbitrary plane
    Plane,
}

impl FromStr for GridType {
    type Err = SarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RGAZIM" => Ok(GridType::Rgazim),
            "RGZERO" => Ok(GridType::Rgzero),
            "XRGYCR" => Ok(GridType::Xrgycr),
            "XCTYAT" => Ok(GridType::Xctyat),
            "PLANE" => Ok(GridType::Plane),
            other => Err(SarError::Metadata(format!("Unknown Grid/Type {:?}", other))),
        }
    }
}

impl std::fmt::Display for GridType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridType::Rgazim => write!(f, "RGAZIM"),
            GridType::Rgzero => write!(f, "RGZERO"),
            GridType::Xrgycr => write!(f, "XRGYCR"),
            GridType::Xctyat => write!(f, "XCTYAT"),
            GridType::Plane => write!(f, "PLANE"),
        }
    }
}

/// Image formation algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormationAlgorithm {
    Pfa,
    Rma,
    Rgazcomp,
    Other,
}

impl FromStr for ImageFormationAlgorithm {
    type Err = SarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PFA" => Ok(ImageFormationAlgorithm::Pfa),
            "RMA" => Ok(ImageFormationAlgorithm::Rma),
            "RGAZCOMP" => Ok(ImageFormationAlgorithm::Rgazcomp),
            "OTHER" => Ok(ImageFormationAlgorithm::Other),
            other => Err(SarError::Metadata(format!(
                "Unknown ImageFormAlgo {:?}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ImageFormationAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageFormationAlgorithm::Pfa => write!(f, "PFA"),
            ImageFormationAlgorithm::Rma => write!(f, "RMA"),
            ImageFormationAlgorithm::Rgazcomp => write!(f, "RGAZCOMP"),
            ImageFormationAlgorithm::Other => write!(f, "OTHER"),
        }
    }
}

/// Error types for SICD projection
#[derive(Debug, thiserror::Error)]
pub enum SarError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid array shape: {0}")]
    InvalidShape(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Convergence error: {0}")]
    Convergence(String),

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Result type for projection operations
pub type SarResult<T> = Result<T, SarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_type_parsing() {
        assert_eq!("MONOSTATIC".parse::<CollectType>().unwrap(), CollectType::Monostatic);
        assert_eq!("BISTATIC".parse::<CollectType>().unwrap(), CollectType::Bistatic);

        let err = "NOT_A_REAL_COLLECT_TYPE".parse::<CollectType>().unwrap_err();
        assert!(err.to_string().contains("must be MONOSTATIC or BISTATIC"));
    }

    #[test]
    fn test_look_sign() {
        assert_eq!("L".parse::<SideOfTrack>().unwrap().look(), 1.0);
        assert_eq!("R".parse::<SideOfTrack>().unwrap().look(), -1.0);
        assert!("X".parse::<SideOfTrack>().is_err());
    }

    #[test]
    fn test_grid_and_ifa_display_roundtrip() {
        for name in ["RGAZIM", "RGZERO", "XRGYCR", "XCTYAT", "PLANE"] {
            let grid: GridType = name.parse().unwrap();
            assert_eq!(grid.to_string(), name);
        }
        for name in ["PFA", "RMA", "RGAZCOMP", "OTHER"] {
            let ifa: ImageFormationAlgorithm = name.parse().unwrap();
            assert_eq!(ifa.to_string(), name);
        }
        assert!("POLAR".parse::<GridType>().is_err());
    }
}
