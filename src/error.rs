use std::path::PathBuf;

use crate::world::{BodyId, MaterialId, SectorId, SegmentId};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("sector {0:?} needs at least 3 segments, got {1}")]
    DegenerateSector(SectorId, usize),
    #[error("segment {0:?} has zero length")]
    ZeroLengthSegment(SegmentId),
    #[error("sector {0:?} does not exist")]
    UnknownSector(SectorId),
    #[error("segment {0:?} does not exist")]
    UnknownSegment(SegmentId),
    #[error("material {0:?} does not exist")]
    UnknownMaterial(MaterialId),
    #[error("body {0:?} does not exist")]
    UnknownBody(BodyId),
    #[error("portal on {segment:?} points at {adjacent:?}, which has no matching edge")]
    BrokenPortal {
        segment: SegmentId,
        adjacent: SectorId,
    },
    #[error("light grid {0} must be positive")]
    InvalidLightGrid(f64),
    #[error("invalid render config: {0}")]
    InvalidConfig(String),
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
