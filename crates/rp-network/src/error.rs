//! Network-subsystem error type.

use thiserror::Error;

use rp_core::{CoordinateSystem, CoreError, DirectionalLinkId, LinkId};

/// Errors produced by `rp-network`.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("cannot build a network from zero links")]
    Empty,

    #[error("duplicate link id {0}")]
    DuplicateLinkId(LinkId),

    #[error("link id must be positive, got {0}")]
    InvalidLinkId(LinkId),

    #[error("links use more than one coordinate system: expected {expected}, found {found}")]
    MixedCoordinateSystems {
        expected: CoordinateSystem,
        found:    CoordinateSystem,
    },

    #[error("link {0} not found in network")]
    LinkNotFound(LinkId),

    #[error("directional link {0} not found in network")]
    DirectionalLinkNotFound(DirectionalLinkId),

    #[error("spatial index is not ready")]
    IndexNotReady,

    #[error("invalid search distance {0}")]
    InvalidDistance(f64),

    #[error("invalid query point ({x}, {y})")]
    InvalidPoint { x: f64, y: f64 },

    #[error("timed out waiting for another index build to finish")]
    BuildTimeout,

    #[error("index build was cancelled while waiting for the build lock")]
    BuildCancelled,

    #[error("index build failed with {conflicts} tile conflict(s)")]
    BuildConflict { conflicts: usize },

    #[error(transparent)]
    Geometry(#[from] CoreError),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
