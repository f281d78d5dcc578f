//! Search-subsystem error type.

use thiserror::Error;

use rp_core::LinkId;
use rp_network::NetworkError;

/// Errors produced by `rp-search`.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("link {0} not found in network")]
    LinkNotFound(LinkId),

    #[error("no path from {from} to {to}")]
    Unreachable { from: LinkId, to: LinkId },

    #[error(transparent)]
    Network(#[from] NetworkError),
}

pub type PathResult<T> = Result<T, SearchError>;
