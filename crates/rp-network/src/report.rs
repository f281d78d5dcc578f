//! Outcome of a spatial-index build request.

use std::fmt;
use std::time::Duration;

use crate::{NetworkError, NetworkResult};

/// What happened when [`RoadNetwork::init`](crate::RoadNetwork::init) ran.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildReport {
    /// A new grid was built and published.
    Built {
        tiles:   usize,
        links:   usize,
        elapsed: Duration,
    },
    /// The index was already ready and no refresh was requested.
    AlreadyDone,
    /// Another build held the lock.  `timed_out` is `false` when the wait
    /// ended through cancellation instead.
    AlreadyInProgress { timed_out: bool },
    /// Finalization hit tile collisions.  Any previously published grid is
    /// still served; otherwise the index is unusable until a refresh.
    Failed { conflicts: usize },
}

impl BuildReport {
    /// `true` if the index is usable after this call.
    pub fn is_success(&self) -> bool {
        matches!(self, BuildReport::Built { .. } | BuildReport::AlreadyDone)
    }

    /// Convert the non-success variants into [`NetworkError`]s.
    pub fn into_result(self) -> NetworkResult<BuildReport> {
        match self {
            BuildReport::AlreadyInProgress { timed_out: true } => Err(NetworkError::BuildTimeout),
            BuildReport::AlreadyInProgress { timed_out: false } => Err(NetworkError::BuildCancelled),
            BuildReport::Failed { conflicts } => Err(NetworkError::BuildConflict { conflicts }),
            ok => Ok(ok),
        }
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildReport::Built { tiles, links, elapsed } => {
                write!(f, "OK: indexed {links} links into {tiles} tiles in {elapsed:?}")
            }
            BuildReport::AlreadyDone => f.write_str("init already done"),
            BuildReport::AlreadyInProgress { timed_out: true } => {
                f.write_str("init already in progress (wait timed out)")
            }
            BuildReport::AlreadyInProgress { timed_out: false } => {
                f.write_str("init already in progress (wait cancelled)")
            }
            BuildReport::Failed { conflicts } => {
                write!(f, "init failed: {conflicts} tile conflict(s)")
            }
        }
    }
}
