//! Search output.

use rp_core::{DirectionalLinkId, LinkId, Polyline};
use rp_network::NetworkInfo;

/// Counters for one search, logged at `debug` level.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchStats {
    /// Nodes taken off the frontier and closed.
    pub expanded: usize,
    /// Entries accepted into the frontier, replacements included.
    pub pushed: usize,
    /// Entries popped for an id that was already closed.
    pub discarded: usize,
}

/// A shortest path between two links.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchResult {
    /// Links in travel order; the sign gives the direction travelled.
    pub path: Vec<DirectionalLinkId>,
    /// The path's geometry in travel order, one point per junction.
    pub geometry: Polyline,
    /// Sum of the lengths of every link on the path, first and last
    /// included.
    pub total_length: f64,
    /// Metadata of the network the path was found in.
    pub network: NetworkInfo,
    pub stats: SearchStats,
}

impl SearchResult {
    /// Undirected link ids in travel order.
    pub fn links(&self) -> impl ExactSizeIterator<Item = LinkId> + '_ {
        self.path.iter().map(|d| d.link())
    }

    /// Number of links on the path.  Never zero.
    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn first(&self) -> Option<DirectionalLinkId> {
        self.path.first().copied()
    }

    pub fn last(&self) -> Option<DirectionalLinkId> {
        self.path.last().copied()
    }
}
