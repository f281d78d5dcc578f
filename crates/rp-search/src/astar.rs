//! Path-finding trait and default A* implementation.
//!
//! # Search space
//!
//! Search nodes are *directional links*, not road nodes: reaching `+7` means
//! link 7 has been travelled start → end.  A node's cost is the length of
//! every link travelled so far, its own included, so the cost of the first
//! link counts and the result of `find_path(L, L)` is L's own length.
//!
//! # Heuristic
//!
//! Straight-line distance from the node's arrival point to the nearer end of
//! the destination link.  Any path onward has to reach one of those two
//! points, and a link is never shorter than the chord between its ends, so
//! the estimate is admissible and consistent.  A directional id is therefore
//! final once popped and is never reopened.
//!
//! # Pluggability
//!
//! Callers go through the [`PathFinder`] trait so that a different engine
//! (bidirectional search, contraction hierarchies) can be swapped in.
//! [`FindPath`] adds `network.find_path(from, to)` for the default engine.

use log::debug;
use rustc_hash::FxHashSet;

use rp_core::{DirectionalLinkId, LinkId, PlanarPoint};
use rp_network::{RoadLink, RoadNetwork};

use crate::frontier::Frontier;
use crate::result::{SearchResult, SearchStats};
use crate::tree::{SearchNode, SearchTree};
use crate::{PathResult, SearchError};

// ── PathFinder trait ──────────────────────────────────────────────────────────

/// Pluggable shortest-path engine.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`; one engine and one network may
/// serve many concurrent queries, each with its own search state.
pub trait PathFinder: Send + Sync {
    /// Shortest path from link `from` to link `to`, both travelled in full.
    ///
    /// # Errors
    ///
    /// [`SearchError::LinkNotFound`] if either id is unknown and
    /// [`SearchError::Unreachable`] if no sequence of legal moves connects
    /// them.
    fn find_path(&self, network: &RoadNetwork, from: LinkId, to: LinkId) -> PathResult<SearchResult>;
}

/// A* over directional links with a straight-line heuristic.
#[derive(Copy, Clone, Debug, Default)]
pub struct AStar;

impl PathFinder for AStar {
    fn find_path(&self, network: &RoadNetwork, from: LinkId, to: LinkId) -> PathResult<SearchResult> {
        find_path(network, from, to)
    }
}

/// `network.find_path(from, to)` using [`AStar`].
pub trait FindPath {
    fn find_path(&self, from: LinkId, to: LinkId) -> PathResult<SearchResult>;
}

impl FindPath for RoadNetwork {
    fn find_path(&self, from: LinkId, to: LinkId) -> PathResult<SearchResult> {
        find_path(self, from, to)
    }
}

// ── A* ────────────────────────────────────────────────────────────────────────

/// Run A* from `from` to `to`.  See [`PathFinder::find_path`].
pub fn find_path(network: &RoadNetwork, from: LinkId, to: LinkId) -> PathResult<SearchResult> {
    let source = network.link(from).map_err(|_| SearchError::LinkNotFound(from))?;
    let target = network.link(to).map_err(|_| SearchError::LinkNotFound(to))?;

    let mut tree = SearchTree::new();
    let mut frontier = Frontier::new();
    let mut closed: FxHashSet<DirectionalLinkId> = FxHashSet::default();
    let mut stats = SearchStats::default();

    for id in seeds(source) {
        let node = SearchNode {
            id,
            link: source,
            parent: None,
            accumulated: source.length(),
            heuristic: heuristic(source.arrival_point(id), target),
        };
        let slot = tree.push(node);
        if frontier.push(id, slot, node.total()) {
            stats.pushed += 1;
        }
    }

    while let Some((id, slot)) = frontier.pop() {
        let node = *tree.get(slot);

        if node.link.id() == to {
            let result = reconstruct(network, &tree, slot, stats);
            debug!(
                "path {from} → {to}: {} links, {:.1} m; expanded {}, pushed {}, discarded {}, arena {}, open {}",
                result.len(),
                result.total_length,
                stats.expanded,
                stats.pushed,
                stats.discarded,
                tree.len(),
                frontier.len()
            );
            return Ok(result);
        }

        if !closed.insert(id) {
            stats.discarded += 1;
            continue;
        }
        stats.expanded += 1;

        for &next in node.link.continuations(id) {
            if closed.contains(&next) {
                continue;
            }
            let link = network.link(next.link())?;
            let accumulated = node.accumulated + link.length();
            let heuristic = heuristic(link.arrival_point(next), target);
            if !frontier.accepts(next, accumulated + heuristic) {
                continue;
            }
            let child = SearchNode { id: next, link, parent: Some(slot), accumulated, heuristic };
            let child_slot = tree.push(child);
            frontier.push(next, child_slot, child.total());
            stats.pushed += 1;
        }
    }

    debug!(
        "no path {from} → {to}: expanded {}, pushed {}, discarded {}",
        stats.expanded, stats.pushed, stats.discarded
    );
    Err(SearchError::Unreachable { from, to })
}

/// Directions in which the search may start on `link`.
fn seeds(link: &RoadLink) -> impl Iterator<Item = DirectionalLinkId> {
    let forward = DirectionalLinkId::forward(link.id());
    let backward = (!link.is_oneway()).then(|| forward.reversed());
    std::iter::once(forward).chain(backward)
}

#[inline]
fn heuristic(arrival: PlanarPoint, target: &RoadLink) -> f64 {
    arrival
        .distance(target.start_point())
        .min(arrival.distance(target.end_point()))
}

fn reconstruct(
    network: &RoadNetwork,
    tree:    &SearchTree<'_>,
    slot:    usize,
    stats:   SearchStats,
) -> SearchResult {
    let nodes = tree.path_to(slot);

    let oriented = |node: &SearchNode<'_>| {
        if node.id.is_forward() {
            node.link.geometry().clone()
        } else {
            node.link.geometry().reversed()
        }
    };

    // The path is never empty: it holds at least the destination node.
    let mut geometry = oriented(nodes[0]);
    for &node in &nodes[1..] {
        geometry.extend_joined(oriented(node).points());
    }

    SearchResult {
        path: nodes.iter().map(|n| n.id).collect(),
        geometry,
        total_length: tree.get(slot).accumulated,
        network: network.info().clone(),
        stats,
    }
}
