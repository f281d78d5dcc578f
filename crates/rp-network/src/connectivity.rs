//! Connectivity derivation.
//!
//! # Two phases
//!
//! ```text
//! phase 1 (rayon, per link)   scan links sharing this link's start/end node,
//!                             stage candidate directional ids in a buffer
//!                             owned by this link alone
//! phase 2 (sequential)        sort + dedup each buffer into the link's final
//!                             immutable sets
//! repair  (sequential)        give dead-end endpoints a U-turn
//! ```
//!
//! Phase 1 only reads the link table, so no locking is needed; each worker
//! writes nothing but the buffer it returns.
//!
//! # Rules
//!
//! For link A and another link B:
//!
//! | A's set      | gate          | B condition               | staged |
//! |--------------|---------------|---------------------------|--------|
//! | end-node     | none          | B starts at A's end node  | `+B`   |
//! | end-node     | B two-way     | B ends at A's end node    | `-B`   |
//! | start-node   | A two-way     | B starts at A's start node| `+B`   |
//! | start-node   | A two-way, B two-way | B ends at A's start node | `-B` |

use log::debug;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use rp_core::{DirectionalLinkId, LinkId, NodeId};

use crate::link::RoadLink;

/// Candidate continuations staged for one link during phase 1.
#[derive(Default, Debug)]
pub(crate) struct StagedLinks {
    pub(crate) start: Vec<DirectionalLinkId>,
    pub(crate) end:   Vec<DirectionalLinkId>,
}

/// Summary of one derivation run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectivityStats {
    /// Total directional ids across all sets, after repair.
    pub connections: usize,
    /// Endpoints that received a synthetic U-turn.
    pub dead_ends_repaired: usize,
}

/// Fill in `start_connected` / `end_connected` for every link.
pub fn derive(links: &mut [RoadLink]) -> ConnectivityStats {
    let incidence = node_incidence(links);

    // ── Phase 1: stage ───────────────────────────────────────────────────
    let staged: Vec<StagedLinks> = {
        let links: &[RoadLink] = links;
        links
            .par_iter()
            .map(|link| stage(link, links, &incidence))
            .collect()
    };

    // ── Phase 2: merge ───────────────────────────────────────────────────
    for (link, staged) in links.iter_mut().zip(staged) {
        link.start_connected = finalize(staged.start);
        link.end_connected = finalize(staged.end);
    }

    // ── Dead-end repair ──────────────────────────────────────────────────
    let mut stats = ConnectivityStats::default();
    for link in links.iter_mut() {
        stats.dead_ends_repaired += repair_dead_end(link);
        stats.connections += link.start_connected.len() + link.end_connected.len();
    }

    debug!(
        "connectivity: {} links, {} nodes, {} connections, {} dead ends repaired",
        links.len(),
        incidence.len(),
        stats.connections,
        stats.dead_ends_repaired
    );
    stats
}

/// `NodeId → indices of links touching that node`.
fn node_incidence(links: &[RoadLink]) -> FxHashMap<NodeId, Vec<usize>> {
    let mut incidence: FxHashMap<NodeId, Vec<usize>> = FxHashMap::default();
    for (i, link) in links.iter().enumerate() {
        incidence.entry(link.start_node).or_default().push(i);
        if link.end_node != link.start_node {
            incidence.entry(link.end_node).or_default().push(i);
        }
    }
    incidence
}

/// Phase 1 for a single link: reads only, returns its own buffer.
pub(crate) fn stage(
    link:      &RoadLink,
    links:     &[RoadLink],
    incidence: &FxHashMap<NodeId, Vec<usize>>,
) -> StagedLinks {
    let mut staged = StagedLinks::default();

    // Arriving at the end node (travelling forwards).
    for other in touching(links, incidence, link.end_node, link.id) {
        collect_continuations(other, link.end_node, &mut staged.end);
    }

    // Arriving at the start node is only possible when travelling backwards.
    if !link.oneway {
        for other in touching(links, incidence, link.start_node, link.id) {
            collect_continuations(other, link.start_node, &mut staged.start);
        }
    }

    staged
}

/// Links incident to `node`, other than `except`.
fn touching<'a>(
    links:     &'a [RoadLink],
    incidence: &'a FxHashMap<NodeId, Vec<usize>>,
    node:      NodeId,
    except:    LinkId,
) -> impl Iterator<Item = &'a RoadLink> + 'a {
    incidence
        .get(&node)
        .into_iter()
        .flatten()
        .map(move |&i| &links[i])
        .filter(move |other| other.id != except)
}

/// Directions in which `other` can be entered from `node`.
fn collect_continuations(other: &RoadLink, node: NodeId, out: &mut Vec<DirectionalLinkId>) {
    if other.start_node == node {
        out.push(DirectionalLinkId::forward(other.id));
    }
    if !other.oneway && other.end_node == node {
        out.push(DirectionalLinkId::backward(other.id));
    }
}

fn finalize(mut ids: Vec<DirectionalLinkId>) -> Box<[DirectionalLinkId]> {
    ids.sort_unstable();
    ids.dedup();
    ids.into_boxed_slice()
}

/// Let a search turn around at an endpoint with nowhere else to go.
///
/// Only legal reversals are added: a oneway link can never be entered
/// backwards, so its dead end stays a dead end.
fn repair_dead_end(link: &mut RoadLink) -> usize {
    if link.oneway {
        return 0;
    }
    let mut repaired = 0;
    if link.start_connected.is_empty() {
        link.start_connected = Box::new([DirectionalLinkId::forward(link.id)]);
        repaired += 1;
    }
    if link.end_connected.is_empty() {
        link.end_connected = Box::new([DirectionalLinkId::backward(link.id)]);
        repaired += 1;
    }
    repaired
}
