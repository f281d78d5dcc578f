//! Arena-backed search tree.
//!
//! Nodes are appended and never moved or freed during a search; a node refers
//! to its parent by arena index, so reconstruction is a walk up `parent`
//! links.  The arena lives exactly as long as one query.

use rp_core::DirectionalLinkId;
use rp_network::RoadLink;

/// One reached directional link.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SearchNode<'n> {
    pub(crate) id:          DirectionalLinkId,
    pub(crate) link:        &'n RoadLink,
    pub(crate) parent:      Option<usize>,
    /// Length travelled so far, including this whole link.
    pub(crate) accumulated: f64,
    /// Estimated remaining length from this link's arrival point.
    pub(crate) heuristic:   f64,
}

impl SearchNode<'_> {
    #[inline]
    pub(crate) fn total(&self) -> f64 {
        self.accumulated + self.heuristic
    }
}

#[derive(Debug, Default)]
pub(crate) struct SearchTree<'n> {
    nodes: Vec<SearchNode<'n>>,
}

impl<'n> SearchTree<'n> {
    pub(crate) fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub(crate) fn push(&mut self, node: SearchNode<'n>) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub(crate) fn get(&self, index: usize) -> &SearchNode<'n> {
        &self.nodes[index]
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes from the root down to `index`.
    pub(crate) fn path_to(&self, index: usize) -> Vec<&SearchNode<'n>> {
        let mut path = Vec::new();
        let mut cur = Some(index);
        while let Some(i) = cur {
            let node = &self.nodes[i];
            path.push(node);
            cur = node.parent;
        }
        path.reverse();
        path
    }
}
