//! Link records (input) and immutable graph links.

use rp_core::{CoordinateSystem, DirectionalLinkId, LinkId, NodeId, PlanarPoint, Polyline};

use crate::NetworkResult;

// ── LinkRecord ────────────────────────────────────────────────────────────────

/// One road link as delivered by the data-set loader.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkRecord {
    pub id:         LinkId,
    /// Travel only allowed start node → end node.
    pub oneway:     bool,
    /// Start node first, end node last.
    pub geometry:   Polyline,
    pub start_node: NodeId,
    pub end_node:   NodeId,
}

impl LinkRecord {
    /// Build a record from raw coordinates, validating the geometry.
    pub fn from_points(
        id:         LinkId,
        oneway:     bool,
        crs:        CoordinateSystem,
        points:     Vec<PlanarPoint>,
        start_node: NodeId,
        end_node:   NodeId,
    ) -> NetworkResult<Self> {
        Ok(Self {
            id,
            oneway,
            geometry: Polyline::new(crs, points)?,
            start_node,
            end_node,
        })
    }
}

// ── RoadLink ──────────────────────────────────────────────────────────────────

/// A link of a built [`RoadNetwork`](crate::RoadNetwork).
///
/// Immutable once the network is built.  The two connectivity sets list the
/// directional links a traveller may continue onto:
///
/// - `end_connected`: after travelling this link forwards (arriving at the
///   end node);
/// - `start_connected`: after travelling it backwards (arriving at the start
///   node).  Always empty for oneway links.
///
/// Both are sorted and free of duplicates.
#[derive(Clone, Debug)]
pub struct RoadLink {
    pub(crate) id:              LinkId,
    pub(crate) oneway:          bool,
    pub(crate) geometry:        Polyline,
    pub(crate) start_node:      NodeId,
    pub(crate) end_node:        NodeId,
    pub(crate) length:          f64,
    pub(crate) start_connected: Box<[DirectionalLinkId]>,
    pub(crate) end_connected:   Box<[DirectionalLinkId]>,
}

impl RoadLink {
    /// Wrap a record with empty connectivity; filled in by
    /// [`connectivity::derive`](crate::connectivity::derive).
    pub(crate) fn from_record(record: LinkRecord) -> Self {
        let length = record.geometry.length();
        Self {
            id:              record.id,
            oneway:          record.oneway,
            geometry:        record.geometry,
            start_node:      record.start_node,
            end_node:        record.end_node,
            length,
            start_connected: Box::default(),
            end_connected:   Box::default(),
        }
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn is_oneway(&self) -> bool {
        self.oneway
    }

    pub fn geometry(&self) -> &Polyline {
        &self.geometry
    }

    pub fn start_node(&self) -> NodeId {
        self.start_node
    }

    pub fn end_node(&self) -> NodeId {
        self.end_node
    }

    /// Position of the start node (first geometry point).
    pub fn start_point(&self) -> PlanarPoint {
        self.geometry.first()
    }

    /// Position of the end node (last geometry point).
    pub fn end_point(&self) -> PlanarPoint {
        self.geometry.last()
    }

    /// Geometric length in metres, cached at build time.
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn start_connected(&self) -> &[DirectionalLinkId] {
        &self.start_connected
    }

    pub fn end_connected(&self) -> &[DirectionalLinkId] {
        &self.end_connected
    }

    /// Whether travelling in `direction`'s sign is permitted on this link.
    pub fn allows(&self, direction: DirectionalLinkId) -> bool {
        direction.is_forward() || !self.oneway
    }

    /// Point where a traveller on `direction` leaves this link.
    pub fn arrival_point(&self, direction: DirectionalLinkId) -> PlanarPoint {
        if direction.is_forward() {
            self.end_point()
        } else {
            self.start_point()
        }
    }

    /// Links reachable after travelling this link in `direction`.
    pub fn continuations(&self, direction: DirectionalLinkId) -> &[DirectionalLinkId] {
        if direction.is_forward() {
            &self.end_connected
        } else {
            &self.start_connected
        }
    }
}
