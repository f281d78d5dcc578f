//! Road network: link table, connectivity, and its spatial index.
//!
//! # Data layout
//!
//! Links live in one `Vec<RoadLink>` in input order; `by_id` maps each
//! [`LinkId`] to its position.  The spatial index stores positions, not ids,
//! so a proximity query resolves candidates without a second hash lookup.
//!
//! After [`RoadNetwork::build`] returns, the link table is never mutated
//! again, so a `RoadNetwork` can be shared across threads (`Arc`) and
//! queried without synchronization.  Only the index has interior state.

use rustc_hash::FxHashMap;

use rp_core::{CoordinateSystem, DirectionalLinkId, LinkId, PlanarPoint};
use rp_sync::CancelToken;

use crate::connectivity::{self, ConnectivityStats};
use crate::index::{IndexConfig, IndexState, SpatialIndex, TileKey};
use crate::link::{LinkRecord, RoadLink};
use crate::report::BuildReport;
use crate::{NetworkError, NetworkResult};

/// Descriptive metadata carried into search results.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkInfo {
    pub name:       String,
    pub crs:        CoordinateSystem,
    pub link_count: usize,
}

/// A loaded road network.  Build with [`RoadNetwork::build`], then call
/// [`init`](Self::init) before proximity queries.
///
/// # Example
///
/// ```
/// use rp_core::{CoordinateSystem, LinkId, NodeId, PlanarPoint};
/// use rp_network::{LinkRecord, RoadNetwork};
///
/// let crs = CoordinateSystem::KOREA_2000_UNIFIED;
/// let road = LinkRecord::from_points(
///     LinkId(1), false, crs,
///     vec![PlanarPoint::new(0.0, 0.0), PlanarPoint::new(250.0, 0.0)],
///     NodeId(10), NodeId(11),
/// ).unwrap();
///
/// let net = RoadNetwork::build([road]).unwrap();
/// assert!(net.init(false, 2).is_success());
/// let near = net.nearest_links(PlanarPoint::new(120.0, 4.0), 5.0).unwrap();
/// assert_eq!(near[0].1, vec![LinkId(1)]);
/// ```
pub struct RoadNetwork {
    info:         NetworkInfo,
    links:        Vec<RoadLink>,
    by_id:        FxHashMap<LinkId, usize>,
    index:        SpatialIndex,
    connectivity: ConnectivityStats,
}

impl RoadNetwork {
    /// Build with default index settings and an anonymous name.
    pub fn build(records: impl IntoIterator<Item = LinkRecord>) -> NetworkResult<Self> {
        Self::build_with("unnamed", records, IndexConfig::default())
    }

    /// Validate `records`, derive connectivity, and attach an (unbuilt)
    /// spatial index.
    ///
    /// # Errors
    ///
    /// - [`NetworkError::Empty`] if `records` is empty;
    /// - [`NetworkError::InvalidLinkId`] for ids ≤ 0;
    /// - [`NetworkError::DuplicateLinkId`];
    /// - [`NetworkError::MixedCoordinateSystems`] if the geometries disagree
    ///   on their coordinate system.
    pub fn build_with(
        name:    impl Into<String>,
        records: impl IntoIterator<Item = LinkRecord>,
        config:  IndexConfig,
    ) -> NetworkResult<Self> {
        let records = records.into_iter();
        let mut links: Vec<RoadLink> = Vec::with_capacity(records.size_hint().0);
        let mut by_id: FxHashMap<LinkId, usize> = FxHashMap::default();
        let mut crs: Option<CoordinateSystem> = None;

        for record in records {
            if record.id.0 <= 0 {
                return Err(NetworkError::InvalidLinkId(record.id));
            }
            let found = record.geometry.crs();
            match crs {
                None => crs = Some(found),
                Some(expected) if expected != found => {
                    return Err(NetworkError::MixedCoordinateSystems { expected, found });
                }
                Some(_) => {}
            }
            if by_id.insert(record.id, links.len()).is_some() {
                return Err(NetworkError::DuplicateLinkId(record.id));
            }
            links.push(RoadLink::from_record(record));
        }

        let crs = crs.ok_or(NetworkError::Empty)?;
        let connectivity = connectivity::derive(&mut links);

        Ok(Self {
            info: NetworkInfo { name: name.into(), crs, link_count: links.len() },
            links,
            by_id,
            index: SpatialIndex::new(config),
            connectivity,
        })
    }

    // ── Metadata ──────────────────────────────────────────────────────────

    pub fn info(&self) -> &NetworkInfo {
        &self.info
    }

    pub fn crs(&self) -> CoordinateSystem {
        self.info.crs
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn connectivity_stats(&self) -> ConnectivityStats {
        self.connectivity
    }

    // ── Graph access ──────────────────────────────────────────────────────

    pub fn link(&self, id: LinkId) -> NetworkResult<&RoadLink> {
        self.by_id
            .get(&id)
            .map(|&i| &self.links[i])
            .ok_or(NetworkError::LinkNotFound(id))
    }

    pub fn contains(&self, id: LinkId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// All links in input order.
    pub fn links(&self) -> impl ExactSizeIterator<Item = &RoadLink> + '_ {
        self.links.iter()
    }

    /// Directional links reachable right after travelling `from`.
    ///
    /// Uses the end-node set for positive ids and the start-node set for
    /// negative ids.  Asking for the backward direction of a oneway link
    /// yields an empty slice, since that link can never be travelled so.
    pub fn neighbors(&self, from: DirectionalLinkId) -> NetworkResult<&[DirectionalLinkId]> {
        let link = self
            .link(from.link())
            .map_err(|_| NetworkError::DirectionalLinkNotFound(from))?;
        Ok(link.continuations(from))
    }

    // ── Spatial index ─────────────────────────────────────────────────────

    /// Build the spatial index on up to `max_workers` threads.
    ///
    /// Blocks the calling thread.  Async callers should run it on their
    /// runtime's blocking pool.
    pub fn init(&self, refresh: bool, max_workers: usize) -> BuildReport {
        self.index.init(&self.links, refresh, max_workers, None)
    }

    /// [`init`](Self::init) whose wait for a concurrent build can be
    /// cancelled.
    pub fn init_with_cancel(
        &self,
        refresh:     bool,
        max_workers: usize,
        cancel:      &CancelToken,
    ) -> BuildReport {
        self.index.init(&self.links, refresh, max_workers, Some(cancel))
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn index_state(&self) -> IndexState {
        self.index.state()
    }

    /// `true` once proximity queries can be answered.
    pub fn is_ready(&self) -> bool {
        self.index.is_ready()
    }

    /// Ids of the links the published grid assigns to `key`.  Empty before
    /// the first successful build.
    pub fn links_in_tile(&self, key: TileKey) -> Vec<LinkId> {
        self.index.links_in_tile(key, &self.links)
    }

    /// Links within `max_distance` metres of `point`, nearest group first.
    ///
    /// # Errors
    ///
    /// [`NetworkError::IndexNotReady`] before a successful [`init`](Self::init).
    pub fn nearest_links(
        &self,
        point:        PlanarPoint,
        max_distance: f64,
    ) -> NetworkResult<Vec<(f64, Vec<LinkId>)>> {
        self.index.search_within_distance(&self.links, point, max_distance)
    }

    /// The single closest link within `max_distance`, ties going to the
    /// smallest id.  Lets a calling layer turn a coordinate into a link id
    /// before searching.
    pub fn snap(&self, point: PlanarPoint, max_distance: f64) -> NetworkResult<Option<LinkId>> {
        let nearest = self.nearest_links(point, max_distance)?;
        Ok(nearest.first().and_then(|(_, ids)| ids.first().copied()))
    }
}

impl std::fmt::Debug for RoadNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoadNetwork")
            .field("info", &self.info)
            .field("index", &self.index)
            .finish()
    }
}
