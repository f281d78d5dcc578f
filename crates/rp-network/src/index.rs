//! Uniform tile grid over link geometry.
//!
//! # Layout
//!
//! The plane is cut into square tiles of side `tile_side`.  A tile is keyed
//! by `(floor(x / side), floor(y / side))` and maps to the links whose
//! geometry passes through it.  A link lands in every tile touched by its
//! geometry; the assignment may include a few extra neighbouring tiles but
//! never misses one.
//!
//! # Build
//!
//! ```text
//! state:   NotBuilt ──► Building ──► Ready
//!                           └──────► Failed   (tile conflict, no prior grid)
//! ```
//!
//! Builds are exclusive per index: the builder holds this index's
//! [`IndexKey`] in a shared [`MutexSet`] for the whole build.  Queries never
//! touch that lock.  They read an `Arc` snapshot of the last *complete* grid,
//! so a slow rebuild neither blocks them nor exposes half-filled tiles.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use ordered_float::OrderedFloat;
use parking_lot::RwLock;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use rp_core::{LinkId, PlanarPoint};
use rp_sync::{CancelToken, MutexSet, WaitConfig};

use crate::link::RoadLink;
use crate::report::BuildReport;
use crate::{NetworkError, NetworkResult};

// ── Keys ──────────────────────────────────────────────────────────────────────

/// Grid cell coordinates.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct TileKey {
    pub ix: i64,
    pub iy: i64,
}

impl TileKey {
    /// Tile containing `p` for the given tile side length.
    #[inline]
    pub fn of(p: PlanarPoint, tile_side: f64) -> Self {
        Self {
            ix: (p.x / tile_side).floor() as i64,
            iy: (p.y / tile_side).floor() as i64,
        }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.ix, self.iy)
    }
}

/// Process-unique identity of a [`SpatialIndex`], used as its build-lock id.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct IndexKey(pub u64);

impl IndexKey {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Build locks shared by every index that does not bring its own set.
static BUILD_LOCKS: LazyLock<Arc<MutexSet<IndexKey>>> =
    LazyLock::new(|| Arc::new(MutexSet::with_config(WaitConfig::default())));

// ── Config & state ────────────────────────────────────────────────────────────

/// Spatial index tuning.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexConfig {
    /// Tile side length in metres.  Non-positive values are replaced by the
    /// default.
    pub tile_side: f64,
    /// How long a second builder waits for a running build before reporting
    /// it as in progress.
    pub build_wait: WaitConfig,
}

impl IndexConfig {
    pub const DEFAULT_TILE_SIDE: f64 = 100.0;

    fn effective_tile_side(&self) -> f64 {
        if self.tile_side.is_finite() && self.tile_side > 0.0 {
            self.tile_side
        } else {
            Self::DEFAULT_TILE_SIDE
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            tile_side:  Self::DEFAULT_TILE_SIDE,
            build_wait: WaitConfig::new(Duration::from_millis(10), Duration::from_secs(30)),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum IndexState {
    NotBuilt,
    Building,
    Ready,
    Failed,
}

// ── TileGrid ──────────────────────────────────────────────────────────────────

/// An immutable, fully built grid.  Link entries are positions in the
/// owning network's link table.
#[derive(Debug, Default)]
pub(crate) struct TileGrid {
    tiles: FxHashMap<TileKey, Box<[usize]>>,
}

impl TileGrid {
    pub(crate) fn get(&self, key: &TileKey) -> Option<&[usize]> {
        self.tiles.get(key).map(|ids| &**ids)
    }
}

struct Published {
    state: IndexState,
    grid:  Option<Arc<TileGrid>>,
}

// ── SpatialIndex ──────────────────────────────────────────────────────────────

pub struct SpatialIndex {
    key:         IndexKey,
    config:      IndexConfig,
    tile_side:   f64,
    published:   RwLock<Published>,
    build_locks: Arc<MutexSet<IndexKey>>,
}

impl SpatialIndex {
    pub fn new(config: IndexConfig) -> Self {
        Self::with_build_locks(config, Arc::clone(&BUILD_LOCKS))
    }

    /// Use a caller-supplied lock set for build exclusion.
    pub fn with_build_locks(config: IndexConfig, build_locks: Arc<MutexSet<IndexKey>>) -> Self {
        Self {
            key: IndexKey::next(),
            tile_side: config.effective_tile_side(),
            config,
            published: RwLock::new(Published { state: IndexState::NotBuilt, grid: None }),
            build_locks,
        }
    }

    pub fn key(&self) -> IndexKey {
        self.key
    }

    pub fn config(&self) -> IndexConfig {
        self.config
    }

    pub fn tile_side(&self) -> f64 {
        self.tile_side
    }

    pub fn state(&self) -> IndexState {
        self.published.read().state
    }

    /// `true` when a complete grid is available to queries.
    pub fn is_ready(&self) -> bool {
        self.published.read().grid.is_some()
    }

    /// `true` while some thread holds this index's build lock.
    pub fn is_building(&self) -> bool {
        self.build_locks.is_locked(&self.key)
    }

    /// Number of non-empty tiles in the published grid.
    pub fn tile_count(&self) -> usize {
        self.published.read().grid.as_ref().map_or(0, |g| g.tiles.len())
    }

    /// Ids of the links assigned to `key` in the published grid.  `links`
    /// must be the slice the grid was built from.
    pub(crate) fn links_in_tile(&self, key: TileKey, links: &[RoadLink]) -> Vec<LinkId> {
        self.snapshot()
            .and_then(|grid| grid.get(&key).map(|ids| ids.iter().map(|&i| links[i].id).collect()))
            .unwrap_or_default()
    }

    fn snapshot(&self) -> Option<Arc<TileGrid>> {
        self.published.read().grid.clone()
    }

    // ── Build ─────────────────────────────────────────────────────────────

    /// Build (or rebuild, with `refresh`) the grid for `links`.
    ///
    /// Waits at most `config.build_wait.timeout` for a concurrent build of
    /// the same index to finish.  The build lock is released on every path.
    pub fn init(
        &self,
        links:       &[RoadLink],
        refresh:     bool,
        max_workers: usize,
        cancel:      Option<&CancelToken>,
    ) -> BuildReport {
        let tile_side = self.tile_side;
        self.build_with(links, refresh, cancel, || stage_tiles(links, tile_side, max_workers))
    }

    /// Lock, run `stage` and publish its finalized tiles.
    ///
    /// `stage` runs only while the build lock is held and its output goes
    /// through [`finalize_tiles`], so a repeated tile key fails the build.
    pub(crate) fn build_with<S, I>(
        &self,
        links:   &[RoadLink],
        refresh: bool,
        cancel:  Option<&CancelToken>,
        stage:   S,
    ) -> BuildReport
    where
        S: FnOnce() -> I,
        I: IntoIterator<Item = (TileKey, Vec<usize>)>,
    {
        if !refresh && self.state() == IndexState::Ready {
            return BuildReport::AlreadyDone;
        }

        let Some(_guard) =
            self.build_locks.lock_for(self.key, self.config.build_wait.timeout, cancel)
        else {
            let timed_out = !cancel.is_some_and(CancelToken::is_cancelled);
            warn!(
                "index {:?}: build already in progress ({})",
                self.key,
                if timed_out { "wait timed out" } else { "wait cancelled" }
            );
            return BuildReport::AlreadyInProgress { timed_out };
        };

        // Another builder may have finished while we waited for the lock.
        if !refresh && self.state() == IndexState::Ready {
            return BuildReport::AlreadyDone;
        }

        self.published.write().state = IndexState::Building;
        let start = Instant::now();

        let (grid, conflicts) = finalize_tiles(stage());
        let tiles = grid.tiles.len();

        let mut published = self.published.write();
        if conflicts == 0 {
            published.grid = Some(Arc::new(grid));
            published.state = IndexState::Ready;
            let elapsed = start.elapsed();
            info!(
                "index {:?}: {} links in {} tiles (side {} m) in {:?}",
                self.key,
                links.len(),
                tiles,
                self.tile_side,
                elapsed
            );
            BuildReport::Built { tiles, links: links.len(), elapsed }
        } else {
            // Keep serving the previous grid if there is one.
            published.state = if published.grid.is_some() {
                IndexState::Ready
            } else {
                IndexState::Failed
            };
            warn!(
                "index {:?}: build failed with {} tile conflict(s); state {:?}",
                self.key, conflicts, published.state
            );
            BuildReport::Failed { conflicts }
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Links within `max_distance` of `center`, grouped by exact distance
    /// and ordered nearest first.  Links tied on distance share a group,
    /// sorted by id.  `links` must be the slice the grid was built from.
    pub(crate) fn search_within_distance(
        &self,
        links:        &[RoadLink],
        center:       PlanarPoint,
        max_distance: f64,
    ) -> NetworkResult<Vec<(f64, Vec<LinkId>)>> {
        if !center.is_finite() {
            return Err(NetworkError::InvalidPoint { x: center.x, y: center.y });
        }
        if !max_distance.is_finite() || max_distance < 0.0 {
            return Err(NetworkError::InvalidDistance(max_distance));
        }
        let grid = self.snapshot().ok_or(NetworkError::IndexNotReady)?;

        let candidates = self.candidates(&grid, center, max_distance);

        let mut grouped: BTreeMap<OrderedFloat<f64>, Vec<LinkId>> = BTreeMap::new();
        for i in candidates {
            let link = &links[i];
            let d = link.geometry.distance_to(center);
            if d <= max_distance {
                grouped.entry(OrderedFloat(d)).or_default().push(link.id);
            }
        }

        Ok(grouped
            .into_iter()
            .map(|(d, mut ids)| {
                ids.sort_unstable();
                (d.into_inner(), ids)
            })
            .collect())
    }

    /// Every link index stored in the full `(2r+1)²` tile square around
    /// `center`, where `r = floor(max_distance / side) + 1`.
    fn candidates(&self, grid: &TileGrid, center: PlanarPoint, max_distance: f64) -> FxHashSet<usize> {
        let range = ((max_distance / self.tile_side).floor() + 1.0).min(i32::MAX as f64) as i64;
        let c = TileKey::of(center, self.tile_side);
        let mut out = FxHashSet::default();

        let side = 2 * range as u128 + 1;
        if side * side > grid.tiles.len() as u128 {
            // Square larger than the grid itself: filter the populated tiles.
            let range = range as u64;
            for (key, ids) in &grid.tiles {
                if key.ix.abs_diff(c.ix) <= range && key.iy.abs_diff(c.iy) <= range {
                    out.extend(ids.iter().copied());
                }
            }
            return out;
        }

        for ix in c.ix.saturating_sub(range)..=c.ix.saturating_add(range) {
            for iy in c.iy.saturating_sub(range)..=c.iy.saturating_add(range) {
                if let Some(ids) = grid.get(&TileKey { ix, iy }) {
                    out.extend(ids.iter().copied());
                }
            }
        }
        out
    }
}

impl fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("key", &self.key)
            .field("tile_side", &self.tile_side)
            .field("state", &self.state())
            .field("tiles", &self.tile_count())
            .finish()
    }
}

// ── Build internals ───────────────────────────────────────────────────────────

/// Tiles touched by one link.
///
/// Samples are at most one tile side apart, so two consecutive samples sit
/// in the same or adjacent tiles; the segment between them stays inside
/// their bounding tile range, which is emitted in full.
pub(crate) fn link_tiles(link: &RoadLink, tile_side: f64) -> Vec<TileKey> {
    let samples = link.geometry.densify(tile_side);
    let mut keys = Vec::with_capacity(samples.len() * 2);
    for w in samples.windows(2) {
        let a = TileKey::of(w[0], tile_side);
        let b = TileKey::of(w[1], tile_side);
        for ix in a.ix.min(b.ix)..=a.ix.max(b.ix) {
            for iy in a.iy.min(b.iy)..=a.iy.max(b.iy) {
                keys.push(TileKey { ix, iy });
            }
        }
    }
    keys.sort_unstable();
    keys.dedup();
    keys
}

/// Sample every link and gather `tile → link indices`.
///
/// Links are split into at most `max_workers` contiguous chunks; each worker
/// only reads its own chunk and returns its own pairs.
pub(crate) fn stage_tiles(
    links:       &[RoadLink],
    tile_side:   f64,
    max_workers: usize,
) -> FxHashMap<TileKey, Vec<usize>> {
    let workers = max_workers.clamp(1, links.len().max(1));
    let chunk = links.len().div_ceil(workers).max(1);

    let sample_chunk = |(n, chunk_links): (usize, &[RoadLink])| -> Vec<(TileKey, usize)> {
        let offset = n * chunk;
        chunk_links
            .iter()
            .enumerate()
            .flat_map(|(i, link)| {
                link_tiles(link, tile_side)
                    .into_iter()
                    .map(move |key| (key, offset + i))
            })
            .collect()
    };

    let batches: Vec<Vec<(TileKey, usize)>> = if workers > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool.install(|| {
                links.par_chunks(chunk).enumerate().map(sample_chunk).collect()
            }),
            Err(e) => {
                warn!("could not start {workers} index workers ({e}); building on one thread");
                links.chunks(chunk).enumerate().map(sample_chunk).collect()
            }
        }
    } else {
        links.chunks(chunk).enumerate().map(sample_chunk).collect()
    };

    let mut staging: FxHashMap<TileKey, Vec<usize>> = FxHashMap::default();
    for (key, link) in batches.into_iter().flatten() {
        staging.entry(key).or_default().push(link);
    }
    debug!("staged {} tiles from {} links on {} worker(s)", staging.len(), links.len(), workers);
    staging
}

/// Move staged tiles into an immutable grid.
///
/// Returns the grid and the number of tile keys that were seen more than
/// once; any such collision makes the build unusable.
pub(crate) fn finalize_tiles(
    staging: impl IntoIterator<Item = (TileKey, Vec<usize>)>,
) -> (TileGrid, usize) {
    let mut grid = TileGrid::default();
    let mut conflicts = 0;
    for (key, mut ids) in staging {
        ids.sort_unstable();
        ids.dedup();
        if grid.tiles.insert(key, ids.into_boxed_slice()).is_some() {
            warn!("tile {key} finalized twice");
            conflicts += 1;
        }
    }
    (grid, conflicts)
}
