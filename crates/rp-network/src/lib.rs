//! `rp-network` — road graph, connectivity, and spatial indexing.
//!
//! # Crate layout
//!
//! | Module           | Contents                                                |
//! |------------------|---------------------------------------------------------|
//! | [`link`]         | `LinkRecord` (input), `RoadLink` (immutable graph link) |
//! | [`connectivity`] | two-phase stage-then-merge connectivity derivation      |
//! | [`index`]        | `SpatialIndex` (uniform tile grid), `IndexConfig`       |
//! | [`network`]      | `RoadNetwork`, `NetworkInfo`                            |
//! | [`report`]       | `BuildReport`                                           |
//! | [`error`]        | `NetworkError`, `NetworkResult<T>`                      |
//!
//! # Lifecycle
//!
//! ```text
//! RoadNetwork::build(records)   validate + derive connectivity (rayon)
//!        │
//!        ▼
//! network.init(refresh, workers)   build the tile grid under an exclusive lock
//!        │
//!        ▼
//! nearest_links / snap            proximity queries (need a ready index)
//! neighbors / link                graph access (available immediately)
//! ```
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public config/records.  |

pub mod connectivity;
pub mod error;
pub mod index;
pub mod link;
pub mod network;
pub mod report;

#[cfg(test)]
mod tests;

pub use connectivity::ConnectivityStats;
pub use error::{NetworkError, NetworkResult};
pub use index::{IndexConfig, IndexKey, IndexState, SpatialIndex, TileKey};
pub use link::{LinkRecord, RoadLink};
pub use network::{NetworkInfo, RoadNetwork};
pub use report::BuildReport;
