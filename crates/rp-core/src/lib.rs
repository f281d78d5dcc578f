//! `rp-core` — foundational types for the `roadpath` workspace.
//!
//! This crate is a dependency of every other `rp-*` crate and has no `rp-*`
//! dependencies of its own.
//!
//! # What lives here
//!
//! | Module    | Contents                                                 |
//! |-----------|----------------------------------------------------------|
//! | [`ids`]   | `LinkId`, `NodeId`, `DirectionalLinkId`                  |
//! | [`geo`]   | `PlanarPoint`, `Polyline`, `CoordinateSystem`            |
//! | [`error`] | `CoreError`, `CoreResult`                                |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod geo;
pub mod ids;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use geo::{CoordinateSystem, PlanarPoint, Polyline};
pub use ids::{DirectionalLinkId, LinkId, NodeId};
