//! `rp-search` — shortest paths over directional road links.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`astar`]    | `PathFinder` trait, `AStar`, `find_path`, `FindPath`      |
//! | [`result`]   | `SearchResult`, `SearchStats`                             |
//! | [`error`]    | `SearchError`, `PathResult<T>`                            |
//! | `frontier`   | ordered open set (private)                                |
//! | `tree`       | arena search tree (private)                               |
//!
//! Each query owns its own tree and frontier, so a shared `&RoadNetwork` can
//! serve any number of searches at once.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on `SearchResult`.         |

pub mod astar;
pub mod error;
pub mod result;

mod frontier;
mod tree;


pub use astar::{AStar, FindPath, PathFinder, find_path};
pub use error::{PathResult, SearchError};
pub use result::{SearchResult, SearchStats};
