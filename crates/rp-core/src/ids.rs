//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  Link and node ids come from the
//! source road-network data set, so they are signed 64-bit integers rather
//! than dense indices.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// The raw integer value.
            #[inline(always)]
            pub fn get(self) -> $inner {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$inner> for $name {
            #[inline(always)]
            fn from(raw: $inner) -> $name {
                $name(raw)
            }
        }
    };
}

typed_id! {
    /// Identifier of a road link, as assigned by the source data set.
    ///
    /// Must be non-zero: the sign of a [`DirectionalLinkId`] carries the
    /// travel direction, and zero has no sign.
    pub struct LinkId(i64);
}

typed_id! {
    /// Identifier of a road node (a link endpoint shared by other links).
    pub struct NodeId(i64);
}

// ── DirectionalLinkId ─────────────────────────────────────────────────────────

/// Travel across one link in one direction.
///
/// Magnitude = link id; sign = direction.  Positive means start node → end
/// node, negative means end node → start node.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectionalLinkId(pub i64);

impl DirectionalLinkId {
    /// Travel `link` from its start node to its end node.
    #[inline]
    pub fn forward(link: LinkId) -> Self {
        Self(link.0.abs())
    }

    /// Travel `link` from its end node to its start node.
    #[inline]
    pub fn backward(link: LinkId) -> Self {
        Self(-link.0.abs())
    }

    /// The undirected link this id travels over.
    #[inline]
    pub fn link(self) -> LinkId {
        LinkId(self.0.abs())
    }

    #[inline]
    pub fn is_forward(self) -> bool {
        self.0 > 0
    }

    /// The same link travelled the other way.
    #[inline]
    pub fn reversed(self) -> Self {
        Self(-self.0)
    }

    #[inline(always)]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for DirectionalLinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.0)
    }
}

impl From<i64> for DirectionalLinkId {
    #[inline(always)]
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}
