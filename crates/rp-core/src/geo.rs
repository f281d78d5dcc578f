//! Planar coordinate types and polyline utilities.
//!
//! All link geometry lives in a projected (planar) coordinate system whose
//! unit is the metre, so distances are plain Euclidean distances.  Converting
//! to geographic coordinates for display is the caller's job; the
//! [`CoordinateSystem`] code is carried along so it knows which projection
//! to invert.
//!
//! Segment distance uses `rstar`'s `Line` primitive rather than a hand-rolled
//! projection.

use std::fmt;

use rstar::PointDistance;
use rstar::primitives::Line;

use crate::{CoreError, CoreResult};

// ── CoordinateSystem ──────────────────────────────────────────────────────────

/// Planar coordinate reference system, identified by its EPSG code.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoordinateSystem(pub u32);

impl CoordinateSystem {
    /// Korea 2000 / Unified CS, the projection used by the national node/link
    /// data set.
    pub const KOREA_2000_UNIFIED: CoordinateSystem = CoordinateSystem(5179);

    /// Web Mercator.
    pub const WEB_MERCATOR: CoordinateSystem = CoordinateSystem(3857);
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

// ── PlanarPoint ───────────────────────────────────────────────────────────────

/// A point in a planar coordinate system, in metres.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
}

impl PlanarPoint {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Straight-line distance in metres.
    #[inline]
    pub fn distance(self, other: PlanarPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Point at fraction `t` of the way from `self` to `other`.
    #[inline]
    pub fn lerp(self, other: PlanarPoint, t: f64) -> PlanarPoint {
        PlanarPoint::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    #[inline]
    fn as_array(self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl fmt::Display for PlanarPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// Distance from `p` to the closed segment `a`–`b`.
pub fn segment_distance(p: PlanarPoint, a: PlanarPoint, b: PlanarPoint) -> f64 {
    if a == b {
        return p.distance(a);
    }
    Line::new(a.as_array(), b.as_array())
        .distance_2(&p.as_array())
        .sqrt()
}

// ── Polyline ──────────────────────────────────────────────────────────────────

/// An ordered sequence of at least two points in one coordinate system.
///
/// The first point is the start node of the link it belongs to, the last is
/// the end node.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawPolyline"))]
pub struct Polyline {
    crs: CoordinateSystem,
    points: Vec<PlanarPoint>,
}

/// Unchecked wire form; deserialized polylines go through [`Polyline::new`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawPolyline {
    crs: CoordinateSystem,
    points: Vec<PlanarPoint>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawPolyline> for Polyline {
    type Error = CoreError;

    fn try_from(raw: RawPolyline) -> CoreResult<Self> {
        Polyline::new(raw.crs, raw.points)
    }
}

impl Polyline {
    /// Validate and wrap `points`.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidGeometry`] if there are fewer than two points or any
    /// coordinate is NaN/infinite.
    pub fn new(crs: CoordinateSystem, points: Vec<PlanarPoint>) -> CoreResult<Self> {
        if points.len() < 2 {
            return Err(CoreError::InvalidGeometry {
                reason: format!("polyline needs at least 2 points, got {}", points.len()),
            });
        }
        if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
            return Err(CoreError::InvalidGeometry {
                reason: format!("non-finite coordinate {bad:?}"),
            });
        }
        Ok(Self { crs, points })
    }

    pub fn crs(&self) -> CoordinateSystem {
        self.crs
    }

    pub fn points(&self) -> &[PlanarPoint] {
        &self.points
    }

    pub fn first(&self) -> PlanarPoint {
        self.points[0]
    }

    pub fn last(&self) -> PlanarPoint {
        self.points[self.points.len() - 1]
    }

    /// Sum of segment lengths in metres.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// Same geometry traversed end → start.
    pub fn reversed(&self) -> Polyline {
        let mut points = self.points.clone();
        points.reverse();
        Polyline { crs: self.crs, points }
    }

    /// Shortest distance from `p` to any point on the polyline.
    pub fn distance_to(&self, p: PlanarPoint) -> f64 {
        self.points
            .windows(2)
            .map(|w| segment_distance(p, w[0], w[1]))
            .fold(f64::INFINITY, f64::min)
    }

    /// Resample so that consecutive points are at most `max_spacing` apart.
    ///
    /// Every original vertex is kept; extra points are inserted evenly along
    /// each segment.  A non-positive spacing returns the original vertices.
    pub fn densify(&self, max_spacing: f64) -> Vec<PlanarPoint> {
        if max_spacing.is_nan() || max_spacing <= 0.0 {
            return self.points.clone();
        }
        let mut out = Vec::with_capacity(self.points.len());
        for w in self.points.windows(2) {
            let (a, b) = (w[0], w[1]);
            let steps = (a.distance(b) / max_spacing).ceil().max(1.0) as usize;
            for i in 0..steps {
                out.push(a.lerp(b, i as f64 / steps as f64));
            }
        }
        out.push(self.last());
        out
    }

    /// Append `other` to `self`, dropping `other`'s first point when it
    /// duplicates `self`'s last one (the shared node at a link junction).
    pub fn extend_joined(&mut self, other: &[PlanarPoint]) {
        let skip = match (self.points.last(), other.first()) {
            (Some(a), Some(b)) if a == b => 1,
            _ => 0,
        };
        self.points.extend_from_slice(&other[skip..]);
    }
}
