//! Directional indicator projection.
//!
//! # Responsibility
//! - Turn (distance, bearing, optional heading) into a bounded 2D offset
//!   for either a north-up map indicator or a heading-up radar indicator.
//! - Decide when the user is close enough to open a drop.
//!
//! # Invariants
//! - Offsets stay within the unit disc: `x² + y² <= 1`.
//! - Screen convention: `+x` is right, `+y` is down, so "ahead" is `-y`.
//! - At or inside the open distance the offset is exactly `(0, 0)`.
//! - A missing or non-finite heading never fails; radar falls back to an
//!   un-rotated frame.

use crate::geo::math::{bearing_deg, distance_m, normalize_deg};
use crate::geo::proximity::DEFAULT_DISCOVERY_RADIUS_M;
use crate::model::coordinate::Coordinate;
use serde::{Deserialize, Serialize};

/// Default distance at which a drop may be opened, in meters.
pub const DEFAULT_OPEN_DISTANCE_M: f64 = 15.0;

/// Presentation frame for the directional indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionMode {
    /// True-north-up; heading is ignored.
    Map,
    /// Rotated so "up" is the device's current facing direction.
    Radar,
}

/// Display offset relative to the indicator center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

impl Offset {
    pub const CENTER: Self = Self { x: 0.0, y: 0.0 };
}

/// One projected frame of guidance toward a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    pub distance_m: f64,
    /// Absolute bearing from the user, degrees from true north.
    pub bearing_deg: f64,
    /// Angle the indicator points at, degrees clockwise from screen-up.
    pub rotation_deg: f64,
    pub offset: Offset,
    /// `true` when within the open distance; offset is snapped to center.
    pub arrived: bool,
    /// `true` when a live heading rotated the frame.
    pub heading_applied: bool,
}

/// Projects target positions into indicator space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionProjector {
    mode: DirectionMode,
    max_range_m: f64,
    open_distance_m: f64,
}

impl Default for DirectionProjector {
    fn default() -> Self {
        Self::new(
            DirectionMode::Radar,
            DEFAULT_DISCOVERY_RADIUS_M,
            DEFAULT_OPEN_DISTANCE_M,
        )
    }
}

impl DirectionProjector {
    /// Creates a projector.
    ///
    /// `max_range_m` is the distance mapped to the indicator edge; values that
    /// are not finite and positive make every non-arrived target sit on the edge.
    pub fn new(mode: DirectionMode, max_range_m: f64, open_distance_m: f64) -> Self {
        Self {
            mode,
            max_range_m,
            open_distance_m,
        }
    }

    pub fn mode(&self) -> DirectionMode {
        self.mode
    }

    pub fn max_range_m(&self) -> f64 {
        self.max_range_m
    }

    pub fn open_distance_m(&self) -> f64 {
        self.open_distance_m
    }

    /// Returns whether a target at `distance_m` may be opened.
    pub fn can_open(&self, distance_m: f64) -> bool {
        distance_m <= self.open_distance_m
    }

    /// Projects `target` as seen from `user` with an optional compass heading.
    pub fn project(
        &self,
        user: &Coordinate,
        target: &Coordinate,
        heading_deg: Option<f64>,
    ) -> Projection {
        self.project_polar(
            distance_m(user, target),
            bearing_deg(user, target),
            heading_deg,
        )
    }

    /// Projects an already computed (distance, bearing) pair.
    pub fn project_polar(
        &self,
        distance_m: f64,
        bearing_deg: f64,
        heading_deg: Option<f64>,
    ) -> Projection {
        let bearing = normalize_deg(bearing_deg);
        let heading = match self.mode {
            DirectionMode::Map => None,
            DirectionMode::Radar => heading_deg.filter(|value| value.is_finite()),
        };
        let rotation = match heading {
            Some(heading) => normalize_deg(bearing - heading),
            None => bearing,
        };

        let arrived = self.can_open(distance_m);
        let offset = if arrived {
            Offset::CENTER
        } else {
            let scale = self.distance_scale(distance_m);
            let radians = rotation.to_radians();
            Offset {
                x: scale * radians.sin(),
                y: -scale * radians.cos(),
            }
        };

        Projection {
            distance_m,
            bearing_deg: bearing,
            rotation_deg: rotation,
            offset,
            arrived,
            heading_applied: heading.is_some(),
        }
    }

    /// `clamp(distance / max_range, 0, 1)`, with non-finite cases pinned.
    fn distance_scale(&self, distance_m: f64) -> f64 {
        if distance_m.is_nan() || distance_m == f64::INFINITY {
            return 1.0;
        }
        if !(self.max_range_m.is_finite() && self.max_range_m > 0.0) {
            return if distance_m > 0.0 { 1.0 } else { 0.0 };
        }
        (distance_m / self.max_range_m).clamp(0.0, 1.0)
    }
}
