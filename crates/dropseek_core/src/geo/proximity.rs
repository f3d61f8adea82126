//! Discovery ranking over a drop snapshot.
//!
//! # Invariants
//! - Output never contains an entry farther than the requested radius.
//! - Output is sorted by ascending distance; ties keep snapshot order.
//! - The input snapshot is only borrowed.

use crate::geo::math::{bearing_deg, distance_m};
use crate::model::coordinate::Coordinate;
use crate::model::drop::DropRecord;
use serde::Serialize;

/// Default discovery radius in meters.
pub const DEFAULT_DISCOVERY_RADIUS_M: f64 = 1000.0;

/// A drop annotated with its position relative to the searching user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryEntry {
    pub drop: DropRecord,
    /// Great-circle distance in meters.
    pub distance_m: f64,
    /// Initial bearing from the user, degrees clockwise from true north.
    pub bearing_deg: f64,
}

impl DiscoveryEntry {
    /// Annotates one drop relative to `origin`.
    pub fn locate(origin: &Coordinate, drop: &DropRecord) -> Self {
        Self {
            distance_m: distance_m(origin, &drop.location),
            bearing_deg: bearing_deg(origin, &drop.location),
            drop: drop.clone(),
        }
    }
}

/// Returns drops within `radius_m` of `origin`, closest first.
///
/// Absent `origin` (or a non-finite one) yields an empty list because every
/// distance is infinite.
pub fn nearby(
    origin: Option<&Coordinate>,
    drops: &[DropRecord],
    radius_m: f64,
) -> Vec<DiscoveryEntry> {
    let Some(origin) = origin.filter(|origin| origin.is_present()) else {
        return Vec::new();
    };

    let mut entries: Vec<DiscoveryEntry> = drops
        .iter()
        .filter_map(|drop| {
            let distance = distance_m(origin, &drop.location);
            (distance.is_finite() && distance <= radius_m).then(|| DiscoveryEntry {
                drop: drop.clone(),
                distance_m: distance,
                bearing_deg: bearing_deg(origin, &drop.location),
            })
        })
        .collect();

    // `sort_by` is stable, which keeps snapshot order for equal distances.
    entries.sort_by(|left, right| left.distance_m.total_cmp(&right.distance_m));
    entries
}
