//! Great-circle distance and bearing on a spherical Earth.

use crate::model::coordinate::Coordinate;

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between `a` and `b` (haversine).
///
/// Returns `f64::INFINITY` when either coordinate is absent, so callers can
/// compare against a radius without special-casing missing locations.
pub fn distance_m(a: &Coordinate, b: &Coordinate) -> f64 {
    if !a.is_present() || !b.is_present() {
        return f64::INFINITY;
    }

    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let sin_dlat = (delta_lat / 2.0).sin();
    let sin_dlon = (delta_lon / 2.0).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    // Rounding can push `h` a hair outside [0, 1] for antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Initial compass bearing from `a` to `b` in degrees, in `[0, 360)`.
///
/// Returns `0.0` when either coordinate is absent or both are identical.
pub fn bearing_deg(a: &Coordinate, b: &Coordinate) -> f64 {
    if !a.is_present() || !b.is_present() || a == b {
        return 0.0;
    }

    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();
    let theta = y.atan2(x).to_degrees();

    normalize_deg(theta)
}

/// Wraps any finite angle into `[0, 360)`.
///
/// Non-finite input maps to `0.0`.
pub fn normalize_deg(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = ((angle % 360.0) + 360.0) % 360.0;
    // `-1e-15 + 360.0` rounds to exactly 360.0.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
