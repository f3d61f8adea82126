//! Geographic coordinate value type.
//!
//! # Invariants
//! - A coordinate is "present" only when both components are finite.
//! - Absent coordinates are infinitely far from everything; geo functions
//!   never return errors for them.

use serde::{Deserialize, Serialize};

/// WGS84-style latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns whether both components are finite.
    pub fn is_present(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Returns `Some(self)` when present, `None` otherwise.
    pub fn present(self) -> Option<Self> {
        self.is_present().then_some(self)
    }
}
