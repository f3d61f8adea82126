//! Pure geodesic computations used by discovery and guidance.
//!
//! # Responsibility
//! - Great-circle distance and initial bearing between coordinates.
//! - Ranked proximity filtering over a drop snapshot.
//! - Projection of (distance, bearing, heading) into a display offset.
//!
//! # Invariants
//! - Every function here is total: absent inputs produce sentinel values
//!   (infinite distance, zero bearing), never errors or panics.
//! - Nothing in this module performs I/O or mutates its inputs.

pub mod direction;
pub mod math;
pub mod proximity;
