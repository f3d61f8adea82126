//! Domain model for location-anchored drops.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep drop validation next to the data it guards.
//!
//! # Invariants
//! - Every persisted drop is identified by a store-assigned `DropId`.
//! - Drops are never updated in place; they are only inserted and deleted.

pub mod coordinate;
pub mod drop;
