//! Drop collection contracts and persistence implementations.
//!
//! # Responsibility
//! - Define the async keyed-collection contract the lifecycle service needs.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - The collection only supports append and delete; no in-place updates.
//! - Deletes are idempotent: removing a missing id is not an error.

pub mod drop_store;
