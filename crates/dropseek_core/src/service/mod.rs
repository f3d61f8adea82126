//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate drop collection calls into lifecycle operations.
//! - Keep session and invoker layers decoupled from storage details.

pub mod cleanup;
pub mod drop_service;
