//! Navigation session: view sequencing from discovery to consumption.
//!
//! # Responsibility
//! - `state`: the owned session value and its views.
//! - `machine`: pure transition function over (session, event).
//! - `controller`: applies transitions and runs their store side effects.
//!
//! # Invariants
//! - The session is only changed by committing a transition result.
//! - Entering `Reveal` consumes the selected drop exactly once, before the
//!   message becomes readable.

pub mod controller;
pub mod machine;
pub mod state;
