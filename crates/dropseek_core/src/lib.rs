//! Core engine for Drop-N-Seek: location-anchored, self-destructing messages.
//!
//! Geo math, discovery and guidance are pure; the lifecycle service and the
//! session controller talk to a [`DropStore`] and never block on it.

pub mod clock;
pub mod config;
pub mod db;
pub mod geo;
pub mod logging;
pub mod model;
pub mod repo;
pub mod sensor;
pub mod service;
pub mod session;

pub use config::{ConfigError, EngineConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use geo::direction::{DirectionMode, DirectionProjector, Offset, Projection};
pub use geo::math::{bearing_deg, distance_m};
pub use geo::proximity::{nearby, DiscoveryEntry};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::coordinate::Coordinate;
pub use model::drop::{DropDraft, DropId, DropRecord, DropValidationError, NewDrop, DROP_TTL_MS};
pub use repo::drop_store::{DropStore, SqliteDropStore, StoreError, StoreResult};
pub use sensor::{
    HeadingSource, HeadingStatus, LocationOptions, LocationSource, SensorError, SensorEvent,
    SensorScope, Subscription,
};
pub use service::cleanup::{run_cleanup, CleanupReport};
pub use service::drop_service::{DropError, DropResult, DropService};
pub use session::controller::{SessionController, SessionError, SessionEvent};
pub use session::machine::{NavEvent, NavigationStateMachine, TransitionError};
pub use session::state::{Notice, Session, ViewState};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
