//! Location and heading source contracts.
//!
//! # Responsibility
//! - Define push-style source traits for device location and heading.
//! - Own the session's sensor subscriptions and release them on drop.
//!
//! # Invariants
//! - Every `Subscription` runs its release hook exactly once.
//! - A missing or denied heading source never blocks location delivery.
//! - A failed location subscribe is reported as an event, so the session sees
//!   `LocationUnavailable` through its normal event path.

use crate::model::coordinate::Coordinate;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// User declined the permission prompt.
    PermissionDenied,
    /// Source is missing, disabled or failed mid-stream.
    Unavailable(String),
}

impl Display for SensorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "sensor permission denied"),
            Self::Unavailable(reason) => write!(f, "sensor unavailable: {reason}"),
        }
    }
}

impl Error for SensorError {}

/// Subscription options for the location source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationOptions {
    pub high_accuracy: bool,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
        }
    }
}

/// One reading pushed by a sensor source.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    Location(Coordinate),
    LocationError(SensorError),
    /// Compass heading in degrees clockwise from true north.
    Heading(f64),
}

pub type SensorSender = UnboundedSender<SensorEvent>;

/// Live registration with a sensor source; releases it when dropped.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Subscription with nothing to release.
    pub fn detached() -> Self {
        Self { release: None }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// Continuous device location provider.
pub trait LocationSource: Send + Sync {
    fn subscribe(
        &self,
        options: LocationOptions,
        events: SensorSender,
    ) -> Result<Subscription, SensorError>;
}

/// Continuous compass heading provider.
pub trait HeadingSource: Send + Sync {
    /// One-time permission grant; sources without a prompt accept by default.
    fn request_permission(&self) -> Result<(), SensorError> {
        Ok(())
    }

    fn subscribe(&self, events: SensorSender) -> Result<Subscription, SensorError>;
}

/// Whether live heading input is flowing for this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadingStatus {
    Active,
    /// No heading source was provided.
    Absent,
    Denied,
    Unavailable(String),
}

/// Session-scoped ownership of sensor subscriptions.
///
/// Dropping the scope releases every subscription it holds.
pub struct SensorScope {
    location_source: Arc<dyn LocationSource>,
    options: LocationOptions,
    events: SensorSender,
    location: Option<Subscription>,
    heading: Option<Subscription>,
    heading_status: HeadingStatus,
}

impl SensorScope {
    /// Subscribes to location (and heading, when a source is given).
    ///
    /// Returns the scope and the receiving end of the merged event stream.
    pub fn acquire(
        location_source: Arc<dyn LocationSource>,
        heading_source: Option<Arc<dyn HeadingSource>>,
        options: LocationOptions,
    ) -> (Self, UnboundedReceiver<SensorEvent>) {
        let (events, receiver) = unbounded_channel();
        let mut scope = Self {
            location_source,
            options,
            events,
            location: None,
            heading: None,
            heading_status: HeadingStatus::Absent,
        };

        scope.subscribe_location();
        if let Some(source) = heading_source {
            scope.subscribe_heading(source.as_ref());
        }
        info!(
            "event=sensor_acquire module=sensor status=ok location={} heading={:?}",
            scope.location.is_some(),
            scope.heading_status
        );

        (scope, receiver)
    }

    /// Replaces the location subscription, typically after a stream error.
    pub fn resubscribe_location(&mut self) -> bool {
        self.location = None;
        self.subscribe_location();
        self.location.is_some()
    }

    pub fn location_active(&self) -> bool {
        self.location.is_some()
    }

    pub fn heading_status(&self) -> &HeadingStatus {
        &self.heading_status
    }

    fn subscribe_location(&mut self) {
        match self
            .location_source
            .subscribe(self.options, self.events.clone())
        {
            Ok(subscription) => self.location = Some(subscription),
            Err(err) => {
                warn!("event=sensor_subscribe module=sensor status=error kind=location error={err}");
                if self.events.send(SensorEvent::LocationError(err)).is_err() {
                    debug!("event=sensor_event module=sensor status=dropped kind=location_error reason=receiver_closed");
                }
            }
        }
    }

    fn subscribe_heading(&mut self, source: &dyn HeadingSource) {
        if let Err(err) = source.request_permission() {
            warn!("event=sensor_permission module=sensor status=degraded kind=heading error={err}");
            self.heading_status = match err {
                SensorError::PermissionDenied => HeadingStatus::Denied,
                SensorError::Unavailable(reason) => HeadingStatus::Unavailable(reason),
            };
            return;
        }

        match source.subscribe(self.events.clone()) {
            Ok(subscription) => {
                self.heading = Some(subscription);
                self.heading_status = HeadingStatus::Active;
            }
            Err(err) => {
                warn!("event=sensor_subscribe module=sensor status=degraded kind=heading error={err}");
                self.heading_status = match err {
                    SensorError::PermissionDenied => HeadingStatus::Denied,
                    SensorError::Unavailable(reason) => HeadingStatus::Unavailable(reason),
                };
            }
        }
    }
}

impl Drop for SensorScope {
    fn drop(&mut self) {
        let had_location = self.location.take().is_some();
        let had_heading = self.heading.take().is_some();
        info!(
            "event=sensor_release module=sensor status=ok location={had_location} heading={had_heading}"
        );
    }
}
