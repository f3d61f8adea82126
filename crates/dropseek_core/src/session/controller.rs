//! Session controller: the single-threaded event loop body.
//!
//! # Responsibility
//! - Feed sensor readings and user events through the state machine.
//! - Run the store action a transition asks for, then commit the transition.
//! - Keep a local drop snapshot for discovery and the latest heading for
//!   guidance.
//!
//! # Invariants
//! - One event is fully processed (including its store action) before
//!   `handle` returns; callers must await it before delivering the next.
//! - A transition whose action fails is not committed.
//! - Guidance always uses the most recent location and heading.

use crate::clock::now_epoch_ms;
use crate::config::EngineConfig;
use crate::geo::direction::{DirectionProjector, Projection};
use crate::geo::math::normalize_deg;
use crate::geo::proximity::{nearby, DiscoveryEntry};
use crate::model::drop::DropRecord;
use crate::repo::drop_store::DropStore;
use crate::sensor::SensorEvent;
use crate::service::drop_service::{DropError, DropService};
use crate::session::machine::{Action, NavEvent, NavigationStateMachine, TransitionError};
use crate::session::state::{Session, ViewState};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum SessionError {
    Transition(TransitionError),
    Drop(DropError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transition(err) => write!(f, "{err}"),
            Self::Drop(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transition(err) => Some(err),
            Self::Drop(err) => Some(err),
        }
    }
}

impl From<TransitionError> for SessionError {
    fn from(value: TransitionError) -> Self {
        Self::Transition(value)
    }
}

impl From<DropError> for SessionError {
    fn from(value: DropError) -> Self {
        Self::Drop(value)
    }
}

/// Anything the session reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Sensor(SensorEvent),
    User(NavEvent),
}

/// Owns one user's session and drives it against a drop collection.
pub struct SessionController<S: DropStore> {
    machine: NavigationStateMachine,
    service: DropService<S>,
    session: Session,
    drops: Vec<DropRecord>,
    heading_deg: Option<f64>,
    discovery_radius_m: f64,
    clock: fn() -> i64,
}

impl<S: DropStore> SessionController<S> {
    pub fn new(service: DropService<S>, config: &EngineConfig) -> Self {
        Self {
            machine: NavigationStateMachine::new(config.projector()),
            service,
            session: Session::new(),
            drops: Vec::new(),
            heading_deg: None,
            discovery_radius_m: config.discovery_radius_m,
            clock: now_epoch_ms,
        }
    }

    /// Replaces the wall clock used to stamp new drops.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn view(&self) -> ViewState {
        self.session.view()
    }

    pub fn service(&self) -> &DropService<S> {
        &self.service
    }

    pub fn projector(&self) -> &DirectionProjector {
        self.machine.projector()
    }

    /// Local snapshot of the drop collection.
    pub fn drops(&self) -> &[DropRecord] {
        &self.drops
    }

    pub fn heading_deg(&self) -> Option<f64> {
        self.heading_deg
    }

    /// Replaces the local snapshot with the collection's current contents.
    pub async fn refresh_drops(&mut self) -> Result<usize, SessionError> {
        self.drops = self.service.list_drops().await?;
        debug!(
            "event=snapshot_refresh module=session status=ok drop_count={}",
            self.drops.len()
        );
        Ok(self.drops.len())
    }

    /// Drops within the discovery radius of the last known location.
    pub fn discoveries(&self) -> Vec<DiscoveryEntry> {
        nearby(
            self.session.location().as_ref(),
            &self.drops,
            self.discovery_radius_m,
        )
    }

    /// Directional guidance toward the selected drop.
    ///
    /// `None` when nothing is selected or no location is known.
    pub fn guidance(&self) -> Option<Projection> {
        let entry = self.session.selected()?;
        let location = self.session.location()?;
        Some(
            self.projector()
                .project(&location, &entry.drop.location, self.heading_deg),
        )
    }

    /// Processes one event to completion.
    pub async fn handle(&mut self, event: SessionEvent) -> Result<ViewState, SessionError> {
        match event {
            SessionEvent::Sensor(SensorEvent::Heading(heading)) => {
                self.heading_deg = heading.is_finite().then(|| normalize_deg(heading));
                Ok(self.view())
            }
            SessionEvent::Sensor(SensorEvent::Location(coordinate)) => {
                self.dispatch(NavEvent::LocationFix(coordinate)).await
            }
            SessionEvent::Sensor(SensorEvent::LocationError(err)) => {
                self.dispatch(NavEvent::LocationFailed(err)).await
            }
            SessionEvent::User(event) => self.dispatch(event).await,
        }
    }

    /// Applies one state-machine event, running its store action first.
    ///
    /// # Errors
    /// - `Transition` when the event is not allowed; the session is unchanged.
    /// - `Drop(InvalidInput | StoreUnavailable)` when the action fails; the
    ///   session is unchanged.
    /// - `Drop(IncorrectPassword)` for the wrong `SubmitPassword` itself; the
    ///   session stays in `Unlock` with the notice set. Later events that
    ///   leave the notice in place still succeed.
    pub async fn dispatch(&mut self, event: NavEvent) -> Result<ViewState, SessionError> {
        let event_name = event.name();
        let from = self.session.view();
        let unlock = self.unlock_attempt(&event);
        let step = self.machine.transition(&self.session, event)?;

        if let Some(action) = step.action {
            self.run_action(action).await?;
        }
        self.session = step.next;

        if from != self.session.view() {
            info!(
                "event=view_transition module=session status=ok trigger={event_name} from={from:?} to={:?}",
                self.session.view()
            );
        }
        if let Some(Err(err)) = unlock {
            return Err(err.into());
        }
        Ok(self.session.view())
    }

    /// Runs the lifecycle unlock check for a password submitted in `Unlock`.
    fn unlock_attempt(&self, event: &NavEvent) -> Option<Result<(), DropError>> {
        match (event, self.session.view(), self.session.selected()) {
            (NavEvent::SubmitPassword(attempt), ViewState::Unlock, Some(entry)) => {
                Some(self.service.unlock(&entry.drop, attempt))
            }
            _ => None,
        }
    }

    async fn run_action(&mut self, action: Action) -> Result<(), DropError> {
        match action {
            Action::CreateDrop { draft, origin } => {
                let created = self
                    .service
                    .create(draft, Some(origin), (self.clock)())
                    .await?;
                self.drops.push(created);
            }
            Action::Consume(id) => {
                self.service.consume(id).await?;
                self.drops.retain(|drop| drop.id != id);
            }
        }
        Ok(())
    }
}
