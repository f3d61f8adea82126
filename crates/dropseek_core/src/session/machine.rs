//! Navigation state machine.
//!
//! # Responsibility
//! - Map (session, event) to the successor session plus at most one store
//!   action the caller must complete before committing it.
//!
//! # Invariants
//! - `transition` is pure: it never touches the store or the input session.
//! - Every (view, event) pair has an answer: a `Step`, or a
//!   `TransitionError` that leaves the session as it was.
//! - A step into `Reveal` always carries `Action::Consume` for the selected
//!   drop; a repeated `RevealEntered` for the same drop carries none.

use crate::geo::direction::DirectionProjector;
use crate::geo::math::distance_m;
use crate::geo::proximity::DiscoveryEntry;
use crate::model::coordinate::Coordinate;
use crate::model::drop::{DropDraft, DropId};
use crate::sensor::SensorError;
use crate::service::drop_service::verify_password;
use crate::session::state::{Notice, Session, ViewState};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input delivered to the session, one at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    LocationFix(Coordinate),
    LocationFailed(SensorError),
    SelectDrop(DiscoveryEntry),
    StartCompose,
    Submit(DropDraft),
    Cancel,
    OpenRequested,
    SubmitPassword(String),
    /// Reveal screen became visible; duplicates are harmless.
    RevealEntered,
    Back,
}

impl NavEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LocationFix(_) => "location_fix",
            Self::LocationFailed(_) => "location_failed",
            Self::SelectDrop(_) => "select_drop",
            Self::StartCompose => "start_compose",
            Self::Submit(_) => "submit",
            Self::Cancel => "cancel",
            Self::OpenRequested => "open_requested",
            Self::SubmitPassword(_) => "submit_password",
            Self::RevealEntered => "reveal_entered",
            Self::Back => "back",
        }
    }
}

/// Store side effect that must succeed before the step is committed.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    CreateDrop {
        draft: DropDraft,
        origin: Coordinate,
    },
    Consume(DropId),
}

/// Result of one accepted transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub next: Session,
    pub action: Option<Action>,
}

impl Step {
    fn to(next: Session) -> Self {
        Self { next, action: None }
    }

    fn with_action(next: Session, action: Action) -> Self {
        Self {
            next,
            action: Some(action),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionError {
    /// Event has no meaning in the current view.
    NotAllowed {
        view: ViewState,
        event: &'static str,
    },
    /// User events before a location fix, or compose without a location.
    LocationUnavailable,
    /// View requires a selected drop but none is set.
    NoSelection,
    /// Open requested outside the open distance.
    TooFar { distance_m: f64 },
}

impl Display for TransitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAllowed { view, event } => {
                write!(f, "event `{event}` is not allowed in view {view:?}")
            }
            Self::LocationUnavailable => write!(f, "location is not available yet"),
            Self::NoSelection => write!(f, "no drop is selected"),
            Self::TooFar { distance_m } => {
                write!(f, "drop is {distance_m:.1} m away; move closer to open it")
            }
        }
    }
}

impl Error for TransitionError {}

/// Pure transition rules for a navigation session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationStateMachine {
    projector: DirectionProjector,
}

impl NavigationStateMachine {
    /// `projector` supplies the open-distance rule for `OpenRequested`.
    pub fn new(projector: DirectionProjector) -> Self {
        Self { projector }
    }

    pub fn projector(&self) -> &DirectionProjector {
        &self.projector
    }

    /// Computes the successor of `session` for `event`.
    pub fn transition(
        &self,
        session: &Session,
        event: NavEvent,
    ) -> Result<Step, TransitionError> {
        let mut next = session.clone();

        match event {
            NavEvent::LocationFix(coordinate) => match coordinate.present() {
                Some(coordinate) => {
                    next.location = Some(coordinate);
                    next.location_ready = true;
                    if next.notice == Some(Notice::LocationUnavailable) {
                        next.notice = None;
                    }
                    if next.view == ViewState::AwaitingLocation {
                        next.view = ViewState::Discovery;
                    }
                    if let Some(entry) = next.selected.as_mut() {
                        *entry = DiscoveryEntry::locate(&coordinate, &entry.drop);
                    }
                    Ok(Step::to(next))
                }
                None => Ok(Step::to(location_failed(next))),
            },
            NavEvent::LocationFailed(_) => Ok(Step::to(location_failed(next))),
            _ if session.view == ViewState::AwaitingLocation => {
                Err(TransitionError::LocationUnavailable)
            }
            event => self.user_transition(next, event),
        }
    }

    fn user_transition(
        &self,
        mut next: Session,
        event: NavEvent,
    ) -> Result<Step, TransitionError> {
        let view = next.view;
        // Notices describe the previous event only.
        next.notice = None;

        match (view, event) {
            (ViewState::Discovery, NavEvent::SelectDrop(entry)) => {
                let entry = match next.location {
                    Some(location) => DiscoveryEntry::locate(&location, &entry.drop),
                    None => entry,
                };
                next.selected = Some(entry);
                next.view = ViewState::Navigate;
                Ok(Step::to(next))
            }
            (ViewState::Discovery, NavEvent::StartCompose) => {
                next.view = ViewState::Compose;
                Ok(Step::to(next))
            }
            (ViewState::Compose, NavEvent::Submit(draft)) => {
                let origin = next.location.ok_or(TransitionError::LocationUnavailable)?;
                next.view = ViewState::Discovery;
                Ok(Step::with_action(next, Action::CreateDrop { draft, origin }))
            }
            (ViewState::Compose, NavEvent::Cancel) => {
                next.view = ViewState::Discovery;
                Ok(Step::to(next))
            }
            (ViewState::Navigate, NavEvent::OpenRequested) => {
                let entry = next.selected.as_ref().ok_or(TransitionError::NoSelection)?;
                let distance = match next.location {
                    Some(location) => distance_m(&location, &entry.drop.location),
                    None => f64::INFINITY,
                };
                if !self.projector.can_open(distance) {
                    return Err(TransitionError::TooFar {
                        distance_m: distance,
                    });
                }
                if entry.drop.is_locked() {
                    next.view = ViewState::Unlock;
                    Ok(Step::to(next))
                } else {
                    enter_reveal(next)
                }
            }
            (ViewState::Navigate, NavEvent::Back) => {
                next.selected = None;
                next.view = ViewState::Discovery;
                Ok(Step::to(next))
            }
            (ViewState::Unlock, NavEvent::SubmitPassword(attempt)) => {
                let entry = next.selected.as_ref().ok_or(TransitionError::NoSelection)?;
                match verify_password(&entry.drop, &attempt) {
                    Ok(()) => enter_reveal(next),
                    Err(_) => {
                        next.notice = Some(Notice::IncorrectPassword);
                        Ok(Step::to(next))
                    }
                }
            }
            (ViewState::Unlock, NavEvent::Back) => {
                next.view = ViewState::Navigate;
                Ok(Step::to(next))
            }
            (ViewState::Reveal, NavEvent::RevealEntered) => {
                let id = next
                    .selected
                    .as_ref()
                    .map(|entry| entry.drop.id)
                    .ok_or(TransitionError::NoSelection)?;
                if next.consumed == Some(id) {
                    return Ok(Step::to(next));
                }
                next.consumed = Some(id);
                Ok(Step::with_action(next, Action::Consume(id)))
            }
            (ViewState::Reveal, NavEvent::Back) => {
                next.selected = None;
                next.consumed = None;
                next.view = ViewState::Discovery;
                Ok(Step::to(next))
            }
            (view, event) => Err(TransitionError::NotAllowed {
                view,
                event: event.name(),
            }),
        }
    }
}

fn enter_reveal(mut next: Session) -> Result<Step, TransitionError> {
    let id = next
        .selected
        .as_ref()
        .map(|entry| entry.drop.id)
        .ok_or(TransitionError::NoSelection)?;
    next.view = ViewState::Reveal;
    next.consumed = Some(id);
    Ok(Step::with_action(next, Action::Consume(id)))
}

fn location_failed(mut next: Session) -> Session {
    // After the first fix the last known location stays usable.
    if !next.location_ready {
        next.notice = Some(Notice::LocationUnavailable);
    }
    next
}
