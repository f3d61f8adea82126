//! Session value and view states.

use crate::geo::proximity::DiscoveryEntry;
use crate::model::coordinate::Coordinate;
use crate::model::drop::DropId;
use serde::Serialize;

/// Active screen of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    /// Pseudo-state before the first location fix; no user transitions.
    AwaitingLocation,
    Discovery,
    Compose,
    Navigate,
    Unlock,
    Reveal,
}

/// User-facing condition attached to the current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    /// No location fix yet; discovery is blocked until one arrives.
    LocationUnavailable,
    /// Last unlock attempt was wrong; input should be cleared.
    IncorrectPassword,
}

/// Process-local navigation state.
///
/// Fields are read-only outside the crate; `NavigationStateMachine` produces
/// successor values and `SessionController` commits them.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub(crate) view: ViewState,
    pub(crate) selected: Option<DiscoveryEntry>,
    pub(crate) location: Option<Coordinate>,
    pub(crate) location_ready: bool,
    pub(crate) notice: Option<Notice>,
    /// Drop already consumed for the current reveal, if any.
    pub(crate) consumed: Option<DropId>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            view: ViewState::AwaitingLocation,
            selected: None,
            location: None,
            location_ready: false,
            notice: None,
            consumed: None,
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn selected(&self) -> Option<&DiscoveryEntry> {
        self.selected.as_ref()
    }

    /// Last known user location.
    pub fn location(&self) -> Option<Coordinate> {
        self.location
    }

    pub fn location_ready(&self) -> bool {
        self.location_ready
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice
    }

    /// Message snapshot of the revealed drop.
    ///
    /// Stays readable after the persisted drop is deleted, until the session
    /// leaves `Reveal`.
    pub fn revealed_message(&self) -> Option<&str> {
        match (self.view, self.selected.as_ref()) {
            (ViewState::Reveal, Some(entry)) => Some(entry.drop.message.as_str()),
            _ => None,
        }
    }

    /// Author of the revealed drop, with the same lifetime as the message.
    pub fn revealed_author(&self) -> Option<&str> {
        match (self.view, self.selected.as_ref()) {
            (ViewState::Reveal, Some(entry)) => Some(entry.drop.author.as_str()),
            _ => None,
        }
    }
}
