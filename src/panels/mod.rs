//! Page view-models. Each panel owns the state of its dialog surface and
//! talks to the controller through the shared [`CommandClient`](crate::client::CommandClient).

pub mod scenarios;
pub mod variables;

use serde::Serialize;
use ts_rs::TS;

use crate::error::AppError;

pub use scenarios::{EditOutcome, ScenarioPanel};
pub use variables::{VariableRow, VariablesPanel};

/// Which dialog a panel has open, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, TS)]
#[ts(export)]
pub enum SurfaceState {
    #[default]
    Closed,
    Fetching,
    Editing,
    Saving,
    ConfirmDelete,
    Deleting,
}

impl SurfaceState {
    pub fn name(self) -> &'static str {
        match self {
            SurfaceState::Closed => "closed",
            SurfaceState::Fetching => "fetching",
            SurfaceState::Editing => "editing",
            SurfaceState::Saving => "saving",
            SurfaceState::ConfirmDelete => "confirm-delete",
            SurfaceState::Deleting => "deleting",
        }
    }
}

/// The single dialog surface of a panel. Every open bumps the session id so
/// replies for a closed or replaced dialog can be recognised and dropped.
#[derive(Debug)]
pub(crate) struct Surface<K> {
    state: SurfaceState,
    session: u64,
    subject: Option<K>,
}

impl<K> Default for Surface<K> {
    fn default() -> Self {
        Self {
            state: SurfaceState::Closed,
            session: 0,
            subject: None,
        }
    }
}

impl<K: Clone> Surface<K> {
    pub(crate) fn state(&self) -> SurfaceState {
        self.state
    }

    pub(crate) fn subject(&self) -> Option<&K> {
        self.subject.as_ref()
    }

    /// Open the surface in `state` for `subject`. Fails with `Busy` when
    /// another dialog is open.
    pub(crate) fn open(&mut self, state: SurfaceState, subject: K) -> Result<u64, AppError> {
        if self.state != SurfaceState::Closed {
            return Err(AppError::Busy {
                surface: self.state.name().to_string(),
            });
        }
        self.session += 1;
        self.state = state;
        self.subject = Some(subject);
        Ok(self.session)
    }

    /// Move from `from` to `to` within the current session, returning the
    /// session id and subject.
    pub(crate) fn advance(&mut self, from: SurfaceState, to: SurfaceState) -> Result<(u64, K), AppError> {
        match (&self.subject, self.state) {
            (Some(subject), state) if state == from => {
                let subject = subject.clone();
                self.state = to;
                Ok((self.session, subject))
            }
            (_, SurfaceState::Closed) => Err(AppError::NotFound {
                what: format!("Open {} dialog", from.name()),
            }),
            (_, state) => Err(AppError::Busy {
                surface: state.name().to_string(),
            }),
        }
    }

    /// Whether a reply for `session`, sent while in `state`, still applies.
    pub(crate) fn is_current(&self, session: u64, state: SurfaceState) -> bool {
        self.session == session && self.state == state
    }

    pub(crate) fn settle(&mut self, to: SurfaceState) {
        self.state = to;
        if to == SurfaceState::Closed {
            self.subject = None;
        }
    }

    /// Close whatever is open. Outstanding replies become stale.
    pub(crate) fn cancel(&mut self) {
        self.session += 1;
        self.settle(SurfaceState::Closed);
    }
}
