//! Session lifecycle.
//!
//! [`SessionStore`] holds at most one authenticated identity and mirrors it
//! to a durable [`KeyValueStore`] under [`SESSION_KEY`]:
//!
//! ```text
//! Unresolved --hydrate()--> Anonymous | Authenticated(u)
//! any        --login(u)---> Authenticated(u)
//! any        --logout()---> Anonymous
//! ```
//!
//! Every state change is published on a `tokio::sync::watch` channel so
//! consumers can wait for hydration before rendering anything that depends
//! on who is logged in.

mod user;

pub use user::{Preset, Role, SessionUser};

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::normalize::normalize_supplied;
use crate::storage::{KeyValueStore, StoreError};

/// Key of the persisted session record.
pub const SESSION_KEY: &str = "qrSocialUser";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session has not been hydrated yet")]
    Unresolved,

    #[error("Corrupt session record: {0}")]
    CorruptSession(String),

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Durable record not read yet.
    #[default]
    Unresolved,
    Anonymous,
    Authenticated(SessionUser),
}

impl SessionState {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Session context, injected into whatever needs to know who is logged in.
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
    state: watch::Sender<SessionState>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Unresolved);
        Self { backend, state }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// The logged-in user, or `None` when anonymous.
    ///
    /// Fails with [`SessionError::Unresolved`] before [`hydrate`](Self::hydrate).
    pub fn current_user(&self) -> Result<Option<SessionUser>, SessionError> {
        match &*self.state.borrow() {
            SessionState::Unresolved => Err(SessionError::Unresolved),
            SessionState::Anonymous => Ok(None),
            SessionState::Authenticated(user) => Ok(Some(user.clone())),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Read the durable record once and leave the `Unresolved` state.
    ///
    /// An unreadable record is cleared and treated as no session. Calling
    /// this again after hydration is a no-op.
    #[instrument(level = "debug", skip(self))]
    pub fn hydrate(&mut self) -> SessionState {
        if !self.state.borrow().is_unresolved() {
            debug!("Session already hydrated");
            return self.state();
        }

        let next = match self.read_record() {
            Ok(Some(user)) => {
                info!(user_id = %user.id, role = %user.role, "Restored persisted session");
                SessionState::Authenticated(user)
            }
            Ok(None) => {
                debug!("No persisted session");
                SessionState::Anonymous
            }
            Err(e) => {
                warn!(error = %e, "Discarding unreadable session record");
                if let Err(e) = self.backend.remove(SESSION_KEY) {
                    warn!(error = %e, "Failed to clear unreadable session record");
                }
                SessionState::Anonymous
            }
        };

        self.state.send_replace(next.clone());
        next
    }

    /// Persist `user` and become `Authenticated`, replacing any prior user.
    ///
    /// If the durable write fails the in-memory state is left untouched.
    #[instrument(level = "debug", skip_all, fields(user_id = %user.id))]
    pub fn login(&mut self, user: SessionUser) -> Result<SessionUser, SessionError> {
        let user = normalize_supplied(user);
        let record = serde_json::to_string(&user)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.backend.set(SESSION_KEY, &record)?;

        info!(role = %user.role, "Session started");
        self.state
            .send_replace(SessionState::Authenticated(user.clone()));
        Ok(user)
    }

    /// Clear the durable record and become `Anonymous`.
    #[instrument(level = "debug", skip(self))]
    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.backend.remove(SESSION_KEY)?;
        info!("Session ended");
        self.state.send_replace(SessionState::Anonymous);
        Ok(())
    }

    fn read_record(&self) -> Result<Option<SessionUser>, SessionError> {
        let Some(raw) = self.backend.get(SESSION_KEY)? else {
            return Ok(None);
        };

        serde_json::from_str::<SessionUser>(&raw)
            .map(|user| Some(normalize_supplied(user)))
            .map_err(|e| SessionError::CorruptSession(e.to_string()))
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &*self.state.borrow())
            .field("persistent", &self.backend.is_persistent())
            .finish()
    }
}

/// Wait until the store behind `rx` has been hydrated.
///
/// Fails with [`SessionError::Unresolved`] if the store is dropped first.
pub async fn wait_hydrated(
    rx: &mut watch::Receiver<SessionState>,
) -> Result<SessionState, SessionError> {
    rx.wait_for(|state| !state.is_unresolved())
        .await
        .map(|state| state.clone())
        .map_err(|_| SessionError::Unresolved)
}
