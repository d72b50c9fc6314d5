//! Caller-facing authentication operations.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::capture::{CaptureLoop, CaptureOutcome};
use crate::dataset::DatasetSource;
use crate::error::{AuthError, Result};
use crate::matcher::GuestResolver;
use crate::normalize::normalize;
use crate::session::{Preset, SessionState, SessionStore, SessionUser};
use crate::storage::KeyValueStore;

/// Wires guest lookup to the session store.
///
/// Every successful login goes through [`SessionStore::login`], so the
/// persisted record and the published state always agree.
pub struct AuthService {
    resolver: GuestResolver,
    session: SessionStore,
    surface_dataset_errors: bool,
}

impl AuthService {
    pub fn new(source: Arc<dyn DatasetSource>, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_session(GuestResolver::new(source), SessionStore::new(store))
    }

    pub fn with_session(resolver: GuestResolver, session: SessionStore) -> Self {
        Self {
            resolver,
            session,
            surface_dataset_errors: false,
        }
    }

    /// Report dataset failures as [`AuthError::Dataset`] instead of folding
    /// them into [`AuthError::NoMatch`].
    pub fn surface_dataset_errors(mut self, surface: bool) -> Self {
        self.surface_dataset_errors = surface;
        self
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn hydrate_session(&mut self) -> SessionState {
        self.session.hydrate()
    }

    /// Log in the guest whose QR token is `token`.
    #[instrument(level = "debug", skip_all)]
    pub async fn login_with_token(&mut self, token: &str) -> Result<SessionUser> {
        let found = self.resolver.resolve_token(token).await;
        let record = self.degrade(found)?;
        Ok(self.session.login(normalize(&record))?)
    }

    /// Log in the guest whose full name is `name`.
    #[instrument(level = "debug", skip_all)]
    pub async fn login_with_name(&mut self, name: &str) -> Result<SessionUser> {
        let found = self.resolver.resolve_name(name).await;
        let record = self.degrade(found)?;
        Ok(self.session.login(normalize(&record))?)
    }

    /// Log in as one of the built-in demo accounts. No dataset lookup.
    #[instrument(level = "debug", skip(self))]
    pub fn login_as_preset(&mut self, preset: Preset) -> Result<SessionUser> {
        let user = self.session.login(preset.user())?;
        info!(%preset, "Preset login");
        Ok(user)
    }

    pub fn logout(&mut self) -> Result<()> {
        Ok(self.session.logout()?)
    }

    /// Run `capture` until it decodes a token, then log in with it.
    ///
    /// A stopped loop yields [`AuthError::Cancelled`]; a camera failure is
    /// returned as [`AuthError::Capture`].
    pub async fn scan_and_login(&mut self, capture: &mut CaptureLoop) -> Result<SessionUser> {
        match capture.run().await? {
            CaptureOutcome::Decoded(token) => self.login_with_token(token.as_str()).await,
            CaptureOutcome::Stopped => Err(AuthError::Cancelled),
        }
    }

    fn degrade<T>(&self, result: Result<T>) -> Result<T> {
        match result {
            Err(AuthError::Dataset(e)) if !self.surface_dataset_errors => {
                warn!(error = %e, source = %self.resolver.source().describe(), "Guest list unavailable");
                Err(AuthError::NoMatch)
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("source", &self.resolver.source().describe())
            .field("session", &self.session)
            .finish()
    }
}
