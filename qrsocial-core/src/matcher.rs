//! Guest lookup by QR token or by typed full name.
//!
//! The matching functions are pure over one dataset snapshot. Scan order is
//! group order, then record order inside a group; the first hit wins. When
//! nothing in the guest list matches, the dataset's reserved test account is
//! consulted as a last resort.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::dataset::DatasetSource;
use crate::error::{AuthError, Result};
use crate::guest::{GuestDataset, GuestRecord};

/// Typed name that resolves to the test account on the manual login form.
pub const TEST_GUEST_PHRASE: &str = "invitado prueba";

/// Find the guest whose QR token equals `token` exactly (case-sensitive).
pub fn match_by_token<'a>(token: &str, dataset: &'a GuestDataset) -> Option<&'a GuestRecord> {
    if token.is_empty() {
        return None;
    }

    dataset
        .guests()
        .find(|guest| guest.qr_token.as_deref() == Some(token))
        .or_else(|| {
            dataset
                .test_account()
                .filter(|account| account.qr_token.as_deref() == Some(token))
        })
}

/// Find the guest whose `"givenName familyName"` matches `query`, ignoring
/// case and surrounding or repeated whitespace.
pub fn match_by_name<'a>(query: &str, dataset: &'a GuestDataset) -> Option<&'a GuestRecord> {
    let query = normalize_name(query);
    if query.is_empty() {
        return None;
    }

    dataset
        .guests()
        .find(|guest| normalize_name(&guest.full_name()) == query)
        .or_else(|| {
            if query == TEST_GUEST_PHRASE {
                dataset.test_account()
            } else {
                None
            }
        })
}

/// Trim, collapse internal whitespace and case-fold.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Resolves credentials against a freshly fetched dataset snapshot.
///
/// Fetch failures propagate as [`AuthError::Dataset`]; a clean miss is
/// [`AuthError::NoMatch`].
#[derive(Clone)]
pub struct GuestResolver {
    source: Arc<dyn DatasetSource>,
}

impl GuestResolver {
    pub fn new(source: Arc<dyn DatasetSource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Arc<dyn DatasetSource> {
        &self.source
    }

    #[instrument(level = "debug", skip_all, fields(source = %self.source.describe()))]
    pub async fn resolve_token(&self, token: &str) -> Result<GuestRecord> {
        let dataset = self.source.fetch().await?;
        let guest = match_by_token(token, &dataset).ok_or(AuthError::NoMatch)?;
        info!(guest_id = %guest.id, "QR token matched a guest");
        Ok(guest.clone())
    }

    #[instrument(level = "debug", skip_all, fields(source = %self.source.describe()))]
    pub async fn resolve_name(&self, name: &str) -> Result<GuestRecord> {
        if normalize_name(name).is_empty() {
            debug!("Empty name, skipping dataset fetch");
            return Err(AuthError::NoMatch);
        }

        let dataset = self.source.fetch().await?;
        let guest = match_by_name(name, &dataset).ok_or(AuthError::NoMatch)?;
        info!(guest_id = %guest.id, "Name matched a guest");
        Ok(guest.clone())
    }
}
