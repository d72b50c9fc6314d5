//! Mapping from raw guest records to the canonical [`SessionUser`].
//!
//! Both functions are total: any well-typed input produces a user whose
//! `avatar_url` is non-empty.

use tracing::debug;

use crate::guest::GuestRecord;
use crate::session::{Role, SessionUser};

/// Avatar shown when a guest has no portrait.
pub const DEFAULT_AVATAR_URL: &str = "/img/default-avatar.png";

/// Relation shown when the dataset does not say how a guest is related.
pub const DEFAULT_RELATION_LABEL: &str = "Invitado";

/// Convert a dataset record into a session user.
pub fn normalize(record: &GuestRecord) -> SessionUser {
    let role = match non_blank(record.role_tag.as_deref()) {
        Some(tag) => Role::from_tag(tag).unwrap_or_else(|| {
            debug!(guest_id = %record.id, role_tag = tag, "Unknown role tag, using guest");
            Role::Guest
        }),
        None => Role::Guest,
    };

    SessionUser {
        id: record.id.clone(),
        display_name: record.given_name.clone(),
        family_name: record.family_name.clone().unwrap_or_default(),
        avatar_url: non_blank(record.portrait_url.as_deref())
            .unwrap_or(DEFAULT_AVATAR_URL)
            .to_string(),
        role,
        relation_label: non_blank(record.relation_label.as_deref())
            .unwrap_or(DEFAULT_RELATION_LABEL)
            .to_string(),
        bio: record.bio.clone().unwrap_or_default(),
    }
}

/// Fill the defaults on a user supplied directly (manual or preset login).
pub fn normalize_supplied(mut user: SessionUser) -> SessionUser {
    if user.avatar_url.trim().is_empty() {
        user.avatar_url = DEFAULT_AVATAR_URL.to_string();
    }
    if user.relation_label.trim().is_empty() {
        user.relation_label = DEFAULT_RELATION_LABEL.to_string();
    }
    user
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
