use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::normalize::{DEFAULT_AVATAR_URL, DEFAULT_RELATION_LABEL};

/// Access level of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Guest,
    Admin,
    SuperAdmin,
}

impl Role {
    /// Parse a role tag as found in datasets and legacy session records.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "guest" => Some(Self::Guest),
            "admin" => Some(Self::Admin),
            "super_admin" | "superadmin" | "super" => Some(Self::SuperAdmin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The canonical identity held by the session store.
///
/// Serialized as camelCase JSON. Session records written by the older web
/// client (`name`, `lastName`, `avatar`/`image`, `relation`) still read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredSessionUser")]
pub struct SessionUser {
    pub id: String,
    pub display_name: String,
    pub family_name: String,
    /// Never empty once a user has gone through a login path.
    pub avatar_url: String,
    pub role: Role,
    pub relation_label: String,
    pub bio: String,
}

impl SessionUser {
    pub fn full_name(&self) -> String {
        if self.family_name.is_empty() {
            self.display_name.clone()
        } else {
            format!("{} {}", self.display_name, self.family_name)
        }
    }
}

/// Wire shape accepted when reading a persisted session.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSessionUser {
    id: serde_json::Value,
    #[serde(alias = "name")]
    display_name: String,
    #[serde(default, alias = "lastName")]
    family_name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default, alias = "relation")]
    relation_label: Option<String>,
    #[serde(default)]
    bio: Option<String>,
}

impl From<StoredSessionUser> for SessionUser {
    fn from(stored: StoredSessionUser) -> Self {
        let id = match stored.id {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        };
        let avatar_url = [stored.avatar_url, stored.avatar, stored.image]
            .into_iter()
            .flatten()
            .find(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AVATAR_URL.to_string());

        Self {
            id,
            display_name: stored.display_name,
            family_name: stored.family_name.unwrap_or_default(),
            avatar_url,
            role: stored
                .role
                .as_deref()
                .and_then(Role::from_tag)
                .unwrap_or_default(),
            relation_label: stored
                .relation_label
                .unwrap_or_else(|| DEFAULT_RELATION_LABEL.to_string()),
            bio: stored.bio.unwrap_or_default(),
        }
    }
}

/// Built-in demo identities, selectable without a guest dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    Guest,
    Admin,
    SuperAdmin,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Guest, Preset::Admin, Preset::SuperAdmin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Admin => "admin",
            Self::SuperAdmin => "super-admin",
        }
    }

    /// The session user this preset logs in as.
    pub fn user(&self) -> SessionUser {
        let (id, name, role, relation) = match self {
            Self::Guest => ("dev-guest-001", "Invitado Demo", Role::Guest, "Invitado"),
            Self::Admin => ("dev-admin-001", "Admin Demo", Role::Admin, "Organizador"),
            Self::SuperAdmin => (
                "dev-super-001",
                "Modo Dios",
                Role::SuperAdmin,
                "Desarrollador",
            ),
        };

        SessionUser {
            id: id.to_string(),
            display_name: name.to_string(),
            family_name: String::new(),
            avatar_url: DEFAULT_AVATAR_URL.to_string(),
            role,
            relation_label: relation.to_string(),
            bio: String::new(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "guest" => Ok(Self::Guest),
            "admin" => Ok(Self::Admin),
            "super-admin" | "super_admin" | "super" => Ok(Self::SuperAdmin),
            other => Err(format!(
                "unknown preset '{other}' (expected guest, admin or super-admin)"
            )),
        }
    }
}
