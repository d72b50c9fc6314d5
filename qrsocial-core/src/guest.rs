//! Guest dataset model.
//!
//! The dataset is served as JSON in one of two shapes: the canonical one
//! (`groups[].guests[]`, camelCase fields, `config.testAccount`) and the
//! legacy `invitados.json` one (`grupos[].invitados[]`, Spanish field names,
//! `config.acceso_prueba.usuario_prueba`). Both deserialize into the same
//! types here so nothing downstream ever sees the legacy names.

use serde::{Deserialize, Deserializer, Serialize};

use crate::dataset::DatasetError;

/// One invitee as published in the guest dataset, before normalization.
///
/// A missing or `null` given name reads as empty rather than rejecting the
/// whole dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawGuestRecord")]
pub struct GuestRecord {
    pub id: String,
    pub given_name: String,
    pub family_name: Option<String>,
    pub portrait_url: Option<String>,
    pub role_tag: Option<String>,
    pub relation_label: Option<String>,
    pub bio: Option<String>,
    /// Opaque string encoded in the invitation's QR code.
    pub qr_token: Option<String>,
}

/// Wire shape of a guest. Canonical and legacy keys are separate fields so a
/// record carrying both (`role` and `roleTag`, `imagen` and `image`) still
/// parses; the first non-blank value wins.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGuestRecord {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    nombre: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    apellido: Option<String>,
    #[serde(default)]
    portrait_url: Option<String>,
    #[serde(default)]
    imagen: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    role_tag: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    relation_label: Option<String>,
    #[serde(default)]
    relacion: Option<String>,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default)]
    qr_token: Option<String>,
    #[serde(default)]
    codigo_qr_contenido: Option<String>,
}

fn first_non_blank<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}

impl From<RawGuestRecord> for GuestRecord {
    fn from(raw: RawGuestRecord) -> Self {
        Self {
            id: raw.id,
            given_name: first_non_blank([raw.given_name, raw.nombre]).unwrap_or_default(),
            family_name: first_non_blank([raw.family_name, raw.apellido]),
            portrait_url: first_non_blank([raw.portrait_url, raw.imagen, raw.image]),
            role_tag: first_non_blank([raw.role_tag, raw.role]),
            relation_label: first_non_blank([raw.relation_label, raw.relacion]),
            bio: raw.bio,
            qr_token: first_non_blank([raw.qr_token, raw.codigo_qr_contenido]),
        }
    }
}

impl GuestRecord {
    /// Minimal record, mostly useful for building datasets in tests.
    pub fn new(id: impl Into<String>, given_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            given_name: given_name.into(),
            family_name: None,
            portrait_url: None,
            role_tag: None,
            relation_label: None,
            bio: None,
            qr_token: None,
        }
    }

    pub fn with_family_name(mut self, family_name: impl Into<String>) -> Self {
        self.family_name = Some(family_name.into());
        self
    }

    pub fn with_qr_token(mut self, token: impl Into<String>) -> Self {
        self.qr_token = Some(token.into());
        self
    }

    /// `"givenName familyName"`, the string typed on the manual login form.
    pub fn full_name(&self) -> String {
        match self.family_name.as_deref() {
            Some(family) if !self.given_name.is_empty() => {
                format!("{} {}", self.given_name, family)
            }
            Some(family) => family.to_string(),
            None => self.given_name.clone(),
        }
    }
}

/// Ordered bucket of guests. Grouping only affects lookup order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default, alias = "nombre")]
    pub name: Option<String>,
    #[serde(default, alias = "invitados")]
    pub guests: Vec<GuestRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default, rename = "testAccount", skip_serializing_if = "Option::is_none")]
    test_account: Option<GuestRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    acceso_prueba: Option<LegacyTestAccess>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct LegacyTestAccess {
    #[serde(default)]
    usuario_prueba: Option<GuestRecord>,
}

impl DatasetConfig {
    pub fn with_test_account(record: GuestRecord) -> Self {
        Self {
            test_account: Some(record),
            acceso_prueba: None,
        }
    }

    /// The reserved test-account record, from whichever schema provided it.
    pub fn test_account(&self) -> Option<&GuestRecord> {
        self.test_account.as_ref().or_else(|| {
            self.acceso_prueba
                .as_ref()
                .and_then(|legacy| legacy.usuario_prueba.as_ref())
        })
    }
}

/// Immutable snapshot of the guest list, as returned by one fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestDataset {
    #[serde(alias = "grupos")]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub config: DatasetConfig,
}

impl GuestDataset {
    /// Parse a dataset document. Any shape error is `DataMalformed`.
    pub fn from_json(bytes: &[u8]) -> Result<Self, DatasetError> {
        serde_json::from_slice(bytes).map_err(|e| DatasetError::DataMalformed(e.to_string()))
    }

    /// Every guest in lookup order: group order, then record order.
    pub fn guests(&self) -> impl Iterator<Item = &GuestRecord> {
        self.groups.iter().flat_map(|group| group.guests.iter())
    }

    pub fn test_account(&self) -> Option<&GuestRecord> {
        self.config.test_account()
    }

    pub fn guest_count(&self) -> usize {
        self.groups.iter().map(|group| group.guests.len()).sum()
    }
}

/// Guest ids show up as numbers in some hand-edited datasets.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}
