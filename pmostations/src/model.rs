//! Modèle de données des stations.

use serde::{Deserialize, Serialize};

/// Station de radio enregistrée dans le catalogue.
///
/// `id` est attribué à la création et ne change jamais ensuite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
pub struct Station {
    pub id: String,
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub bitrate: Option<String>,
}

/// Données d'entrée pour créer une station.
///
/// Les champs absents du JSON valent la chaîne vide et sont rejetés par la
/// validation, ce qui donne une erreur par champ plutôt qu'une erreur de
/// désérialisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
pub struct NewStation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bitrate: Option<String>,
}

impl NewStation {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.bitrate = Some(bitrate.into());
        self
    }
}

/// Mise à jour partielle d'une station.
///
/// `None` laisse le champ inchangé. Pour `description` et `bitrate`, une
/// chaîne vide efface la valeur.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
pub struct StationPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bitrate: Option<String>,
}

impl StationPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.url.is_none()
            && self.description.is_none()
            && self.bitrate.is_none()
    }
}

impl Station {
    /// Construit une station à partir de données déjà validées.
    pub(crate) fn from_new(id: String, data: NewStation) -> Self {
        Self {
            id,
            name: data.name.trim().to_string(),
            url: data.url.trim().to_string(),
            description: normalize_optional(data.description),
            bitrate: normalize_optional(data.bitrate),
        }
    }

    /// Applique une mise à jour déjà validée ; l'identifiant n'est jamais touché.
    pub fn apply(&mut self, patch: StationPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(url) = patch.url {
            self.url = url.trim().to_string();
        }
        if patch.description.is_some() {
            self.description = normalize_optional(patch.description);
        }
        if patch.bitrate.is_some() {
            self.bitrate = normalize_optional(patch.bitrate);
        }
    }
}

/// Une chaîne vide ou blanche est stockée comme absente.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
