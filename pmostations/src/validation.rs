//! Validation des données de station.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::model::{NewStation, StationPatch};

/// Erreur de validation sur un champ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn check_name(name: &str) -> Option<FieldError> {
    if name.trim().is_empty() {
        Some(FieldError::new("name", "Station name is required"))
    } else {
        None
    }
}

fn check_url(raw: &str) -> Option<FieldError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(FieldError::new("url", "Stream URL is required"));
    }
    match Url::parse(raw) {
        Ok(url) if !url.cannot_be_a_base() => None,
        _ => Some(FieldError::new("url", "Please enter a valid URL")),
    }
}

/// Vérifie une création ; toutes les erreurs sont retournées ensemble.
pub fn validate_new(data: &NewStation) -> Result<(), Vec<FieldError>> {
    let errors: Vec<FieldError> = [check_name(&data.name), check_url(&data.url)]
        .into_iter()
        .flatten()
        .collect();

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Vérifie une mise à jour : seuls les champs fournis sont contrôlés.
pub fn validate_patch(patch: &StationPatch) -> Result<(), Vec<FieldError>> {
    let errors: Vec<FieldError> = [
        patch.name.as_deref().and_then(check_name),
        patch.url.as_deref().and_then(check_url),
    ]
    .into_iter()
    .flatten()
    .collect();

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_name_and_bad_url_are_both_reported() {
        let errors = validate_new(&NewStation::new("", "not-a-url")).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "url"]);
    }

    #[test]
    fn test_valid_station() {
        assert!(validate_new(&NewStation::new("KEXP", "https://kexp.example/stream")).is_ok());
    }

    #[test]
    fn test_url_rules() {
        assert!(check_url("http://10.0.0.2:8000/live").is_none());
        assert!(check_url("   ").is_some());
        assert!(check_url("/relative/path").is_some());
        assert!(check_url("mailto:someone@example.com").is_some());
    }

    #[test]
    fn test_patch_checks_only_present_fields() {
        assert!(validate_patch(&StationPatch::default()).is_ok());

        let patch = StationPatch {
            url: Some("nope".into()),
            ..Default::default()
        };
        let errors = validate_patch(&patch).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "url");
    }
}
