//! Types d'erreurs pour pmostations

use crate::validation::FieldError;

/// Erreurs du catalogue de stations
///
/// Une station inconnue n'est pas une erreur : les opérations concernées
/// retournent `Option`/`bool`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid station data: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    /// Échec du backend de stockage. [`MemoryStore`](crate::MemoryStore) ne
    /// peut pas échouer ; les implémentations persistantes de
    /// [`StationStore`](crate::StationStore) remontent leurs erreurs ici.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Erreurs de champ, si c'est une erreur de validation
    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            Error::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Type Result spécialisé pour pmostations
pub type Result<T> = std::result::Result<T, Error>;
