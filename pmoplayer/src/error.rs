//! Types d'erreurs pour pmoplayer

/// Erreurs du lecteur
///
/// Les échecs de lecture ne remontent pas à l'appelant sous forme de
/// `Result` : le coordinateur passe en état `Errored` et conserve le message
/// (voir [`crate::PlaybackCoordinator`]). Ce type sert aux backends audio,
/// au service et à l'API.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("Failed to create audio resource: {0}")]
    ResourceCreation(String),

    #[error("Failed to play audio stream: {0}")]
    PlayRejected(String),

    #[error("Failed to load audio stream: {0}")]
    StreamLoad(String),

    #[error("Station not found: {0}")]
    StationNotFound(String),

    #[error("Unknown remote action: {0}")]
    UnknownAction(String),

    #[error("Player service is not running")]
    Closed,

    #[error(transparent)]
    Catalog(#[from] pmostations::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Type Result spécialisé pour pmoplayer
pub type Result<T> = std::result::Result<T, PlaybackError>;
