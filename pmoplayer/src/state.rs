//! États observables du lecteur.

use pmostations::Station;
use serde::{Deserialize, Serialize};

/// État de la machine de lecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Errored,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Loading => "loading",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Errored => "errored",
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Photographie de l'état du coordinateur, publiée à chaque transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
pub struct Snapshot {
    pub is_playing: bool,
    pub is_loading: bool,
    pub volume: u8,
    pub error: Option<String>,
    pub state: PlaybackState,
    pub current_url: Option<String>,
    pub station: Option<Station>,
    /// Génération de la ressource audio courante
    pub generation: u64,
}

impl Snapshot {
    pub fn idle(volume: u8) -> Self {
        Self {
            is_playing: false,
            is_loading: false,
            volume,
            error: None,
            state: PlaybackState::Idle,
            current_url: None,
            station: None,
            generation: 0,
        }
    }
}

/// État de lecture tel qu'exposé aux télécommandes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum MediaPlaybackState {
    #[default]
    None,
    Paused,
    Playing,
}

impl From<PlaybackState> for MediaPlaybackState {
    fn from(state: PlaybackState) -> Self {
        match state {
            PlaybackState::Playing => MediaPlaybackState::Playing,
            PlaybackState::Paused => MediaPlaybackState::Paused,
            _ => MediaPlaybackState::None,
        }
    }
}

/// Icône affichée par les surfaces « en cours de lecture ».
pub const RADIO_ARTWORK: &str = "data:image/svg+xml;base64,PHN2ZyB4bWxucz0iaHR0cDovL3d3dy53My5vcmcvMjAwMC9zdmciIHZpZXdCb3g9IjAgMCAxMDAgMTAwIj48Y2lyY2xlIGN4PSI1MCIgY3k9IjUwIiByPSI0NSIgZmlsbD0iIzNCODJGNiIvPjxjaXJjbGUgY3g9IjUwIiBjeT0iNTAiIHI9IjIwIiBmaWxsPSJ3aGl0ZSIvPjwvc3ZnPg==";

/// Métadonnées de la station en cours
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
pub struct MediaMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub artwork: String,
}

impl MediaMetadata {
    pub fn for_station(station: &Station) -> Self {
        Self {
            title: station.name.clone(),
            artist: station
                .description
                .clone()
                .unwrap_or_else(|| "Internet Radio".to_string()),
            album: "Radio Player".to_string(),
            artwork: RADIO_ARTWORK.to_string(),
        }
    }
}

/// Surface « en cours de lecture » (métadonnées + état)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
pub struct NowPlaying {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub artwork: Option<String>,
    pub playback_state: MediaPlaybackState,
}

impl NowPlaying {
    pub fn new(metadata: Option<&MediaMetadata>, playback_state: MediaPlaybackState) -> Self {
        match metadata {
            Some(m) => Self {
                title: Some(m.title.clone()),
                artist: Some(m.artist.clone()),
                album: Some(m.album.clone()),
                artwork: Some(m.artwork.clone()),
                playback_state,
            },
            None => Self {
                playback_state,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(description: Option<&str>) -> Station {
        Station {
            id: "s1".into(),
            name: "Jazz FM 88.3".into(),
            url: "https://jazz.example/live".into(),
            description: description.map(str::to_string),
            bitrate: None,
        }
    }

    #[test]
    fn test_metadata_falls_back_to_internet_radio() {
        let m = MediaMetadata::for_station(&station(None));
        assert_eq!(m.title, "Jazz FM 88.3");
        assert_eq!(m.artist, "Internet Radio");
        assert_eq!(m.album, "Radio Player");
        assert!(m.artwork.starts_with("data:image/svg+xml"));

        let m = MediaMetadata::for_station(&station(Some("Smooth jazz")));
        assert_eq!(m.artist, "Smooth jazz");
    }

    #[test]
    fn test_media_state_mapping() {
        assert_eq!(MediaPlaybackState::from(PlaybackState::Playing), MediaPlaybackState::Playing);
        assert_eq!(MediaPlaybackState::from(PlaybackState::Paused), MediaPlaybackState::Paused);
        assert_eq!(MediaPlaybackState::from(PlaybackState::Loading), MediaPlaybackState::None);
        assert_eq!(MediaPlaybackState::from(PlaybackState::Errored), MediaPlaybackState::None);
    }

    #[test]
    fn test_state_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&PlaybackState::Errored).unwrap(), "\"errored\"");
    }
}
