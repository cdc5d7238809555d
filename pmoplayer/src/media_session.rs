//! Télécommande (touches média) et surface « en cours de lecture ».

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::PlaybackError;
use crate::state::{MediaMetadata, MediaPlaybackState, NowPlaying};

/// Actions qu'une télécommande peut déclencher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum RemoteAction {
    Play,
    Pause,
    NextTrack,
    PreviousTrack,
    SeekForward,
    SeekBackward,
}

impl RemoteAction {
    pub const ALL: [RemoteAction; 6] = [
        RemoteAction::Play,
        RemoteAction::Pause,
        RemoteAction::NextTrack,
        RemoteAction::PreviousTrack,
        RemoteAction::SeekForward,
        RemoteAction::SeekBackward,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteAction::Play => "play",
            RemoteAction::Pause => "pause",
            RemoteAction::NextTrack => "nexttrack",
            RemoteAction::PreviousTrack => "previoustrack",
            RemoteAction::SeekForward => "seekforward",
            RemoteAction::SeekBackward => "seekbackward",
        }
    }
}

impl std::fmt::Display for RemoteAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RemoteAction {
    type Err = PlaybackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        RemoteAction::ALL
            .into_iter()
            .find(|a| a.as_str() == lowered)
            .ok_or_else(|| PlaybackError::UnknownAction(s.to_string()))
    }
}

/// Callback de navigation fourni par l'hôte de session
pub type RemoteHandler = Arc<dyn Fn() + Send + Sync>;

/// Callbacks de navigation ; le coordinateur ne navigue jamais lui-même.
#[derive(Clone, Default)]
pub struct RemoteHandlers {
    pub on_next: Option<RemoteHandler>,
    pub on_previous: Option<RemoteHandler>,
}

impl std::fmt::Debug for RemoteHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteHandlers")
            .field("on_next", &self.on_next.is_some())
            .field("on_previous", &self.on_previous.is_some())
            .finish()
    }
}

/// Cible d'une action enregistrée
#[derive(Clone)]
pub(crate) enum RemoteBinding {
    Play,
    Pause,
    Handler(RemoteHandler),
}

/// Table d'enregistrement des actions de télécommande.
#[derive(Clone, Default)]
pub(crate) struct RemoteTable {
    bindings: HashMap<RemoteAction, RemoteBinding>,
}

impl RemoteTable {
    /// Reconstruit la table : `play`/`pause` sont toujours servis par le
    /// coordinateur, le reste suit les callbacks fournis.
    pub(crate) fn rebuild(&mut self, handlers: &RemoteHandlers) {
        self.bindings.clear();
        self.bindings.insert(RemoteAction::Play, RemoteBinding::Play);
        self.bindings.insert(RemoteAction::Pause, RemoteBinding::Pause);

        if let Some(next) = &handlers.on_next {
            self.bindings
                .insert(RemoteAction::NextTrack, RemoteBinding::Handler(next.clone()));
            // Les autoradios n'envoient souvent que seekforward/seekbackward
            self.bindings
                .insert(RemoteAction::SeekForward, RemoteBinding::Handler(next.clone()));
        }
        if let Some(previous) = &handlers.on_previous {
            self.bindings.insert(
                RemoteAction::PreviousTrack,
                RemoteBinding::Handler(previous.clone()),
            );
            self.bindings.insert(
                RemoteAction::SeekBackward,
                RemoteBinding::Handler(previous.clone()),
            );
        }
    }

    pub(crate) fn get(&self, action: RemoteAction) -> Option<RemoteBinding> {
        self.bindings.get(&action).cloned()
    }

    pub(crate) fn registered(&self) -> Vec<RemoteAction> {
        RemoteAction::ALL
            .into_iter()
            .filter(|a| self.bindings.contains_key(a))
            .collect()
    }
}

/// Surface de métadonnées exposée au système (écran de verrouillage,
/// autoradio, interface web…).
pub trait MediaSession: Send + Sync {
    fn set_metadata(&self, metadata: Option<MediaMetadata>);
    fn set_playback_state(&self, state: MediaPlaybackState);
}

/// Implémentation qui conserve la dernière valeur dans un canal `watch`.
#[derive(Clone)]
pub struct NowPlayingSurface {
    tx: Arc<watch::Sender<NowPlaying>>,
}

impl NowPlayingSurface {
    pub fn new() -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(NowPlaying::default())),
        }
    }

    pub fn current(&self) -> NowPlaying {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NowPlaying> {
        self.tx.subscribe()
    }
}

impl Default for NowPlayingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaSession for NowPlayingSurface {
    fn set_metadata(&self, metadata: Option<MediaMetadata>) {
        self.tx.send_modify(|np| {
            *np = NowPlaying::new(metadata.as_ref(), np.playback_state);
        });
    }

    fn set_playback_state(&self, state: MediaPlaybackState) {
        self.tx.send_if_modified(|np| {
            if np.playback_state == state {
                false
            } else {
                np.playback_state = state;
                true
            }
        });
    }
}
