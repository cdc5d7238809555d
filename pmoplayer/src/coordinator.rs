//! Coordinateur de lecture.
//!
//! Le coordinateur possède au plus une ressource audio à la fois. Il traduit
//! les intentions (`load`, `play`, `pause`, volume), les évènements de la
//! ressource et les actions de télécommande en une seule machine à états,
//! publiée sous forme de [`Snapshot`] à chaque transition.
//!
//! Chaque `load()` incrémente la génération ; un évènement dont la
//! génération n'est pas celle de la ressource vivante est ignoré.

use std::sync::Arc;

use pmostations::Station;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::PlaybackError;
use crate::media_session::{
    MediaSession, RemoteAction, RemoteBinding, RemoteHandlers, RemoteTable,
};
use crate::resource::{
    AudioBackend, AudioResource, EventSink, Generation, ResourceEvent, TaggedEvent,
};
use crate::state::{MediaMetadata, MediaPlaybackState, PlaybackState, Snapshot};

/// Volume appliqué tant que la configuration n'en fournit pas d'autre
pub const DEFAULT_VOLUME: u8 = 70;

struct LiveResource {
    generation: Generation,
    resource: Box<dyn AudioResource>,
    sink: EventSink,
}

pub struct PlaybackCoordinator {
    backend: Arc<dyn AudioBackend>,
    events: mpsc::UnboundedSender<TaggedEvent>,
    media: Arc<dyn MediaSession>,
    remote: RemoteTable,
    snapshot_tx: watch::Sender<Snapshot>,

    generation: Generation,
    live: Option<LiveResource>,
    state: PlaybackState,
    volume: u8,
    error: Option<String>,
    current_url: Option<String>,
    station: Option<Station>,
}

impl PlaybackCoordinator {
    /// Crée un coordinateur inactif.
    ///
    /// `events` est le canal sur lequel les ressources créées publieront leurs
    /// évènements ; le propriétaire du récepteur doit les repasser à
    /// [`handle_event`](Self::handle_event).
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        events: mpsc::UnboundedSender<TaggedEvent>,
        media: Arc<dyn MediaSession>,
        volume: u8,
    ) -> Self {
        let volume = volume.min(100);
        let mut remote = RemoteTable::default();
        remote.rebuild(&RemoteHandlers::default());

        Self {
            backend,
            events,
            media,
            remote,
            snapshot_tx: watch::Sender::new(Snapshot::idle(volume)),
            generation: 0,
            live: None,
            state: PlaybackState::Idle,
            volume,
            error: None,
            current_url: None,
            station: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            is_playing: self.state == PlaybackState::Playing,
            is_loading: self.state == PlaybackState::Loading,
            volume: self.volume,
            error: self.error.clone(),
            state: self.state,
            current_url: self.current_url.clone(),
            station: self.station.clone(),
            generation: self.generation,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn station(&self) -> Option<&Station> {
        self.station.as_ref()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn has_resource(&self) -> bool {
        self.live.is_some()
    }

    /// Charge `url`, en remplaçant la ressource courante.
    ///
    /// Sans effet si `url` est déjà chargée.
    pub fn load(&mut self, url: &str, station: Option<Station>) {
        if self.live.is_some() && self.current_url.as_deref() == Some(url) {
            debug!("{} already loaded, nothing to do", url);
            return;
        }

        self.teardown();

        self.generation += 1;
        self.current_url = Some(url.to_string());
        self.station = station;
        self.error = None;
        self.state = PlaybackState::Loading;
        self.media
            .set_metadata(self.station.as_ref().map(MediaMetadata::for_station));

        let sink = EventSink::new(self.generation, self.events.clone());
        match self.backend.create(url, self.volume, sink.clone()) {
            Ok(resource) => {
                info!("🎵 Loading {} (generation {})", url, self.generation);
                self.live = Some(LiveResource {
                    generation: self.generation,
                    resource,
                    sink,
                });
            }
            Err(e) => {
                sink.detach();
                let message = match e {
                    e @ PlaybackError::ResourceCreation(_) => e.to_string(),
                    other => PlaybackError::ResourceCreation(other.to_string()).to_string(),
                };
                warn!("{}", message);
                self.state = PlaybackState::Errored;
                self.error = Some(message);
            }
        }

        self.publish();
    }

    /// Demande la lecture de la ressource chargée.
    pub fn play(&mut self) {
        let Some(live) = self.live.as_mut() else {
            debug!("play() without a loaded resource");
            return;
        };

        self.error = None;
        if self.state == PlaybackState::Errored {
            self.state = PlaybackState::Loading;
        }
        if let Err(e) = live.resource.play() {
            let detail = match e {
                PlaybackError::PlayRejected(detail) => detail,
                other => other.to_string(),
            };
            self.fail(PlaybackError::PlayRejected(detail));
            return;
        }
        self.publish();
    }

    pub fn pause(&mut self) {
        if matches!(self.state, PlaybackState::Paused | PlaybackState::Idle) {
            return;
        }
        if let Some(live) = self.live.as_mut() {
            live.resource.pause();
        }
    }

    /// Règle le volume (borné à 0–100) et retourne la valeur retenue.
    ///
    /// La valeur est conservée pour les prochaines ressources, même sans
    /// ressource chargée.
    pub fn set_volume(&mut self, volume: i64) -> u8 {
        let volume = volume.clamp(0, 100) as u8;
        self.volume = volume;
        if let Some(live) = self.live.as_mut() {
            live.resource.set_volume(volume);
        }
        self.publish();
        volume
    }

    /// Libère la ressource et revient à l'état initial.
    pub fn stop(&mut self) {
        self.teardown();
        self.state = PlaybackState::Idle;
        self.error = None;
        self.current_url = None;
        self.station = None;
        self.media.set_metadata(None);
        self.publish();
    }

    pub fn shutdown(&mut self) {
        info!("Playback coordinator shutting down");
        self.stop();
    }

    /// Applique un évènement de ressource.
    ///
    /// Retourne `false` si l'évènement a été ignoré (génération périmée ou
    /// ressource déjà libérée).
    pub fn handle_event(&mut self, tagged: TaggedEvent) -> bool {
        let current = self.live.as_ref().map(|l| l.generation);
        if current != Some(tagged.generation) {
            debug!(
                "Dropping stale {:?} from generation {} (current: {:?})",
                tagged.event, tagged.generation, current
            );
            return false;
        }

        match tagged.event {
            ResourceEvent::LoadStart => {
                self.state = PlaybackState::Loading;
                self.error = None;
            }
            ResourceEvent::CanPlay | ResourceEvent::CanPlayThrough => {
                self.error = None;
            }
            ResourceEvent::Playing => {
                self.state = PlaybackState::Playing;
                self.error = None;
            }
            ResourceEvent::Paused => self.state = PlaybackState::Paused,
            ResourceEvent::Ended => self.state = PlaybackState::Idle,
            ResourceEvent::Waiting | ResourceEvent::Stalled => {
                self.state = PlaybackState::Loading;
            }
            ResourceEvent::Error(detail) => {
                self.fail(PlaybackError::StreamLoad(detail));
                return true;
            }
            ResourceEvent::PlayRejected(detail) => {
                self.fail(PlaybackError::PlayRejected(detail));
                return true;
            }
        }

        debug!("Playback state -> {}", self.state);
        self.publish();
        true
    }

    /// Remplace les callbacks de navigation de la télécommande.
    pub fn set_remote_handlers(&mut self, handlers: RemoteHandlers) {
        self.remote.rebuild(&handlers);
        debug!("Remote actions registered: {:?}", self.remote.registered());
    }

    pub fn remote_actions(&self) -> Vec<RemoteAction> {
        self.remote.registered()
    }

    /// Exécute une action de télécommande.
    ///
    /// Retourne `false` si aucune cible n'est enregistrée pour cette action.
    pub fn remote(&mut self, action: RemoteAction) -> bool {
        match self.remote.get(action) {
            Some(RemoteBinding::Play) => self.play(),
            Some(RemoteBinding::Pause) => self.pause(),
            Some(RemoteBinding::Handler(handler)) => handler(),
            None => {
                debug!("Remote action {} has no handler", action);
                return false;
            }
        }
        true
    }

    fn fail(&mut self, error: PlaybackError) {
        warn!("{}", error);
        self.state = PlaybackState::Errored;
        self.error = Some(error.to_string());
        self.publish();
    }

    /// Libère la ressource vivante : détachement, pause, libération.
    fn teardown(&mut self) {
        if let Some(mut live) = self.live.take() {
            // Détaché d'abord : la pause ci-dessous ne doit rien émettre
            live.sink.detach();
            live.resource.pause();
            live.resource.release();
            debug!("Released resource of generation {}", live.generation);
        }
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.media
            .set_playback_state(MediaPlaybackState::from(snapshot.state));
        self.snapshot_tx.send_replace(snapshot);
    }
}

impl Drop for PlaybackCoordinator {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_session::NowPlayingSurface;
    use crate::resource::AudioResource;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Log {
        created: Vec<(Generation, String)>,
        released: Vec<Generation>,
        volumes: Vec<u8>,
    }

    struct FakeResource {
        generation: Generation,
        log: Arc<Mutex<Log>>,
        reject_play: bool,
    }

    impl AudioResource for FakeResource {
        fn play(&mut self) -> crate::Result<()> {
            if self.reject_play {
                Err(PlaybackError::PlayRejected("autoplay blocked".into()))
            } else {
                Ok(())
            }
        }
        fn pause(&mut self) {}
        fn set_volume(&mut self, volume: u8) {
            self.log.lock().unwrap().volumes.push(volume);
        }
        fn release(&mut self) {
            self.log.lock().unwrap().released.push(self.generation);
        }
    }

    #[derive(Default)]
    struct FakeBackend {
        log: Arc<Mutex<Log>>,
        reject_play: bool,
    }

    impl AudioBackend for FakeBackend {
        fn create(
            &self,
            url: &str,
            _volume: u8,
            sink: EventSink,
        ) -> crate::Result<Box<dyn AudioResource>> {
            if url.starts_with("bad:") {
                return Err(PlaybackError::ResourceCreation("unsupported scheme".into()));
            }
            self.log
                .lock()
                .unwrap()
                .created
                .push((sink.generation(), url.to_string()));
            Ok(Box::new(FakeResource {
                generation: sink.generation(),
                log: self.log.clone(),
                reject_play: self.reject_play,
            }))
        }
    }

    fn coordinator(backend: FakeBackend) -> (PlaybackCoordinator, Arc<Mutex<Log>>) {
        let log = backend.log.clone();
        let (tx, _rx) = mpsc::unbounded_channel();
        let c = PlaybackCoordinator::new(
            Arc::new(backend),
            tx,
            Arc::new(NowPlayingSurface::new()),
            DEFAULT_VOLUME,
        );
        (c, log)
    }

    fn event(generation: Generation, event: ResourceEvent) -> TaggedEvent {
        TaggedEvent { generation, event }
    }

    #[test]
    fn test_load_enters_loading() {
        let (mut c, log) = coordinator(FakeBackend::default());
        c.load("http://a/", None);

        assert_eq!(c.state(), PlaybackState::Loading);
        assert_eq!(c.generation(), 1);
        assert!(c.snapshot().is_loading);
        assert_eq!(log.lock().unwrap().created.len(), 1);
    }

    #[test]
    fn test_creation_failure_keeps_coordinator_usable() {
        let (mut c, _log) = coordinator(FakeBackend::default());
        c.load("bad:stream", None);

        assert_eq!(c.state(), PlaybackState::Errored);
        assert!(!c.has_resource());
        assert!(
            c.error()
                .unwrap()
                .starts_with("Failed to create audio resource")
        );

        c.load("http://a/", None);
        assert_eq!(c.state(), PlaybackState::Loading);
        assert!(c.error().is_none());
    }

    #[test]
    fn test_event_mapping() {
        let (mut c, _log) = coordinator(FakeBackend::default());
        c.load("http://a/", None);
        let g = c.generation();

        assert!(c.handle_event(event(g, ResourceEvent::CanPlay)));
        assert_eq!(c.state(), PlaybackState::Loading);

        c.handle_event(event(g, ResourceEvent::Playing));
        assert!(c.snapshot().is_playing);

        c.handle_event(event(g, ResourceEvent::Stalled));
        assert_eq!(c.state(), PlaybackState::Loading);

        c.handle_event(event(g, ResourceEvent::Playing));
        c.handle_event(event(g, ResourceEvent::Paused));
        assert_eq!(c.state(), PlaybackState::Paused);

        c.handle_event(event(g, ResourceEvent::Ended));
        assert_eq!(c.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_error_event_sets_message() {
        let (mut c, _log) = coordinator(FakeBackend::default());
        c.load("http://a/", None);
        let g = c.generation();

        c.handle_event(event(g, ResourceEvent::Error("HTTP 404".into())));

        let snap = c.snapshot();
        assert_eq!(snap.state, PlaybackState::Errored);
        assert!(!snap.is_playing);
        assert!(!snap.is_loading);
        assert_eq!(snap.error.as_deref(), Some("Failed to load audio stream: HTTP 404"));
    }

    #[test]
    fn test_sync_play_rejection() {
        let (mut c, _log) = coordinator(FakeBackend {
            reject_play: true,
            ..Default::default()
        });
        c.load("http://a/", None);
        c.play();

        assert_eq!(c.state(), PlaybackState::Errored);
        assert_eq!(
            c.error(),
            Some("Failed to play audio stream: autoplay blocked")
        );
    }

    #[test]
    fn test_play_and_pause_without_resource_are_noops() {
        let (mut c, _log) = coordinator(FakeBackend::default());
        c.play();
        c.pause();
        assert_eq!(c.snapshot(), Snapshot::idle(DEFAULT_VOLUME));
    }

    #[test]
    fn test_volume_is_clamped_and_applied() {
        let (mut c, log) = coordinator(FakeBackend::default());

        assert_eq!(c.set_volume(150), 100);
        assert_eq!(c.set_volume(-5), 0);

        c.load("http://a/", None);
        assert_eq!(c.set_volume(42), 42);
        assert_eq!(log.lock().unwrap().volumes, vec![42]);
    }

    #[test]
    fn test_stop_releases_and_ignores_late_events() {
        let (mut c, log) = coordinator(FakeBackend::default());
        c.load("http://a/", None);
        let g = c.generation();

        c.stop();
        assert_eq!(log.lock().unwrap().released, vec![g]);
        assert!(!c.handle_event(event(g, ResourceEvent::Playing)));
        assert_eq!(c.state(), PlaybackState::Idle);
        assert!(c.current_url().is_none());
    }

    #[test]
    fn test_unregistered_remote_action() {
        let (mut c, _log) = coordinator(FakeBackend::default());
        assert!(!c.remote(RemoteAction::NextTrack));
        assert!(c.remote(RemoteAction::Pause));
    }
}
