mod common;

use std::sync::Arc;

use common::ScriptedBackend;
use pmoplayer::{
    DEFAULT_VOLUME, MediaPlaybackState, NowPlayingSurface, PlaybackCoordinator, PlaybackState,
    RemoteAction, RemoteHandlers, ResourceEvent, TaggedEvent,
};
use pmostations::Station;
use tokio::sync::mpsc;

struct Fixture {
    coordinator: PlaybackCoordinator,
    backend: ScriptedBackend,
    events: mpsc::UnboundedReceiver<TaggedEvent>,
    surface: NowPlayingSurface,
}

impl Fixture {
    fn new() -> Self {
        let backend = ScriptedBackend::new();
        let surface = NowPlayingSurface::new();
        let (tx, events) = mpsc::unbounded_channel();
        let coordinator = PlaybackCoordinator::new(
            Arc::new(backend.clone()),
            tx,
            Arc::new(surface.clone()),
            DEFAULT_VOLUME,
        );
        Self {
            coordinator,
            backend,
            events,
            surface,
        }
    }

    /// Repasse au coordinateur tous les évènements en attente.
    fn drain(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.coordinator.handle_event(event);
        }
    }
}

fn station(name: &str, description: Option<&str>) -> Station {
    Station {
        id: name.to_lowercase(),
        name: name.to_string(),
        url: format!("https://{}.example/live", name.to_lowercase()),
        description: description.map(str::to_string),
        bitrate: None,
    }
}

#[test]
fn test_single_flight_releases_previous_resource() {
    let mut f = Fixture::new();

    f.coordinator.load("https://u1.example/", None);
    let g1 = f.coordinator.generation();
    f.coordinator.play();
    f.drain();
    assert_eq!(f.coordinator.state(), PlaybackState::Playing);

    f.coordinator.load("https://u2.example/", None);
    let g2 = f.coordinator.generation();

    assert_eq!(g2, g1 + 1);
    assert_eq!(f.backend.released(), vec![g1]);
    assert_eq!(
        f.backend.created_urls(),
        vec!["https://u1.example/", "https://u2.example/"]
    );
    // La ressource remplacée ne peut plus rien émettre
    assert!(!f.backend.emit(g1, ResourceEvent::Playing));
    f.drain();
    assert_eq!(f.coordinator.state(), PlaybackState::Loading);
}

#[test]
fn test_reloading_same_url_creates_one_resource() {
    let mut f = Fixture::new();

    f.coordinator.load("https://u.example/", None);
    f.coordinator.load("https://u.example/", None);

    assert_eq!(f.backend.created().len(), 1);
    assert_eq!(f.coordinator.generation(), 1);
    assert!(f.backend.released().is_empty());
}

#[test]
fn test_stale_playing_event_is_ignored() {
    let mut f = Fixture::new();

    f.coordinator.load("https://u1.example/", None);
    let g1 = f.coordinator.generation();
    f.coordinator.load("https://u2.example/", None);
    f.drain();

    let applied = f.coordinator.handle_event(TaggedEvent {
        generation: g1,
        event: ResourceEvent::Playing,
    });

    assert!(!applied);
    assert_eq!(f.coordinator.state(), PlaybackState::Loading);
    assert!(!f.coordinator.snapshot().is_playing);
}

#[test]
fn test_buffering_returns_to_loading() {
    let mut f = Fixture::new();
    f.coordinator.load("https://u.example/", None);
    f.coordinator.play();
    f.drain();

    let g = f.coordinator.generation();
    f.backend.emit(g, ResourceEvent::Waiting);
    f.drain();
    assert_eq!(f.coordinator.state(), PlaybackState::Loading);

    f.backend.emit(g, ResourceEvent::Playing);
    f.drain();
    assert_eq!(f.coordinator.state(), PlaybackState::Playing);
}

#[test]
fn test_play_rejection_sets_errored() {
    let mut f = Fixture::new();
    f.backend.reject_play(Some("NotAllowedError"));

    f.coordinator.load("https://u.example/", None);
    f.coordinator.play();
    f.drain();

    let snap = f.coordinator.snapshot();
    assert_eq!(snap.state, PlaybackState::Errored);
    assert!(!snap.is_playing);
    assert!(!snap.is_loading);
    assert_eq!(
        snap.error.as_deref(),
        Some("Failed to play audio stream: NotAllowedError")
    );
}

#[test]
fn test_async_play_rejection_sets_errored() {
    let mut f = Fixture::new();
    f.coordinator.load("https://u.example/", None);
    let g = f.coordinator.generation();

    f.backend
        .emit(g, ResourceEvent::PlayRejected("connection refused".into()));
    f.drain();

    assert_eq!(f.coordinator.state(), PlaybackState::Errored);
    assert!(f.coordinator.error().unwrap().contains("connection refused"));
}

#[test]
fn test_creation_failure_then_recovery() {
    let mut f = Fixture::new();
    f.backend.fail_creation_for("https://down.example/");

    f.coordinator.load("https://down.example/", None);
    assert_eq!(f.coordinator.state(), PlaybackState::Errored);
    assert!(!f.coordinator.has_resource());
    assert_eq!(
        f.coordinator.error(),
        Some("Failed to create audio resource: cannot open https://down.example/")
    );

    // Pas de ressource : play() ne fait rien
    f.coordinator.play();
    assert!(f.backend.played().is_empty());

    f.coordinator.load("https://up.example/", None);
    assert_eq!(f.coordinator.state(), PlaybackState::Loading);
    assert!(f.coordinator.error().is_none());
}

#[test]
fn test_volume_clamps_and_persists_across_loads() {
    let mut f = Fixture::new();

    assert_eq!(f.coordinator.set_volume(120), 100);
    assert_eq!(f.coordinator.snapshot().volume, 100);
    assert!(f.backend.volumes().is_empty());

    f.coordinator.load("https://u.example/", None);
    assert_eq!(f.coordinator.set_volume(-3), 0);
    assert_eq!(f.backend.volumes(), vec![(1, 0)]);

    f.coordinator.load("https://v.example/", None);
    assert_eq!(f.coordinator.volume(), 0);
}

#[test]
fn test_pause_is_noop_when_paused() {
    let mut f = Fixture::new();
    f.coordinator.load("https://u.example/", None);
    f.coordinator.play();
    f.drain();

    f.coordinator.pause();
    f.drain();
    assert_eq!(f.coordinator.state(), PlaybackState::Paused);

    f.coordinator.pause();
    assert!(f.events.try_recv().is_err());
}

#[test]
fn test_now_playing_follows_load_and_state() {
    let mut f = Fixture::new();

    f.coordinator
        .load("https://jazz.example/live", Some(station("Jazz", None)));
    let now = f.surface.current();
    assert_eq!(now.title.as_deref(), Some("Jazz"));
    assert_eq!(now.artist.as_deref(), Some("Internet Radio"));
    assert_eq!(now.album.as_deref(), Some("Radio Player"));
    assert_eq!(now.playback_state, MediaPlaybackState::None);

    f.coordinator.play();
    f.drain();
    assert_eq!(f.surface.current().playback_state, MediaPlaybackState::Playing);

    f.coordinator.stop();
    let now = f.surface.current();
    assert!(now.title.is_none());
    assert_eq!(now.playback_state, MediaPlaybackState::None);
}

#[test]
fn test_remote_play_pause_and_navigation() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let mut f = Fixture::new();
    let next_calls = Arc::new(AtomicUsize::new(0));
    let prev_calls = Arc::new(AtomicUsize::new(0));
    let (n, p) = (next_calls.clone(), prev_calls.clone());
    f.coordinator.set_remote_handlers(RemoteHandlers {
        on_next: Some(Arc::new(move || {
            n.fetch_add(1, Ordering::SeqCst);
        })),
        on_previous: Some(Arc::new(move || {
            p.fetch_add(1, Ordering::SeqCst);
        })),
    });

    assert!(f.coordinator.remote(RemoteAction::SeekForward));
    assert!(f.coordinator.remote(RemoteAction::NextTrack));
    assert!(f.coordinator.remote(RemoteAction::SeekBackward));
    assert_eq!(next_calls.load(Ordering::SeqCst), 2);
    assert_eq!(prev_calls.load(Ordering::SeqCst), 1);

    f.coordinator.load("https://u.example/", None);
    f.coordinator.remote(RemoteAction::Play);
    f.drain();
    assert_eq!(f.coordinator.state(), PlaybackState::Playing);

    f.coordinator.remote(RemoteAction::Pause);
    f.drain();
    assert_eq!(f.coordinator.state(), PlaybackState::Paused);

    // La navigation n'a jamais touché la ressource
    assert_eq!(f.backend.created().len(), 1);
}
