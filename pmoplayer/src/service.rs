//! Service lecteur : une tâche unique qui possède l'hôte de session.
//!
//! Les commandes utilisateur, les actions de télécommande et les évènements
//! des ressources audio sont traités un par un dans cette tâche ; aucune
//! mutation concurrente de la session n'est possible. Le reste du programme
//! dialogue avec elle au travers d'un [`PlayerHandle`].

use std::sync::Arc;

use pmostations::{CatalogEvent, NewStation, Station, StationCatalog, StationPatch};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::coordinator::{DEFAULT_VOLUME, PlaybackCoordinator};
use crate::error::{PlaybackError, Result};
use crate::http_stream::StreamRelay;
use crate::media_session::{NowPlayingSurface, RemoteAction, RemoteHandlers};
use crate::resource::{AudioBackend, TaggedEvent};
use crate::session::{Notification, SessionHost, SessionView};
use crate::state::{NowPlaying, Snapshot};

/// Options du service lecteur
#[derive(Debug, Clone)]
pub struct PlayerOptions {
    pub default_volume: u8,
    pub notification_capacity: usize,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            default_volume: DEFAULT_VOLUME,
            notification_capacity: 32,
        }
    }
}

/// Intentions sans paramètre
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Play,
    Pause,
    Toggle,
    Next,
    Previous,
    Stop,
}

enum PlayerCommand {
    Intent {
        intent: Intent,
        reply: Option<oneshot::Sender<SessionView>>,
    },
    Select {
        id: String,
        reply: oneshot::Sender<Result<SessionView>>,
    },
    SetVolume {
        volume: i64,
        reply: oneshot::Sender<SessionView>,
    },
    Remote {
        action: RemoteAction,
        reply: oneshot::Sender<bool>,
    },
    AddStation {
        data: NewStation,
        reply: oneshot::Sender<Result<Station>>,
    },
    UpdateStation {
        id: String,
        patch: StationPatch,
        reply: oneshot::Sender<Result<Option<Station>>>,
    },
    DeleteStation {
        id: String,
        reply: oneshot::Sender<Result<bool>>,
    },
    Refresh {
        reply: oneshot::Sender<Result<SessionView>>,
    },
    View {
        reply: oneshot::Sender<SessionView>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Accès clonable au service lecteur.
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::UnboundedSender<PlayerCommand>,
    snapshots: watch::Receiver<Snapshot>,
    notifications: broadcast::Sender<Notification>,
    now_playing: NowPlayingSurface,
    relay: Option<StreamRelay>,
}

pub struct PlayerService {
    host: SessionHost,
    commands: mpsc::UnboundedReceiver<PlayerCommand>,
    events: mpsc::UnboundedReceiver<TaggedEvent>,
    catalog_events: broadcast::Receiver<CatalogEvent>,
}

impl PlayerService {
    /// Démarre le service dans une tâche tokio.
    ///
    /// La liste des stations est chargée avant de rendre la main.
    pub async fn spawn(
        catalog: Arc<StationCatalog>,
        backend: Arc<dyn AudioBackend>,
        options: PlayerOptions,
    ) -> Result<(PlayerHandle, JoinHandle<()>)> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let notifications = broadcast::channel(options.notification_capacity.max(1)).0;
        let now_playing = NowPlayingSurface::new();
        let relay = backend.relay();

        let mut coordinator = PlaybackCoordinator::new(
            backend,
            event_tx,
            Arc::new(now_playing.clone()),
            options.default_volume,
        );
        coordinator.set_remote_handlers(remote_handlers(&cmd_tx));
        let snapshots = coordinator.subscribe();

        let catalog_events = catalog.subscribe();
        let mut host = SessionHost::new(catalog, coordinator, notifications.clone());
        host.refresh().await?;

        let service = PlayerService {
            host,
            commands: cmd_rx,
            events: event_rx,
            catalog_events,
        };
        let task = tokio::spawn(service.run());

        info!("✅ Player service started");
        Ok((
            PlayerHandle {
                commands: cmd_tx,
                snapshots,
                notifications,
                now_playing,
                relay,
            },
            task,
        ))
    }

    async fn run(mut self) {
        let mut catalog_open = true;
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        debug!("All player handles dropped");
                        break;
                    };
                    if !self.handle_command(command).await {
                        break;
                    }
                }
                Some(event) = self.events.recv() => {
                    self.host.handle_event(event);
                }
                change = self.catalog_events.recv(), if catalog_open => {
                    let event = match change {
                        Ok(event) => Some(event),
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            debug!("Missed {} catalog events", n);
                            None
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            catalog_open = false;
                            continue;
                        }
                    };
                    if let Err(e) = self.host.on_catalog_event(event).await {
                        warn!("Failed to refresh station list: {}", e);
                    }
                }
            }
        }

        self.host.shutdown();
        info!("Player service stopped");
    }

    /// Retourne `false` quand le service doit s'arrêter.
    async fn handle_command(&mut self, command: PlayerCommand) -> bool {
        match command {
            PlayerCommand::Intent { intent, reply } => {
                debug!("Intent {:?}", intent);
                match intent {
                    Intent::Play => self.host.play(),
                    Intent::Pause => self.host.pause(),
                    Intent::Toggle => self.host.toggle_play_pause(),
                    Intent::Next => self.host.next(),
                    Intent::Previous => self.host.previous(),
                    Intent::Stop => self.host.stop(),
                }
                if let Some(reply) = reply {
                    let _ = reply.send(self.host.view());
                }
            }
            PlayerCommand::Select { id, reply } => {
                let result = self.host.select_play_id(&id).await;
                let _ = reply.send(result.map(|_| self.host.view()));
            }
            PlayerCommand::SetVolume { volume, reply } => {
                self.host.set_volume(volume);
                let _ = reply.send(self.host.view());
            }
            PlayerCommand::Remote { action, reply } => {
                debug!("Remote action {}", action);
                let handled = self.host.remote(action);
                let _ = reply.send(handled);
            }
            PlayerCommand::AddStation { data, reply } => {
                let _ = reply.send(self.host.add_station(data).await);
            }
            PlayerCommand::UpdateStation { id, patch, reply } => {
                let _ = reply.send(self.host.update_station(&id, patch).await);
            }
            PlayerCommand::DeleteStation { id, reply } => {
                let _ = reply.send(self.host.delete_station(&id).await);
            }
            PlayerCommand::Refresh { reply } => {
                let result = self.host.refresh().await;
                let _ = reply.send(result.map(|_| self.host.view()));
            }
            PlayerCommand::View { reply } => {
                let _ = reply.send(self.host.view());
            }
            PlayerCommand::Shutdown { reply } => {
                self.host.shutdown();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }
}

/// Les actions de navigation de la télécommande repassent par la file de
/// commandes, comme les intentions utilisateur.
fn remote_handlers(commands: &mpsc::UnboundedSender<PlayerCommand>) -> RemoteHandlers {
    let enqueue = |intent: Intent| {
        let weak = commands.downgrade();
        Arc::new(move || {
            if let Some(tx) = weak.upgrade() {
                let _ = tx.send(PlayerCommand::Intent {
                    intent,
                    reply: None,
                });
            }
        }) as crate::media_session::RemoteHandler
    };

    RemoteHandlers {
        on_next: Some(enqueue(Intent::Next)),
        on_previous: Some(enqueue(Intent::Previous)),
    }
}

impl PlayerHandle {
    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> PlayerCommand) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .map_err(|_| PlaybackError::Closed)?;
        rx.await.map_err(|_| PlaybackError::Closed)
    }

    pub async fn intent(&self, intent: Intent) -> Result<SessionView> {
        self.request(|reply| PlayerCommand::Intent {
            intent,
            reply: Some(reply),
        })
        .await
    }

    pub async fn play(&self) -> Result<SessionView> {
        self.intent(Intent::Play).await
    }

    pub async fn pause(&self) -> Result<SessionView> {
        self.intent(Intent::Pause).await
    }

    pub async fn toggle(&self) -> Result<SessionView> {
        self.intent(Intent::Toggle).await
    }

    pub async fn next(&self) -> Result<SessionView> {
        self.intent(Intent::Next).await
    }

    pub async fn previous(&self) -> Result<SessionView> {
        self.intent(Intent::Previous).await
    }

    pub async fn stop(&self) -> Result<SessionView> {
        self.intent(Intent::Stop).await
    }

    pub async fn select(&self, id: &str) -> Result<SessionView> {
        let id = id.to_string();
        self.request(|reply| PlayerCommand::Select { id, reply })
            .await?
    }

    pub async fn set_volume(&self, volume: i64) -> Result<SessionView> {
        self.request(|reply| PlayerCommand::SetVolume { volume, reply })
            .await
    }

    /// Retourne `false` si l'action n'a pas de cible enregistrée.
    pub async fn remote(&self, action: RemoteAction) -> Result<bool> {
        self.request(|reply| PlayerCommand::Remote { action, reply })
            .await
    }

    pub async fn add_station(&self, data: NewStation) -> Result<Station> {
        self.request(|reply| PlayerCommand::AddStation { data, reply })
            .await?
    }

    pub async fn update_station(&self, id: &str, patch: StationPatch) -> Result<Option<Station>> {
        let id = id.to_string();
        self.request(|reply| PlayerCommand::UpdateStation { id, patch, reply })
            .await?
    }

    pub async fn delete_station(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.request(|reply| PlayerCommand::DeleteStation { id, reply })
            .await?
    }

    pub async fn refresh(&self) -> Result<SessionView> {
        self.request(|reply| PlayerCommand::Refresh { reply }).await?
    }

    pub async fn view(&self) -> Result<SessionView> {
        self.request(|reply| PlayerCommand::View { reply }).await
    }

    /// Arrête le service ; la ressource audio est libérée.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| PlayerCommand::Shutdown { reply }).await
    }

    /// Dernier snapshot publié par le coordinateur.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn now_playing(&self) -> NowPlaying {
        self.now_playing.current()
    }

    pub fn relay(&self) -> Option<&StreamRelay> {
        self.relay.as_ref()
    }
}
