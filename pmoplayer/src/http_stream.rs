//! Backend audio HTTP : une ressource = une connexion au flux de la station.
//!
//! Les octets reçus sont relayés via [`StreamRelay`] aux auditeurs locaux
//! (`GET /api/player/stream`). La connexion n'est ouverte qu'au `play()` et
//! fermée à la pause ; le passage par l'état `Loading` pendant une coupure
//! réseau est signalé par `Waiting`.

use std::sync::{
    Arc, PoisonError, RwLock,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use reqwest::Client;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{PlaybackError, Result};
use crate::resource::{AudioBackend, AudioResource, EventSink, ResourceEvent};

/// Réglages du backend HTTP
#[derive(Debug, Clone)]
pub struct HttpStreamOptions {
    /// Délai maximal d'établissement de la connexion
    pub connect_timeout: Duration,
    /// Délai sans données avant de signaler une mise en mémoire tampon
    pub stall_timeout: Duration,
    /// Nombre de blocs conservés pour un auditeur en retard
    pub relay_capacity: usize,
}

impl Default for HttpStreamOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(10_000),
            stall_timeout: Duration::from_millis(8_000),
            relay_capacity: 64,
        }
    }
}

/// Diffusion des octets du flux courant aux auditeurs locaux.
#[derive(Clone)]
pub struct StreamRelay {
    tx: broadcast::Sender<Bytes>,
    content_type: Arc<RwLock<Option<String>>>,
    active: Arc<AtomicBool>,
}

impl StreamRelay {
    pub fn new(capacity: usize) -> Self {
        Self {
            tx: broadcast::channel(capacity.max(1)).0,
            content_type: Arc::new(RwLock::new(None)),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Bytes> {
        self.tx.subscribe()
    }

    /// Vrai tant qu'un flux est en cours de réception.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn content_type(&self) -> Option<String> {
        self.content_type
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    fn set_content_type(&self, content_type: Option<String>) {
        *self
            .content_type
            .write()
            .unwrap_or_else(PoisonError::into_inner) = content_type;
    }

    fn publish(&self, chunk: Bytes) {
        // Aucun auditeur n'est une situation normale
        let _ = self.tx.send(chunk);
    }
}

/// Backend qui ouvre une connexion HTTP par ressource.
pub struct HttpStreamBackend {
    client: Client,
    options: HttpStreamOptions,
    relay: StreamRelay,
}

impl HttpStreamBackend {
    pub fn new(options: HttpStreamOptions) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(options.connect_timeout)
            .user_agent(concat!("PMORadio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PlaybackError::Other(e.into()))?;

        Ok(Self {
            client,
            relay: StreamRelay::new(options.relay_capacity),
            options,
        })
    }

    pub fn stream_relay(&self) -> StreamRelay {
        self.relay.clone()
    }
}

impl AudioBackend for HttpStreamBackend {
    fn create(&self, url: &str, volume: u8, sink: EventSink) -> Result<Box<dyn AudioResource>> {
        let url = Url::parse(url).map_err(|e| PlaybackError::ResourceCreation(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PlaybackError::ResourceCreation(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        sink.emit(ResourceEvent::LoadStart);
        Ok(Box::new(HttpStreamResource {
            client: self.client.clone(),
            url,
            sink,
            relay: self.relay.clone(),
            stall_timeout: self.options.stall_timeout,
            volume,
            task: None,
        }))
    }

    fn relay(&self) -> Option<StreamRelay> {
        Some(self.relay.clone())
    }
}

struct HttpStreamResource {
    client: Client,
    url: Url,
    sink: EventSink,
    relay: StreamRelay,
    stall_timeout: Duration,
    /// Le relais transporte le flux brut : le volume est appliqué par
    /// l'auditeur à partir du snapshot.
    volume: u8,
    task: Option<JoinHandle<()>>,
}

impl HttpStreamResource {
    fn abort(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                self.relay.set_active(false);
                true
            }
            None => false,
        }
    }
}

impl AudioResource for HttpStreamResource {
    fn play(&mut self) -> Result<()> {
        if self.task.as_ref().is_some_and(|t| !t.is_finished()) {
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PlaybackError::PlayRejected(e.to_string()))?;

        debug!("Opening {} (volume {})", self.url, self.volume);
        self.task = Some(runtime.spawn(pump(
            self.client.clone(),
            self.url.clone(),
            self.sink.clone(),
            self.relay.clone(),
            self.stall_timeout,
        )));
        Ok(())
    }

    fn pause(&mut self) {
        if self.abort() {
            self.sink.emit(ResourceEvent::Paused);
        }
    }

    fn set_volume(&mut self, volume: u8) {
        self.volume = volume;
    }

    fn release(&mut self) {
        self.abort();
        self.sink.detach();
    }
}

impl Drop for HttpStreamResource {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Lit le flux et le pousse dans le relais jusqu'à la fin, une erreur ou
/// l'annulation de la tâche.
///
/// Une fois le `sink` détaché, la tâche n'écrit plus dans le relais, pas même
/// pour le désactiver : il appartient alors à la ressource suivante.
async fn pump(client: Client, url: Url, sink: EventSink, relay: StreamRelay, stall: Duration) {
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            sink.emit(ResourceEvent::PlayRejected(e.to_string()));
            return;
        }
    };

    if sink.is_detached() {
        return;
    }

    let status = response.status();
    if !status.is_success() {
        sink.emit(ResourceEvent::Error(format!("upstream returned {}", status)));
        return;
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    relay.set_content_type(content_type);
    sink.emit(ResourceEvent::CanPlay);

    let mut stream = response.bytes_stream();
    let mut started = false;
    let mut waiting = false;

    loop {
        let next = tokio::time::timeout(stall, stream.next()).await;
        // `abort()` n'agit qu'au prochain point d'attente : une ressource
        // remplacée ne doit plus toucher au relais
        if sink.is_detached() {
            return;
        }

        match next {
            Ok(Some(Ok(chunk))) => {
                if !started {
                    started = true;
                    relay.set_active(true);
                    info!("▶️ Streaming {}", url);
                    sink.emit(ResourceEvent::Playing);
                } else if waiting {
                    waiting = false;
                    sink.emit(ResourceEvent::Playing);
                }
                relay.publish(chunk);
            }
            Ok(Some(Err(e))) => {
                warn!("Stream error on {}: {}", url, e);
                sink.emit(ResourceEvent::Error(e.to_string()));
                break;
            }
            Ok(None) => {
                debug!("Stream {} ended", url);
                sink.emit(ResourceEvent::Ended);
                break;
            }
            Err(_) => {
                if !waiting {
                    waiting = true;
                    debug!("No data from {} for {:?}", url, stall);
                    sink.emit(ResourceEvent::Waiting);
                }
            }
        }
    }

    relay.set_active(false);
}
