//! Ressource audio et évènements qu'elle émet.
//!
//! Une ressource est créée par un [`AudioBackend`] pour une URL donnée. Elle
//! signale sa progression (chargement, lecture, mise en mémoire tampon,
//! erreurs) au travers d'un [`EventSink`] marqué avec la génération sous
//! laquelle elle a été créée.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::mpsc;

use crate::error::Result;

/// Numéro de génération d'une ressource, incrémenté à chaque `load()`.
pub type Generation = u64;

/// Évènements bruts d'une ressource audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent {
    /// Début du chargement
    LoadStart,
    /// Assez de données pour démarrer
    CanPlay,
    /// Assez de données pour lire sans interruption
    CanPlayThrough,
    /// La lecture a effectivement commencé
    Playing,
    Paused,
    Ended,
    /// En attente de données
    Waiting,
    Stalled,
    /// Échec du chargement du flux
    Error(String),
    /// Demande de lecture refusée
    PlayRejected(String),
}

/// Évènement accompagné de la génération de la ressource émettrice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedEvent {
    pub generation: Generation,
    pub event: ResourceEvent,
}

/// Canal par lequel une ressource publie ses évènements.
///
/// Une fois détaché, le sink ignore silencieusement toute émission.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: Generation,
    tx: mpsc::UnboundedSender<TaggedEvent>,
    detached: Arc<AtomicBool>,
}

impl EventSink {
    pub fn new(generation: Generation, tx: mpsc::UnboundedSender<TaggedEvent>) -> Self {
        Self {
            generation,
            tx,
            detached: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Publie un évènement ; retourne `false` s'il n'a pas été transmis.
    pub fn emit(&self, event: ResourceEvent) -> bool {
        if self.is_detached() {
            return false;
        }
        self.tx
            .send(TaggedEvent {
                generation: self.generation,
                event,
            })
            .is_ok()
    }

    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }
}

/// Ressource audio vivante, possédée exclusivement par le coordinateur.
pub trait AudioResource: Send {
    /// Démarre (ou reprend) la lecture.
    ///
    /// Un refus immédiat est retourné en erreur ; un refus différé arrive
    /// sous forme de [`ResourceEvent::PlayRejected`].
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    /// Volume entre 0 et 100.
    fn set_volume(&mut self, volume: u8);

    /// Arrête tout travail en cours. La ressource n'est plus utilisée ensuite.
    fn release(&mut self);
}

/// Fabrique de ressources audio.
pub trait AudioBackend: Send + Sync {
    fn create(&self, url: &str, volume: u8, sink: EventSink) -> Result<Box<dyn AudioResource>>;

    /// Relais des octets lus, pour les backends qui en exposent un.
    fn relay(&self) -> Option<crate::http_stream::StreamRelay> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_tags_events_with_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(7, tx);

        assert!(sink.emit(ResourceEvent::CanPlay));
        assert_eq!(
            rx.try_recv().unwrap(),
            TaggedEvent {
                generation: 7,
                event: ResourceEvent::CanPlay
            }
        );
    }

    #[test]
    fn test_detached_sink_is_silent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(1, tx);
        let clone = sink.clone();

        sink.detach();
        assert!(clone.is_detached());
        assert!(!clone.emit(ResourceEvent::Playing));
        assert!(rx.try_recv().is_err());
    }
}
