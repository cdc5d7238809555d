#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pmoplayer::{
    AudioBackend, AudioResource, EventSink, Generation, PlaybackError, PlaybackState,
    PlayerHandle, ResourceEvent, Snapshot,
};
use pmostations::{NewStation, Station, StationCatalog};

#[derive(Default)]
struct Script {
    created: Vec<(Generation, String)>,
    released: Vec<Generation>,
    played: Vec<Generation>,
    sinks: HashMap<Generation, EventSink>,
    failing_urls: HashSet<String>,
    reject_play: Option<String>,
    volumes: Vec<(Generation, u8)>,
}

/// Backend en mémoire : enregistre les ressources créées et libérées, et
/// laisse le test piloter les évènements.
///
/// `play()` émet `Playing`, `pause()` émet `Paused`, comme une vraie
/// ressource.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_creation_for(&self, url: &str) {
        self.script.lock().unwrap().failing_urls.insert(url.to_string());
    }

    pub fn reject_play(&self, reason: Option<&str>) {
        self.script.lock().unwrap().reject_play = reason.map(str::to_string);
    }

    pub fn created(&self) -> Vec<(Generation, String)> {
        self.script.lock().unwrap().created.clone()
    }

    pub fn created_urls(&self) -> Vec<String> {
        self.created().into_iter().map(|(_, url)| url).collect()
    }

    pub fn released(&self) -> Vec<Generation> {
        self.script.lock().unwrap().released.clone()
    }

    pub fn played(&self) -> Vec<Generation> {
        self.script.lock().unwrap().played.clone()
    }

    pub fn volumes(&self) -> Vec<(Generation, u8)> {
        self.script.lock().unwrap().volumes.clone()
    }

    /// Fait émettre un évènement par la ressource de la génération donnée.
    ///
    /// Retourne `false` si la ressource a été détachée.
    pub fn emit(&self, generation: Generation, event: ResourceEvent) -> bool {
        let sink = self.script.lock().unwrap().sinks.get(&generation).cloned();
        sink.is_some_and(|s| s.emit(event))
    }
}

impl AudioBackend for ScriptedBackend {
    fn create(
        &self,
        url: &str,
        _volume: u8,
        sink: EventSink,
    ) -> pmoplayer::Result<Box<dyn AudioResource>> {
        let mut script = self.script.lock().unwrap();
        if script.failing_urls.contains(url) {
            return Err(PlaybackError::ResourceCreation(format!(
                "cannot open {}",
                url
            )));
        }

        let generation = sink.generation();
        script.created.push((generation, url.to_string()));
        script.sinks.insert(generation, sink.clone());
        sink.emit(ResourceEvent::LoadStart);

        Ok(Box::new(ScriptedResource {
            generation,
            sink,
            script: self.script.clone(),
        }))
    }
}

struct ScriptedResource {
    generation: Generation,
    sink: EventSink,
    script: Arc<Mutex<Script>>,
}

impl AudioResource for ScriptedResource {
    fn play(&mut self) -> pmoplayer::Result<()> {
        let reject = {
            let mut script = self.script.lock().unwrap();
            script.played.push(self.generation);
            script.reject_play.clone()
        };
        if let Some(reason) = reject {
            return Err(PlaybackError::PlayRejected(reason));
        }
        self.sink.emit(ResourceEvent::CanPlay);
        self.sink.emit(ResourceEvent::Playing);
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.emit(ResourceEvent::Paused);
    }

    fn set_volume(&mut self, volume: u8) {
        self.script
            .lock()
            .unwrap()
            .volumes
            .push((self.generation, volume));
    }

    fn release(&mut self) {
        self.script.lock().unwrap().released.push(self.generation);
    }
}

/// Catalogue avec les stations A, B et C (dans cet ordre).
pub async fn abc_catalog() -> (Arc<StationCatalog>, Vec<Station>) {
    let catalog = Arc::new(StationCatalog::in_memory());
    let mut stations = Vec::new();
    for name in ["A", "B", "C"] {
        let station = catalog
            .create(NewStation::new(
                name,
                format!("https://{}.radio.example/live", name.to_lowercase()),
            ))
            .await
            .unwrap();
        stations.push(station);
    }
    (catalog, stations)
}

/// Attend un snapshot satisfaisant `predicate`.
pub async fn wait_for(handle: &PlayerHandle, predicate: impl FnMut(&Snapshot) -> bool) -> Snapshot {
    let mut rx = handle.subscribe_snapshots();
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for snapshot")
        .expect("player stopped")
        .clone()
}

pub async fn wait_for_state(handle: &PlayerHandle, state: PlaybackState) -> Snapshot {
    wait_for(handle, |s| s.state == state).await
}
